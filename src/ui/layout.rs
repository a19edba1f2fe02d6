use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct MenuLayout {
    pub title_area: Rect,
    pub files_area: Rect,
    pub settings_area: Rect,
    pub status_area: Rect,
    pub footer_area: Rect,
}

pub struct QuizLayout {
    pub header_area: Rect,
    pub content_area: Rect,
    pub status_area: Rect,
    pub help_area: Rect,
}

pub fn calculate_menu_chunks(area: Rect) -> MenuLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(area);

    MenuLayout {
        title_area: chunks[0],
        files_area: chunks[1],
        settings_area: chunks[2],
        status_area: chunks[3],
        footer_area: chunks[4],
    }
}

pub fn calculate_quiz_chunks(area: Rect) -> QuizLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(area);

    QuizLayout {
        header_area: chunks[0],
        content_area: chunks[1],
        status_area: chunks[2],
        help_area: chunks[3],
    }
}
