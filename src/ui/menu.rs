use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::models::QuestionType;
use crate::ui::layout::calculate_menu_chunks;
use crate::utils::truncate_string;

fn key_span(label: &str) -> Span<'static> {
    Span::styled(
        label.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

fn type_toggles(app: &App) -> Line<'static> {
    let mut spans = vec![Span::from("Types: ")];
    for (i, (kind, enabled)) in QuestionType::GENERATED
        .iter()
        .zip(app.enabled_types.iter())
        .enumerate()
    {
        let mark = if *enabled { "[x]" } else { "[ ]" };
        let style = if *enabled {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(
            format!("{} {} {}  ", i + 1, mark, kind.label()),
            style,
        ));
    }
    Line::from(spans)
}

pub fn draw_menu(f: &mut Frame, app: &App) {
    let layout = calculate_menu_chunks(f.area());

    let title = Paragraph::new("Quiz Generator v0.1.0")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, layout.title_area);

    let width = layout.files_area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = if app.source_files.is_empty() {
        vec![ListItem::new("No .txt or .md files found in the sources directory").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]
    } else {
        app.source_files
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let style = if i == app.selected_file_index {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(truncate_string(&name, width)).style(style)
            })
            .collect()
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Source Files")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, layout.files_area);

    let settings = Paragraph::new(vec![
        Line::from(format!("Questions: {}", app.num_questions)),
        type_toggles(app),
    ])
    .block(Block::default().borders(Borders::ALL).title("Settings"));
    f.render_widget(settings, layout.settings_area);

    let status = Paragraph::new(app.status.clone().unwrap_or_default())
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, layout.status_area);

    let footer_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(layout.footer_area);

    let ai_status_content = if app.ai_enabled() {
        vec![
            Line::from("AI: Enabled"),
            Line::from(format!("Model: {}", app.session.config().model.model)),
        ]
    } else {
        vec![
            Line::from("AI: Disabled"),
            Line::from("Set OPENROUTER_API_KEY"),
        ]
    };
    let ai_status = Paragraph::new(ai_status_content)
        .style(
            Style::default()
                .fg(if app.ai_enabled() {
                    Color::Green
                } else {
                    Color::Yellow
                })
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).title("AI Status"));
    f.render_widget(ai_status, footer_chunks[0]);

    let mut second_line = vec![key_span("1-4"), Span::from(" Toggle Type  ")];
    if app.ai_enabled() {
        second_line.extend([key_span("l"), Span::from(" Generate with AI  ")]);
    }
    second_line.extend([key_span("q/Esc"), Span::from(" Quit")]);

    let help = Paragraph::new(vec![
        Line::from(vec![
            key_span("↑/↓"),
            Span::from(" Select  "),
            key_span("+/-"),
            Span::from(" Questions  "),
            key_span("Enter"),
            Span::from(" Generate"),
        ]),
        Line::from(second_line),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, footer_chunks[1]);
}
