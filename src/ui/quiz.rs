use crate::app::App;
use crate::ui::layout::calculate_quiz_chunks;
use crate::utils::{calculate_max_scroll, estimate_text_height, render_markdown};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn key_span(label: &'static str) -> Span<'static> {
    Span::styled(
        label,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

pub fn draw_quiz(f: &mut Frame, app: &mut App) {
    let layout = calculate_quiz_chunks(f.area());
    let state = app.session.state();

    let types: Vec<String> = state.question_types.iter().map(|t| t.label()).collect();
    let header = Paragraph::new(format!(
        "{} questions - {}",
        state.num_questions,
        types.join(", ")
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(ratatui::layout::Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, layout.header_area);

    let content = Text::from(render_markdown(&app.content));
    let visible_height = layout.content_area.height.saturating_sub(2) as usize;
    let text_width = layout.content_area.width.saturating_sub(2) as usize;
    let max_scroll = calculate_max_scroll(estimate_text_height(&content, text_width), visible_height);
    // keep the stored offset bounded so repeated Down presses don't drift
    app.scroll_y = app.scroll_y.min(max_scroll);

    let quiz = Paragraph::new(content)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll_y, 0))
        .block(Block::default().borders(Borders::ALL).title("Quiz"));
    f.render_widget(quiz, layout.content_area);

    let status = Paragraph::new(app.status.clone().unwrap_or_default())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, layout.status_area);

    let mut action_spans = vec![
        key_span("s"),
        Span::from(" Shuffle  "),
        key_span("a"),
        Span::from(" Analyze  "),
    ];
    if app.ai_enabled() {
        action_spans.extend([key_span("e"), Span::from(" Explain  ")]);
    }
    action_spans.extend([
        key_span("d/c/t/p"),
        Span::from(" Download md/csv/txt/pdf"),
    ]);

    let help = Paragraph::new(vec![
        Line::from(action_spans),
        Line::from(vec![
            key_span("↑/↓"),
            Span::from(" Scroll  "),
            key_span("Esc/m"),
            Span::from(" Menu  "),
            key_span("q"),
            Span::from(" Quit"),
        ]),
    ])
    .alignment(ratatui::layout::Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, layout.help_area);
}
