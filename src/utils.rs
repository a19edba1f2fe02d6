use lazy_static::lazy_static;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

lazy_static! {
    static ref NUMBERED_ITEM: Option<Regex> = Regex::new(r"^(\d+)\.\s+(.*)$").ok();
    static ref INLINE_MARKUP: Option<Regex> =
        Regex::new(r"\*\*(.+?)\*\*|\*(.+?)\*|`([^`]+)`").ok();
}

const RULE_WIDTH: usize = 40;

/// Shortens `s` to at most `max_width` terminal columns, ending in "...".
pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push_str("...");
    out
}

/// Rows `text` occupies once wrapped to `width` columns.
pub fn estimate_text_height(text: &Text, width: usize) -> usize {
    let width = width.max(1);
    text.lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

pub fn calculate_max_scroll(content_height: usize, visible_height: usize) -> u16 {
    content_height
        .saturating_sub(visible_height)
        .min(u16::MAX as usize) as u16
}

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

/// Converts the quiz markdown into styled terminal lines. Handles headings,
/// horizontal rules, bullet and numbered items, and inline bold, italic
/// and code spans.
pub fn render_markdown(content: &str) -> Vec<Line<'static>> {
    let mut result = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(h) = trimmed
            .strip_prefix("### ")
            .or_else(|| trimmed.strip_prefix("## "))
            .or_else(|| trimmed.strip_prefix("# "))
        {
            result.push(heading(h));
            continue;
        }

        if trimmed == "---" {
            result.push(Line::from(Span::styled(
                "─".repeat(RULE_WIDTH),
                Style::default().add_modifier(Modifier::DIM),
            )));
            continue;
        }

        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let mut spans = vec![Span::from("  • ")];
            spans.extend(parse_inline(item));
            result.push(Line::from(spans));
            continue;
        }

        if let Some(caps) = NUMBERED_ITEM.as_ref().and_then(|re| re.captures(trimmed)) {
            if let (Some(num), Some(item)) = (caps.get(1), caps.get(2)) {
                let mut spans = vec![Span::from(format!("  {}. ", num.as_str()))];
                spans.extend(parse_inline(item.as_str()));
                result.push(Line::from(spans));
                continue;
            }
        }

        if trimmed.is_empty() {
            result.push(Line::from(""));
        } else {
            result.push(Line::from(parse_inline(line)));
        }
    }

    result
}

fn parse_inline(text: &str) -> Vec<Span<'static>> {
    let Some(re) = INLINE_MARKUP.as_ref() else {
        return vec![Span::from(text.to_string())];
    };

    let mut spans = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::from(text[last..whole.start()].to_string()));
        }

        if let Some(bold) = caps.get(1) {
            spans.push(Span::styled(
                bold.as_str().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if let Some(italic) = caps.get(2) {
            spans.push(Span::styled(
                italic.as_str().to_string(),
                Style::default().add_modifier(Modifier::ITALIC),
            ));
        } else if let Some(code) = caps.get(3) {
            spans.push(Span::styled(
                code.as_str().to_string(),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Span::from(text[last..].to_string()));
    }
    if spans.is_empty() {
        spans.push(Span::from(text.to_string()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_no_truncation() {
        assert_eq!(truncate_string("Short string", 20), "Short string");
        assert_eq!(truncate_string("", 20), "");
    }

    #[test]
    fn test_truncate_string_with_truncation() {
        let result = truncate_string("This is a very long string that should be truncated", 20);
        assert_eq!(result, "This is a very lo...");
        assert!(result.width() <= 20);
    }

    #[test]
    fn test_truncate_string_multibyte() {
        let result = truncate_string("什么是机器学习和深度学习", 10);
        assert!(result.ends_with("..."));
        assert!(result.width() <= 10);
    }

    #[test]
    fn test_max_scroll() {
        assert_eq!(calculate_max_scroll(10, 20), 0);
        assert_eq!(calculate_max_scroll(30, 20), 10);
    }

    #[test]
    fn test_estimate_text_height_wraps() {
        let text = Text::from(vec![Line::from("a".repeat(25)), Line::from("")]);
        assert_eq!(estimate_text_height(&text, 10), 4);
    }

    #[test]
    fn test_render_quiz_heading_and_rule() {
        let lines = render_markdown("# Generated Quiz (2 questions)\n\n---\n");
        assert_eq!(lines[0].spans[0].content, "Generated Quiz (2 questions)");
        assert!(lines[0].spans[0].style.add_modifier.intersects(Modifier::BOLD));
        assert_eq!(lines[1].to_string(), "");
        assert!(lines[2].to_string().starts_with('─'));
    }

    #[test]
    fn test_question_line_inline_styles() {
        let lines = render_markdown("**Q1.** *(Fill Blank)* Python is a _____ language.");
        let line = &lines[0];
        assert_eq!(line.spans[0].content, "Q1.");
        assert!(line.spans[0].style.add_modifier.intersects(Modifier::BOLD));
        assert_eq!(line.spans[2].content, "(Fill Blank)");
        assert!(line.spans[2].style.add_modifier.intersects(Modifier::ITALIC));
        assert!(line.to_string().ends_with("Python is a _____ language."));
    }

    #[test]
    fn test_option_bullets_and_numbers() {
        let lines = render_markdown("- A) Rust\n1. First");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].to_string().contains("• A) Rust"));
        assert!(lines[1].to_string().contains("1. First"));
    }

    #[test]
    fn test_code_span() {
        let lines = render_markdown("`code`");
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[0].spans[0].content, "code");
    }
}
