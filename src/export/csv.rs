use crate::models::QuestionRecord;

pub const HEADER: [&str; 5] = ["Question Number", "Type", "Question", "Answer", "Options"];
pub const OPTION_SEPARATOR: &str = "|";
const LINE_END: &str = "\r\n";

/// Quotes a field when it holds a comma, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push_str(LINE_END);
}

pub fn to_csv(questions: &[QuestionRecord]) -> String {
    let mut out = String::new();
    write_row(&mut out, &HEADER);

    for (i, q) in questions.iter().enumerate() {
        let number = (i + 1).to_string();
        let options = q
            .options
            .as_ref()
            .map(|o| o.join(OPTION_SEPARATOR))
            .unwrap_or_default();
        write_row(
            &mut out,
            &[
                number.as_str(),
                q.kind.as_str(),
                q.question.as_str(),
                q.answer.as_str(),
                options.as_str(),
            ],
        );
    }

    out
}

/// Parses CSV content into rows. Quoted fields may contain commas,
/// doubled quotes and line breaks; blank lines are skipped.
pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes && field.is_empty() => {
                in_quotes = true;
            }
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
