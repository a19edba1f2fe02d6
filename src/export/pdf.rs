use crate::error::{QuizError, Result};
use owned_ttf_parser::Face;
use printpdf::{IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use regex::Regex;
use std::collections::BTreeSet;
use unicode_width::UnicodeWidthStr;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BODY_SIZE: f32 = 11.0;
const PT_TO_MM: f32 = 0.3528;
const LINE_SPACING: f32 = 1.4;
/// Rough DejaVu Sans advance per display column, as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.55;
const BLANK_LINE: &str = "___________";

static SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
static SANS_OBLIQUE: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Oblique.ttf");
static SANS_BOLD_OBLIQUE: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-BoldOblique.ttf");

lazy_static::lazy_static! {
    static ref BOLD_RE: Option<Regex> = Regex::new(r"\*\*(.+?)\*\*").ok();
    static ref ITALIC_RE: Option<Regex> = Regex::new(r"\*(.+?)\*").ok();
    static ref UNDERSCORES_RE: Option<Regex> = Regex::new(r"_{2,}").ok();
}

/// Escapes XML characters, then turns `**x**` into `<b>x</b>`, `*x*` into
/// `<i>x</i>` and any run of underscores into a fixed-width blank.
pub fn clean_text_for_pdf(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    let mut cleaned = escaped;
    if let Some(re) = BOLD_RE.as_ref() {
        cleaned = re.replace_all(&cleaned, "<b>$1</b>").into_owned();
    }
    if let Some(re) = ITALIC_RE.as_ref() {
        cleaned = re.replace_all(&cleaned, "<i>$1</i>").into_owned();
    }
    if let Some(re) = UNDERSCORES_RE.as_ref() {
        cleaned = re.replace_all(&cleaned, BLANK_LINE).into_owned();
    }
    cleaned
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: RunStyle,
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Splits `<b>`/`<i>` markup into styled runs with entities decoded.
pub fn parse_markup(markup: &str) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    let mut style = RunStyle::default();
    let mut current = String::new();
    let mut rest = markup;

    fn flush(current: &mut String, style: RunStyle, runs: &mut Vec<StyledRun>) {
        if !current.is_empty() {
            runs.push(StyledRun {
                text: unescape(current),
                style,
            });
            current.clear();
        }
    }

    while let Some(c) = rest.chars().next() {
        let tag = ["<b>", "</b>", "<i>", "</i>"]
            .into_iter()
            .find(|t| rest.starts_with(t));
        match tag {
            Some(tag) => {
                flush(&mut current, style, &mut runs);
                match tag {
                    "<b>" => style.bold = true,
                    "</b>" => style.bold = false,
                    "<i>" => style.italic = true,
                    _ => style.italic = false,
                }
                rest = &rest[tag.len()..];
            }
            None => {
                current.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    flush(&mut current, style, &mut runs);

    runs
}

/// Greedy word wrap over styled runs. Words keep their style; adjacent
/// words of the same style are merged back into one run.
fn wrap_runs(runs: &[StyledRun], max_chars: usize) -> Vec<Vec<StyledRun>> {
    let mut lines: Vec<Vec<StyledRun>> = Vec::new();
    let mut line: Vec<StyledRun> = Vec::new();
    let mut width = 0;

    for run in runs {
        for word in run.text.split_whitespace() {
            let len = word.width();
            if width > 0 && width + 1 + len > max_chars {
                lines.push(std::mem::take(&mut line));
                width = 0;
            }
            let piece = if width == 0 {
                word.to_string()
            } else {
                format!(" {}", word)
            };
            width += piece.width();
            match line.last_mut() {
                Some(last) if last.style == run.style => last.text.push_str(&piece),
                _ => line.push(StyledRun {
                    text: piece,
                    style: run.style,
                }),
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// One TrueType face, embedded into the document the first time it is used.
struct FontSlot<'a> {
    data: &'a [u8],
    face: Face<'a>,
    font: Option<IndirectFontRef>,
}

impl<'a> FontSlot<'a> {
    fn parse(data: &'a [u8], name: &str) -> Result<Self> {
        let face = Face::parse(data, 0)
            .map_err(|e| QuizError::Pdf(format!("cannot read {} font: {}", name, e)))?;
        Ok(Self {
            data,
            face,
            font: None,
        })
    }

    fn covers(&self, c: char) -> bool {
        self.face.glyph_index(c).is_some_and(|id| id.0 != 0)
    }

    fn font_ref(&mut self, doc: &PdfDocumentReference) -> Result<IndirectFontRef> {
        if let Some(font) = &self.font {
            return Ok(font.clone());
        }
        let font = doc
            .add_external_font(self.data)
            .map_err(|e| QuizError::Pdf(e.to_string()))?;
        self.font = Some(font.clone());
        Ok(font)
    }
}

const FALLBACK_SLOT: usize = 4;

/// Bundled DejaVu Sans faces (regular, bold, oblique, bold oblique) plus an
/// optional fallback face for scripts they do not cover.
struct Fonts<'a> {
    slots: Vec<FontSlot<'a>>,
}

impl<'a> Fonts<'a> {
    fn load(fallback: Option<&'a [u8]>) -> Result<Self> {
        let mut slots = vec![
            FontSlot::parse(SANS, "DejaVuSans")?,
            FontSlot::parse(SANS_BOLD, "DejaVuSans-Bold")?,
            FontSlot::parse(SANS_OBLIQUE, "DejaVuSans-Oblique")?,
            FontSlot::parse(SANS_BOLD_OBLIQUE, "DejaVuSans-BoldOblique")?,
        ];
        if let Some(data) = fallback {
            slots.push(FontSlot::parse(data, "fallback")?);
        }
        Ok(Self { slots })
    }

    fn style_slot(style: RunStyle) -> usize {
        match (style.bold, style.italic) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn slot_for(&self, style: RunStyle, c: char) -> Option<usize> {
        let primary = Self::style_slot(style);
        if self.slots[primary].covers(c) {
            return Some(primary);
        }
        self.slots
            .get(FALLBACK_SLOT)
            .filter(|slot| slot.covers(c))
            .map(|_| FALLBACK_SLOT)
    }

    /// Characters no loaded face has a glyph for. Whitespace is skipped since
    /// wrapping turns it into plain spaces.
    fn missing(&self, runs: &[StyledRun]) -> BTreeSet<char> {
        runs.iter()
            .flat_map(|run| {
                run.text
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .filter(move |&c| self.slot_for(run.style, c).is_none())
            })
            .collect()
    }

    /// Splits a run into consecutive pieces drawn with the same face.
    fn segments(&self, run: &StyledRun) -> Vec<(usize, String)> {
        let primary = Self::style_slot(run.style);
        let mut segments: Vec<(usize, String)> = Vec::new();
        for c in run.text.chars() {
            let slot = self.slot_for(run.style, c).unwrap_or(primary);
            match segments.last_mut() {
                Some((last, text)) if *last == slot => text.push(c),
                _ => segments.push((slot, c.to_string())),
            }
        }
        segments
    }

    fn font_ref(&mut self, slot: usize, doc: &PdfDocumentReference) -> Result<IndirectFontRef> {
        self.slots[slot].font_ref(doc)
    }
}

enum Block {
    Gap,
    Paragraph {
        runs: Vec<StyledRun>,
        size: f32,
        indent: f32,
    },
}

fn parse_blocks(markdown: &str) -> Vec<Block> {
    markdown
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == "---" {
                return Block::Gap;
            }

            let (text, size, indent, heading) = if let Some(h) = trimmed.strip_prefix("# ") {
                (h, 16.0, 0.0, true)
            } else if let Some(h) = trimmed.strip_prefix("## ") {
                (h, 13.0, 0.0, true)
            } else if trimmed.starts_with("- ") {
                (trimmed, BODY_SIZE, 6.0, false)
            } else {
                (trimmed, BODY_SIZE, 0.0, false)
            };

            let mut runs = parse_markup(&clean_text_for_pdf(text));
            if heading {
                for run in &mut runs {
                    run.style.bold = true;
                }
            }
            Block::Paragraph { runs, size, indent }
        })
        .collect()
}

struct PageWriter<'a, 'f> {
    doc: &'a PdfDocumentReference,
    fonts: Fonts<'f>,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageWriter<'_, '_> {
    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Page {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn skip(&mut self, size: f32) {
        self.y -= size * PT_TO_MM * LINE_SPACING;
    }

    fn paragraph(&mut self, runs: &[StyledRun], size: f32, indent: f32) -> Result<()> {
        let usable = PAGE_WIDTH - 2.0 * MARGIN - indent;
        let max_chars = (usable / (size * AVG_CHAR_WIDTH * PT_TO_MM)).max(10.0) as usize;
        let line_height = size * PT_TO_MM * LINE_SPACING;

        for line in wrap_runs(runs, max_chars) {
            self.ensure_room(line_height);
            self.y -= line_height;
            self.layer.begin_text_section();
            self.layer.set_text_cursor(Mm(MARGIN + indent), Mm(self.y));
            for run in &line {
                for (slot, text) in self.fonts.segments(run) {
                    let font = self.fonts.font_ref(slot, self.doc)?;
                    self.layer.set_font(&font, size);
                    self.layer.write_text(text, &font);
                }
            }
            self.layer.end_text_section();
        }
        Ok(())
    }
}

fn describe_missing(missing: &BTreeSet<char>) -> String {
    missing
        .iter()
        .map(|c| format!("'{}' (U+{:04X})", c, *c as u32))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lays the rendered Markdown quiz out on A4 pages and returns the PDF bytes.
///
/// Text is drawn with embedded DejaVu Sans faces, falling back to
/// `fallback_font` (raw TTF/OTF bytes) for characters they lack. A character
/// that no face covers is an error rather than a silent omission.
pub fn render_pdf(markdown: &str, fallback_font: Option<&[u8]>) -> Result<Vec<u8>> {
    let fonts = Fonts::load(fallback_font)?;
    let blocks = parse_blocks(markdown);

    let missing: BTreeSet<char> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph { runs, .. } => Some(fonts.missing(runs)),
            Block::Gap => None,
        })
        .flatten()
        .collect();
    if !missing.is_empty() {
        return Err(QuizError::Pdf(format!(
            "no available font has glyphs for {}; set QUIZ_PDF_FONT to a font that covers them",
            describe_missing(&missing)
        )));
    }

    let (doc, page, layer) =
        PdfDocument::new("Generated Quiz", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
    let layer = doc.get_page(page).get_layer(layer);

    {
        let mut writer = PageWriter {
            doc: &doc,
            fonts,
            layer,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        };

        for block in &blocks {
            match block {
                Block::Gap => writer.skip(BODY_SIZE * 0.5),
                Block::Paragraph { runs, size, indent } => writer.paragraph(runs, *size, *indent)?,
            }
        }
    }

    doc.save_to_bytes().map_err(|e| QuizError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpdf::lopdf::{self, Object, content::Content};

    /// Glyph ids of every `Tj` operand, in drawing order.
    fn shown_glyphs(pdf: &[u8]) -> Vec<u16> {
        let doc = lopdf::Document::load_mem(pdf).unwrap();
        let mut glyphs = Vec::new();
        for page_id in doc.get_pages().into_values() {
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            for op in content.operations.iter().filter(|op| op.operator == "Tj") {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    glyphs.extend(bytes.chunks(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])));
                }
            }
        }
        glyphs
    }

    fn glyph_ids(font: &[u8], text: &str) -> Vec<u16> {
        let face = Face::parse(font, 0).unwrap();
        text.chars().map(|c| face.glyph_index(c).unwrap().0).collect()
    }

    #[test]
    fn test_clean_text_for_pdf_markers() {
        assert_eq!(clean_text_for_pdf("**bold** text"), "<b>bold</b> text");
        assert_eq!(clean_text_for_pdf("*italic* text"), "<i>italic</i> text");
        assert!(clean_text_for_pdf("Fill in _____ here").contains("___________"));
    }

    #[test]
    fn test_clean_text_for_pdf_escapes_first() {
        let cleaned = clean_text_for_pdf("Use <tag> & **bold**");
        assert_eq!(cleaned, "Use &lt;tag&gt; &amp; <b>bold</b>");
    }

    #[test]
    fn test_parse_markup_styles() {
        let runs = parse_markup("<b>Q1.</b> <i>(Mcq)</i> a &lt;b&gt; tag");
        assert_eq!(runs.len(), 4);
        assert!(runs[0].style.bold);
        assert_eq!(runs[0].text, "Q1.");
        assert!(runs[2].style.italic);
        assert_eq!(runs[3].text, " a <b> tag");
        assert_eq!(runs[3].style, RunStyle::default());
    }

    #[test]
    fn test_wrap_runs_respects_width() {
        let runs = vec![StyledRun {
            text: "one two three four five six".to_string(),
            style: RunStyle::default(),
        }];
        let lines = wrap_runs(&runs, 10);
        assert!(lines.len() >= 3);
        for line in &lines {
            let width: usize = line.iter().map(|r| r.text.chars().count()).sum();
            assert!(width <= 10);
        }
    }

    #[test]
    fn test_render_pdf_produces_document() {
        let mut markdown = String::from("# Generated Quiz (40 questions)\n\n");
        for i in 1..=40 {
            markdown.push_str(&format!(
                "**Q{}.** *(Fill Blank)* Python is a _____ language.\n\n**Answer:** programming\n\n",
                i
            ));
        }
        let bytes = render_pdf(&markdown, None).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_pdf_keeps_non_latin_glyphs() {
        let text = "Ωmega Привет ĳ €";
        let bytes = render_pdf(text, None).unwrap();
        assert_eq!(shown_glyphs(&bytes), glyph_ids(SANS, text));
    }

    #[test]
    fn test_render_pdf_rejects_uncovered_characters() {
        let err = render_pdf("**Q1.** 什么 Ω", None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'什' (U+4EC0)"), "{}", message);
        assert!(message.contains("'么' (U+4E48)"), "{}", message);
        assert!(!message.contains("U+03A9"), "{}", message);
    }

    #[test]
    fn test_render_pdf_uses_fallback_font() {
        // DejaVu Sans Bold has no mathematical sans-serif letters
        let heading = "# 𝖠 set";
        assert!(render_pdf(heading, None).is_err());

        let bytes = render_pdf(heading, Some(SANS)).unwrap();
        let mut expected = glyph_ids(SANS, "𝖠");
        expected.extend(glyph_ids(SANS_BOLD, " set"));
        assert_eq!(shown_glyphs(&bytes), expected);
    }

    #[test]
    fn test_render_pdf_invalid_fallback_font() {
        let err = render_pdf("plain", Some(b"not a font".as_slice())).unwrap_err();
        assert!(err.to_string().contains("cannot read fallback font"));
    }
}
