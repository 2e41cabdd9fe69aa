//! OCR layout model.
//!
//! Turns a Document Intelligence `analyzeResult` into ordered line and word
//! records carrying page geometry. Rows are ordered so that rotated pages read
//! naturally, then regrouped into visual lines by their baseline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Maximum baseline drift between two rows on the same visual line
pub const LINE_DRIFT_THRESHOLD: f64 = 0.015;

const HEADER_FOOTER_MARKERS: [&str; 3] = [
    "<!-- PageFooter=\"",
    "<!-- PageHeader=\"",
    "<!-- PageNumber=\"",
];
const MARKER_END: &str = "\" -->";

/// Raw analyze result as returned by the Document Intelligence REST API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pages: Vec<AnalyzedPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedPage {
    pub page_number: u32,
    #[serde(default)]
    pub angle: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub lines: Vec<AnalyzedLine>,
    #[serde(default)]
    pub words: Vec<AnalyzedWord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzedLine {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub polygon: Vec<f64>,
    #[serde(default)]
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzedWord {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub polygon: Vec<f64>,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Four corners of a quadrilateral, clockwise from the top left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub top_left_x: f64,
    pub top_left_y: f64,
    pub top_right_x: f64,
    pub top_right_y: f64,
    pub bottom_right_x: f64,
    pub bottom_right_y: f64,
    pub bottom_left_x: f64,
    pub bottom_left_y: f64,
}

impl Quad {
    /// Build from an 8 value polygon; `None` when fewer coordinates are present.
    pub fn from_polygon(polygon: &[f64]) -> Option<Self> {
        match polygon {
            [a, b, c, d, e, f, g, h, ..] => Some(Self {
                top_left_x: *a,
                top_left_y: *b,
                top_right_x: *c,
                top_right_y: *d,
                bottom_right_x: *e,
                bottom_right_y: *f,
                bottom_left_x: *g,
                bottom_left_y: *h,
            }),
            _ => None,
        }
    }
}

/// A span together with the slice of document content it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanContent {
    pub offset: usize,
    pub length: usize,
    pub content: String,
}

/// Geometry shared by every row on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page: u32,
    pub angle: f64,
    pub width: f64,
    pub height: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub text: String,
    #[serde(flatten)]
    pub quad: Quad,
    #[serde(flatten)]
    pub geometry: PageGeometry,
    pub spans: Vec<SpanContent>,
    pub page_spans: Vec<SpanContent>,
    pub line_numbers: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    pub text: String,
    pub confidence: Option<f64>,
    pub word_number: usize,
    #[serde(flatten)]
    pub quad: Quad,
    #[serde(flatten)]
    pub geometry: PageGeometry,
    pub spans: Vec<SpanContent>,
    pub page_spans: Vec<SpanContent>,
    pub line_numbers: u32,
    pub phrase_line: u32,
}

/// Rows that can be placed on a page and assigned a visual line
trait Positioned {
    fn quad(&self) -> &Quad;
    fn geometry(&self) -> &PageGeometry;
    fn line_number(&self) -> u32;
    fn set_line_number(&mut self, line: u32);
}

impl Positioned for LineRecord {
    fn quad(&self) -> &Quad {
        &self.quad
    }

    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn line_number(&self) -> u32 {
        self.line_numbers
    }

    fn set_line_number(&mut self, line: u32) {
        self.line_numbers = line;
    }
}

impl Positioned for WordRecord {
    fn quad(&self) -> &Quad {
        &self.quad
    }

    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn line_number(&self) -> u32 {
        self.line_numbers
    }

    fn set_line_number(&mut self, line: u32) {
        self.line_numbers = line;
    }
}

/// Parsed OCR layout of one uploaded document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub document_id: String,
    pub lines: Vec<LineRecord>,
    pub words: Vec<WordRecord>,
}

impl DocumentLayout {
    pub fn from_analyze_result(result: &AnalyzeResult, document_id: impl Into<String>) -> Self {
        let content: Vec<char> = result.content.chars().collect();
        let mut lines = Vec::new();
        let mut words = Vec::new();
        let mut word_number = 0usize;
        let mut line_number = 0u32;

        for page in &result.pages {
            let geometry = PageGeometry {
                page: page.page_number,
                angle: page.angle.unwrap_or(0.0),
                width: page.width.unwrap_or(0.0),
                height: page.height.unwrap_or(0.0),
                unit: page.unit.clone().unwrap_or_default(),
            };
            let page_spans = slice_spans(&content, &page.spans);

            for line in &page.lines {
                line_number += 1;
                let Some(quad) = Quad::from_polygon(&line.polygon) else {
                    tracing::warn!(
                        page = page.page_number,
                        text = %line.content,
                        "Skipping OCR line with incomplete polygon"
                    );
                    continue;
                };
                lines.push(LineRecord {
                    text: line.content.clone(),
                    quad,
                    geometry: geometry.clone(),
                    spans: slice_spans(&content, &line.spans),
                    page_spans: page_spans.clone(),
                    line_numbers: line_number,
                });
            }

            for word in &page.words {
                word_number += 1;
                let Some(quad) = Quad::from_polygon(&word.polygon) else {
                    tracing::warn!(
                        page = page.page_number,
                        text = %word.content,
                        "Skipping OCR word with incomplete polygon"
                    );
                    continue;
                };
                let spans: Vec<Span> = word.span.iter().copied().collect();
                words.push(WordRecord {
                    text: word.content.clone(),
                    confidence: word.confidence,
                    word_number,
                    quad,
                    geometry: geometry.clone(),
                    spans: slice_spans(&content, &spans),
                    page_spans: page_spans.clone(),
                    line_numbers: line_number,
                    phrase_line: 0,
                });
            }
        }

        let mut lines = regroup_visual_lines(sort_rotated(lines));
        for line in &mut lines {
            line.text = strip_header_footer_markers(&line.text);
        }

        let mut words = regroup_visual_lines(sort_rotated(words));
        assign_phrase_lines(&mut words);

        Self {
            document_id: document_id.into(),
            lines,
            words,
        }
    }

    /// Distinct page numbers present in the line records, ascending
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.lines.iter().map(|l| l.geometry.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

/// Stable content hash identifying an uploaded document
pub fn document_id(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// OCR text of every page: non-empty line contents joined by newlines
pub fn page_content(result: &AnalyzeResult) -> BTreeMap<u32, String> {
    result
        .pages
        .iter()
        .map(|page| {
            let text = page
                .lines
                .iter()
                .map(|line| line.content.as_str())
                .filter(|content| !content.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            (page.page_number, text)
        })
        .collect()
}

fn slice_spans(content: &[char], spans: &[Span]) -> Vec<SpanContent> {
    spans
        .iter()
        .map(|span| {
            let start = span.offset.min(content.len());
            let end = span.offset.saturating_add(span.length).min(content.len());
            SpanContent {
                offset: span.offset,
                length: span.length,
                content: content[start..end].iter().collect(),
            }
        })
        .collect()
}

fn by_page(a: &PageGeometry, b: &PageGeometry) -> Ordering {
    a.page.cmp(&b.page)
}

/// Orders rows for reading, grouped by page rotation in first-seen order.
fn sort_rotated<T: Positioned>(rows: Vec<T>) -> Vec<T> {
    let mut angles: Vec<f64> = Vec::new();
    for row in &rows {
        let angle = row.geometry().angle;
        if !angles.iter().any(|seen| seen.to_bits() == angle.to_bits()) {
            angles.push(angle);
        }
    }

    let mut groups: Vec<Vec<T>> = angles.iter().map(|_| Vec::new()).collect();
    for row in rows {
        let bits = row.geometry().angle.to_bits();
        if let Some(index) = angles.iter().position(|seen| seen.to_bits() == bits) {
            groups[index].push(row);
        }
    }

    let mut ordered = Vec::new();
    for (angle, mut group) in angles.into_iter().zip(groups) {
        let turn = angle.abs();
        if turn > 80.0 && turn < 100.0 {
            group.sort_by(|a, b| {
                by_page(a.geometry(), b.geometry())
                    .then(a.quad().bottom_left_x.total_cmp(&b.quad().bottom_left_x))
                    .then(a.quad().bottom_left_y.total_cmp(&b.quad().bottom_left_y))
            });
        } else if turn > 170.0 && turn < 190.0 {
            group.sort_by(|a, b| {
                by_page(a.geometry(), b.geometry())
                    .then(b.quad().bottom_left_y.total_cmp(&a.quad().bottom_left_y))
                    .then(b.quad().bottom_left_x.total_cmp(&a.quad().bottom_left_x))
            });
        } else if turn > 260.0 && turn < 280.0 {
            group.sort_by(|a, b| {
                by_page(a.geometry(), b.geometry())
                    .then(b.quad().bottom_left_x.total_cmp(&a.quad().bottom_left_x))
            });
        } else {
            group.sort_by(|a, b| {
                by_page(a.geometry(), b.geometry())
                    .then(a.quad().bottom_left_y.total_cmp(&b.quad().bottom_left_y))
                    .then(a.quad().bottom_left_x.total_cmp(&b.quad().bottom_left_x))
            });
        }
        ordered.extend(group);
    }
    ordered
}

/// Numbers visual lines by baseline drift, then orders rows within each line.
fn regroup_visual_lines<T: Positioned>(mut rows: Vec<T>) -> Vec<T> {
    let mut current = 0u32;
    let mut previous_y: Option<f64> = None;

    for row in rows.iter_mut() {
        let y = row.quad().bottom_left_y;
        let continues = previous_y
            .map(|prev| {
                let diff = y - prev;
                (0.0..LINE_DRIFT_THRESHOLD).contains(&diff)
            })
            .unwrap_or(false);
        if !continues {
            current += 1;
        }
        row.set_line_number(current);
        previous_y = Some(y);
    }

    rows.sort_by(|a, b| {
        by_page(a.geometry(), b.geometry())
            .then(a.line_number().cmp(&b.line_number()))
            .then(a.quad().bottom_left_x.total_cmp(&b.quad().bottom_left_x))
    });
    rows
}

fn assign_phrase_lines(words: &mut [WordRecord]) {
    let mut phrase = 1u32;
    let mut previous: Option<u32> = words.first().map(|w| w.line_numbers);
    for word in words.iter_mut() {
        if previous != Some(word.line_numbers) {
            phrase += 1;
        }
        word.phrase_line = phrase;
        previous = Some(word.line_numbers);
    }
}

/// Removes page header, footer and number markers the layout model wraps text in.
pub fn strip_header_footer_markers(text: &str) -> String {
    let mut text = text.to_string();
    for marker in HEADER_FOOTER_MARKERS {
        let starts = text.starts_with(marker);
        let ends = text.ends_with(MARKER_END);
        if starts {
            text = text.replace(marker, "");
        }
        if ends {
            text = text.replace(MARKER_END, "");
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn polygon(x: f64, y: f64) -> serde_json::Value {
        json!([x, y - 0.1, x + 1.0, y - 0.1, x + 1.0, y, x, y])
    }

    fn sample_result() -> AnalyzeResult {
        serde_json::from_value(json!({
            "content": "Shipper: ACME\nBOL No 12345\nPage 1",
            "pages": [{
                "pageNumber": 1,
                "angle": 0.0,
                "width": 8.5,
                "height": 11.0,
                "unit": "inch",
                "spans": [{"offset": 0, "length": 34}],
                "lines": [
                    {"content": "BOL No 12345", "polygon": polygon(1.0, 2.0), "spans": [{"offset": 14, "length": 12}]},
                    {"content": "Shipper: ACME", "polygon": polygon(1.0, 1.0), "spans": [{"offset": 0, "length": 13}]},
                    {"content": "<!-- PageNumber=\"Page 1\" -->", "polygon": polygon(4.0, 10.5), "spans": [{"offset": 27, "length": 6}]},
                    {"content": "broken", "polygon": [1.0, 2.0], "spans": []}
                ],
                "words": [
                    {"content": "12345", "polygon": polygon(3.0, 2.0), "span": {"offset": 21, "length": 5}, "confidence": 0.99},
                    {"content": "BOL", "polygon": polygon(1.0, 2.005), "span": {"offset": 14, "length": 3}, "confidence": 0.98},
                    {"content": "Shipper:", "polygon": polygon(1.0, 1.0), "span": {"offset": 0, "length": 8}, "confidence": 0.97}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_document_id_is_stable_hex() {
        let first = document_id(b"%PDF-1.7 sample");
        let second = document_id(b"%PDF-1.7 sample");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, document_id(b"other"));
    }

    #[test]
    fn test_page_content_skips_empty_lines() {
        let mut result = sample_result();
        result.pages[0].lines.push(AnalyzedLine::default());

        let content = page_content(&result);
        assert_eq!(
            content.get(&1).map(String::as_str),
            Some("BOL No 12345\nShipper: ACME\n<!-- PageNumber=\"Page 1\" -->\nbroken")
        );
    }

    #[test]
    fn test_lines_are_ordered_top_to_bottom() {
        let layout = DocumentLayout::from_analyze_result(&sample_result(), "doc-1");
        let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();

        assert_eq!(texts, vec!["Shipper: ACME", "BOL No 12345", "Page 1"]);
        assert_eq!(layout.lines[0].line_numbers, 1);
        assert_eq!(layout.lines[2].line_numbers, 3);
        assert_eq!(layout.lines[1].spans[0].content, "BOL No 12345");
        assert_eq!(layout.lines[0].page_spans[0].length, 34);
        assert_eq!(layout.document_id, "doc-1");
    }

    #[test]
    fn test_words_share_visual_line_and_phrase() {
        let layout = DocumentLayout::from_analyze_result(&sample_result(), "doc-1");
        let words: Vec<(&str, u32, u32)> = layout
            .words
            .iter()
            .map(|w| (w.text.as_str(), w.line_numbers, w.phrase_line))
            .collect();

        // "BOL" sits 0.005 below "12345" yet reads on the same line, left of it
        assert_eq!(words[0].0, "Shipper:");
        assert_eq!(words[1].0, "BOL");
        assert_eq!(words[2].0, "12345");
        assert_eq!(words[1].1, words[2].1);
        assert_eq!(words[0].2, 1);
        assert_eq!(words[1].2, 2);
        assert_eq!(words[2].2, 2);
    }

    #[test]
    fn test_word_numbers_follow_input_order() {
        let layout = DocumentLayout::from_analyze_result(&sample_result(), "doc-1");
        let bol = layout.words.iter().find(|w| w.text == "BOL").unwrap();
        assert_eq!(bol.word_number, 2);
        assert_eq!(bol.spans[0].content, "BOL");
        assert_eq!(bol.confidence, Some(0.98));
    }

    #[test]
    fn test_upside_down_page_reads_bottom_up() {
        let result: AnalyzeResult = serde_json::from_value(json!({
            "content": "",
            "pages": [{
                "pageNumber": 1,
                "angle": 180.0,
                "lines": [
                    {"content": "upper", "polygon": polygon(1.0, 1.0)},
                    {"content": "lower", "polygon": polygon(1.0, 5.0)}
                ]
            }]
        }))
        .unwrap();

        let layout = DocumentLayout::from_analyze_result(&result, "doc");
        assert_eq!(layout.lines[0].text, "lower");
        assert_eq!(layout.lines[1].text, "upper");
    }

    fn rotated_page(page: u32, angle: f64, lines: &[(&str, f64, f64)]) -> serde_json::Value {
        let lines: Vec<serde_json::Value> = lines
            .iter()
            .map(|(text, x, y)| json!({"content": text, "polygon": polygon(*x, *y)}))
            .collect();
        json!({"pageNumber": page, "angle": angle, "lines": lines})
    }

    fn line_texts(pages: Vec<serde_json::Value>) -> Vec<(String, u32)> {
        let result: AnalyzeResult = serde_json::from_value(json!({"pages": pages})).unwrap();
        DocumentLayout::from_analyze_result(&result, "doc")
            .lines
            .into_iter()
            .map(|line| (line.text, line.line_numbers))
            .collect()
    }

    #[test]
    fn test_quarter_turn_page_reads_left_to_right() {
        let lines = line_texts(vec![rotated_page(
            1,
            90.0,
            &[("right", 3.0, 1.0), ("left low", 1.0, 5.0), ("left high", 1.0, 2.0)],
        )]);
        let texts: Vec<&str> = lines.iter().map(|(text, _)| text.as_str()).collect();
        assert_eq!(texts, vec!["left high", "left low", "right"]);
    }

    #[test]
    fn test_three_quarter_turn_page_reads_right_to_left() {
        let lines = line_texts(vec![rotated_page(
            1,
            270.0,
            &[("left", 1.0, 1.0), ("right", 3.0, 4.0), ("middle", 2.0, 8.0)],
        )]);
        let texts: Vec<&str> = lines.iter().map(|(text, _)| text.as_str()).collect();
        assert_eq!(texts, vec!["right", "middle", "left"]);
    }

    #[test]
    fn test_mixed_angles_number_lines_in_first_seen_group_order() {
        let lines = line_texts(vec![
            rotated_page(2, 0.0, &[("upright b", 1.0, 6.0), ("upright a", 1.0, 1.0)]),
            rotated_page(1, 90.0, &[("turned b", 2.0, 1.0), ("turned a", 1.0, 9.0)]),
        ]);

        // Pages stay in order, but the upright group was seen first and numbered first
        assert_eq!(
            lines,
            vec![
                ("turned a".to_string(), 3),
                ("turned b".to_string(), 4),
                ("upright a".to_string(), 1),
                ("upright b".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_missing_angle_counts_as_upright() {
        let result: AnalyzeResult = serde_json::from_value(json!({
            "pages": [{
                "pageNumber": 2,
                "lines": [{"content": "only", "polygon": polygon(1.0, 1.0)}]
            }]
        }))
        .unwrap();

        let layout = DocumentLayout::from_analyze_result(&result, "doc");
        assert_eq!(layout.lines[0].geometry.angle, 0.0);
        assert_eq!(layout.pages(), vec![2]);
    }

    #[test]
    fn test_strip_header_footer_markers() {
        assert_eq!(
            strip_header_footer_markers("<!-- PageFooter=\"Confidential\" -->"),
            "Confidential"
        );
        assert_eq!(
            strip_header_footer_markers("<!-- PageHeader=\"ACME Freight\" -->"),
            "ACME Freight"
        );
        assert_eq!(strip_header_footer_markers("plain text"), "plain text");
    }

    #[test]
    fn test_span_slicing_is_clamped() {
        let content: Vec<char> = "short".chars().collect();
        let sliced = slice_spans(&content, &[Span { offset: 3, length: 50 }]);
        assert_eq!(sliced[0].content, "rt");

        let sliced = slice_spans(&content, &[Span { offset: 99, length: 1 }]);
        assert_eq!(sliced[0].content, "");
    }
}
