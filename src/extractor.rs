//! Positioned text extraction from PDF using lopdf
//!
//! This module walks page content streams and yields text fragments with
//! their bounding box, one list per page.

use crate::ReportError;
use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;

/// A unit of decoded text with its position on the page
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The text content
    pub text: String,
    /// Horizontal origin (left edge)
    pub left_x: f32,
    /// Bottom edge of the box, one font descent below the baseline
    /// (PDF coordinates, origin at bottom-left)
    pub bottom_y: f32,
    /// Estimated right edge
    pub right_x: f32,
    /// Top edge, one font ascent above the baseline
    pub top_y: f32,
    /// Page number (1-indexed)
    pub page: u32,
}

impl Fragment {
    /// Fragment with a degenerate box at the given origin
    pub fn new(text: &str, left_x: f32, bottom_y: f32) -> Self {
        Self {
            text: text.to_string(),
            left_x,
            bottom_y,
            right_x: left_x,
            top_y: bottom_y,
            page: 1,
        }
    }
}

/// All fragments of one page, in content-stream order
#[derive(Debug, Clone, Default)]
pub struct PageFragments {
    pub page: u32,
    pub fragments: Vec<Fragment>,
}

impl AsRef<[Fragment]> for PageFragments {
    fn as_ref(&self) -> &[Fragment] {
        &self.fragments
    }
}

/// Parameters for building fragments from shown text
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Runs closer than this many font sizes join the same fragment
    pub char_margin: f32,
    /// Gaps wider than this many font sizes get a separating space
    pub word_margin: f32,
    /// Maximum baseline difference for runs on the same line
    pub line_tolerance: f32,
    /// Estimated glyph advance as a fraction of font size
    pub glyph_width_ratio: f32,
    /// Ascent (fraction of font size) for fonts without a descriptor
    pub default_ascent: f32,
    /// Descent (fraction of font size, negative) for fonts without a
    /// descriptor, e.g. the standard 14 fonts
    pub default_descent: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            char_margin: 2.0,
            word_margin: 0.1,
            line_tolerance: 0.5,
            glyph_width_ratio: 0.5,
            default_ascent: 0.8,
            default_descent: -0.2,
        }
    }
}

/// Vertical font metrics as fractions of the font size
#[derive(Debug, Clone, Copy, PartialEq)]
struct FontMetrics {
    ascent: f32,
    descent: f32,
}

impl FontMetrics {
    fn fallback(params: &LayoutParams) -> Self {
        Self {
            ascent: params.default_ascent,
            descent: params.default_descent,
        }
    }
}

/// A single shown string before grouping
#[derive(Debug, Clone)]
struct TextRun {
    text: String,
    x: f32,
    baseline: f32,
    bottom: f32,
    top: f32,
    width: f32,
    font_size: f32,
}

/// Extract fragments from PDF file
pub fn extract_fragments<P: AsRef<Path>>(
    path: P,
    params: &LayoutParams,
) -> Result<Vec<PageFragments>, ReportError> {
    let doc = Document::load(path)?;
    extract_fragments_from_doc(&doc, params)
}

/// Extract fragments from memory buffer
pub fn extract_fragments_mem(
    buffer: &[u8],
    params: &LayoutParams,
) -> Result<Vec<PageFragments>, ReportError> {
    let doc = Document::load_mem(buffer)?;
    extract_fragments_from_doc(&doc, params)
}

fn extract_fragments_from_doc(
    doc: &Document,
    params: &LayoutParams,
) -> Result<Vec<PageFragments>, ReportError> {
    let pages = doc.get_pages();
    let mut result = Vec::with_capacity(pages.len());

    for (&page_num, &page_id) in pages.iter() {
        let runs = extract_page_runs(doc, page_id, params)?;
        let fragments = group_into_fragments(runs, params, page_num);
        log::debug!("page {}: {} fragments", page_num, fragments.len());
        result.push(PageFragments {
            page: page_num,
            fragments,
        });
    }

    Ok(result)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translation(tx: f32, ty: f32) -> [f32; 6] {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Text and graphics state while walking a content stream
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    font: String,
    font_size: f32,
    metrics: FontMetrics,
    leading: Option<f32>,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    in_text_block: bool,
}

impl TextState {
    fn new(params: &LayoutParams) -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            font: String::new(),
            font_size: 12.0,
            metrics: FontMetrics::fallback(params),
            leading: None,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text_block: false,
        }
    }

    fn next_line(&mut self) {
        self.line_matrix = multiply_matrices(
            &translation(0.0, -self.leading.unwrap_or(self.font_size * 1.2)),
            &self.line_matrix,
        );
        self.text_matrix = self.line_matrix;
    }

    /// Position `text` at the current point; `advance` is its width in
    /// units of the font size.
    fn run(&self, text: String, advance: f32) -> TextRun {
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        let size = effective_font_size(self.font_size, &combined);
        let baseline = combined[5];
        TextRun {
            text,
            x: combined[4],
            baseline,
            bottom: baseline + self.metrics.descent * size,
            top: baseline + self.metrics.ascent * size,
            width: advance * size,
            font_size: size,
        }
    }

    /// Move the text matrix past shown text
    fn advance(&mut self, advance: f32) {
        self.text_matrix =
            multiply_matrices(&translation(advance * self.font_size, 0.0), &self.text_matrix);
    }
}

/// Extract text runs from a single page
fn extract_page_runs(
    doc: &Document,
    page_id: ObjectId,
    params: &LayoutParams,
) -> Result<Vec<TextRun>, ReportError> {
    use lopdf::content::Content;

    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| ReportError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| ReportError::Parse(e.to_string()))?;

    Ok(interpret_operations(
        &content.operations,
        params,
        |obj, font| decode_operand(obj, doc, &fonts, font),
        |font| {
            fonts
                .get(font.as_bytes())
                .and_then(|dict| font_metrics(doc, dict))
        },
    ))
}

/// Walk content operations and collect shown text.
///
/// `decode` turns a string operand into text for the named font;
/// `metrics` looks up the named font's ascent and descent.
fn interpret_operations<D, M>(
    operations: &[Operation],
    params: &LayoutParams,
    decode: D,
    metrics: M,
) -> Vec<TextRun>
where
    D: Fn(&Object, &str) -> Option<String>,
    M: Fn(&str) -> Option<FontMetrics>,
{
    let mut runs = Vec::new();
    let mut state = TextState::new(params);

    for op in operations {
        match op.operator.as_str() {
            "q" => {
                // Save graphics state
                state.ctm_stack.push(state.ctm);
            }
            "Q" => {
                // Restore graphics state
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                // Concatenate matrix to CTM
                if op.operands.len() >= 6 {
                    let m = read_matrix(&op.operands);
                    state.ctm = multiply_matrices(&m, &state.ctm);
                }
            }
            "BT" => {
                // Begin text block
                state.in_text_block = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => {
                // End text block
                state.in_text_block = false;
            }
            "Tf" => {
                // Set font and size
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        state.font = String::from_utf8_lossy(name).to_string();
                        state.metrics =
                            metrics(&state.font).unwrap_or_else(|| FontMetrics::fallback(params));
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "TL" => {
                // Set leading
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    state.leading = Some(leading);
                }
            }
            "Td" | "TD" => {
                // Move text position; TD also sets the leading
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = Some(-ty);
                    }
                    state.line_matrix = multiply_matrices(&translation(tx, ty), &state.line_matrix);
                    state.text_matrix = state.line_matrix;
                }
            }
            "Tm" => {
                // Set text matrix
                if op.operands.len() >= 6 {
                    state.text_matrix = read_matrix(&op.operands);
                    state.line_matrix = state.text_matrix;
                }
            }
            "T*" => {
                // Move to start of next line
                state.next_line();
            }
            "Tj" => {
                // Show text string
                if state.in_text_block {
                    if let Some(text) = op.operands.first().and_then(|o| decode(o, &state.font)) {
                        let advance = glyph_advance(&text, params);
                        push_run(&mut runs, &state, text, advance);
                        state.advance(advance);
                    }
                }
            }
            "TJ" => {
                // Show text with positioning
                if state.in_text_block {
                    if let Some(Ok(array)) = op.operands.first().map(|o| o.as_array()) {
                        let (text, advance) = collect_tj_array(array, params, |o| {
                            decode(o, &state.font)
                        });
                        push_run(&mut runs, &state, text, advance);
                        state.advance(advance);
                    }
                }
            }
            "'" => {
                // Move to next line and show text
                if state.in_text_block {
                    state.next_line();
                    if let Some(text) = op.operands.first().and_then(|o| decode(o, &state.font)) {
                        let advance = glyph_advance(&text, params);
                        push_run(&mut runs, &state, text, advance);
                        state.advance(advance);
                    }
                }
            }
            _ => {}
        }
    }

    runs
}

/// Join the strings of a TJ array.
///
/// Numbers move the pen left by n/1000 of the font size; a move right wider
/// than the word margin becomes a space. Returns the text and its total
/// advance in units of the font size.
fn collect_tj_array<D>(array: &[Object], params: &LayoutParams, decode: D) -> (String, f32)
where
    D: Fn(&Object) -> Option<String>,
{
    let mut text = String::new();
    let mut advance = 0.0f32;

    for item in array {
        if let Some(n) = get_number(item) {
            let shift = -n / 1000.0;
            advance += shift;
            if shift > params.word_margin
                && !text.is_empty()
                && !text.ends_with(char::is_whitespace)
            {
                text.push(' ');
            }
        } else if let Some(part) = decode(item) {
            advance += glyph_advance(&part, params);
            text.push_str(&part);
        }
    }

    (text, advance)
}

fn glyph_advance(text: &str, params: &LayoutParams) -> f32 {
    text.chars().count() as f32 * params.glyph_width_ratio
}

fn push_run(runs: &mut Vec<TextRun>, state: &TextState, text: String, advance: f32) {
    if !text.trim().is_empty() {
        runs.push(state.run(text, advance));
    }
}

fn read_matrix(operands: &[Object]) -> [f32; 6] {
    let mut m = IDENTITY;
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand).unwrap_or(IDENTITY[i]);
    }
    m
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and a text-to-device matrix
fn effective_font_size(base_size: f32, matrix: &[f32; 6]) -> f32 {
    let scale_x = (matrix[0].powi(2) + matrix[1].powi(2)).sqrt();
    let scale_y = (matrix[2].powi(2) + matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Read /Ascent and /Descent from the font descriptor.
///
/// Type0 fonts carry the descriptor on their first descendant font.
fn font_metrics(doc: &Document, font: &Dictionary) -> Option<FontMetrics> {
    let descriptor = match font.get(b"FontDescriptor") {
        Ok(obj) => resolve(doc, obj)?.as_dict().ok()?,
        Err(_) => {
            let descendants = resolve(doc, font.get(b"DescendantFonts").ok()?)?
                .as_array()
                .ok()?;
            let descendant = resolve(doc, descendants.first()?)?.as_dict().ok()?;
            resolve(doc, descendant.get(b"FontDescriptor").ok()?)?
                .as_dict()
                .ok()?
        }
    };

    let ascent = descriptor.get(b"Ascent").ok().and_then(get_number)?;
    let descent = descriptor.get(b"Descent").ok().and_then(get_number)?;
    if ascent == 0.0 && descent == 0.0 {
        return None;
    }
    // Some producers write the descent as a positive number
    Some(FontMetrics {
        ascent: ascent / 1000.0,
        descent: -descent.abs() / 1000.0,
    })
}

/// Decode a string operand, using the font encoding when available
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    // Latin-1
    Some(bytes.iter().map(|&b| b as char).collect())
}

/// Remove control characters left over from unmapped glyphs
pub fn clean_fragment_text(text: &str) -> String {
    static CONTROL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[\x00-\x08\x0B-\x1F\x7F]").unwrap());
    CONTROL_RE.replace_all(text, "").into_owned()
}

/// A fragment being built, with the line it sits on
struct OpenFragment {
    fragment: Fragment,
    baseline: f32,
    font_size: f32,
}

/// Merge consecutive runs on one baseline into fragments.
///
/// Stream order is preserved; only the most recent fragment is considered
/// for merging, so interleaved columns stay separate.
fn group_into_fragments(runs: Vec<TextRun>, params: &LayoutParams, page: u32) -> Vec<Fragment> {
    let mut open: Vec<OpenFragment> = Vec::new();

    for run in runs {
        let text = clean_fragment_text(&run.text);
        if text.trim().is_empty() {
            continue;
        }

        if let Some(last) = open.last_mut() {
            let gap = run.x - last.fragment.right_x;
            let size = last.font_size.max(run.font_size);
            let same_line = (last.baseline - run.baseline).abs() <= params.line_tolerance;
            if same_line && gap >= -size && gap <= params.char_margin * size {
                let needs_space = gap > params.word_margin * size
                    && !last.fragment.text.ends_with(char::is_whitespace)
                    && !text.starts_with(char::is_whitespace);
                if needs_space {
                    last.fragment.text.push(' ');
                }
                last.fragment.text.push_str(&text);
                last.fragment.right_x = last.fragment.right_x.max(run.x + run.width);
                last.fragment.bottom_y = last.fragment.bottom_y.min(run.bottom);
                last.fragment.top_y = last.fragment.top_y.max(run.top);
                last.font_size = size;
                continue;
            }
        }

        open.push(OpenFragment {
            fragment: Fragment {
                text,
                left_x: run.x,
                bottom_y: run.bottom,
                right_x: run.x + run.width,
                top_y: run.top,
                page,
            },
            baseline: run.baseline,
            font_size: run.font_size,
        });
    }

    open.into_iter().map(|o| o.fragment).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify_fragment, Classification};
    use crate::template::TemplateConfig;
    use lopdf::dictionary;

    fn run(text: &str, x: f32, y: f32) -> TextRun {
        TextRun {
            text: text.into(),
            x,
            baseline: y,
            bottom: y - 2.0,
            top: y + 8.0,
            width: text.chars().count() as f32 * 5.0,
            font_size: 10.0,
        }
    }

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn font(name: &str, size: i64) -> Operation {
        op("Tf", vec![Object::Name(name.as_bytes().to_vec()), size.into()])
    }

    fn show(text: &str) -> Operation {
        op("Tj", vec![Object::string_literal(text)])
    }

    fn latin1(obj: &Object, _font: &str) -> Option<String> {
        match obj {
            Object::String(bytes, _) => Some(bytes.iter().map(|&b| b as char).collect()),
            _ => None,
        }
    }

    fn interpret(operations: Vec<Operation>) -> Vec<TextRun> {
        interpret_operations(&operations, &LayoutParams::default(), latin1, |_| None)
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_adjacent_runs_merge_with_space() {
        // "98" ends at 210; gap of 5 is above the word margin
        let runs = vec![run("98", 200.0, 401.0), run("mg/dL", 215.0, 401.0)];
        let fragments = group_into_fragments(runs, &LayoutParams::default(), 1);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "98 mg/dL");
        assert_eq!(fragments[0].left_x, 200.0);
        assert_eq!(fragments[0].bottom_y, 399.0);
    }

    #[test]
    fn test_touching_runs_merge_without_space() {
        let runs = vec![run("Glu", 65.0, 400.0), run("cose", 80.0, 400.0)];
        let fragments = group_into_fragments(runs, &LayoutParams::default(), 1);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "Glucose");
    }

    #[test]
    fn test_distant_columns_stay_separate() {
        let runs = vec![
            run("Glucose", 65.0, 400.0),
            run("98 mg/dL", 200.0, 401.0),
            run("70-110", 300.0, 400.0),
        ];
        let fragments = group_into_fragments(runs, &LayoutParams::default(), 2);
        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|f| f.page == 2));
        assert_eq!(fragments[1].bottom_y, 399.0);
    }

    #[test]
    fn test_different_baselines_stay_separate() {
        let runs = vec![run("Line one", 65.0, 400.0), run("Line two", 65.0, 388.0)];
        let fragments = group_into_fragments(runs, &LayoutParams::default(), 1);
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn test_clean_fragment_text_strips_carriage_return() {
        assert_eq!(clean_fragment_text("Befund\r folgt"), "Befund folgt");
        assert_eq!(clean_fragment_text("Müller, Hans"), "Müller, Hans");
    }

    #[test]
    fn test_bottom_edge_sits_one_descent_below_baseline() {
        let operations = vec![
            op("BT", vec![]),
            font("F1", 9),
            op("Td", vec![55.into(), 516.into()]),
            show("Mueller, Hans"),
            op("ET", vec![]),
        ];
        let helvetica = FontMetrics {
            ascent: 0.718,
            descent: -0.207,
        };
        let runs = interpret_operations(
            &operations,
            &LayoutParams::default(),
            latin1,
            |_| Some(helvetica),
        );
        let fragments = group_into_fragments(runs, &LayoutParams::default(), 1);
        assert_eq!(fragments.len(), 1);
        assert_close(fragments[0].bottom_y, 514.137);
        assert_close(fragments[0].top_y, 522.462);

        let page = fragments.clone();
        match classify_fragment(&fragments[0], &page, &TemplateConfig::default()) {
            Classification::Patient(info) => {
                assert_eq!(info.last_name.as_deref(), Some("Mueller"));
            }
            other => panic!("expected patient info, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_descent_without_descriptor() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 9),
            op("Td", vec![55.into(), 516.into()]),
            show("Mueller, Hans"),
            op("ET", vec![]),
        ]);
        assert_close(runs[0].baseline, 516.0);
        assert_close(runs[0].bottom, 514.2);
        assert_close(runs[0].top, 523.2);
    }

    #[test]
    fn test_tj_offsets_insert_word_space() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 9),
            op("Td", vec![200.into(), 401.into()]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("98"),
                    (-400).into(),
                    Object::string_literal("mg/dL"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "98 mg/dL");
        // 7 glyphs at 0.5 em plus 0.4 em of displacement
        assert_close(runs[0].width, 3.9 * 9.0);
    }

    #[test]
    fn test_tj_kerning_does_not_split_words() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 10),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Gluc"),
                    Object::Real(-20.0),
                    Object::string_literal("ose"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[0].text, "Glucose");
    }

    #[test]
    fn test_td_sets_leading_for_next_line() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 10),
            op("Td", vec![65.into(), 400.into()]),
            show("A"),
            op("TD", vec![0.into(), (-14).into()]),
            show("B"),
            op("T*", vec![]),
            show("C"),
            op("ET", vec![]),
        ]);
        let positions: Vec<(f32, f32)> = runs.iter().map(|r| (r.x, r.baseline)).collect();
        assert_eq!(positions, vec![(65.0, 400.0), (65.0, 386.0), (65.0, 372.0)]);
    }

    #[test]
    fn test_tl_and_default_leading() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 10),
            op("Td", vec![65.into(), 400.into()]),
            op("T*", vec![]),
            show("default"),
            op("TL", vec![20.into()]),
            op("T*", vec![]),
            show("explicit"),
            op("ET", vec![]),
        ]);
        assert_close(runs[0].baseline, 388.0);
        assert_close(runs[1].baseline, 368.0);
    }

    #[test]
    fn test_tm_scales_font_size() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 10),
            op(
                "Tm",
                vec![2.into(), 0.into(), 0.into(), 2.into(), 100.into(), 300.into()],
            ),
            show("X"),
            op("ET", vec![]),
        ]);
        assert_eq!((runs[0].x, runs[0].baseline), (100.0, 300.0));
        assert_close(runs[0].font_size, 20.0);
        assert_close(runs[0].bottom, 296.0);
    }

    #[test]
    fn test_cm_is_restored_by_q() {
        let runs = interpret(vec![
            op("q", vec![]),
            op(
                "cm",
                vec![1.into(), 0.into(), 0.into(), 1.into(), 10.into(), 20.into()],
            ),
            op("BT", vec![]),
            op("Td", vec![65.into(), 400.into()]),
            show("shifted"),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Td", vec![65.into(), 400.into()]),
            show("plain"),
            op("ET", vec![]),
        ]);
        assert_eq!((runs[0].x, runs[0].baseline), (75.0, 420.0));
        assert_eq!((runs[1].x, runs[1].baseline), (65.0, 400.0));
    }

    #[test]
    fn test_consecutive_tj_advance_pen() {
        let runs = interpret(vec![
            op("BT", vec![]),
            font("F1", 10),
            op("Td", vec![65.into(), 400.into()]),
            show("ab"),
            show("cd"),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[1].x, 75.0);
        let fragments = group_into_fragments(runs, &LayoutParams::default(), 1);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "abcd");
    }

    #[test]
    fn test_text_outside_text_block_is_skipped() {
        let runs = interpret(vec![
            show("stray"),
            op("'", vec![Object::string_literal("also stray")]),
            op("BT", vec![]),
            op("'", vec![Object::string_literal("inside")]),
            op("ET", vec![]),
        ]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "inside");
    }

    #[test]
    fn test_font_metrics_from_descriptor() {
        let mut doc = Document::with_version("1.5");
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "Ascent" => 718,
            "Descent" => -207,
        });
        let simple = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "FontDescriptor" => descriptor_id,
        };
        let metrics = font_metrics(&doc, &simple).unwrap();
        assert_close(metrics.ascent, 0.718);
        assert_close(metrics.descent, -0.207);

        let descendant_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "FontDescriptor" => descriptor_id,
        });
        let composite = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "DescendantFonts" => vec![descendant_id.into()],
        };
        assert_eq!(font_metrics(&doc, &composite), Some(metrics));

        let standard = dictionary! { "Type" => "Font", "BaseFont" => "Helvetica" };
        assert!(font_metrics(&doc, &standard).is_none());
    }
}
