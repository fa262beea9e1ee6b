//! Layout analysis for lopdf pages.
//!
//! Interprets a page content stream into positioned text runs, then groups
//! runs into lines and lines into blocks, producing the [`TextPage`] tree
//! the analysis model consumes.

use lopdf::content::Operation;
use lopdf::Object;
use unicode_normalization::UnicodeNormalization;

use super::tree::{BlockRecord, LineRecord, SpanRecord, TextPage, BLOCK_TYPE_TEXT};
use crate::model::BoundingBox;

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;
/// Ascender height as a fraction of the font size.
const ASCENT: f64 = 0.8;
/// Descender depth as a fraction of the font size.
const DESCENT: f64 = 0.2;

/// A run of text shown by a single text-showing operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// The decoded text
    pub text: String,
    /// X position of the run start (user space)
    pub x: f64,
    /// Baseline Y position (user space, bottom-up)
    pub y: f64,
    /// Estimated advance width
    pub width: f64,
    /// Effective font size after text and graphics transforms
    pub font_size: f64,
}

impl TextRun {
    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f64 {
        self.y + self.font_size * ASCENT
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f64 {
        self.y - self.font_size * DESCENT
    }
}

/// Page frame used to convert user space into top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Left edge of the media box
    pub left: f64,
    /// Top edge of the media box (user space)
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PageFrame {
    /// Frame from a `[x0, y0, x1, y1]` media box.
    pub fn from_media_box(media_box: [f64; 4]) -> Self {
        let [x0, y0, x1, y1] = media_box;
        Self {
            left: x0.min(x1),
            top: y0.max(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    fn span_bbox(&self, run: &TextRun) -> BoundingBox {
        BoundingBox::new(
            run.x - self.left,
            self.top - run.top(),
            run.x + run.width - self.left,
            self.top - run.bottom(),
        )
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }
}

impl Matrix {
    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Self {
            a: get_number(&operands[0])?,
            b: get_number(&operands[1])?,
            c: get_number(&operands[2])?,
            d: get_number(&operands[3])?,
            e: get_number(&operands[4])?,
            f: get_number(&operands[5])?,
        })
    }

    fn translation(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::default()
        }
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn from_array([a, b, c, d, e, f]: [f64; 6]) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn horizontal_scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Text and graphics state tracked while walking a content stream.
#[derive(Debug, Default)]
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    in_text_block: bool,
}

/// Graphics and text state saved around a Form XObject.
struct SavedState {
    ctm: Matrix,
    stack_depth: usize,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    in_text_block: bool,
}

impl TextState {
    fn snapshot(&self) -> SavedState {
        SavedState {
            ctm: self.ctm,
            stack_depth: self.ctm_stack.len(),
            text_matrix: self.text_matrix,
            line_matrix: self.line_matrix,
            font_size: self.font_size,
            leading: self.leading,
            in_text_block: self.in_text_block,
        }
    }

    /// Undo whatever a form did, including unbalanced `q`.
    fn restore(&mut self, saved: SavedState) {
        self.ctm = saved.ctm;
        self.ctm_stack.truncate(saved.stack_depth);
        self.text_matrix = saved.text_matrix;
        self.line_matrix = saved.line_matrix;
        self.font_size = saved.font_size;
        self.leading = saved.leading;
        self.in_text_block = saved.in_text_block;
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Record a run for `text` and advance the text matrix past it.
    fn show(&mut self, text: String, kerning: f64, runs: &mut Vec<TextRun>) {
        let glyphs = text.chars().count() as f64;
        let advance = glyphs * AVG_GLYPH_WIDTH * self.font_size - kerning / 1000.0 * self.font_size;
        let advance = advance.max(0.0);

        let rendering = self.text_matrix.multiply(&self.ctm);
        if self.in_text_block && !text.trim().is_empty() {
            runs.push(TextRun {
                text,
                x: rendering.e,
                y: rendering.f,
                width: advance * rendering.horizontal_scale(),
                font_size: self.font_size * rendering.vertical_scale(),
            });
        }

        self.text_matrix = Matrix::translation(advance, 0.0).multiply(&self.text_matrix);
    }
}

/// Deepest Form XObject nesting followed before giving up.
pub const MAX_FORM_DEPTH: usize = 16;

/// A Form XObject ready to be interpreted: its operations, its `/Matrix`
/// and the forms its own resources name.
pub struct Form<'a> {
    pub operations: Vec<Operation>,
    pub matrix: Option<[f64; 6]>,
    pub resources: Box<dyn FormSource + 'a>,
}

/// Looks up the Form XObjects a `Do` operator may paint.
pub trait FormSource {
    /// The form named `name`, or `None` when the name is missing or is not a form.
    fn form(&self, name: &[u8]) -> Option<Form<'_>>;
}

/// A resource set without Form XObjects.
pub struct NoForms;

impl FormSource for NoForms {
    fn form(&self, _name: &[u8]) -> Option<Form<'_>> {
        None
    }
}

/// Walk content stream operations and collect the text runs they show.
pub fn collect_text_runs(operations: &[Operation]) -> Vec<TextRun> {
    collect_text_runs_with_forms(operations, &NoForms)
}

/// Like [`collect_text_runs`], following `Do` into the Form XObjects `forms` resolves.
pub fn collect_text_runs_with_forms(
    operations: &[Operation],
    forms: &dyn FormSource,
) -> Vec<TextRun> {
    let mut state = TextState {
        font_size: 12.0,
        ..TextState::default()
    };
    let mut runs = Vec::new();
    interpret(operations, forms, &mut state, &mut runs, 0);
    runs
}

fn interpret(
    operations: &[Operation],
    forms: &dyn FormSource,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
    depth: usize,
) {
    for op in operations {
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    state.ctm = m.multiply(&state.ctm);
                }
            }
            "BT" => {
                state.in_text_block = true;
                state.text_matrix = Matrix::default();
                state.line_matrix = Matrix::default();
            }
            "ET" => state.in_text_block = false,
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(get_number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = op.operands.first().and_then(get_number).unwrap_or(0.0);
                let ty = op.operands.get(1).and_then(get_number).unwrap_or(0.0);
                if op.operator == "TD" {
                    state.leading = -ty;
                }
                state.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    state.show(decode_text(bytes), 0.0, runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let mut combined = String::new();
                    let mut kerning = 0.0;
                    for item in items {
                        match item {
                            Object::String(bytes, _) => combined.push_str(&decode_text(bytes)),
                            other => kerning += get_number(other).unwrap_or(0.0),
                        }
                    }
                    state.show(combined, kerning, runs);
                }
            }
            "'" | "\"" => {
                state.next_line();
                let text_idx = if op.operator == "\"" { 2 } else { 0 };
                if let Some(Object::String(bytes, _)) = op.operands.get(text_idx) {
                    state.show(decode_text(bytes), 0.0, runs);
                }
            }
            "Do" => {
                if let Some(Ok(name)) = op.operands.first().map(Object::as_name) {
                    paint_form(name, forms, state, runs, depth);
                }
            }
            _ => {}
        }
    }
}

/// Interpret a Form XObject inside its own saved graphics state.
fn paint_form(
    name: &[u8],
    forms: &dyn FormSource,
    state: &mut TextState,
    runs: &mut Vec<TextRun>,
    depth: usize,
) {
    let Some(form) = forms.form(name) else {
        return;
    };
    if depth >= MAX_FORM_DEPTH {
        log::warn!(
            "Form /{} nested deeper than {}, skipping",
            String::from_utf8_lossy(name),
            MAX_FORM_DEPTH
        );
        return;
    }

    let saved = state.snapshot();
    if let Some(m) = form.matrix {
        state.ctm = Matrix::from_array(m).multiply(&state.ctm);
    }
    interpret(&form.operations, form.resources.as_ref(), state, runs, depth + 1);
    state.restore(saved);
}

/// Group text runs into the block → line → span tree of one page.
pub fn build_text_page(frame: PageFrame, runs: Vec<TextRun>) -> TextPage {
    let lines = group_runs_into_lines(runs);
    let groups = group_lines_into_blocks(lines);

    let blocks: Vec<BlockRecord> = groups
        .into_iter()
        .enumerate()
        .filter_map(|(number, lines)| {
            let lines: Vec<LineRecord> = lines
                .into_iter()
                .filter_map(|line| line_record(&frame, line))
                .collect();
            let bbox = lines
                .iter()
                .map(|l| BoundingBox::from(l.bbox))
                .reduce(|acc, b| acc.union(&b))?;
            Some(BlockRecord {
                number: number as u32,
                kind: BLOCK_TYPE_TEXT,
                bbox: bbox.to_array(),
                lines,
            })
        })
        .collect();

    log::debug!("Layout produced {} blocks", blocks.len());

    TextPage {
        width: frame.width,
        height: frame.height,
        blocks,
    }
}

/// Runs sharing a baseline.
#[derive(Debug, Clone)]
struct RunLine {
    runs: Vec<TextRun>,
    y: f64,
    x: f64,
    font_size: f64,
}

impl RunLine {
    fn from_runs(mut runs: Vec<TextRun>) -> Self {
        runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

        // Dominant font size, weighted by text length
        let total_chars: usize = runs.iter().map(|r| r.text.len()).sum();
        let weighted: f64 = runs
            .iter()
            .map(|r| r.font_size * r.text.len() as f64)
            .sum();
        let font_size = if total_chars > 0 {
            weighted / total_chars as f64
        } else {
            runs.first().map(|r| r.font_size).unwrap_or(0.0)
        };

        let (x, y) = runs.first().map(|r| (r.x, r.y)).unwrap_or((0.0, 0.0));
        Self {
            runs,
            y,
            x,
            font_size,
        }
    }
}

fn line_record(frame: &PageFrame, line: RunLine) -> Option<LineRecord> {
    let spans: Vec<SpanRecord> = line
        .runs
        .into_iter()
        .map(|run| SpanRecord {
            bbox: frame.span_bbox(&run).to_array(),
            text: run.text,
        })
        .collect();
    let bbox = spans
        .iter()
        .map(|s| BoundingBox::from(s.bbox))
        .reduce(|acc, b| acc.union(&b))?;
    Some(LineRecord {
        bbox: bbox.to_array(),
        spans,
    })
}

/// Y-based line grouping, top to bottom.
fn group_runs_into_lines(mut runs: Vec<TextRun>) -> Vec<RunLine> {
    if runs.is_empty() {
        return vec![];
    }

    // PDF Y is bottom-up
    runs.sort_by(|a, b| {
        let y_cmp = b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal);
        if y_cmp == std::cmp::Ordering::Equal {
            a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            y_cmp
        }
    });

    let mut lines: Vec<RunLine> = Vec::new();
    let mut current: Vec<TextRun> = Vec::new();
    let mut current_y: Option<f64> = None;

    for run in runs {
        let y_tolerance = run.font_size * 0.3;
        match current_y {
            Some(y) if (run.y - y).abs() <= y_tolerance => current.push(run),
            _ => {
                if !current.is_empty() {
                    lines.push(RunLine::from_runs(std::mem::take(&mut current)));
                }
                current_y = Some(run.y);
                current.push(run);
            }
        }
    }

    if !current.is_empty() {
        lines.push(RunLine::from_runs(current));
    }

    lines
}

/// Group lines into blocks based on spacing, size and indentation.
fn group_lines_into_blocks(lines: Vec<RunLine>) -> Vec<Vec<RunLine>> {
    let avg_spacing = avg_line_spacing(&lines);
    let mut blocks: Vec<Vec<RunLine>> = Vec::new();
    let mut current: Vec<RunLine> = Vec::new();

    for line in lines {
        let should_break = current
            .last()
            .map(|prev| should_break_block(prev, &line, avg_spacing))
            .unwrap_or(false);
        if should_break {
            blocks.push(std::mem::take(&mut current));
        }
        current.push(line);
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn avg_line_spacing(lines: &[RunLine]) -> f64 {
    let spacings: Vec<f64> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return 12.0;
    }

    spacings.iter().sum::<f64>() / spacings.len() as f64
}

fn should_break_block(prev: &RunLine, curr: &RunLine, avg_spacing: f64) -> bool {
    (prev.y - curr.y).abs() > avg_spacing * 1.5
        || (prev.font_size - curr.font_size).abs() > 1.0
        || (prev.x - curr.x).abs() > 20.0
}

/// Helper to extract a number from a PDF object.
fn get_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Decode a string operand without font encoding information.
fn decode_text(bytes: &[u8]) -> String {
    let raw = if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else if let Ok(s) = std::str::from_utf8(bytes) {
        s.to_string()
    } else {
        // Latin-1
        bytes.iter().map(|&b| b as char).collect()
    };
    raw.nfc().collect()
}
