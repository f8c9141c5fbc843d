use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{BIG5, UTF_16BE, UTF_16LE};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

use crate::error::ExtractError;
use crate::model::{PageItems, RawTextItem};
use crate::options::PageSelection;

/// Glyph advance assumed for every character, in text space ems; no font metrics are read.
const AVERAGE_GLYPH_WIDTH_EM: f64 = 0.5;

/// `TJ` adjustments more negative than this are rendered as a word gap.
const TJ_SPACE_THRESHOLD: f64 = -100.0;

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    let cjk_count = text
        .chars()
        .filter(|ch| {
            ('\u{4E00}'..='\u{9FFF}').contains(ch) || ('\u{3400}'..='\u{4DBF}').contains(ch)
        })
        .count();
    let ext_a_count = text
        .chars()
        .filter(|ch| ('\u{3400}'..='\u{4DBF}').contains(ch))
        .count();

    replacement * 8 > total
        || control * 5 > total
        || (cjk_count > 20 && ext_a_count * 4 > cjk_count)
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let utf16_bom = match bytes {
        [0xFE, 0xFF, rest @ ..] => Some((UTF_16BE, rest)),
        [0xFF, 0xFE, rest @ ..] => Some((UTF_16LE, rest)),
        _ => None,
    };
    if let Some((encoding, rest)) = utf16_bom {
        let (utf16, had_errors) = encoding.decode_without_bom_handling(rest);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("big5")
            || lower.contains("b5")
            || lower.contains("eten")
            || lower.contains("cns")
        {
            let (big5, _, had_errors) = BIG5.decode(bytes);
            if !had_errors && !big5.is_empty() {
                return big5.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(self, other: Self) -> Self {
        let [a1, b1, c1, d1, e1, f1] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Self([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }

    fn scale_x(self) -> f64 {
        self.0[0].hypot(self.0[1])
    }

    fn scale_y(self) -> f64 {
        self.0[2].hypot(self.0[3])
    }
}

#[derive(Debug, Clone, Copy)]
struct TextState<'a> {
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scale: f64,
    leading: f64,
    font_size: f64,
    rise: f64,
    encoding: Option<&'a str>,
}

impl Default for TextState<'_> {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            font_size: 1.0,
            rise: 0.0,
            encoding: None,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn number(operand: &Object) -> Option<f64> {
    match operand {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(out)
}

/// Tracks the graphics and text state of one content stream and records every shown
/// string with its position.
struct PageInterpreter<'a> {
    encodings: &'a BTreeMap<Vec<u8>, &'a str>,
    ctm: Matrix,
    state: TextState<'a>,
    saved: Vec<(Matrix, TextState<'a>)>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    items: Vec<RawTextItem>,
}

impl<'a> PageInterpreter<'a> {
    fn new(encodings: &'a BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            encodings,
            ctm: Matrix::IDENTITY,
            state: TextState::default(),
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            items: Vec::new(),
        }
    }

    fn run(mut self, operations: &[Operation]) -> Vec<RawTextItem> {
        for operation in operations {
            self.apply(operation);
        }
        self.items
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => self.saved.push((self.ctm, self.state)),
            "Q" => {
                if let Some((ctm, state)) = self.saved.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(values) = numbers::<6>(operands) {
                    self.ctm = Matrix(values).then(self.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    self.state.encoding = self.encodings.get(font_name).copied();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.state.font_size = size;
                }
            }
            "Tc" => self.set_state(operands, |state, value| state.char_spacing = value),
            "Tw" => self.set_state(operands, |state, value| state.word_spacing = value),
            "Tz" => self.set_state(operands, |state, value| {
                state.horizontal_scale = value / 100.0;
            }),
            "TL" => self.set_state(operands, |state, value| state.leading = value),
            "Ts" => self.set_state(operands, |state, value| state.rise = value),
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    self.state.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(values) = numbers::<6>(operands) {
                    self.text_matrix = Matrix(values);
                    self.line_matrix = Matrix(values);
                }
            }
            "T*" => self.next_line(),
            "Tj" | "TJ" => self.show(operands),
            "'" => {
                self.next_line();
                self.show(operands);
            }
            "\"" => {
                if let Some([word_spacing, char_spacing]) = numbers::<2>(operands) {
                    self.state.word_spacing = word_spacing;
                    self.state.char_spacing = char_spacing;
                }
                self.next_line();
                self.show(operands.get(2..).unwrap_or_default());
            }
            _ => {}
        }
    }

    fn set_state(&mut self, operands: &[Object], update: impl FnOnce(&mut TextState<'a>, f64)) {
        if let Some(value) = operands.first().and_then(number) {
            update(&mut self.state, value);
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).then(self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn collect(&self, operand: &Object, text: &mut String, advance: &mut f64) {
        let state = &self.state;
        match operand {
            Object::String(bytes, _) => {
                let decoded = decode_pdf_bytes(state.encoding, bytes);
                for ch in decoded.chars() {
                    let spacing = if ch == ' ' {
                        state.char_spacing + state.word_spacing
                    } else {
                        state.char_spacing
                    };
                    *advance += (AVERAGE_GLYPH_WIDTH_EM * state.font_size + spacing)
                        * state.horizontal_scale;
                }
                text.push_str(&decoded);
            }
            Object::Array(items) => {
                for item in items {
                    if let Some(adjustment) = number(item) {
                        *advance -= adjustment / 1000.0 * state.font_size * state.horizontal_scale;
                        if adjustment < TJ_SPACE_THRESHOLD && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    } else {
                        self.collect(item, text, advance);
                    }
                }
            }
            _ => {}
        }
    }

    fn show(&mut self, operands: &[Object]) {
        let mut text = String::new();
        let mut advance = 0.0;
        for operand in operands {
            self.collect(operand, &mut text, &mut advance);
        }

        let device = self.text_matrix.then(self.ctm);
        let state = &self.state;
        let rendering = Matrix([
            state.font_size * state.horizontal_scale,
            0.0,
            0.0,
            state.font_size,
            0.0,
            state.rise,
        ])
        .then(device);

        if !text.trim().is_empty() {
            self.items.push(RawTextItem {
                transform: rendering.0,
                width: Some(advance * device.scale_x()),
                height: Some(rendering.scale_y()),
                text,
            });
        }

        self.text_matrix = Matrix::translation(advance, 0.0).then(self.text_matrix);
    }
}

fn extract_page_items(
    document: &Document,
    page_number: u32,
    page_id: ObjectId,
) -> Result<Vec<RawTextItem>, ExtractError> {
    let page_error = |message: String| ExtractError::PageContent {
        page: page_number,
        message,
    };

    let raw_content = document
        .get_page_content(page_id)
        .map_err(|error| page_error(error.to_string()))?;
    let content = Content::decode(&raw_content).map_err(|error| page_error(error.to_string()))?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    Ok(PageInterpreter::new(&encodings).run(&content.operations))
}

fn read_document_pages(
    document: &Document,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageItems>, ExtractError> {
    let mut pages = Vec::new();
    for (page_number, page_id) in document.get_pages() {
        if page_selection.is_some_and(|selection| !selection.contains(page_number)) {
            continue;
        }

        let items = extract_page_items(document, page_number, page_id)?;
        tracing::debug!(page = page_number, items = items.len(), "read positioned text");
        pages.push(PageItems { page_number, items });
    }

    if pages.is_empty() {
        return Err(ExtractError::NoPagesSelected);
    }

    Ok(pages)
}

/// Reads positioned text for every selected page, in page order.
///
/// # Errors
///
/// Fails when the document or a page's content stream cannot be decoded, or when the
/// selection leaves no pages.
pub fn read_pdf_pages(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageItems>, ExtractError> {
    let document = Document::load(input_pdf)?;
    read_document_pages(&document, page_selection)
}

/// In-memory variant of [`read_pdf_pages`].
///
/// # Errors
///
/// Same as [`read_pdf_pages`].
pub fn read_pdf_pages_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<Vec<PageItems>, ExtractError> {
    let document = Document::load_mem(input_pdf)?;
    read_document_pages(&document, page_selection)
}
