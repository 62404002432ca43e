//! Content stream scanning
//!
//! Walks a page's operators with a graphics-state stack and records where
//! images are painted and where text is shown. Form XObjects are followed
//! with their own matrix and resources.

use super::Matrix;
use crate::constants::{
    HELVETICA_CHAR_WIDTH_RATIO, MAX_FORM_DEPTH, TEXT_ASCENT_RATIO, TEXT_DESCENT_RATIO,
};
use crate::layout::Rect;
use crate::source::{SourcePage, extract_number, name_of, resolve, stream_bytes};
use crate::types::*;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// An Image XObject painted on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub object_id: ObjectId,
    /// Maps the image unit square to page space
    pub ctm: Matrix,
    /// Page-space bounding box of the painted image
    pub bbox: Rect,
}

/// One text-showing operation
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Estimated page-space bounding box
    pub bbox: Rect,
    /// Number of character codes shown
    pub chars: usize,
}

/// Everything the scanner found on a page, in paint order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageObjects {
    pub images: Vec<PlacedImage>,
    pub text_runs: Vec<TextRun>,
}

impl PageObjects {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.text_runs.is_empty()
    }
}

/// Scan a page. Undecodable content is a rasterization failure for that page.
pub fn scan_page(page: &SourcePage<'_>) -> Result<PageObjects> {
    let content = page
        .content()
        .map_err(|e| PipelineError::raster(page.index(), e))?;

    let mut scanner = Scanner {
        doc: page.document(),
        page_index: page.index(),
        objects: PageObjects::default(),
    };
    scanner.scan_stream(&content, page.resources(), Matrix::identity(), 0)?;
    Ok(scanner.objects)
}

// =============================================================================
// Scanner
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct TextState {
    font_size: f32,
    two_byte: bool,
    horizontal_scale: f32,
    leading: f32,
    tm: Matrix,
    tlm: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 0.0,
            two_byte: false,
            horizontal_scale: 1.0,
            leading: 0.0,
            tm: Matrix::identity(),
            tlm: Matrix::identity(),
        }
    }
}

struct Scanner<'a> {
    doc: &'a Document,
    page_index: usize,
    objects: PageObjects,
}

impl<'a> Scanner<'a> {
    fn scan_stream(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        initial: Matrix,
        depth: usize,
    ) -> Result<()> {
        let content = Content::decode(content)
            .map_err(|e| PipelineError::raster(self.page_index, format!("content stream: {}", e)))?;

        let mut ctm_stack = vec![initial];
        let mut text = TextState::default();

        for op in &content.operations {
            let ctm = *ctm_stack.last().unwrap_or(&initial);
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if ctm_stack.len() > 1 {
                        ctm_stack.pop();
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operand(op) {
                        if let Some(top) = ctm_stack.last_mut() {
                            *top = m.multiply(&ctm);
                        }
                    }
                }
                "BT" => {
                    text.tm = Matrix::identity();
                    text.tlm = Matrix::identity();
                }
                "Tf" => {
                    if let (Some(font), Some(size)) = (
                        op.operands.first().and_then(name_of),
                        op.operands.get(1).and_then(extract_number),
                    ) {
                        text.font_size = size;
                        text.two_byte = self.is_two_byte_font(resources, &font);
                    }
                }
                "Tz" => {
                    if let Some(scale) = number(op, 0) {
                        text.horizontal_scale = scale / 100.0;
                    }
                }
                "TL" => {
                    if let Some(leading) = number(op, 0) {
                        text.leading = leading;
                    }
                }
                "Td" | "TD" => {
                    if let (Some(tx), Some(ty)) = (number(op, 0), number(op, 1)) {
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        next_line(&mut text, tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_operand(op) {
                        text.tm = m;
                        text.tlm = m;
                    }
                }
                "T*" => {
                    let leading = text.leading;
                    next_line(&mut text, 0.0, -leading);
                }
                "Tj" => {
                    if let Some(bytes) = op.operands.first().and_then(string_bytes) {
                        let chars = text_chars(bytes, text.two_byte);
                        self.show_text(&mut text, &ctm, &[Shown::Chars(chars)]);
                    }
                }
                "'" | "\"" => {
                    let leading = text.leading;
                    next_line(&mut text, 0.0, -leading);
                    if let Some(bytes) = op.operands.last().and_then(string_bytes) {
                        let chars = text_chars(bytes, text.two_byte);
                        self.show_text(&mut text, &ctm, &[Shown::Chars(chars)]);
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        let shown: Vec<Shown> = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => {
                                    Some(Shown::Chars(text_chars(bytes, text.two_byte)))
                                }
                                other => extract_number(other).map(Shown::Adjust),
                            })
                            .collect();
                        self.show_text(&mut text, &ctm, &shown);
                    }
                }
                "Do" => {
                    if let Some(name) = op.operands.first().and_then(name_of) {
                        self.paint_xobject(resources, &name, ctm, depth)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn paint_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &str,
        ctm: Matrix,
        depth: usize,
    ) -> Result<()> {
        let Some(object_id) = self.xobject_id(resources, name) else {
            log::debug!("page {}: unresolved XObject /{}", self.page_index, name);
            return Ok(());
        };
        let Ok(Object::Stream(stream)) = self.doc.get_object(object_id) else {
            return Ok(());
        };

        let subtype = stream.dict.get(b"Subtype").ok().and_then(name_of);
        match subtype.as_deref() {
            Some("Image") => {
                let bbox = ctm.transform_rect(&Rect::new(0.0, 0.0, 1.0, 1.0));
                self.objects.images.push(PlacedImage {
                    object_id,
                    ctm,
                    bbox,
                });
            }
            Some("Form") => {
                if depth >= MAX_FORM_DEPTH {
                    log::warn!(
                        "page {}: form XObject nesting deeper than {}, skipped",
                        self.page_index,
                        MAX_FORM_DEPTH
                    );
                    return Ok(());
                }
                let form_matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|obj| matrix_from_array(self.doc, obj))
                    .unwrap_or_default();
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|obj| resolve(self.doc, obj).ok())
                    .and_then(|obj| obj.as_dict().ok())
                    .or(resources);
                let content = stream_bytes(stream)
                    .map_err(|e| PipelineError::raster(self.page_index, e))?;
                self.scan_stream(
                    &content,
                    form_resources,
                    form_matrix.multiply(&ctm),
                    depth + 1,
                )?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Record one text-showing operation and advance the text matrix
    fn show_text(&mut self, text: &mut TextState, ctm: &Matrix, shown: &[Shown]) {
        let em = text.font_size * text.horizontal_scale;
        let mut width = 0.0;
        let mut chars = 0;
        for item in shown {
            match item {
                Shown::Chars(n) => {
                    width += *n as f32 * HELVETICA_CHAR_WIDTH_RATIO * em;
                    chars += n;
                }
                Shown::Adjust(amount) => width -= amount / 1000.0 * em,
            }
        }

        if chars > 0 && text.font_size > 0.0 {
            let glyph_box = Rect::from_corners(
                0.0,
                -TEXT_DESCENT_RATIO * text.font_size,
                width,
                TEXT_ASCENT_RATIO * text.font_size,
            );
            let bbox = text.tm.multiply(ctm).transform_rect(&glyph_box);
            if !bbox.is_empty() {
                self.objects.text_runs.push(TextRun { bbox, chars });
            }
        }

        text.tm = Matrix::translate(width, 0.0).multiply(&text.tm);
    }

    fn xobject_id(&self, resources: Option<&'a Dictionary>, name: &str) -> Option<ObjectId> {
        let xobjects = resources?.get(b"XObject").ok()?;
        let xobjects = resolve(self.doc, xobjects).ok()?.as_dict().ok()?;
        match xobjects.get(name.as_bytes()).ok()? {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    fn is_two_byte_font(&self, resources: Option<&'a Dictionary>, font: &str) -> bool {
        let lookup = || -> Option<bool> {
            let fonts = resolve(self.doc, resources?.get(b"Font").ok()?).ok()?;
            let font = resolve(self.doc, fonts.as_dict().ok()?.get(font.as_bytes()).ok()?).ok()?;
            let subtype = font.as_dict().ok()?.get(b"Subtype").ok().and_then(name_of)?;
            Some(subtype == "Type0")
        };
        lookup().unwrap_or(false)
    }
}

enum Shown {
    Chars(usize),
    Adjust(f32),
}

fn next_line(text: &mut TextState, tx: f32, ty: f32) {
    text.tlm = Matrix::translate(tx, ty).multiply(&text.tlm);
    text.tm = text.tlm;
}

fn text_chars(bytes: &[u8], two_byte: bool) -> usize {
    if two_byte {
        bytes.len() / 2
    } else {
        bytes.len()
    }
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

fn number(op: &Operation, index: usize) -> Option<f32> {
    op.operands.get(index).and_then(extract_number)
}

fn matrix_operand(op: &Operation) -> Option<Matrix> {
    if op.operands.len() < 6 {
        return None;
    }
    let v: Vec<f32> = op.operands[..6]
        .iter()
        .filter_map(extract_number)
        .collect();
    (v.len() == 6).then(|| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}

fn matrix_from_array(doc: &Document, obj: &Object) -> Option<Matrix> {
    let arr = resolve(doc, obj).ok()?.as_array().ok()?;
    let v: Vec<f32> = arr.iter().filter_map(extract_number).collect();
    (v.len() == 6).then(|| Matrix::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}
