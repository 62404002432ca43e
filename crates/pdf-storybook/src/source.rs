//! Read-only view over an uploaded PDF
//!
//! The document is parsed once per conversion and never mutated. Pages expose
//! their geometry (MediaBox, inherited through the page tree) and raw content.

use crate::constants::{DEFAULT_PAGE_HEIGHT_PT, DEFAULT_PAGE_WIDTH_PT};
use crate::layout::Rect;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::sync::Arc;

/// Limit on `/Parent` hops and reference chains
const MAX_INDIRECTION: usize = 32;

/// A parsed source PDF
#[derive(Debug)]
pub struct SourceDocument {
    doc: Document,
    page_ids: Vec<ObjectId>,
    raw: Arc<Vec<u8>>,
}

impl SourceDocument {
    /// Parse PDF bytes. Unparseable input and empty documents are `InvalidInput`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes)
            .map_err(|e| PipelineError::InvalidInput(format!("not a parseable PDF: {}", e)))?;
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();

        if page_ids.is_empty() {
            return Err(PipelineError::InvalidInput(
                "document has no pages".to_string(),
            ));
        }

        Ok(Self {
            doc,
            page_ids,
            raw: Arc::new(bytes),
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Size of the original input in bytes
    pub fn byte_len(&self) -> usize {
        self.raw.len()
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page(&self, index: usize) -> Result<SourcePage<'_>> {
        let id = *self.page_ids.get(index).ok_or_else(|| {
            PipelineError::InvalidInput(format!(
                "page {} out of range ({} pages)",
                index,
                self.page_ids.len()
            ))
        })?;

        let media_box = inherited_entry(&self.doc, id, b"MediaBox")
            .and_then(|obj| rect_from_array(&self.doc, obj))
            .unwrap_or_else(|| {
                Rect::new(0.0, 0.0, DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT)
            });

        let rotate = inherited_entry(&self.doc, id, b"Rotate")
            .and_then(|obj| resolve(&self.doc, obj).ok())
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);

        Ok(SourcePage {
            source: self,
            index,
            id,
            media_box,
            rotate,
        })
    }

    pub fn pages(&self) -> impl Iterator<Item = Result<SourcePage<'_>>> + '_ {
        (0..self.page_count()).map(move |i| self.page(i))
    }
}

/// One page of a [`SourceDocument`]
#[derive(Debug, Clone, Copy)]
pub struct SourcePage<'a> {
    source: &'a SourceDocument,
    index: usize,
    id: ObjectId,
    media_box: Rect,
    rotate: i64,
}

impl<'a> SourcePage<'a> {
    /// 0-based position in the document
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn object_id(&self) -> ObjectId {
        self.id
    }

    pub fn source(&self) -> &'a SourceDocument {
        self.source
    }

    pub fn document(&self) -> &'a Document {
        &self.source.doc
    }

    /// Page box in default user space
    pub fn media_box(&self) -> Rect {
        self.media_box
    }

    pub fn width(&self) -> f32 {
        self.media_box.width
    }

    pub fn height(&self) -> f32 {
        self.media_box.height
    }

    /// The page's `/Rotate` value in degrees
    pub fn rotation(&self) -> i64 {
        self.rotate
    }

    /// Concatenated, decoded content streams
    pub fn content(&self) -> Result<Vec<u8>> {
        let page_dict = self.document().get_dictionary(self.id)?;
        get_page_content(self.document(), page_dict)
    }

    /// Resources dictionary, following `/Parent` inheritance
    pub fn resources(&self) -> Option<&'a Dictionary> {
        let doc = self.document();
        inherited_entry(doc, self.id, b"Resources")
            .and_then(|obj| resolve(doc, obj).ok())
            .and_then(|obj| obj.as_dict().ok())
    }
}

// =============================================================================
// Object Helpers
// =============================================================================

/// Follow references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_INDIRECTION {
        match current {
            Object::Reference(id) => current = doc.get_object(*id)?,
            _ => return Ok(current),
        }
    }
    Err(PipelineError::InvalidInput(
        "reference chain too deep".to_string(),
    ))
}

/// Look up a key on a page, walking up `/Parent` for inheritable attributes
fn inherited_entry<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INDIRECTION {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").ok()?;
        dict = resolve(doc, parent).ok()?.as_dict().ok()?;
    }
    None
}

/// Extract numeric value from a PDF object
pub(crate) fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Read a PDF name (`/Foo`) as a string
pub(crate) fn name_of(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    }
}

fn rect_from_array(doc: &Document, obj: &Object) -> Option<Rect> {
    let arr = resolve(doc, obj).ok()?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (slot, item) in values.iter_mut().zip(arr) {
        *slot = extract_number(resolve(doc, item).ok()?)?;
    }
    let rect = Rect::from_corners(values[0], values[1], values[2], values[3]);
    if rect.is_empty() { None } else { Some(rect) }
}

// =============================================================================
// Stream Content
// =============================================================================

/// Decoded bytes of a stream; unfiltered streams are returned as-is
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    Ok(stream.decompressed_content()?)
}

/// Get the content stream data from a page.
fn get_page_content(doc: &Document, page_dict: &Dictionary) -> Result<Vec<u8>> {
    let contents = match page_dict.get(b"Contents") {
        Ok(c) => c,
        Err(_) => return Ok(Vec::new()), // No content = blank page
    };

    match resolve(doc, contents)? {
        Object::Stream(stream) => stream_bytes(stream),
        Object::Array(arr) => {
            let mut result = Vec::new();
            for obj in arr {
                if let Object::Stream(stream) = resolve(doc, obj)? {
                    result.extend_from_slice(&stream_bytes(stream)?);
                    result.push(b'\n');
                }
            }
            Ok(result)
        }
        _ => Ok(Vec::new()),
    }
}
