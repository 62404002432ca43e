//! Document assembly
//!
//! An [`OutputDocument`] lists the output pages in order, each with the items
//! placed on it. [`assemble`] writes it out as PDF bytes without reordering
//! or dropping anything:
//! - Raster items become DCTDecode Image XObjects
//! - Passthrough items become Form XObjects built from source pages
//! - Blank items draw nothing but keep their slot

mod placement;
mod xobject;

pub use placement::*;
pub use xobject::{copy_object_deep, create_image_xobject, create_page_xobject};

use crate::layout::Rect;
use crate::raster::CompressedImage;
use crate::source::SourceDocument;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// What an item shows
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    /// Recompressed raster
    Image(CompressedImage),
    /// Part of a source page, kept as vector content
    Passthrough { page_index: usize, clip: Rect },
    /// Padding
    Blank,
}

/// One piece of content on an output page
#[derive(Debug, Clone, PartialEq)]
pub struct PageItem {
    pub content: PageContent,
    /// Target area in the upright page
    pub frame: Rect,
    pub scaling: ScalingMode,
    pub rotation: Rotation,
}

/// One output page
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPage {
    pub size: PageSize,
    /// `/Rotate` to carry over, in degrees
    pub rotate: i64,
    pub items: Vec<PageItem>,
}

impl AssembledPage {
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            rotate: 0,
            items: Vec::new(),
        }
    }

    /// The whole page as a frame
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.size.width_pt, self.size.height_pt)
    }
}

/// The pages of a conversion result, in output order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputDocument {
    pub pages: Vec<AssembledPage>,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: AssembledPage) {
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Serialize an output document. Passthrough items read from `source`.
pub fn assemble(document: &OutputDocument, source: &SourceDocument) -> Result<Vec<u8>> {
    if document.pages.is_empty() {
        return Err(PipelineError::InvalidInput(
            "nothing to assemble: no output pages".to_string(),
        ));
    }

    let mut output = Document::with_version("1.7");
    let pages_tree_id = output.new_object_id();
    let mut page_refs = Vec::with_capacity(document.pages.len());
    let mut forms = FormCache::default();

    for page in &document.pages {
        let page_id = render_page(&mut output, source, page, pages_tree_id, &mut forms)?;
        page_refs.push(Object::Reference(page_id));
    }

    finalize_document(&mut output, pages_tree_id, page_refs);

    output.compress();
    let mut bytes = Vec::new();
    output.save_to(&mut bytes)?;
    log::debug!(
        "assembled {} pages, {} bytes",
        document.pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Form XObjects and copied resources shared across one output
#[derive(Default)]
struct FormCache {
    forms: HashMap<(usize, [u32; 4]), ObjectId>,
    objects: HashMap<ObjectId, ObjectId>,
}

impl FormCache {
    fn form(
        &mut self,
        output: &mut Document,
        source: &SourceDocument,
        page_index: usize,
        clip: &Rect,
    ) -> Result<ObjectId> {
        let key = (
            page_index,
            [
                clip.x.to_bits(),
                clip.y.to_bits(),
                clip.width.to_bits(),
                clip.height.to_bits(),
            ],
        );
        if let Some(&id) = self.forms.get(&key) {
            return Ok(id);
        }
        let page = source.page(page_index)?;
        let id = create_page_xobject(output, &page, clip, &mut self.objects)?;
        self.forms.insert(key, id);
        Ok(id)
    }
}

fn render_page(
    output: &mut Document,
    source: &SourceDocument,
    page: &AssembledPage,
    parent_pages_id: ObjectId,
    forms: &mut FormCache,
) -> Result<ObjectId> {
    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page.size.width_pt),
            Object::Real(page.size.height_pt),
        ]),
    );
    if page.rotate.rem_euclid(360) != 0 {
        page_dict.set("Rotate", Object::Integer(page.rotate.rem_euclid(360)));
    }

    let mut content_ops = Vec::new();
    let mut xobjects = Dictionary::new();

    for (idx, item) in page.items.iter().enumerate() {
        match &item.content {
            PageContent::Blank => {}
            PageContent::Image(image) => {
                let name = format!("Im{}", idx);
                let id = create_image_xobject(output, image);
                xobjects.set(name.as_bytes(), Object::Reference(id));

                let placement = place_content(
                    image.width as f32,
                    image.height as f32,
                    &item.frame,
                    item.scaling,
                );
                let placement = oriented(placement, item.rotation, &page.size);
                content_ops.push(image_command(&name, &placement, item.rotation));
            }
            PageContent::Passthrough { page_index, clip } => {
                let name = format!("P{}", idx);
                let id = forms.form(output, source, *page_index, clip)?;
                xobjects.set(name.as_bytes(), Object::Reference(id));

                let placement = place_content(clip.width, clip.height, &item.frame, item.scaling);
                let placement = oriented(placement, item.rotation, &page.size);
                content_ops.push(form_command(&name, clip, &placement, item.rotation));
            }
        }
    }

    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = content_ops.join("");
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    page_dict.set("Contents", Object::Reference(content_id));
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(output.add_object(page_dict))
}

/// Create pages tree and catalog, finalize document structure
fn finalize_document(output: &mut Document, pages_tree_id: ObjectId, page_refs: Vec<Object>) {
    let count = page_refs.len() as i64;
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(page_refs)),
        ("Count", Object::Integer(count)),
    ]);
    output
        .objects
        .insert(pages_tree_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_tree_id)),
    ]));

    output.trailer.set("Root", catalog_id);
}
