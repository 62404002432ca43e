//! XObject creation for assembled pages
//!
//! Passthrough content becomes a Form XObject built from a source page and
//! clipped by its BBox. Raster content becomes a DCTDecode Image XObject.

use crate::content::scan_page;
use crate::layout::Rect;
use crate::raster::CompressedImage;
use crate::source::SourcePage;
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::{HashMap, HashSet};

// =============================================================================
// XObject Creation
// =============================================================================

/// Create a Form XObject showing `clip` of a source page.
///
/// Resources (inherited ones included) are deep-copied through `cache`, so
/// several forms from one source share their fonts and images. Images the
/// page only draws outside `clip` are swapped for a 1x1 placeholder.
pub fn create_page_xobject(
    output: &mut Document,
    page: &SourcePage<'_>,
    clip: &Rect,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let content_data = page.content()?;

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            Object::Real(clip.x),
            Object::Real(clip.y),
            Object::Real(clip.right()),
            Object::Real(clip.top()),
        ]),
    );
    xobject_dict.set("FormType", Object::Integer(1));

    if let Some(resources) = page.resources() {
        let resources = Object::Dictionary(resources.clone());
        let hidden = images_outside(page, clip);
        let copied = if hidden.is_empty() {
            copy_object_deep(output, page.document(), &resources, cache)?
        } else {
            log::debug!(
                "page {}: {} image(s) lie outside the clip and are not copied",
                page.index(),
                hidden.len()
            );
            PrunedCopy::new(page.document(), &hidden).copy(output, &resources, cache)?
        };
        xobject_dict.set("Resources", copied);
    }

    Ok(output.add_object(Stream::new(xobject_dict, content_data)))
}

/// Image XObjects none of whose placements on the page touch `clip`
fn images_outside(page: &SourcePage<'_>, clip: &Rect) -> HashSet<ObjectId> {
    let objects = match scan_page(page) {
        Ok(objects) => objects,
        Err(e) => {
            log::warn!("page {}: scan failed, copying all resources: {}", page.index(), e);
            return HashSet::new();
        }
    };
    let shown: HashSet<ObjectId> = objects
        .images
        .iter()
        .filter(|image| image.bbox.intersects(clip))
        .map(|image| image.object_id)
        .collect();
    objects
        .images
        .iter()
        .map(|image| image.object_id)
        .filter(|id| !shown.contains(id))
        .collect()
}

/// Embed JPEG data as an Image XObject
pub fn create_image_xobject(output: &mut Document, image: &CompressedImage) -> ObjectId {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(image.width as i64));
    dict.set("Height", Object::Integer(image.height as i64));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    // already entropy-coded; keep Flate off it when the document is compressed
    let stream = Stream::new(dict, image.data.clone()).with_compression(false);
    output.add_object(stream)
}

// =============================================================================
// Deep Copy
// =============================================================================

/// Deep copy an object from source to output document, following references.
///
/// Uses a cache to avoid copying the same object multiple times.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            // Reserve the id first so reference cycles resolve to it
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let referenced = source.get_object(*id)?;
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                if is_back_link(key) {
                    continue;
                }
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
            }
            Ok(Object::Stream(Stream {
                dict: new_dict,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: None,
            }))
        }
        // Primitive types: just clone
        _ => Ok(obj.clone()),
    }
}

/// Deep copy that leaves `hidden` objects behind.
///
/// Objects that never lead to a hidden one go through the shared cache as
/// usual. Their ancestors are copied fresh, so other forms from the same
/// source still get the untouched originals.
struct PrunedCopy<'a> {
    source: &'a Document,
    hidden: &'a HashSet<ObjectId>,
    reaches: HashMap<ObjectId, bool>,
    fresh: HashMap<ObjectId, ObjectId>,
    placeholder: Option<ObjectId>,
}

impl<'a> PrunedCopy<'a> {
    fn new(source: &'a Document, hidden: &'a HashSet<ObjectId>) -> Self {
        Self {
            source,
            hidden,
            reaches: HashMap::new(),
            fresh: HashMap::new(),
            placeholder: None,
        }
    }

    fn copy(
        &mut self,
        output: &mut Document,
        obj: &Object,
        cache: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<Object> {
        if !self.reaches_hidden(obj) {
            return copy_object_deep(output, self.source, obj, cache);
        }

        match obj {
            Object::Reference(id) if self.hidden.contains(id) => {
                Ok(Object::Reference(self.placeholder(output)))
            }
            Object::Reference(id) => {
                if let Some(&new_id) = self.fresh.get(id) {
                    return Ok(Object::Reference(new_id));
                }
                let new_id = output.new_object_id();
                self.fresh.insert(*id, new_id);

                let source = self.source;
                let copied = self.copy(output, source.get_object(*id)?, cache)?;
                output.objects.insert(new_id, copied);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => {
                let mut new_dict = Dictionary::new();
                for (key, value) in dict.iter() {
                    if is_back_link(key) {
                        continue;
                    }
                    new_dict.set(key.clone(), self.copy(output, value, cache)?);
                }
                Ok(Object::Dictionary(new_dict))
            }
            Object::Array(arr) => {
                let mut new_arr = Vec::with_capacity(arr.len());
                for item in arr {
                    new_arr.push(self.copy(output, item, cache)?);
                }
                Ok(Object::Array(new_arr))
            }
            Object::Stream(stream) => {
                let mut new_dict = Dictionary::new();
                for (key, value) in stream.dict.iter() {
                    new_dict.set(key.clone(), self.copy(output, value, cache)?);
                }
                Ok(Object::Stream(Stream {
                    dict: new_dict,
                    content: stream.content.clone(),
                    allows_compression: stream.allows_compression,
                    start_position: None,
                }))
            }
            _ => Ok(obj.clone()),
        }
    }

    /// Whether copying `obj` would pull in a hidden object
    fn reaches_hidden(&mut self, obj: &Object) -> bool {
        match obj {
            Object::Reference(id) => {
                if self.hidden.contains(id) {
                    return true;
                }
                if let Some(&known) = self.reaches.get(id) {
                    return known;
                }
                // cycles resolve to false while the walk is in progress
                self.reaches.insert(*id, false);
                let source = self.source;
                let found = source
                    .get_object(*id)
                    .map(|target| self.reaches_hidden(target))
                    .unwrap_or(false);
                self.reaches.insert(*id, found);
                found
            }
            Object::Dictionary(dict) => dict
                .iter()
                .filter(|(key, _)| !is_back_link(key))
                .any(|(_, value)| self.reaches_hidden(value)),
            Object::Array(arr) => arr.iter().any(|item| self.reaches_hidden(item)),
            Object::Stream(stream) => stream
                .dict
                .iter()
                .any(|(_, value)| self.reaches_hidden(value)),
            _ => false,
        }
    }

    fn placeholder(&mut self, output: &mut Document) -> ObjectId {
        *self.placeholder.get_or_insert_with(|| {
            output.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 1,
                    "Height" => 1,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![255],
            ))
        })
    }
}

/// Page back-links would drag the whole source tree along
fn is_back_link(key: &[u8]) -> bool {
    key == b"Parent" || key == b"P"
}
