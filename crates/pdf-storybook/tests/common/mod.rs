#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

/// Builds small in-memory PDFs for tests
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    /// Uncompressed 8-bit RGB image
    pub fn rgb_image(
        &mut self,
        width: u32,
        height: u32,
        pixel: impl Fn(u32, u32) -> [u8; 3],
    ) -> ObjectId {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&pixel(x, y));
            }
        }
        self.raw_image(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            data,
        )
    }

    pub fn raw_image(&mut self, dict: Dictionary, data: Vec<u8>) -> ObjectId {
        let stream = Stream::new(dict, data).with_compression(false);
        self.doc.add_object(stream)
    }

    /// Form XObject with its own resources
    pub fn form(
        &mut self,
        bbox: [f32; 4],
        matrix: [f32; 6],
        content: &str,
        xobjects: &[(&str, ObjectId)],
    ) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => reals(&bbox),
            "Matrix" => reals(&matrix),
            "Resources" => self.resources(xobjects),
        };
        self.doc
            .add_object(Stream::new(dict, content.as_bytes().to_vec()))
    }

    /// Add a page; `/F1` is Helvetica on every page
    pub fn page(
        &mut self,
        width: f32,
        height: f32,
        content: &str,
        xobjects: &[(&str, ObjectId)],
    ) -> &mut Self {
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));
        let resources = self.resources(xobjects);
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => reals(&[0.0, 0.0, width, height]),
            "Resources" => resources,
            "Contents" => content_id,
        });
        self.kids.push(Object::Reference(page_id));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn resources(&self, xobjects: &[(&str, ObjectId)]) -> Dictionary {
        let mut xobject_dict = Dictionary::new();
        for (name, id) in xobjects {
            xobject_dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
        }
        dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
            "XObject" => xobject_dict,
        }
    }
}

fn reals(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
}

pub fn gradient(x: u32, y: u32) -> [u8; 3] {
    [(x % 256) as u8, (y % 256) as u8, ((x + y) / 2 % 256) as u8]
}

/// One storybook spread: picture on the left half, caption on the right
pub fn add_spread(builder: &mut PdfBuilder) {
    let image = builder.rgb_image(64, 64, gradient);
    builder.page(
        800.0,
        400.0,
        "q 400 0 0 400 0 0 cm /Im0 Do Q BT /F1 24 Tf 450 200 Td (Once upon a time) Tj ET",
        &[("Im0", image)],
    );
}

/// A document of `count` spreads
pub fn spreads_pdf(count: usize) -> Vec<u8> {
    let mut builder = PdfBuilder::new();
    for _ in 0..count {
        add_spread(&mut builder);
    }
    builder.build()
}

/// `count` pages of distinct sizes, each fully covered by one picture
pub fn picture_book(count: usize) -> Vec<u8> {
    let mut builder = PdfBuilder::new();
    for i in 0..count {
        let width = 200.0 + 10.0 * i as f32;
        let height = 300.0;
        let image = builder.rgb_image(300, 300, gradient);
        let content = format!("q {} 0 0 {} 0 0 cm /Im0 Do Q", width, height);
        builder.page(width, height, &content, &[("Im0", image)]);
    }
    builder.build()
}

/// Text-only pages
pub fn text_pdf(count: usize) -> Vec<u8> {
    let mut builder = PdfBuilder::new();
    for _ in 0..count {
        builder.page(
            612.0,
            792.0,
            "BT /F1 12 Tf 72 700 Td (Chapter one) Tj 0 -20 Td (The end) Tj ET",
            &[],
        );
    }
    builder.build()
}

/// Output page sizes, in order
pub fn page_sizes(pdf: &[u8]) -> Vec<(f32, f32)> {
    let source = pdf_storybook::SourceDocument::from_bytes(pdf.to_vec()).unwrap();
    (0..source.page_count())
        .map(|i| {
            let page = source.page(i).unwrap();
            (page.width(), page.height())
        })
        .collect()
}

/// Names of the XObjects each output page uses, in order
pub fn page_xobject_names(pdf: &[u8]) -> Vec<Vec<String>> {
    let source = pdf_storybook::SourceDocument::from_bytes(pdf.to_vec()).unwrap();
    (0..source.page_count())
        .map(|i| {
            let page = source.page(i).unwrap();
            let resources = page.resources().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            xobjects
                .iter()
                .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
                .collect()
        })
        .collect()
}

/// Decoded content stream of an output page
pub fn page_content(pdf: &[u8], index: usize) -> String {
    let source = pdf_storybook::SourceDocument::from_bytes(pdf.to_vec()).unwrap();
    let content = source.page(index).unwrap().content().unwrap();
    String::from_utf8_lossy(&content).into_owned()
}

/// Every Image XObject in a PDF as (width, height, last filter)
pub fn image_streams(pdf: &[u8]) -> Vec<(i64, i64, Option<String>)> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.objects
        .values()
        .filter_map(|obj| match obj {
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        })
        .filter(|dict| matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image"))
        .map(|dict| {
            let width = dict.get(b"Width").unwrap().as_i64().unwrap();
            let height = dict.get(b"Height").unwrap().as_i64().unwrap();
            let filter = match dict.get(b"Filter") {
                Ok(Object::Name(name)) => Some(String::from_utf8_lossy(name).into_owned()),
                Ok(Object::Array(names)) => names
                    .last()
                    .and_then(|n| n.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).into_owned()),
                _ => None,
            };
            (width, height, filter)
        })
        .collect()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}
