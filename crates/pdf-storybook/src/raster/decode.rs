//! Image XObject decoding
//!
//! Turns an Image XObject stream into a `DynamicImage`. JPEG data goes through
//! the image crate; everything else is unpacked from raw samples after lopdf
//! has removed the stream filters.

use crate::source::{extract_number, name_of, resolve, stream_bytes};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};

/// Color spaces the raw-sample path understands
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of RGB triplets (gray palettes are expanded on load)
    Indexed { palette: Vec<[u8; 3]> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }
}

/// True for stencil masks, which carry no color of their own
pub(crate) fn is_stencil_mask(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true)))
}

/// Decode an Image XObject, applying its `/SMask` as an alpha channel when present
pub(crate) fn decode_image(doc: &Document, stream: &Stream) -> Result<DynamicImage, String> {
    let base = decode_samples(doc, stream)?;

    let smask = match stream.dict.get(b"SMask") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        _ => None,
    };
    let Some(Object::Stream(mask_stream)) = smask else {
        return Ok(base);
    };

    let mask = decode_samples(doc, mask_stream)
        .map_err(|e| format!("soft mask: {}", e))?
        .to_luma8();
    let mut rgba = base.to_rgba8();
    let mask = if mask.dimensions() != rgba.dimensions() {
        image::imageops::resize(
            &mask,
            rgba.width(),
            rgba.height(),
            image::imageops::FilterType::Triangle,
        )
    } else {
        mask
    };
    for (pixel, alpha) in rgba.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = alpha.0[0];
    }
    Ok(DynamicImage::ImageRgba8(rgba))
}

fn decode_samples(doc: &Document, stream: &Stream) -> Result<DynamicImage, String> {
    let dict = &stream.dict;
    let width = dict_u32(doc, dict, b"Width").ok_or("missing /Width")?;
    let height = dict_u32(doc, dict, b"Height").ok_or("missing /Height")?;
    if width == 0 || height == 0 {
        return Err(format!("empty image {}x{}", width, height));
    }

    match last_filter(doc, dict).as_deref() {
        Some("DCTDecode") => {
            let jpeg = undo_leading_filters(stream)?;
            return image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)
                .map_err(|e| format!("JPEG data: {}", e));
        }
        Some("JPXDecode") => return Err("JPEG 2000 images are not supported".to_string()),
        Some("CCITTFaxDecode") | Some("JBIG2Decode") => {
            return Err("bilevel fax/JBIG2 images are not supported".to_string());
        }
        _ => {}
    }

    let data = stream_bytes(stream).map_err(|e| e.to_string())?;
    let bpc = dict_u32(doc, dict, b"BitsPerComponent").unwrap_or(8);
    let color_space = match dict.get(b"ColorSpace") {
        Ok(obj) => parse_color_space(doc, obj)?,
        Err(_) => ColorSpace::Gray,
    };

    let samples = unpack_samples(
        &data,
        width as usize,
        height as usize,
        color_space.components(),
        bpc,
        !matches!(color_space, ColorSpace::Indexed { .. }),
    )?;

    let image = match color_space {
        ColorSpace::Gray => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        ColorSpace::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        ColorSpace::Cmyk => {
            let rgb = samples
                .chunks_exact(4)
                .flat_map(|p| cmyk_to_rgb(p[0], p[1], p[2], p[3]))
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        ColorSpace::Indexed { palette } => {
            let rgb = samples
                .iter()
                .flat_map(|&i| palette.get(i as usize).copied().unwrap_or([0, 0, 0]))
                .collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };
    image.ok_or_else(|| "sample buffer does not match image size".to_string())
}

/// Unpack packed samples into one byte per component.
///
/// Rows are padded to whole bytes. When `normalize` is set, sub-byte samples
/// are scaled to 0..=255; palette indices are left as-is.
fn unpack_samples(
    data: &[u8],
    width: usize,
    height: usize,
    components: usize,
    bpc: u32,
    normalize: bool,
) -> Result<Vec<u8>, String> {
    let per_row = width * components;
    let row_bytes = (per_row * bpc as usize).div_ceil(8);
    let needed = row_bytes * height;
    if data.len() < needed {
        return Err(format!(
            "image data truncated: {} bytes, expected {}",
            data.len(),
            needed
        ));
    }

    match bpc {
        8 => Ok(data[..needed].to_vec()),
        16 => Ok(data[..needed].chunks_exact(2).map(|pair| pair[0]).collect()),
        1 | 2 | 4 => {
            let max = (1u32 << bpc) - 1;
            let mut out = Vec::with_capacity(per_row * height);
            for row in data[..needed].chunks_exact(row_bytes) {
                for i in 0..per_row {
                    let bit = i * bpc as usize;
                    let byte = row[bit / 8] as u32;
                    let shift = 8 - bpc as usize - (bit % 8);
                    let value = (byte >> shift) & max;
                    out.push(if normalize {
                        (value * 255 / max) as u8
                    } else {
                        value as u8
                    });
                }
            }
            Ok(out)
        }
        other => Err(format!("unsupported BitsPerComponent {}", other)),
    }
}

fn parse_color_space(doc: &Document, obj: &Object) -> Result<ColorSpace, String> {
    let obj = resolve(doc, obj).map_err(|e| e.to_string())?;
    if let Some(name) = name_of(obj) {
        return match name.as_str() {
            "DeviceGray" | "G" | "CalGray" => Ok(ColorSpace::Gray),
            "DeviceRGB" | "RGB" | "CalRGB" => Ok(ColorSpace::Rgb),
            "DeviceCMYK" | "CMYK" => Ok(ColorSpace::Cmyk),
            other => Err(format!("unsupported color space /{}", other)),
        };
    }

    let arr = obj
        .as_array()
        .map_err(|_| "malformed /ColorSpace".to_string())?;
    let family = arr.first().and_then(name_of).unwrap_or_default();
    match family.as_str() {
        "CalGray" => Ok(ColorSpace::Gray),
        "CalRGB" => Ok(ColorSpace::Rgb),
        "ICCBased" => {
            let profile = arr
                .get(1)
                .and_then(|o| resolve(doc, o).ok())
                .and_then(|o| o.as_stream().ok())
                .ok_or("ICCBased without profile stream")?;
            match dict_u32(doc, &profile.dict, b"N") {
                Some(1) => Ok(ColorSpace::Gray),
                Some(3) => Ok(ColorSpace::Rgb),
                Some(4) => Ok(ColorSpace::Cmyk),
                n => Err(format!("ICCBased with {:?} components", n)),
            }
        }
        "Indexed" | "I" => {
            let base = arr.get(1).ok_or("Indexed without base")?;
            let base = parse_color_space(doc, base)?;
            let lookup = arr
                .get(3)
                .ok_or("Indexed without lookup table")
                .and_then(|o| resolve(doc, o).map_err(|_| "unresolvable lookup table"))?;
            let table = match lookup {
                Object::String(bytes, _) => bytes.clone(),
                Object::Stream(s) => stream_bytes(s).map_err(|e| e.to_string())?,
                _ => return Err("malformed Indexed lookup table".to_string()),
            };
            let palette = match base {
                ColorSpace::Rgb => table.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
                ColorSpace::Gray => table.iter().map(|&g| [g, g, g]).collect(),
                ColorSpace::Cmyk => table
                    .chunks_exact(4)
                    .map(|c| cmyk_to_rgb(c[0], c[1], c[2], c[3]))
                    .collect(),
                ColorSpace::Indexed { .. } => {
                    return Err("nested Indexed color space".to_string());
                }
            };
            Ok(ColorSpace::Indexed { palette })
        }
        other => Err(format!("unsupported color space family /{}", other)),
    }
}

fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - k as u32;
    [
        ((255 - c as u32) * k / 255) as u8,
        ((255 - m as u32) * k / 255) as u8,
        ((255 - y as u32) * k / 255) as u8,
    ]
}

fn last_filter(doc: &Document, dict: &Dictionary) -> Option<String> {
    let filter = resolve(doc, dict.get(b"Filter").ok()?).ok()?;
    match filter {
        Object::Array(arr) => arr.last().and_then(name_of),
        other => name_of(other),
    }
}

/// Stream bytes with every filter before the last one removed.
///
/// Image codecs such as DCTDecode can sit behind a general filter chain
/// (`[/FlateDecode /DCTDecode]`); lopdf only undoes the general filters.
fn undo_leading_filters(stream: &Stream) -> Result<Vec<u8>, String> {
    let filters = match stream.dict.get(b"Filter") {
        Ok(Object::Array(filters)) if filters.len() > 1 => filters,
        _ => return Ok(stream.content.clone()),
    };
    let leading = filters.len() - 1;

    let mut dict = stream.dict.clone();
    dict.set("Filter", Object::Array(filters[..leading].to_vec()));
    if let Ok(Object::Array(parms)) = stream.dict.get(b"DecodeParms") {
        let parms = parms[..parms.len().min(leading)].to_vec();
        // lopdf reads a single parameter dictionary, not a per-filter array
        match parms.first() {
            Some(Object::Dictionary(first)) if leading == 1 => {
                dict.set("DecodeParms", Object::Dictionary(first.clone()))
            }
            _ => {
                dict.remove(b"DecodeParms");
            }
        }
    }
    stream_bytes(&Stream::new(dict, stream.content.clone())).map_err(|e| e.to_string())
}

fn dict_u32(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<u32> {
    let value = resolve(doc, dict.get(key).ok()?).ok()?;
    extract_number(value).filter(|v| *v >= 0.0).map(|v| v as u32)
}
