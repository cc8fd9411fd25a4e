//! Image resolution for material textures.
//!
//! glTF images come from one of three places: a base64 `data:` URI, a file
//! next to the asset, or a buffer view inside a resolved buffer. All three end
//! up as an [`RgbaImage`]; any failure is logged and yields `None`.

use std::path::Path;

use image::{ImageFormat, RgbaImage};

/// Decode the pixels of `image`. `None` means "no usable image".
pub fn resolve_image(
    image: &gltf::Image,
    buffers: &[gltf::buffer::Data],
    base_dir: &Path,
) -> Option<RgbaImage> {
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => {
            if uri.len() > 5 && uri.starts_with("data:") {
                let bytes = decode_data_uri(uri)?;
                decode(&bytes, ImageFormat::Png)
            } else {
                let path = base_dir.join(uri);
                match image::open(&path) {
                    Ok(img) => Some(img.to_rgba8()),
                    Err(e) => {
                        log::warn!("IMAGE: [{}] Failed to load texture: {}", path.display(), e);
                        None
                    }
                }
            }
        }
        gltf::image::Source::View { view, mime_type } => {
            let Some(buffer) = buffers.get(view.buffer().index()) else {
                log::warn!("IMAGE: Buffer {} not loaded", view.buffer().index());
                return None;
            };
            let Some(format) = format_for_mime(mime_type) else {
                log::warn!("IMAGE: glTF image data MIME type not recognized: {}", mime_type);
                return None;
            };
            let Some(bytes) =
                copy_view(buffer, view.offset(), view.length(), view.stride().unwrap_or(1))
            else {
                log::warn!("IMAGE: Buffer view {} exceeds its buffer", view.index());
                return None;
            };
            decode(&bytes, format)
        }
    }
}

/// Some exporters keep JSON's escaped slash in the MIME type.
fn format_for_mime(mime_type: &str) -> Option<ImageFormat> {
    match mime_type {
        "image/png" | "image\\/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image\\/jpeg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// Gather `length` bytes starting at `offset`, `stride` bytes apart.
/// `None` if the view runs past the buffer.
fn copy_view(buffer: &[u8], offset: usize, length: usize, stride: usize) -> Option<Vec<u8>> {
    if stride <= 1 {
        return buffer.get(offset..offset.checked_add(length)?).map(<[u8]>::to_vec);
    }
    (0..length)
        .map(|k| {
            let at = k.checked_mul(stride)?.checked_add(offset)?;
            buffer.get(at).copied()
        })
        .collect()
}

fn decode(bytes: &[u8], format: ImageFormat) -> Option<RgbaImage> {
    match image::load_from_memory_with_format(bytes, format) {
        Ok(img) => Some(img.to_rgba8()),
        Err(e) => {
            log::warn!("IMAGE: Failed to decode {:?} data: {}", format, e);
            None
        }
    }
}

/// Payload of a `data:[<mime>][;base64],<data>` URI.
pub(crate) fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let Some(comma) = uri.find(',') else {
        log::warn!("IMAGE: glTF data URI is not a valid image");
        return None;
    };
    let decoded = base64_decode(&uri[comma + 1..]);
    if decoded.is_none() {
        log::warn!("IMAGE: glTF data URI holds invalid base64 data");
    }
    decoded
}

/// Standard-alphabet base64. Padding is optional and whitespace is skipped.
pub(crate) fn base64_decode(input: &str) -> Option<Vec<u8>> {
    fn sextet(c: u8) -> Option<u8> {
        match c {
            b'A'..=b'Z' => Some(c - b'A'),
            b'a'..=b'z' => Some(c - b'a' + 26),
            b'0'..=b'9' => Some(c - b'0' + 52),
            b'+' => Some(62),
            b'/' => Some(63),
            _ => None,
        }
    }

    let input: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let data = match input.iter().position(|&b| b == b'=') {
        Some(pad) if input[pad..].iter().all(|&b| b == b'=') && input.len() - pad <= 2 => {
            &input[..pad]
        }
        Some(_) => return None,
        None => &input[..],
    };

    let mut out = Vec::with_capacity(data.len() * 3 / 4);
    for chunk in data.chunks(4) {
        if chunk.len() == 1 {
            return None;
        }
        let mut acc: u32 = 0;
        for &c in chunk {
            acc = (acc << 6) | sextet(c)? as u32;
        }
        acc <<= 6 * (4 - chunk.len()) as u32;
        let bytes = acc.to_be_bytes();
        out.extend_from_slice(&bytes[1..chunk.len()]);
    }
    Some(out)
}
