use std::{collections::HashMap, path::Path, sync::Arc};

use image::ImageFormat;

use crate::{
    buffer::{Resources, find_resource, parse_data_uri},
    document::{Document, SamplerData},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

impl TextureFilter {
    /// Maps a GL filter code. Mipmap variants collapse onto their base
    /// filter.
    fn from_code(code: u32) -> Self {
        match code {
            9728 | 9984 | 9986 => Self::Nearest, // NEAREST, NEAREST_MIPMAP_*
            _ => Self::Linear,
        }
    }

    fn uses_mipmaps(code: u32) -> bool {
        (9984..=9987).contains(&code)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

impl WrapMode {
    fn from_code(code: u32) -> Self {
        match code {
            33071 => Self::ClampToEdge,
            33648 => Self::MirroredRepeat,
            _ => Self::Repeat,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerSettings {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub mipmaps: bool,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl From<&SamplerData> for SamplerSettings {
    fn from(sampler: &SamplerData) -> Self {
        Self {
            mag_filter: sampler.mag_filter.map(TextureFilter::from_code).unwrap_or_default(),
            min_filter: sampler.min_filter.map(TextureFilter::from_code).unwrap_or_default(),
            mipmaps: sampler.min_filter.is_some_and(TextureFilter::uses_mipmaps),
            wrap_s: WrapMode::from_code(sampler.wrap_s),
            wrap_t: WrapMode::from_code(sampler.wrap_t),
        }
    }
}

/// Decoded pixels, always RGBA8.
#[derive(Clone, Debug)]
pub struct TextureImage {
    pub name: String,
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// An image paired with the sampler state it is drawn with.
#[derive(Clone, Debug)]
pub struct SceneTexture {
    pub image: Arc<TextureImage>,
    pub sampler: SamplerSettings,
    pub source: usize,
}

/// Builds one [`SceneTexture`] per document texture. Textures naming the
/// same `(source, sampler)` pair share a single instance, and images are
/// decoded once no matter how many samplers use them. A texture whose image
/// cannot be decoded resolves to `None`.
pub fn load_textures(
    document: &Document,
    buffers: &[Vec<u8>],
    resources: &Resources<'_>,
) -> Vec<Option<Arc<SceneTexture>>> {
    let mut images: HashMap<usize, Option<Arc<TextureImage>>> = HashMap::new();
    let mut unique: HashMap<(usize, Option<usize>), Arc<SceneTexture>> = HashMap::new();

    document
        .textures
        .iter()
        .map(|texture| {
            let source = texture.source?;
            if let Some(shared) = unique.get(&(source, texture.sampler)) {
                return Some(shared.clone());
            }
            let image = images
                .entry(source)
                .or_insert_with(|| decode_image(document, source, buffers, resources).map(Arc::new))
                .clone()?;
            let sampler = texture
                .sampler
                .map(|index| SamplerSettings::from(&document.samplers[index]))
                .unwrap_or_default();
            let scene_texture = Arc::new(SceneTexture {
                image,
                sampler,
                source,
            });
            unique.insert((source, texture.sampler), scene_texture.clone());
            Some(scene_texture)
        })
        .collect()
}

/// Decodes a single document image. Unknown encodings, unresolvable uris
/// and corrupt data all yield `None`.
pub fn decode_image(
    document: &Document,
    index: usize,
    buffers: &[Vec<u8>],
    resources: &Resources<'_>,
) -> Option<TextureImage> {
    let image = &document.images[index];
    let name = image.name.clone().unwrap_or_else(|| format!("image{index}"));

    let (bytes, mime_type): (&[u8], Option<String>) = match (&image.uri, image.buffer_view) {
        (_, Some(view)) => {
            let view = &document.buffer_views[view];
            let buffer = &buffers[view.buffer];
            let range = view
                .byte_offset
                .checked_add(view.byte_length)
                .map(|end| view.byte_offset..end);
            let Some(bytes) = range.and_then(|range| buffer.get(range)) else {
                log::warn!("image {name}: buffer view lies outside its buffer");
                return None;
            };
            (bytes, image.mime_type.clone())
        }
        (Some(uri), None) => match parse_data_uri(uri) {
            Some(Ok(data)) => {
                let format = format_for(Some(&data.mime_type), uri);
                return decode_bytes(&name, &data.bytes, format);
            }
            Some(Err(err)) => {
                log::warn!("image {name}: {err}");
                return None;
            }
            None => {
                let Some(bytes) = find_resource(resources, uri) else {
                    log::warn!("image {name}: no resource supplied for \"{uri}\"");
                    return None;
                };
                (bytes, image.mime_type.clone())
            }
        },
        (None, None) => {
            log::warn!("image {name} has neither a uri nor a buffer view");
            return None;
        }
    };

    let uri = image.uri.as_deref().unwrap_or_default();
    decode_bytes(&name, bytes, format_for(mime_type.as_deref(), uri))
}

fn format_for(mime_type: Option<&str>, uri: &str) -> Option<ImageFormat> {
    mime_type
        .and_then(ImageFormat::from_mime_type)
        .or_else(|| Path::new(uri).extension().and_then(ImageFormat::from_extension))
}

fn decode_bytes(name: &str, bytes: &[u8], format: Option<ImageFormat>) -> Option<TextureImage> {
    let Some(format) = format else {
        log::warn!("image {name}: unsupported or missing mime type");
        return None;
    };
    match image::load_from_memory_with_format(bytes, format) {
        Ok(decoded) => {
            let rgba = decoded.to_rgba8();
            let (width, height) = rgba.dimensions();
            log::debug!("decoded image {name} ({width}x{height})");
            Some(TextureImage {
                name: name.to_string(),
                pixels: rgba.into_raw(),
                width,
                height,
            })
        }
        Err(err) => {
            log::warn!("image {name}: failed to decode: {err}");
            None
        }
    }
}
