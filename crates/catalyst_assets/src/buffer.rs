use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{document::Document, error::AssetError};

/// Externally supplied bytes, looked up by the `uri` a buffer or image uses.
/// A buffer without a `uri` (the BIN chunk of a binary container) is looked
/// up under the empty name.
pub type Resources<'a> = [(&'a str, &'a [u8])];

/// Payload of a `data:` uri.
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Returns `None` when `uri` is not a data uri at all.
pub fn parse_data_uri(uri: &str) -> Option<Result<DataUri, AssetError>> {
    let rest = uri.strip_prefix("data:")?;
    let Some((header, payload)) = rest.split_once(',') else {
        return Some(Err(AssetError::InvalidDataUri(truncate(uri))));
    };
    let Some(mime_type) = header.strip_suffix(";base64") else {
        return Some(Err(AssetError::InvalidDataUri(truncate(uri))));
    };
    Some(
        STANDARD
            .decode(payload)
            .map(|bytes| DataUri {
                mime_type: mime_type.to_string(),
                bytes,
            })
            .map_err(AssetError::from),
    )
}

pub fn find_resource<'a>(resources: &Resources<'a>, name: &str) -> Option<&'a [u8]> {
    resources
        .iter()
        .find(|(resource_name, _)| *resource_name == name)
        .map(|(_, data)| *data)
}

/// Decodes every buffer of the document into owned bytes, truncated to the
/// declared `byteLength`.
pub fn decode_buffers(
    document: &Document,
    resources: &Resources<'_>,
) -> Result<Vec<Vec<u8>>, AssetError> {
    let mut buffers = Vec::with_capacity(document.buffers.len());
    for (index, buffer) in document.buffers.iter().enumerate() {
        let uri = buffer.uri.as_deref().unwrap_or("");
        let mut bytes = match parse_data_uri(uri) {
            Some(data) => data?.bytes,
            None => find_resource(resources, uri)
                .ok_or_else(|| AssetError::MissingBuffer {
                    index,
                    uri: uri.to_string(),
                })?
                .to_vec(),
        };
        if bytes.len() < buffer.byte_length {
            return Err(AssetError::BufferTooShort {
                index,
                declared: buffer.byte_length,
                actual: bytes.len(),
            });
        }
        bytes.truncate(buffer.byte_length);
        log::debug!("decoded buffer {index}: {} bytes", bytes.len());
        buffers.push(bytes);
    }
    Ok(buffers)
}

fn truncate(uri: &str) -> String {
    uri.chars().take(48).collect()
}
