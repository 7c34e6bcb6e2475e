use thiserror::Error;

use crate::shader::ShaderKey;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("freshly created shader for {key:?} cannot render the renderable it was created for")]
    ShaderMismatch { key: ShaderKey },

    #[error("renderable has {bones} bones, shaders support at most {max}")]
    TooManyBones { bones: usize, max: usize },
}
