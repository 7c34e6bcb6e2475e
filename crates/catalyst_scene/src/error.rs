use catalyst_assets::AssetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("document has no scene {0}")]
    MissingScene(usize),

    #[error("document declares no scenes")]
    NoScenes,

    #[error("joint node {joint} of skin {skin} is not part of the scene graph")]
    MissingJoint { skin: usize, joint: usize },

    #[error("animation \"{animation}\" targets a node that is not part of the copied graph")]
    UnresolvedAnimationNode { animation: String },

    #[error("no scene node named \"{0}\"")]
    NodeNotFound(String),

    #[error("no scene named \"{0}\"")]
    SceneNotFound(String),

    #[error("no animation named \"{0}\"")]
    AnimationNotFound(String),

    #[error("none of the requested root nodes {0:?} exist")]
    EmptyFilter(Vec<String>),
}
