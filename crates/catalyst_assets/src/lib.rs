pub mod accessor;
pub mod animation;
pub mod buffer;
pub mod context;
pub mod document;
pub mod error;
pub mod material;
pub mod mesh;
pub mod skin;
pub mod texture;

pub use buffer::Resources;
pub use context::{IndexPolicy, LoadOptions, SceneResourceContext};
pub use document::Document;
pub use error::{AssetError, DocumentError};
