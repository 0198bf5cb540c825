use normalpaint_config::MirrorMode;
use thiserror::Error;

/// Failures surfaced by editing operations.
///
/// None of these end the session; the operation that hit one is aborted (or,
/// for [`EditError::AsymmetricMesh`], completes without mirroring).
#[derive(Debug, Error)]
pub enum EditError {
    #[error("mesh '{name}' is empty or not readable")]
    InvalidMesh { name: String },

    #[error("mesh is not symmetric under {mode:?}, mirroring disabled")]
    AsymmetricMesh { mode: MirrorMode },

    #[error("no usable target meshes")]
    NoUsableTargets,

    #[error("missing input: {0}")]
    MissingInput(&'static str),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
