//! Interactive normal editing session
//!
//! This crate keeps a mesh's edited normals consistent while the user works:
//! - [`editor::NormalEditor`] - The session and every tool it exposes
//! - [`buffers`] - Bind-pose and posed vertex streams
//! - [`skin`] - Keeping posed and bind-pose normals in step
//! - [`mirror`] - Mirror symmetry across a local axis
//! - [`selection`] - Soft selection weights and pivot summary
//! - [`history`] - Normal snapshots keyed by an external undo index
//! - [`weld`] - Scene meshes taking part in a multi-mesh weld
//! - [`bake`] - Vertex color and normal map encoding
//! - [`asset`] - The shared mesh the session edits
//! - [`display`] - Upload and file output seams

pub mod asset;
pub mod bake;
pub mod buffers;
pub mod display;
pub mod editor;
pub mod error;
pub mod history;
pub mod mirror;
pub mod selection;
pub mod skin;
pub mod weld;

pub use asset::{MeshAsset, MeshHandle, SkinBinding, is_valid_mesh};
pub use bake::NormalMapImage;
pub use buffers::{BufferSet, LiveModel, VertexStreams};
pub use display::{AssetWriter, BakedNormalMap, DisplaySink, FsWriter, NullDisplay};
pub use editor::{NormalEditor, ScreenView};
pub use error::EditError;
pub use history::{HistoryEntry, HistoryManager, HistoryPort, LinearUndo, MeshRecord};
pub use mirror::{MirrorEngine, MirrorRelation};
pub use selection::SelectionState;
pub use skin::{MeshKind, SkinContext, SyncState};
pub use weld::{SceneMesh, WeldTarget};
