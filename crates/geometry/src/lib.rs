//! Stateless geometry kernel for normal editing
//!
//! This crate provides the operations the editing core delegates to:
//! - [`kernel::GeometryKernel`] - The kernel seam, with reference implementations
//! - [`cpu::CpuKernel`] - Reference CPU kernel
//! - [`types`] - Borrowed buffer views and value types
//! - [`raycast`] - Ray-triangle intersection and normal picking
//! - [`select`] - Screen, brush and topology selection tests
//! - [`brush`] - Normal brushes
//! - [`transform`] - Selection-weighted transform tools
//! - [`smooth`] - Smoothing and welding
//! - [`mirror`] - Mirror relation build and apply
//! - [`project`] - Normal projection between meshes
//! - [`skinning`] - Linear-blend skinning, forward and reverse
//! - [`generate`] - Normal and tangent synthesis

pub mod brush;
pub mod cpu;
pub mod generate;
pub mod grid;
pub mod kernel;
pub mod mirror;
pub mod project;
pub mod raycast;
pub mod select;
pub mod skinning;
pub mod smooth;
pub mod topology;
pub mod transform;
pub mod types;

pub use brush::BlendOp;
pub use cpu::CpuKernel;
pub use kernel::{DEFAULT_WELD_EPSILON, GeometryKernel};
pub use types::*;
