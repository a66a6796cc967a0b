//! The `cutcell_core` crate builds high-order finite-difference derivative
//! operators on uniform Cartesian grids cut by immersed solid objects.
//!
//! Key components:
//! - **Geometry / Raycast**: closed-form shapes and the per-line classifier
//!   that records where rays enter and leave solid material.
//! - **Mesh**: fluid/solid segmentation of every grid line, cut faces and
//!   the fluid-slice index.
//! - **Stencil**: the `Stencil` trait (in `traits`) and the E2, E4,
//!   E6/E8-uniform and free-coefficient families with `psi`-dependent
//!   boundary closures.
//! - **Derivative**: per-axis operators assembled from line blocks and
//!   sparse cut-face couplings.
//! - **Config**: serde-driven setup producing all of the above.
pub mod config;
pub mod derivative;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod raycast;
pub mod stencil;
pub mod traits;

pub use config::{CutCellConfig, CutCellSetup};
pub use derivative::{BoundaryData, BoundarySpec, DerivativeOperator, DerivativeSet, WallPair};
pub use error::{MeshError, OperatorError, StencilError};
pub use geometry::{Axis, Shape, SolidObject};
pub use mesh::CartesianMesh;
pub use stencil::{AnyStencil, BoundaryKind, DerivativeOrder, StencilFamily, StencilSelection};
pub use traits::Stencil;
