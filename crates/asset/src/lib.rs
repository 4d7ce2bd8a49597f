//! Asset loading: text mesh formats into flat, index-ready buffers.
//!
//! Three formats are understood, chosen by extension:
//! - `.obj` face lists with per-corner texcoord/normal references,
//! - `.off` count-header vertex/face lists,
//! - `.stl` ASCII facet blocks (binary STL is rejected).

mod dedup;
pub mod format;
pub mod loader;
pub mod mesh;
pub mod obj;
pub mod off;
pub mod stl;
pub mod tokenize;

pub use corelib::{Diagnostics, LoadError, LoadResult};
pub use format::{MeshFormat, MeshParser};
pub use loader::{Mesh, load_mesh_from_path, load_mesh_from_str, load_mesh_with_format};
pub use mesh::{Aabb, MeshBuffers};
