//! Path-based loading and the reloadable [`Mesh`] holder.

use std::fs;
use std::path::Path;

use corelib::{Diagnostics, LoadError, LoadResult};

use crate::format::MeshFormat;
use crate::mesh::MeshBuffers;

/// Load a mesh, choosing the parser from the file extension.
pub fn load_mesh_from_path(
    path: impl AsRef<Path>,
    diagnostics: Diagnostics,
) -> LoadResult<MeshBuffers> {
    let path = path.as_ref();
    let result =
        MeshFormat::from_path(path).and_then(|format| read_and_parse(path, format, diagnostics));
    if let Err(err) = &result {
        diagnostics.error(format_args!("failed to load {}: {err}", path.display()));
    }
    result
}

/// Load a mesh from a file with an explicitly chosen format.
pub fn load_mesh_with_format(
    path: impl AsRef<Path>,
    format: MeshFormat,
    diagnostics: Diagnostics,
) -> LoadResult<MeshBuffers> {
    let path = path.as_ref();
    let result = read_and_parse(path, format, diagnostics);
    if let Err(err) = &result {
        diagnostics.error(format_args!("failed to load {}: {err}", path.display()));
    }
    result
}

/// Parse an in-memory document.
pub fn load_mesh_from_str(
    text: &str,
    format: MeshFormat,
    diagnostics: Diagnostics,
) -> LoadResult<MeshBuffers> {
    let mesh = format.parse(text, diagnostics)?;
    mesh.validate()?;
    Ok(mesh)
}

fn read_and_parse(
    path: &Path,
    format: MeshFormat,
    diagnostics: Diagnostics,
) -> LoadResult<MeshBuffers> {
    let bytes = fs::read(path).map_err(|source| LoadError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    diagnostics.info(format_args!(
        "loading {} as {:?} ({} bytes)",
        path.display(),
        format,
        bytes.len()
    ));
    // Non-UTF-8 bytes become U+FFFD; null bytes survive for the binary check.
    let text = String::from_utf8_lossy(&bytes);
    load_mesh_from_str(&text, format, diagnostics)
}

/// A mesh slot that is replaced wholesale by each successful load.
///
/// A failed load leaves the previously loaded buffers untouched.
#[derive(Debug, Default)]
pub struct Mesh {
    buffers: Option<MeshBuffers>,
    diagnostics: Diagnostics,
}

impl Mesh {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            buffers: None,
            diagnostics,
        }
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> LoadResult<()> {
        let buffers = load_mesh_from_path(path, self.diagnostics)?;
        self.buffers = Some(buffers);
        Ok(())
    }

    pub fn load_str(&mut self, text: &str, format: MeshFormat) -> LoadResult<()> {
        let buffers = match load_mesh_from_str(text, format, self.diagnostics) {
            Ok(buffers) => buffers,
            Err(err) => {
                self.diagnostics.error(format_args!("failed to parse {format:?} text: {err}"));
                return Err(err);
            }
        };
        self.buffers = Some(buffers);
        Ok(())
    }

    #[inline]
    pub fn buffers(&self) -> Option<&MeshBuffers> {
        self.buffers.as_ref()
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Drop the current buffers, returning them if any were loaded.
    pub fn clear(&mut self) -> Option<MeshBuffers> {
        self.buffers.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn failed_reload_keeps_previous_buffers() {
        let mut mesh = Mesh::new(Diagnostics::silent());
        mesh.load_str(TRIANGLE, MeshFormat::FaceList).unwrap();
        let before = mesh.buffers().cloned();

        let err = mesh
            .load_str("v 0 0 0\nf 1/1/1/1 1 1\n", MeshFormat::FaceList)
            .unwrap_err();
        assert!(matches!(err, LoadError::MalformedFace { .. }));
        assert_eq!(mesh.buffers().cloned(), before);
    }

    #[test]
    fn failed_first_load_stays_empty() {
        let mut mesh = Mesh::default();
        assert!(mesh.load_str("OFF\n3 1\n", MeshFormat::HeaderCount).is_err());
        assert!(!mesh.is_loaded());
    }

    #[test]
    fn reload_replaces_and_clear_releases() {
        let mut mesh = Mesh::new(Diagnostics::silent());
        mesh.load_str(TRIANGLE, MeshFormat::FaceList).unwrap();
        let square = "OFF\n4 2 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n3 0 1 2\n3 0 2 3\n";
        mesh.load_str(square, MeshFormat::HeaderCount).unwrap();
        assert_eq!(mesh.buffers().map(MeshBuffers::vertex_count), Some(4));
        assert_eq!(mesh.clear().map(|b| b.triangle_count()), Some(2));
        assert!(!mesh.is_loaded());
    }

    #[test]
    fn diagnostics_do_not_change_results() {
        let loud = load_mesh_from_str(TRIANGLE, MeshFormat::FaceList, Diagnostics::default()).unwrap();
        let quiet = load_mesh_from_str(TRIANGLE, MeshFormat::FaceList, Diagnostics::silent()).unwrap();
        assert_eq!(loud, quiet);
    }
}
