//! Format selection and the parser capability shared by all formats.

use std::path::Path;

use corelib::{Diagnostics, LoadError, LoadResult};

use crate::mesh::MeshBuffers;
use crate::obj::FaceListParser;
use crate::off::HeaderCountParser;
use crate::stl::FacetedTriangleParser;

/// Parses a whole text document into mesh buffers.
pub trait MeshParser {
    fn parse(&self, text: &str) -> LoadResult<MeshBuffers>;
}

/// Supported mesh text formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// Wavefront-style `v`/`vt`/`vn`/`f` lists (`.obj`).
    FaceList,
    /// Count header followed by vertex and face lines (`.off`).
    HeaderCount,
    /// ASCII `facet`/`outer loop`/`vertex` blocks (`.stl`).
    FacetedTriangle,
}

const EXTENSION_TAGS: [(&str, MeshFormat); 3] = [
    (".obj", MeshFormat::FaceList),
    (".off", MeshFormat::HeaderCount),
    (".stl", MeshFormat::FacetedTriangle),
];

impl MeshFormat {
    /// Pick the format from the file name.
    ///
    /// The name must contain `.obj`, `.off` or `.stl`, matched case-sensitively
    /// as a substring, so `part.obj.txt` is a face list. When several occur,
    /// the rightmost wins.
    pub fn from_path(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_file_name)
            .ok_or_else(|| LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }

    fn from_file_name(name: &str) -> Option<Self> {
        EXTENSION_TAGS
            .iter()
            .filter_map(|&(tag, format)| name.rfind(tag).map(|at| (at, format)))
            .max_by_key(|&(at, _)| at)
            .map(|(_, format)| format)
    }

    /// Format for a bare extension name such as `"obj"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "obj" => Some(Self::FaceList),
            "off" => Some(Self::HeaderCount),
            "stl" => Some(Self::FacetedTriangle),
            _ => None,
        }
    }

    /// Run this format's parser over `text`.
    pub fn parse(self, text: &str, diagnostics: Diagnostics) -> LoadResult<MeshBuffers> {
        match self {
            Self::FaceList => FaceListParser::new(diagnostics).parse(text),
            Self::HeaderCount => HeaderCountParser::new(diagnostics).parse(text),
            Self::FacetedTriangle => FacetedTriangleParser::new(diagnostics).parse(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch() {
        assert_eq!(MeshFormat::from_path("a/b/model.obj").unwrap(), MeshFormat::FaceList);
        assert_eq!(MeshFormat::from_path("cube.off").unwrap(), MeshFormat::HeaderCount);
        assert_eq!(MeshFormat::from_path("part.stl").unwrap(), MeshFormat::FacetedTriangle);
    }

    #[test]
    fn extension_is_matched_as_a_substring() {
        assert_eq!(MeshFormat::from_path("part.obj.txt").unwrap(), MeshFormat::FaceList);
        assert_eq!(MeshFormat::from_path("scan.off.bak").unwrap(), MeshFormat::HeaderCount);
        assert_eq!(MeshFormat::from_path("export.obj.stl").unwrap(), MeshFormat::FacetedTriangle);
    }

    #[test]
    fn unknown_or_miscased_extension_fails() {
        for path in ["model.ply", "model.OBJ", "model", "obj", "models.obj/readme"] {
            assert!(
                matches!(MeshFormat::from_path(path), Err(LoadError::UnsupportedFormat { .. })),
                "{path}"
            );
        }
    }

    #[test]
    fn bare_names() {
        assert_eq!(MeshFormat::from_name("obj"), Some(MeshFormat::FaceList));
        assert_eq!(MeshFormat::from_name("off"), Some(MeshFormat::HeaderCount));
        assert_eq!(MeshFormat::from_name("stl"), Some(MeshFormat::FacetedTriangle));
        assert_eq!(MeshFormat::from_name(".obj"), None);
    }
}
