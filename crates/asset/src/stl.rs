//! Faceted-triangle (ASCII STL) parser.
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//! endsolid name
//! ```
//!
//! Every `vertex` line becomes its own output vertex carrying the normal of
//! the enclosing facet. Loops with more than three vertices are fanned.
//! Binary STL is rejected as soon as a null byte shows up.

use corelib::{Diagnostics, LoadError, LoadResult};

use crate::format::MeshParser;
use crate::mesh::MeshBuffers;
use crate::tokenize::{WHITESPACE, tokenize};

/// One closed `outer loop` block.
#[derive(Debug, PartialEq)]
struct FacetLoop {
    normal: [f32; 3],
    vertices: Vec<[f32; 3]>,
}

fn parse_xyz(args: &[&str]) -> Option<[f32; 3]> {
    match args {
        [x, y, z, ..] => Some([x.parse().ok()?, y.parse().ok()?, z.parse().ok()?]),
        _ => None,
    }
}

/// Parser for the faceted-triangle grammar.
#[derive(Clone, Copy, Debug, Default)]
pub struct FacetedTriangleParser {
    diagnostics: Diagnostics,
}

impl FacetedTriangleParser {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Walk the block structure, handing every finished loop to `sink`.
    fn walk(
        text: &str,
        diagnostics: Diagnostics,
        mut sink: impl FnMut(FacetLoop),
    ) -> LoadResult<()> {
        let mut normal = [0.0f32; 3];
        let mut open: Option<Vec<[f32; 3]>> = None;
        let mut last_line = 0usize;

        let mut flush = |vertices: Vec<[f32; 3]>, normal: [f32; 3], line: usize| {
            if vertices.len() < 3 {
                diagnostics.anomaly(
                    line,
                    format_args!("loop with {} vertices produces no triangle", vertices.len()),
                );
            }
            sink(FacetLoop { normal, vertices });
        };

        for (line_no, line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            last_line = line_no;
            if line.contains('\0') {
                return Err(LoadError::UnsupportedBinaryFormat { line: line_no });
            }
            let tokens = tokenize(line, WHITESPACE);
            let Some((keyword, args)) = tokens.split_first() else {
                continue;
            };

            match keyword.to_ascii_lowercase().as_str() {
                "solid" | "endsolid" => {}
                "facet" => {
                    if let Some(vertices) = open.take() {
                        diagnostics.anomaly(line_no, format_args!("unterminated loop closed"));
                        flush(vertices, normal, line_no);
                    }
                    normal = match args.split_first() {
                        Some((kw, xyz)) if kw.eq_ignore_ascii_case("normal") => {
                            parse_xyz(xyz).unwrap_or_else(|| {
                                diagnostics.anomaly(line_no, format_args!("unreadable facet normal"));
                                [0.0; 3]
                            })
                        }
                        _ => {
                            diagnostics.anomaly(line_no, format_args!("facet without normal"));
                            [0.0; 3]
                        }
                    };
                }
                "outer" => {
                    if !args.first().is_some_and(|kw| kw.eq_ignore_ascii_case("loop")) {
                        diagnostics.anomaly(line_no, format_args!("expected 'outer loop'"));
                        continue;
                    }
                    if let Some(vertices) = open.replace(Vec::with_capacity(3)) {
                        diagnostics.anomaly(line_no, format_args!("unterminated loop closed"));
                        flush(vertices, normal, line_no);
                    }
                }
                "vertex" => match (open.as_mut(), parse_xyz(args)) {
                    (Some(vertices), Some(position)) => vertices.push(position),
                    (None, _) => {
                        diagnostics.anomaly(line_no, format_args!("vertex outside a loop ignored"))
                    }
                    (Some(_), None) => {
                        diagnostics.anomaly(line_no, format_args!("unreadable vertex ignored"))
                    }
                },
                "endloop" => match open.take() {
                    Some(vertices) => flush(vertices, normal, line_no),
                    None => diagnostics.anomaly(line_no, format_args!("'endloop' without a loop")),
                },
                "endfacet" => {
                    if let Some(vertices) = open.take() {
                        diagnostics.anomaly(line_no, format_args!("'endfacet' inside a loop"));
                        flush(vertices, normal, line_no);
                    }
                }
                other => {
                    diagnostics.anomaly(line_no, format_args!("unknown keyword '{other}' ignored"))
                }
            }
        }

        if let Some(vertices) = open.take() {
            diagnostics.anomaly(last_line, format_args!("input ended inside a loop"));
            flush(vertices, normal, last_line);
        }
        Ok(())
    }
}

impl MeshParser for FacetedTriangleParser {
    fn parse(&self, text: &str) -> LoadResult<MeshBuffers> {
        let (mut loops, mut vertices, mut triangles) = (0usize, 0usize, 0usize);
        Self::walk(text, self.diagnostics, |facet| {
            loops += 1;
            vertices += facet.vertices.len();
            triangles += facet.vertices.len().saturating_sub(2);
        })?;
        if u32::try_from(vertices).is_err() {
            return Err(LoadError::TooManyVertices);
        }
        self.diagnostics.info(format_args!(
            "faceted-triangle scan: {loops} loops, {vertices} vertices"
        ));

        let mut mesh = MeshBuffers::with_counts(vertices, triangles);
        mesh.has_normals = vertices > 0;
        let mut next = 0usize;
        let mut corners: Vec<u32> = Vec::with_capacity(3);
        Self::walk(text, Diagnostics::silent(), |facet| {
            corners.clear();
            for position in facet.vertices {
                mesh.positions[next] = position;
                mesh.normals[next] = facet.normal;
                corners.push(next as u32);
                next += 1;
            }
            mesh.push_fan(&corners);
        })?;

        self.diagnostics.info(format_args!(
            "faceted-triangle loaded: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        ));
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> LoadResult<MeshBuffers> {
        FacetedTriangleParser::new(Diagnostics::silent()).parse(src)
    }

    #[test]
    fn single_facet_keeps_duplicate_vertices() {
        let src = "\
solid test
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 0 0
    endloop
  endfacet
endsolid test
";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.positions[1], mesh.positions[2]);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
        assert!(mesh.has_normals);
        assert!(!mesh.has_texcoords);
    }

    #[test]
    fn normals_follow_their_facet() {
        let src = "\
solid two
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 1 0
endloop
endfacet
facet normal 0 0 -1
outer loop
vertex 0 0 0
vertex 0 1 0
vertex 1 0 0
endloop
endfacet
endsolid two
";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.normals[2], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.normals[3], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn quad_loop_is_fanned() {
        let src = "\
solid quad
FACET NORMAL 0 0 1
OUTER LOOP
VERTEX 0 0 0
VERTEX 1 0 0
VERTEX 1 1 0
VERTEX 0 1 0
ENDLOOP
ENDFACET
ENDSOLID quad
";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn null_byte_is_rejected() {
        let src = "solid x\nfacet normal 0 0 1\n\0\0\0\x01garbage\n";
        assert!(matches!(
            parse(src),
            Err(LoadError::UnsupportedBinaryFormat { line: 3 })
        ));
    }

    #[test]
    fn stray_and_unterminated_blocks() {
        let src = "\
solid s
vertex 9 9 9
facet normal 0 1 0
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 0 0 1
facet normal 1 0 0
outer loop
vertex 0 0 0
vertex 0 1 0
";
        let mesh = parse(src).unwrap();
        // Second loop has two vertices and yields no triangle.
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.normals[0], [0.0, 1.0, 0.0]);
        assert_eq!(mesh.normals[4], [1.0, 0.0, 0.0]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn empty_solid() {
        let mesh = parse("solid empty\nendsolid empty\n").unwrap();
        assert!(mesh.is_empty());
        assert!(!mesh.has_normals);
    }
}
