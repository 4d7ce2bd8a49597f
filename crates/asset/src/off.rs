//! Header-count (OFF) parser.
//!
//! ```text
//! OFF                      optional sentinel
//! <nV> <nF> <nE>           counts; the edge count is checked, then dropped
//! x y z [r g b [a]]        nV vertex lines
//! n i0 .. i(n-1) [r g b [a]]  nF face lines, 0-based indices
//! ```
//!
//! Only a missing or malformed count line is fatal. Every other line that
//! does not fit the current state is reported and skipped.

use corelib::{Diagnostics, LoadError, LoadResult};

use crate::format::MeshParser;
use crate::mesh::MeshBuffers;
use crate::tokenize::{WHITESPACE, tokenize};

const SENTINELS: &[&str] = &["OFF", "COFF", "NOFF", "CNOFF", "STOFF"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OffState {
    Header,
    Vertices,
    Faces,
    Done,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct OffHeader {
    vertices: usize,
    faces: usize,
}

#[derive(Debug, PartialEq)]
enum OffRecord {
    Vertex([f32; 3]),
    /// Resolved 0-based corner indices, at least three.
    Face(Vec<u32>),
}

/// Colour components that may trail a vertex or face record.
fn trailing_ok(extra: usize) -> bool {
    matches!(extra, 0 | 3 | 4)
}

fn parse_header(tokens: &[&str], line: usize, content: &str) -> LoadResult<OffHeader> {
    let malformed = || LoadError::MalformedHeader {
        line,
        content: content.trim().to_owned(),
    };
    let &[v, f, e] = tokens else {
        return Err(malformed());
    };
    let count = |t: &str| t.parse::<usize>().map_err(|_| malformed());
    let header = OffHeader {
        vertices: count(v)?,
        faces: count(f)?,
    };
    count(e)?;
    if u32::try_from(header.vertices).is_err() {
        return Err(LoadError::TooManyVertices);
    }
    Ok(header)
}

/// Parser for the header-count grammar.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderCountParser {
    diagnostics: Diagnostics,
}

impl HeaderCountParser {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    /// Run the state machine over `text`, handing each accepted record to `sink`.
    fn walk(
        text: &str,
        diagnostics: Diagnostics,
        mut sink: impl FnMut(OffRecord),
    ) -> LoadResult<()> {
        let mut state = OffState::Header;
        let mut header = OffHeader::default();
        let mut vertices_read = 0usize;
        let mut faces_read = 0usize;
        let mut last_line = 0usize;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            last_line = line_no;
            let content = raw_line.split('#').next().unwrap_or_default();
            let tokens = tokenize(content, WHITESPACE);
            if tokens.is_empty() {
                continue;
            }

            match state {
                OffState::Header => {
                    let counts = match tokens.split_first() {
                        Some((first, rest)) if SENTINELS.contains(first) => rest,
                        _ => &tokens[..],
                    };
                    if counts.is_empty() {
                        continue;
                    }
                    header = parse_header(counts, line_no, content)?;
                    diagnostics.info(format_args!(
                        "header-count: {} vertices, {} faces declared",
                        header.vertices, header.faces
                    ));
                    state = if header.vertices > 0 {
                        OffState::Vertices
                    } else if header.faces > 0 {
                        OffState::Faces
                    } else {
                        OffState::Done
                    };
                }
                OffState::Vertices => {
                    let coords: Option<Vec<f32>> = tokens
                        .iter()
                        .take(3)
                        .map(|t| t.parse::<f32>().ok())
                        .collect();
                    let position = match coords.as_deref() {
                        Some(&[x, y, z]) => [x, y, z],
                        _ => {
                            diagnostics.anomaly(line_no, format_args!("vertex line skipped"));
                            continue;
                        }
                    };
                    if !trailing_ok(tokens.len() - 3) {
                        diagnostics.anomaly(
                            line_no,
                            format_args!("{} trailing vertex components ignored", tokens.len() - 3),
                        );
                    }
                    sink(OffRecord::Vertex(position));
                    vertices_read += 1;
                    if vertices_read == header.vertices {
                        state = if header.faces > 0 {
                            OffState::Faces
                        } else {
                            OffState::Done
                        };
                    }
                }
                OffState::Faces => {
                    let Ok(corner_count) = tokens[0].parse::<usize>() else {
                        diagnostics.anomaly(line_no, format_args!("face line skipped"));
                        continue;
                    };
                    faces_read += 1;
                    if faces_read == header.faces {
                        state = OffState::Done;
                    }

                    if corner_count < 3 || tokens.len() - 1 < corner_count {
                        diagnostics.anomaly(
                            line_no,
                            format_args!("face with {corner_count} corners skipped"),
                        );
                        continue;
                    }
                    let corners: Option<Vec<u32>> = tokens[1..=corner_count]
                        .iter()
                        .map(|t| Self::resolve_index(t, header.vertices))
                        .collect();
                    let Some(corners) = corners else {
                        diagnostics.anomaly(line_no, format_args!("face with invalid index skipped"));
                        continue;
                    };
                    let extra = tokens.len() - 1 - corner_count;
                    if !trailing_ok(extra) {
                        diagnostics.anomaly(
                            line_no,
                            format_args!("{extra} trailing face components ignored"),
                        );
                    }
                    sink(OffRecord::Face(corners));
                }
                OffState::Done => {
                    diagnostics.anomaly(line_no, format_args!("content after last face ignored"));
                }
            }
        }

        match state {
            OffState::Header => {
                return Err(LoadError::MalformedHeader {
                    line: last_line,
                    content: String::new(),
                });
            }
            OffState::Vertices | OffState::Faces => diagnostics.anomaly(
                last_line,
                format_args!(
                    "input ended early: {vertices_read}/{} vertices, {faces_read}/{} faces",
                    header.vertices, header.faces
                ),
            ),
            OffState::Done => {}
        }
        Ok(())
    }

    /// Indices are 0-based; a negative index counts back from the declared vertex total.
    fn resolve_index(token: &str, vertex_count: usize) -> Option<u32> {
        let raw = token.parse::<i64>().ok()?;
        let idx = if raw < 0 {
            vertex_count as i64 + raw
        } else {
            raw
        };
        if idx < 0 || idx as usize >= vertex_count {
            return None;
        }
        u32::try_from(idx).ok()
    }
}

impl MeshParser for HeaderCountParser {
    fn parse(&self, text: &str) -> LoadResult<MeshBuffers> {
        // Faces are only accepted once every declared vertex has been read,
        // so sizing by what was read keeps every face index in range.
        let mut vertices = 0usize;
        let mut triangles = 0usize;
        Self::walk(text, self.diagnostics, |record| match record {
            OffRecord::Vertex(_) => vertices += 1,
            OffRecord::Face(corners) => triangles += corners.len() - 2,
        })?;

        let mut mesh = MeshBuffers::with_counts(vertices, triangles);
        let mut next_vertex = 0usize;
        Self::walk(text, Diagnostics::silent(), |record| match record {
            OffRecord::Vertex(position) => {
                mesh.positions[next_vertex] = position;
                next_vertex += 1;
            }
            OffRecord::Face(corners) => mesh.push_fan(&corners),
        })?;

        self.diagnostics.info(format_args!(
            "header-count loaded: {} vertices, {} triangles",
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
        HeaderCountParser::new(Diagnostics::silent()).parse(src)
    }

    const SQUARE: &str = "\
OFF
4 2 0
0 0 0
1 0 0
1 1 0
0 1 0
3 0 1 2
3 0 2 3
";

    #[test]
    fn square_of_two_triangles() {
        let mesh = parse(SQUARE).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(!mesh.has_normals && !mesh.has_texcoords);
        assert_eq!(mesh.positions[2], [1.0, 1.0, 0.0]);
        assert!(mesh.normals.iter().all(|n| *n == [0.0; 3]));
    }

    #[test]
    fn sentinel_is_optional() {
        let without = parse(SQUARE.strip_prefix("OFF\n").unwrap()).unwrap();
        assert_eq!(without, parse(SQUARE).unwrap());

        let same_line = parse(&SQUARE.replacen("OFF\n4 2 0", "OFF 4 2 0", 1)).unwrap();
        assert_eq!(same_line, without);
    }

    #[test]
    fn polygon_is_fanned_from_first_corner() {
        let src = "OFF\n5 1 0\n0 0 0\n1 0 0\n2 1 0\n1 2 0\n0 1 0\n5 4 0 1 2 3\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![4, 0, 1, 4, 1, 2, 4, 2, 3]);
    }

    #[test]
    fn negative_index_uses_declared_total() {
        let src = "OFF\n4 1 0\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n3 0 1 -1\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![0, 1, 3]);
    }

    #[test]
    fn colours_and_comments_are_ignored() {
        let src = "\
COFF # coloured
# counts follow
3 1 3
0 0 0 255 0 0 255
1 0 0 0 255 0 255
0 1 0 0 0 255 255
3 0 1 2 0.5 0.5 0.5
";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn bad_header_is_fatal() {
        for src in ["OFF\n4 2\n", "OFF\n4 2 0 1\n", "OFF\nfour 2 0\n", "OFF\n", ""] {
            assert!(
                matches!(parse(src), Err(LoadError::MalformedHeader { .. })),
                "{src:?}"
            );
        }
    }

    #[test]
    fn stray_lines_are_skipped() {
        let src = "\
OFF
3 2 0
0 0 0
bogus vertex
1 0 0
0 1 0
x 0 1 2
3 0 1 2
2 0 1
0 0 0
";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn out_of_range_face_is_skipped() {
        let src = "OFF\n3 2 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n3 2 1 0\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.indices, vec![2, 1, 0]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn truncated_body_keeps_only_vertices_read() {
        let src = "OFF\n4 1 0\n0 0 0\n1 0 0\n";
        let mesh = parse(src).unwrap();
        assert_eq!(mesh.positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn huge_declared_count_is_not_allocated() {
        let mesh = parse("OFF\n4000000000 0 0\n0 0 0\n").unwrap();
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.normals.len(), 1);
        assert_eq!(mesh.texcoords.len(), 1);
    }

    #[test]
    fn edge_count_must_still_be_a_count() {
        assert!(matches!(
            parse("OFF\n3 1 -2\n"),
            Err(LoadError::MalformedHeader { line: 2, .. })
        ));
    }
}
