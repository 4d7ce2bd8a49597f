//! Face-list (OBJ) parser.
//!
//! Two passes over the text. The scan pass validates every face corner,
//! counts attributes and triangles, and collects the distinct corner tokens so
//! the output streams can be allocated once at their final size. The resolve
//! pass fills the raw attribute tables in file order, assigns dense indices
//! per distinct corner token and fan-triangulates each face.

use std::collections::HashSet;

use corelib::{Diagnostics, LoadError, LoadResult};

use crate::dedup::VertexIndex;
use crate::format::MeshParser;
use crate::mesh::MeshBuffers;
use crate::tokenize::{SLASH, WHITESPACE, tokenize};

/// Attribute slots present in one face corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CornerShape {
    /// `p`
    Position,
    /// `p/t`
    PositionTexcoord,
    /// `p//n`
    PositionNormal,
    /// `p/t/n`
    Full,
}

/// Raw (1-based or negative) references of one corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CornerRefs {
    position: i64,
    texcoord: Option<i64>,
    normal: Option<i64>,
}

/// Everything from `#` to the end of the line is a comment.
fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default()
}

fn malformed_face(corner: &str, line: usize) -> LoadError {
    LoadError::MalformedFace {
        line,
        corner: corner.to_owned(),
    }
}

fn classify_corner(corner: &str, line: usize) -> LoadResult<CornerShape> {
    if corner.starts_with('/') || corner.ends_with('/') {
        return Err(malformed_face(corner, line));
    }
    let slots = tokenize(corner, SLASH).len();
    let slashes = corner.matches('/').count();
    match (slots, slashes) {
        (1, 0) => Ok(CornerShape::Position),
        (2, 1) => Ok(CornerShape::PositionTexcoord),
        (2, 2) => Ok(CornerShape::PositionNormal),
        (3, 2) => Ok(CornerShape::Full),
        _ => Err(malformed_face(corner, line)),
    }
}

fn parse_corner(corner: &str, line: usize) -> LoadResult<CornerRefs> {
    let shape = classify_corner(corner, line)?;
    let slots = tokenize(corner, SLASH);
    let int = |token: &str| {
        token
            .parse::<i64>()
            .map_err(|_| malformed_face(corner, line))
    };
    let refs = match shape {
        CornerShape::Position => CornerRefs {
            position: int(slots[0])?,
            texcoord: None,
            normal: None,
        },
        CornerShape::PositionTexcoord => CornerRefs {
            position: int(slots[0])?,
            texcoord: Some(int(slots[1])?),
            normal: None,
        },
        CornerShape::PositionNormal => CornerRefs {
            position: int(slots[0])?,
            texcoord: None,
            normal: Some(int(slots[1])?),
        },
        CornerShape::Full => CornerRefs {
            position: int(slots[0])?,
            texcoord: Some(int(slots[1])?),
            normal: Some(int(slots[2])?),
        },
    };
    Ok(refs)
}

/// Map a 1-based or negative reference onto a table holding `available` entries.
/// `-1` is the most recently declared entry.
fn resolve_reference(reference: i64, available: usize, line: usize) -> LoadResult<usize> {
    let idx = match reference {
        r if r > 0 => r - 1,
        r if r < 0 => available as i64 + r,
        _ => -1,
    };
    if idx < 0 || idx as usize >= available {
        return Err(LoadError::IndexOutOfRange {
            line,
            reference,
            available,
        });
    }
    Ok(idx as usize)
}

fn parse_components<const N: usize>(
    args: &[&str],
    directive: &str,
    line: usize,
) -> LoadResult<[f32; N]> {
    let malformed = || LoadError::MalformedAttribute {
        line,
        directive: directive.to_owned(),
    };
    if args.len() < N {
        return Err(malformed());
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(args) {
        *slot = token.parse::<f32>().map_err(|_| malformed())?;
    }
    Ok(out)
}

/// What the scan pass learned about a file.
#[derive(Debug, Default)]
struct FaceListScan<'a> {
    positions: usize,
    texcoords: usize,
    normals: usize,
    faces: usize,
    triangles: usize,
    objects: usize,
    groups: usize,
    unique_corners: HashSet<&'a str>,
    has_texcoords: bool,
    has_normals: bool,
}

/// Per-load state of the resolve pass.
struct ResolvePass<'a> {
    positions: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    index: VertexIndex<&'a str>,
    mesh: MeshBuffers,
    corners: Vec<u32>,
}

impl<'a> ResolvePass<'a> {
    fn new(scan: &FaceListScan<'a>) -> Self {
        let mut mesh = MeshBuffers::with_counts(scan.unique_corners.len(), scan.triangles);
        mesh.has_texcoords = scan.has_texcoords;
        mesh.has_normals = scan.has_normals;
        Self {
            positions: Vec::with_capacity(scan.positions),
            texcoords: Vec::with_capacity(scan.texcoords),
            normals: Vec::with_capacity(scan.normals),
            index: VertexIndex::with_capacity(scan.unique_corners.len()),
            mesh,
            corners: Vec::new(),
        }
    }

    fn face(&mut self, corners: &[&'a str], line: usize) -> LoadResult<()> {
        self.corners.clear();
        for &corner in corners {
            let (dense, is_new) = self.index.get_or_insert(corner)?;
            if is_new {
                self.write_vertex(dense as usize, corner, line)?;
            }
            self.corners.push(dense);
        }
        self.mesh.push_fan(&self.corners);
        Ok(())
    }

    fn write_vertex(&mut self, slot: usize, corner: &str, line: usize) -> LoadResult<()> {
        let refs = parse_corner(corner, line)?;
        let p = resolve_reference(refs.position, self.positions.len(), line)?;
        self.mesh.positions[slot] = self.positions[p];
        if let Some(t) = refs.texcoord {
            let t = resolve_reference(t, self.texcoords.len(), line)?;
            self.mesh.texcoords[slot] = self.texcoords[t];
        }
        if let Some(n) = refs.normal {
            let n = resolve_reference(n, self.normals.len(), line)?;
            self.mesh.normals[slot] = self.normals[n];
        }
        Ok(())
    }
}

/// Parser for the face-list grammar: `v`, `vt`, `vn`, `f`, with `o`, `g`,
/// `s`, `mtllib` and `usemtl` consumed without effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct FaceListParser {
    diagnostics: Diagnostics,
}

impl FaceListParser {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self { diagnostics }
    }

    fn scan<'a>(&self, text: &'a str) -> LoadResult<FaceListScan<'a>> {
        let mut scan = FaceListScan::default();

        for (line_no, line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let tokens = tokenize(strip_comment(line), WHITESPACE);
            let Some((&directive, args)) = tokens.split_first() else {
                continue;
            };

            match directive {
                "v" => {
                    parse_components::<3>(args, directive, line_no)?;
                    scan.positions += 1;
                }
                "vt" => {
                    parse_components::<2>(args, directive, line_no)?;
                    scan.texcoords += 1;
                }
                "vn" => {
                    parse_components::<3>(args, directive, line_no)?;
                    scan.normals += 1;
                }
                "f" => {
                    for corner in args {
                        match classify_corner(corner, line_no)? {
                            CornerShape::Position => {}
                            CornerShape::PositionTexcoord => scan.has_texcoords = true,
                            CornerShape::PositionNormal => scan.has_normals = true,
                            CornerShape::Full => {
                                scan.has_texcoords = true;
                                scan.has_normals = true;
                            }
                        }
                    }
                    if args.len() < 3 {
                        self.diagnostics.anomaly(
                            line_no,
                            format_args!("face with {} corners skipped", args.len()),
                        );
                        continue;
                    }
                    scan.faces += 1;
                    scan.triangles += args.len() - 2;
                    scan.unique_corners.extend(args.iter().copied());
                }
                "o" => scan.objects += 1,
                "g" => scan.groups += 1,
                "s" | "mtllib" | "usemtl" => {}
                other => self
                    .diagnostics
                    .anomaly(line_no, format_args!("unknown directive '{other}' ignored")),
            }
        }

        self.diagnostics.info(format_args!(
            "face-list scan: {} positions, {} texcoords, {} normals, {} faces, {} objects, {} groups",
            scan.positions, scan.texcoords, scan.normals, scan.faces, scan.objects, scan.groups
        ));
        Ok(scan)
    }

    fn resolve<'a>(&self, text: &'a str, scan: &FaceListScan<'a>) -> LoadResult<MeshBuffers> {
        let mut pass = ResolvePass::new(scan);

        for (line_no, line) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let tokens = tokenize(strip_comment(line), WHITESPACE);
            let Some((&directive, args)) = tokens.split_first() else {
                continue;
            };

            match directive {
                "v" => pass
                    .positions
                    .push(parse_components::<3>(args, directive, line_no)?),
                "vt" => pass
                    .texcoords
                    .push(parse_components::<2>(args, directive, line_no)?),
                "vn" => pass
                    .normals
                    .push(parse_components::<3>(args, directive, line_no)?),
                "f" if args.len() >= 3 => pass.face(args, line_no)?,
                _ => {}
            }
        }

        self.diagnostics.info(format_args!(
            "face-list resolved: {} unique vertices, {} triangles",
            pass.index.len(),
            pass.mesh.triangle_count()
        ));
        Ok(pass.mesh)
    }
}

impl MeshParser for FaceListParser {
    fn parse(&self, text: &str) -> LoadResult<MeshBuffers> {
        let scan = self.scan(text)?;
        self.resolve(text, &scan)
    }
}
