//! CPU-side mesh representation produced by the loaders.

use corelib::{LoadError, LoadResult};
use glam::Vec3;

/// Indexed triangle mesh as parallel attribute streams.
///
/// `positions`, `normals` and `texcoords` always have one entry per unique
/// vertex. Normals and texcoords are zero-filled unless the source supplied
/// them; check [`has_normals`](Self::has_normals) and
/// [`has_texcoords`](Self::has_texcoords) before using them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    /// Every 3 consecutive entries form one triangle.
    pub indices: Vec<u32>,
    pub has_normals: bool,
    pub has_texcoords: bool,
}

/// Axis-aligned bounding box in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl MeshBuffers {
    /// Zero-filled attribute streams for `vertex_count` vertices and room for
    /// `triangle_count` triangles.
    pub fn with_counts(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; vertex_count],
            normals: vec![[0.0; 3]; vertex_count],
            texcoords: vec![[0.0; 2]; vertex_count],
            indices: Vec::with_capacity(triangle_count * 3),
            has_normals: false,
            has_texcoords: false,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.indices.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// `3 * vertex_count` floats.
    pub fn flat_positions(&self) -> &[f32] {
        self.positions.as_flattened()
    }

    /// `3 * vertex_count` floats; meaningful only if `has_normals`.
    pub fn flat_normals(&self) -> &[f32] {
        self.normals.as_flattened()
    }

    /// `2 * vertex_count` floats; meaningful only if `has_texcoords`.
    pub fn flat_texcoords(&self) -> &[f32] {
        self.texcoords.as_flattened()
    }

    /// Push one fan for a polygon whose corners are `corners`, anchored at the first.
    pub(crate) fn push_fan(&mut self, corners: &[u32]) {
        let Some((&anchor, rest)) = corners.split_first() else {
            return;
        };
        for pair in rest.windows(2) {
            self.indices.extend_from_slice(&[anchor, pair[0], pair[1]]);
        }
    }

    /// Check the stream shapes and that every index addresses a vertex.
    pub fn validate(&self) -> LoadResult<()> {
        let vertex_count = self.positions.len();
        if self.normals.len() != vertex_count || self.texcoords.len() != vertex_count {
            return Err(LoadError::InvalidTopology {
                index: 0,
                vertex_count,
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(LoadError::InvalidTopology {
                index: self.indices.len() as u32,
                vertex_count,
            });
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(LoadError::InvalidTopology {
                index: bad,
                vertex_count,
            });
        }
        Ok(())
    }

    /// Bounds of all positions, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.positions.iter().map(|&p| Vec3::from_array(p));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Aabb { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_of_pentagon() {
        let mut mesh = MeshBuffers::with_counts(5, 3);
        mesh.push_fan(&[0, 1, 2, 3, 4]);
        assert_eq!(
            mesh.triangles().collect::<Vec<_>>(),
            vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]
        );
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn degenerate_fans_emit_nothing() {
        let mut mesh = MeshBuffers::with_counts(2, 0);
        mesh.push_fan(&[]);
        mesh.push_fan(&[0]);
        mesh.push_fan(&[0, 1]);
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut mesh = MeshBuffers::with_counts(3, 1);
        mesh.indices.extend_from_slice(&[0, 1, 3]);
        assert!(matches!(
            mesh.validate(),
            Err(LoadError::InvalidTopology { index: 3, vertex_count: 3 })
        ));
    }

    #[test]
    fn flat_views_and_bounds() {
        let mut mesh = MeshBuffers::with_counts(2, 0);
        mesh.positions = vec![[-1.0, 2.0, 0.5], [3.0, -4.0, 0.0]];
        assert_eq!(mesh.flat_positions(), &[-1.0, 2.0, 0.5, 3.0, -4.0, 0.0]);
        assert_eq!(mesh.flat_texcoords().len(), 4);

        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -4.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 0.5));
        assert_eq!(bounds.size(), Vec3::new(4.0, 6.0, 0.5));
        assert!(MeshBuffers::default().bounds().is_none());
    }
}
