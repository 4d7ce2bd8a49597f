//! Renderer side of mesh loading: upload `MeshBuffers` into wgpu buffers.
//!
//! Vertex data goes into one buffer laid out block by block: all positions,
//! then all normals, then all texcoords. Indices live in a separate `u32`
//! buffer. Each block is bound to its own vertex slot.

use asset::MeshBuffers;
use wgpu::{
    Buffer, BufferAddress, BufferUsages, Device, IndexFormat, RenderPass, VertexBufferLayout,
    VertexStepMode, util::DeviceExt,
};

const F32: BufferAddress = std::mem::size_of::<f32>() as BufferAddress;

pub const POSITION_STRIDE: BufferAddress = 3 * F32;
pub const NORMAL_STRIDE: BufferAddress = 3 * F32;
pub const TEXCOORD_STRIDE: BufferAddress = 2 * F32;

/// CPU copy of the block-ordered vertex buffer with byte offsets of each block.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexBlock {
    pub data: Vec<f32>,
    pub normal_offset: BufferAddress,
    pub texcoord_offset: BufferAddress,
}

impl VertexBlock {
    #[inline]
    pub fn byte_len(&self) -> BufferAddress {
        self.data.len() as BufferAddress * F32
    }
}

/// Concatenate positions, normals and texcoords into one block-ordered stream.
pub fn pack_vertex_block(mesh: &MeshBuffers) -> VertexBlock {
    let positions = mesh.flat_positions();
    let normals = mesh.flat_normals();
    let texcoords = mesh.flat_texcoords();

    let mut data = Vec::with_capacity(positions.len() + normals.len() + texcoords.len());
    data.extend_from_slice(positions);
    data.extend_from_slice(normals);
    data.extend_from_slice(texcoords);

    let normal_offset = positions.len() as BufferAddress * F32;
    let texcoord_offset = normal_offset + normals.len() as BufferAddress * F32;
    VertexBlock {
        data,
        normal_offset,
        texcoord_offset,
    }
}

/// Index and vertex counts as `u32` draw ranges, or `None` if either overflows.
pub fn draw_counts(index_len: usize, vertex_len: usize) -> Option<(u32, u32)> {
    Some((u32::try_from(index_len).ok()?, u32::try_from(vertex_len).ok()?))
}

/// GPU-resident mesh ready for an indexed draw.
pub struct GpuMesh {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
    vertex_count: u32,
    normal_offset: BufferAddress,
    texcoord_offset: BufferAddress,
    pub has_normals: bool,
    pub has_texcoords: bool,
}

impl GpuMesh {
    /// One layout per block: slot 0 position, 1 normal, 2 texcoord.
    pub const LAYOUTS: [VertexBufferLayout<'static>; 3] = [
        VertexBufferLayout {
            array_stride: POSITION_STRIDE,
            step_mode: VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3],
        },
        VertexBufferLayout {
            array_stride: NORMAL_STRIDE,
            step_mode: VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![1 => Float32x3],
        },
        VertexBufferLayout {
            array_stride: TEXCOORD_STRIDE,
            step_mode: VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![2 => Float32x2],
        },
    ];

    pub fn vertex_layouts() -> [VertexBufferLayout<'static>; 3] {
        Self::LAYOUTS
    }

    /// Upload vertex and index buffers.
    ///
    /// Returns `None` without touching the device when the mesh has more
    /// indices or vertices than a `u32` draw range can address.
    pub fn upload(device: &Device, label: &str, mesh: &MeshBuffers) -> Option<Self> {
        let Some((index_count, vertex_count)) =
            draw_counts(mesh.indices.len(), mesh.vertex_count())
        else {
            log::error!(
                "'{}' is too large to draw: {} vertices, {} indices",
                label,
                mesh.vertex_count(),
                mesh.indices.len()
            );
            return None;
        };
        let block = pack_vertex_block(mesh);
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} VB")),
            contents: bytemuck::cast_slice(&block.data),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} IB")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });
        log::debug!(
            "Uploaded '{}': {} vertices ({} bytes), {} indices",
            label,
            mesh.vertex_count(),
            block.byte_len(),
            mesh.indices.len()
        );

        Some(Self {
            vertex_buf,
            index_buf,
            index_count,
            vertex_count,
            normal_offset: block.normal_offset,
            texcoord_offset: block.texcoord_offset,
            has_normals: mesh.has_normals,
            has_texcoords: mesh.has_texcoords,
        })
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Bind the three blocks and the index buffer, then draw all triangles.
    pub fn draw(&self, rpass: &mut RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        rpass.set_vertex_buffer(0, self.vertex_buf.slice(..self.normal_offset));
        rpass.set_vertex_buffer(1, self.vertex_buf.slice(self.normal_offset..self.texcoord_offset));
        rpass.set_vertex_buffer(2, self.vertex_buf.slice(self.texcoord_offset..));
        rpass.set_index_buffer(self.index_buf.slice(..), IndexFormat::Uint32);
        rpass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
