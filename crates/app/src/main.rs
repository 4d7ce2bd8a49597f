//! meshload: load a mesh file, report what came out, optionally upload it.
//!
//! Usage: `meshload <path> [--format=obj|off|stl] [--quiet] [--no-errors]
//!                  [--upload] [--gpu-backend=auto|vulkan|dx12|metal|gl]`

use anyhow::{Context, Result, anyhow};
use asset::{Diagnostics, MeshBuffers, MeshFormat};

fn parse_backend_arg() -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_format_arg() -> Result<Option<MeshFormat>> {
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--format=") {
            return MeshFormat::from_name(&val.to_ascii_lowercase())
                .map(Some)
                .ok_or_else(|| anyhow!("Unknown mesh format '{val}' (expected obj, off or stl)"));
        }
    }
    Ok(None)
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_path_arg() -> Result<String> {
    std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .ok_or_else(|| anyhow!("Missing mesh path. Usage: meshload <path> [--format=obj|off|stl]"))
}

fn report(mesh: &MeshBuffers) {
    log::info!(
        "{} vertices, {} triangles, normals={}, texcoords={}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.has_normals,
        mesh.has_texcoords
    );
    if let Some(bounds) = mesh.bounds() {
        log::info!(
            "Bounds min={:?} max={:?} size={:?}",
            bounds.min.to_array(),
            bounds.max.to_array(),
            bounds.size().to_array()
        );
    }
}

fn upload(mesh: &MeshBuffers, backends: wgpu::Backends, label: &str) -> Result<()> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends,
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .context("No suitable GPU adapter")?;
    log::info!("Adapter: {}", adapter.get_info().name);

    let (device, _queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("meshload Device"),
        ..Default::default()
    }))
    .context("request_device failed")?;

    let gpu = renderer::GpuMesh::upload(&device, label, mesh)
        .context("Mesh exceeds the u32 draw range")?;
    log::info!(
        "Uploaded {} vertices and {} indices",
        gpu.vertex_count(),
        gpu.index_count()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = parse_path_arg()?;
    let format = parse_format_arg()?;
    let diagnostics = Diagnostics::new(!has_flag("--quiet"), !has_flag("--no-errors"));

    let mesh = match format {
        Some(format) => asset::load_mesh_with_format(&path, format, diagnostics),
        None => asset::load_mesh_from_path(&path, diagnostics),
    }
    .with_context(|| format!("Failed to load mesh: {path}"))?;
    report(&mesh);

    if has_flag("--upload") {
        upload(&mesh, parse_backend_arg(), &path)?;
    }

    Ok(())
}
