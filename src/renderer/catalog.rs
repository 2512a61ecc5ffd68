//! GPU geometry and shading programs per instance kind

use wgpu::util::DeviceExt;

use super::assets::{ShipAsset, TextureData};
use super::instance::{InstanceKind, InstanceRaw};
use super::shapes::{self, MeshData};
use super::vertex::Vertex;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex and index buffers for one mesh
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }
}

/// Mesh plus the pipeline that shades it
pub struct ModelResources {
    pub mesh: GpuMesh,
    pub pipeline: wgpu::RenderPipeline,
}

/// How a pipeline blends and writes depth
#[derive(Debug, Clone, Copy)]
struct PassStyle {
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
    depth_compare: wgpu::CompareFunction,
}

const OPAQUE: PassStyle = PassStyle {
    blend: None,
    depth_write: true,
    depth_compare: wgpu::CompareFunction::Less,
};

const TRANSLUCENT: PassStyle = PassStyle {
    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
    depth_write: false,
    depth_compare: wgpu::CompareFunction::Less,
};

/// Premultiplied additive, no depth test
const ADDITIVE: PassStyle = PassStyle {
    blend: Some(wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent::OVER,
    }),
    depth_write: false,
    depth_compare: wgpu::CompareFunction::Always,
};

/// Everything the submitter needs to draw each kind
pub struct GeometryCatalog {
    pub background: wgpu::RenderPipeline,
    pub ship: ModelResources,
    pub invader: ModelResources,
    pub laser: ModelResources,
    pub particle: ModelResources,
    pub flame: ModelResources,
    /// Group 1 for the ship pipeline: base colour, metallic-roughness, sampler
    pub ship_material: wgpu::BindGroup,
}

impl GeometryCatalog {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        ship: &ShipAsset,
    ) -> Self {
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ship_material_layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let base_color = upload_texture(
            device,
            queue,
            "ship_base_color",
            &ship.base_color,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        );
        let metallic_roughness = upload_texture(
            device,
            queue,
            "ship_metallic_roughness",
            &ship.metallic_roughness,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ship_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let ship_material = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ship_material"),
            layout: &material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&base_color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&metallic_roughness),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let model_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("model_pipeline_layout"),
            bind_group_layouts: &[camera_layout],
            immediate_size: 0,
        });
        let ship_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ship_pipeline_layout"),
            bind_group_layouts: &[camera_layout, &material_layout],
            immediate_size: 0,
        });

        let model_shader = shader(device, "model_shader", include_str!("model.wgsl"));
        let ship_shader = shader(device, "ship_shader", include_str!("ship.wgsl"));
        let flame_shader = shader(device, "flame_shader", include_str!("flame.wgsl"));
        let background_shader =
            shader(device, "background_shader", include_str!("background.wgsl"));

        let instanced = |label: &str,
                         layout: &wgpu::PipelineLayout,
                         module: &wgpu::ShaderModule,
                         style: PassStyle| {
            create_pipeline(
                device,
                label,
                layout,
                module,
                &[Vertex::desc(), InstanceRaw::desc()],
                color_format,
                style,
            )
        };

        let ship = ModelResources {
            mesh: GpuMesh::upload(device, "ship", &ship.mesh),
            pipeline: instanced("ship_pipeline", &ship_layout, &ship_shader, OPAQUE),
        };
        let invader = ModelResources {
            mesh: GpuMesh::upload(device, "invader", &shapes::voxel_invader()),
            pipeline: instanced("invader_pipeline", &model_layout, &model_shader, OPAQUE),
        };
        let laser = ModelResources {
            mesh: GpuMesh::upload(device, "laser", &shapes::cube()),
            pipeline: instanced(
                "laser_pipeline",
                &model_layout,
                &model_shader,
                PassStyle {
                    depth_write: true,
                    ..TRANSLUCENT
                },
            ),
        };
        let particle = ModelResources {
            mesh: GpuMesh::upload(device, "particle", &shapes::octahedron()),
            pipeline: instanced("particle_pipeline", &model_layout, &model_shader, TRANSLUCENT),
        };
        let flame = ModelResources {
            mesh: GpuMesh::upload(device, "flame", &shapes::quad()),
            pipeline: instanced("flame_pipeline", &model_layout, &flame_shader, ADDITIVE),
        };

        // Full-screen triangle at the far plane, behind everything
        let background = create_pipeline(
            device,
            "background_pipeline",
            &model_layout,
            &background_shader,
            &[],
            color_format,
            PassStyle {
                blend: None,
                depth_write: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
            },
        );

        log::info!("Geometry catalog ready");

        Self {
            background,
            ship,
            invader,
            laser,
            particle,
            flame,
            ship_material,
        }
    }

    pub fn model(&self, kind: InstanceKind) -> &ModelResources {
        match kind {
            InstanceKind::Ship => &self.ship,
            InstanceKind::Invader => &self.invader,
            InstanceKind::Laser => &self.laser,
            InstanceKind::Particle => &self.particle,
            InstanceKind::Flame => &self.flame,
        }
    }
}

fn shader(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    data: &TextureData,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: data.width,
                height: data.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &data.rgba,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    color_format: wgpu::TextureFormat,
    style: PassStyle,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: style.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: style.depth_write,
            depth_compare: style.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Depth attachment matching the surface size
pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
