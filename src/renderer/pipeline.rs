//! WebGPU render state and draw submission
//!
//! Buffers are fully repacked and uploaded every frame. The submission order
//! is computed by [`plan_draws`] so it can be checked without a GPU.

use thiserror::Error;

use super::assets::{AssetError, ShipSource, load_ship};
use super::camera::{CameraController, CameraUniform};
use super::catalog::{GeometryCatalog, create_depth_view};
use super::instance::{InstanceBatch, InstanceKind, InstanceRaw};
use crate::consts::MAX_INSTANCES;
use crate::palette;

/// Renderer startup failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// One entry of a frame's submission plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStep {
    /// Full-screen background triangle
    Background,
    /// `count` instances starting `byte_offset` into the instance buffer
    Instances {
        kind: InstanceKind,
        byte_offset: wgpu::BufferAddress,
        count: u32,
    },
}

/// Background first, then every non-empty group in draw order.
///
/// Groups are addressed by byte offset rather than first instance so the
/// plan also works on backends without base-instance support.
pub fn plan_draws(batch: &InstanceBatch) -> Vec<DrawStep> {
    let stride = std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress;
    std::iter::once(DrawStep::Background)
        .chain(batch.groups.iter().map(|group| DrawStep::Instances {
            kind: group.kind,
            byte_offset: group.first_instance as wgpu::BufferAddress * stride,
            count: group.count,
        }))
        .collect()
}

/// What one rendered frame cost
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub instances: usize,
    pub dropped: usize,
    pub draw_calls: u32,
}

/// Running count of instances lost to the capacity limit
#[derive(Debug, Clone, Copy, Default)]
pub struct DropTracker {
    pub total: u64,
    pub peak: usize,
}

impl DropTracker {
    /// Record a frame's drops. Returns true when the frame is worth a warning:
    /// the first saturation of the run or a new per-frame peak.
    pub fn record(&mut self, dropped: usize) -> bool {
        if dropped == 0 {
            return false;
        }
        let first = self.total == 0;
        self.total += dropped as u64;
        if first || dropped > self.peak {
            self.peak = self.peak.max(dropped);
            return true;
        }
        false
    }
}

pub struct RenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    catalog: GeometryCatalog,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    depth_view: wgpu::TextureView,
    drops: DropTracker,
    /// Viewport size in pixels
    pub size: (u32, u32),
}

impl RenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        ship_source: &dyn ShipSource,
    ) -> Result<Self, RenderError> {
        let ship = load_ship(ship_source)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("invader-strike-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera_bind_group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instances"),
            size: (std::mem::size_of::<InstanceRaw>() * MAX_INSTANCES) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let catalog = GeometryCatalog::new(&device, &queue, surface_format, &camera_layout, &ship);
        let depth_view = create_depth_view(&device, config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            catalog,
            camera_buffer,
            camera_bind_group,
            instance_buffer,
            depth_view,
            drops: DropTracker::default(),
            size: (width, height),
        })
    }

    /// Instances that fit in the per-frame buffer
    pub fn capacity(&self) -> usize {
        MAX_INSTANCES
    }

    /// Instances dropped to saturation since startup
    pub fn total_dropped(&self) -> u64 {
        self.drops.total
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height);
        }
    }

    /// Upload the batch and camera, then execute the draw plan
    pub fn render(
        &mut self,
        batch: &InstanceBatch,
        camera: &CameraController,
    ) -> Result<FrameStats, wgpu::SurfaceError> {
        if self.drops.record(batch.dropped) {
            log::warn!(
                "Instance capacity {} saturated: {} dropped this frame, {} total",
                self.capacity(),
                batch.dropped,
                self.total_dropped()
            );
        } else if batch.dropped > 0 {
            log::debug!("{} instances dropped this frame", batch.dropped);
        }

        let instance_bytes = batch.as_bytes();
        let buffer_size = self.instance_buffer.size();
        if instance_bytes.len() as u64 > buffer_size {
            log::error!(
                "Batch of {} instances exceeds capacity {}, skipping overflow",
                batch.len(),
                self.capacity()
            );
        }
        let upload_len = (instance_bytes.len() as u64).min(buffer_size) as usize;

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&camera.uniform()),
        );
        if upload_len > 0 {
            self.queue
                .write_buffer(&self.instance_buffer, 0, &instance_bytes[..upload_len]);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let [r, g, b, a] = palette::BACKGROUND.map(f64::from);
        let stride = std::mem::size_of::<InstanceRaw>() as u64;
        let mut draw_calls = 0;

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for step in plan_draws(batch) {
                match step {
                    DrawStep::Background => {
                        render_pass.set_pipeline(&self.catalog.background);
                        render_pass.draw(0..3, 0..1);
                    }
                    DrawStep::Instances {
                        kind,
                        byte_offset,
                        count,
                    } => {
                        let end = byte_offset + count as u64 * stride;
                        if end > upload_len as u64 {
                            continue;
                        }
                        let model = self.catalog.model(kind);
                        render_pass.set_pipeline(&model.pipeline);
                        if kind == InstanceKind::Ship {
                            render_pass.set_bind_group(1, &self.catalog.ship_material, &[]);
                        }
                        render_pass.set_vertex_buffer(0, model.mesh.vertex_buffer.slice(..));
                        render_pass
                            .set_vertex_buffer(1, self.instance_buffer.slice(byte_offset..end));
                        render_pass.set_index_buffer(
                            model.mesh.index_buffer.slice(..),
                            wgpu::IndexFormat::Uint16,
                        );
                        render_pass.draw_indexed(0..model.mesh.index_count, 0, 0..count);
                    }
                }
                draw_calls += 1;
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(FrameStats {
            instances: upload_len / stride as usize,
            dropped: batch.dropped,
            draw_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::instance::{DrawGroup, pack};
    use crate::sim::GameState;
    use crate::tuning::Tuning;

    #[test]
    fn test_plan_starts_with_background_and_ends_with_flame() {
        let state = GameState::new(1, Tuning::default());
        let batch = pack(&state.snapshot(), MAX_INSTANCES);
        let plan = plan_draws(&batch);

        assert_eq!(plan.len(), batch.groups.len() + 1);
        assert_eq!(plan[0], DrawStep::Background);
        assert!(matches!(
            plan.last(),
            Some(DrawStep::Instances {
                kind: InstanceKind::Flame,
                ..
            })
        ));
    }

    #[test]
    fn test_plan_offsets_accumulate() {
        let batch = InstanceBatch {
            instances: vec![InstanceRaw::default(); 6],
            groups: vec![
                DrawGroup {
                    kind: InstanceKind::Ship,
                    first_instance: 0,
                    count: 1,
                },
                DrawGroup {
                    kind: InstanceKind::Laser,
                    first_instance: 1,
                    count: 3,
                },
                DrawGroup {
                    kind: InstanceKind::Flame,
                    first_instance: 4,
                    count: 2,
                },
            ],
            dropped: 0,
        };

        let plan = plan_draws(&batch);
        assert_eq!(
            plan[1..],
            [
                DrawStep::Instances {
                    kind: InstanceKind::Ship,
                    byte_offset: 0,
                    count: 1
                },
                DrawStep::Instances {
                    kind: InstanceKind::Laser,
                    byte_offset: 48,
                    count: 3
                },
                DrawStep::Instances {
                    kind: InstanceKind::Flame,
                    byte_offset: 192,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_empty_batch_draws_only_background() {
        let plan = plan_draws(&InstanceBatch::default());
        assert_eq!(plan, vec![DrawStep::Background]);
    }

    #[test]
    fn test_drop_tracker_warns_on_first_and_new_peak() {
        let mut drops = DropTracker::default();
        assert!(!drops.record(0));
        assert!(drops.record(5));
        assert!(!drops.record(3));
        assert!(!drops.record(5));
        assert!(drops.record(8));
        assert_eq!(drops.total, 21);
        assert_eq!(drops.peak, 8);
    }
}
