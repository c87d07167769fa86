use super::{Generation, SdfBackend};
use crate::config::BackendKind;
use crate::error::{Result, SdfPackerError};
use crate::region::WorkingRegion;
use crate::sdf::{self, DistanceField};
use bytemuck::{Pod, Zeroable};
use tracing::{debug, info, instrument};
use wgpu::util::DeviceExt;

const SEED_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
const SOURCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PassParams {
    spread: i32,
    gradient: f32,
    _pad: [f32; 2],
}

/// Compiled render pipelines, one per stage.
struct Kernels {
    layout: wgpu::BindGroupLayout,
    seed: wgpu::RenderPipeline,
    jump: wgpu::RenderPipeline,
    finalize: wgpu::RenderPipeline,
}

/// Raster GPU backend.
///
/// Every stage is a full-screen draw into a render target; the jump passes ping-pong between two
/// seed textures. Seeds are kept in framebuffer space (pixel centers at `+0.5`), which shifts
/// seed and pixel alike and leaves every distance unchanged.
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    adapter_name: String,
    max_dimension: u32,
    kernels: Option<Kernels>,
}

impl std::fmt::Debug for GpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBackend")
            .field("adapter", &self.adapter_name)
            .field("max_dimension", &self.max_dimension)
            .field("initialized", &self.kernels.is_some())
            .finish()
    }
}

fn unavailable(reason: impl Into<String>) -> SdfPackerError {
    SdfPackerError::BackendUnavailable {
        backend: BackendKind::Gpu,
        reason: reason.into(),
    }
}

fn request_adapter(instance: &wgpu::Instance) -> Option<wgpu::Adapter> {
    pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
}

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

impl GpuBackend {
    /// Opens a device on the preferred adapter. Fails with `BackendUnavailable` when there is none.
    pub fn new() -> Result<Self> {
        let instance = instance();
        let adapter =
            request_adapter(&instance).ok_or_else(|| unavailable("no compatible GPU adapter"))?;
        let limits = adapter.limits();
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("sdf-packer device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits.clone(),
            },
            None,
        ))
        .map_err(|e| unavailable(format!("device request failed: {e}")))?;

        let adapter_name = adapter.get_info().name;
        info!(adapter = %adapter_name, "GPU device ready");
        Ok(Self {
            device,
            queue,
            adapter_name,
            max_dimension: limits.max_texture_dimension_2d,
            kernels: None,
        })
    }

    /// True when an adapter exists. Does not open a device.
    pub fn probe() -> bool {
        request_adapter(&instance()).is_some()
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn is_initialized(&self) -> bool {
        self.kernels.is_some()
    }

    fn build_kernels(&self) -> Kernels {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("jump flood"),
                source: wgpu::ShaderSource::Wgsl(include_str!("jump_flood.wgsl").into()),
            });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("jump flood bindings"),
                entries: &[
                    texture_entry(0),
                    texture_entry(1),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("jump flood layout"),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });

        let pipeline = |label: &str, entry_point: &str, format: wgpu::TextureFormat| {
            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: "vs_main",
                        buffers: &[],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point,
                        targets: &[Some(wgpu::ColorTargetState {
                            format,
                            blend: None,
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                })
        };

        Kernels {
            seed: pipeline("seed pass", "fs_seed", SEED_FORMAT),
            jump: pipeline("jump pass", "fs_jump", SEED_FORMAT),
            finalize: pipeline("finalize pass", "fs_finalize", FIELD_FORMAT),
            layout,
        }
    }

    fn target(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn bind_group(
        &self,
        kernels: &Kernels,
        source: &wgpu::TextureView,
        seeds: &wgpu::TextureView,
        params: PassParams,
    ) -> wgpu::BindGroup {
        let uniform = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("pass params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pass bindings"),
            layout: &kernels.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(seeds),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform.as_entire_binding(),
                },
            ],
        })
    }

    fn draw(
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: None,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    fn run(
        &self,
        kernels: &Kernels,
        region: &WorkingRegion,
        gradient_px: f32,
    ) -> Result<DistanceField> {
        let (width, height) = (region.width(), region.height());
        if width > self.max_dimension || height > self.max_dimension {
            return Err(SdfPackerError::Gpu(format!(
                "region {width}x{height} exceeds the device texture limit of {}",
                self.max_dimension
            )));
        }
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let source = self.target("source", width, height, SOURCE_FORMAT);
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &source,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            region.image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            extent,
        );
        let seeds = [
            self.target("seeds a", width, height, SEED_FORMAT),
            self.target("seeds b", width, height, SEED_FORMAT),
        ];
        let field = self.target("field", width, height, FIELD_FORMAT);

        let source_view = source.create_view(&Default::default());
        let seed_views = [
            seeds[0].create_view(&Default::default()),
            seeds[1].create_view(&Default::default()),
        ];
        let field_view = field.create_view(&Default::default());

        let params = |spread: u32| PassParams {
            spread: spread as i32,
            gradient: gradient_px,
            _pad: [0.0; 2],
        };
        let offsets = sdf::jump_offsets(width, height);
        debug!(passes = offsets.len(), "encoding jump flood");

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("jump flood"),
            });

        // seed pass writes A; B is bound only to satisfy the layout
        let group = self.bind_group(kernels, &source_view, &seed_views[1], params(0));
        Self::draw(&mut encoder, &kernels.seed, &group, &seed_views[0]);
        let mut front = 0;
        for &offset in &offsets {
            let back = 1 - front;
            let group =
                self.bind_group(kernels, &source_view, &seed_views[front], params(offset));
            Self::draw(&mut encoder, &kernels.jump, &group, &seed_views[back]);
            front = back;
        }
        let group = self.bind_group(kernels, &source_view, &seed_views[front], params(0));
        Self::draw(&mut encoder, &kernels.finalize, &group, &field_view);

        let unpadded = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("field readback"),
            size: padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &field,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| SdfPackerError::Gpu(format!("readback channel closed: {e}")))?
            .map_err(|e| SdfPackerError::Gpu(format!("readback mapping failed: {e}")))?;

        let mut values = Vec::with_capacity((width * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize).take(height as usize) {
                let row: &[f32] = bytemuck::cast_slice(&row[..unpadded as usize]);
                values.extend_from_slice(row);
            }
        }
        readback.unmap();

        Ok(DistanceField {
            width,
            height,
            values,
        })
    }
}

impl SdfBackend for GpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn initialize(&mut self) -> Result<()> {
        if self.kernels.is_some() {
            return Ok(());
        }
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let kernels = self.build_kernels();
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(SdfPackerError::Gpu(format!("kernel compilation failed: {err}")));
        }
        debug!("GPU kernels compiled");
        self.kernels = Some(kernels);
        Ok(())
    }

    fn teardown(&mut self) {
        if self.kernels.take().is_some() {
            debug!("GPU kernels released");
        }
    }

    #[instrument(skip_all, fields(width = region.width(), height = region.height()))]
    fn generate(&self, region: &WorkingRegion, gradient_px: f32) -> Generation<DistanceField> {
        let Some(kernels) = &self.kernels else {
            return Generation::Deferred("GPU kernels are not compiled; call initialize()".into());
        };
        if !gradient_px.is_finite() || gradient_px <= 0.0 {
            return Generation::Failed(SdfPackerError::InvalidInput(format!(
                "gradient must be a positive number of pixels (got {gradient_px})"
            )));
        }
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let result = self.run(kernels, region, gradient_px);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Generation::Failed(SdfPackerError::Gpu(err.to_string()));
        }
        result.into()
    }
}
