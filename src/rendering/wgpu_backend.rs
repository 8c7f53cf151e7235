use crate::rendering::backend::{BufferHandle, ProgramHandle, RenderBackend};
use crate::{MapError, Result};
use fxhash::FxHashMap;
use wgpu::{Device, Queue, RenderPipeline, TextureFormat, TextureView};

const INITIAL_BUFFER_BYTES: u64 = 4096;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

/// Line-strip renderer on wgpu.
///
/// Draws load the existing contents of the target view, so layers composite
/// over whatever the host already rendered this frame.
pub struct WgpuLineBackend {
    device: Device,
    queue: Queue,
    format: TextureFormat,
    target: Option<TextureView>,
    programs: FxHashMap<ProgramHandle, RenderPipeline>,
    buffers: FxHashMap<BufferHandle, GpuBuffer>,
    next_handle: u32,
}

impl WgpuLineBackend {
    pub fn from_device(device: Device, queue: Queue, format: TextureFormat) -> Self {
        Self {
            device,
            queue,
            format,
            target: None,
            programs: FxHashMap::default(),
            buffers: FxHashMap::default(),
            next_handle: 0,
        }
    }

    /// Backend on the default adapter, without a surface
    pub async fn new_headless(format: TextureFormat) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            dx12_shader_compiler: Default::default(),
            flags: wgpu::InstanceFlags::default(),
            gles_minor_version: wgpu::Gles3MinorVersion::Automatic,
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| MapError::Render("Failed to find an appropriate adapter".to_string()))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("IxMaps Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| MapError::Render(format!("Failed to create device: {}", e)))?;

        Ok(Self::from_device(device, queue, format))
    }

    /// View that subsequent draws render into
    pub fn set_target(&mut self, view: TextureView) {
        self.target = Some(view);
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn vertex_buffer(&self, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Projection Layer Vertices"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

impl RenderBackend for WgpuLineBackend {
    fn compile_program(&mut self, vertex_src: &str, fragment_src: &str) -> Result<ProgramHandle> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Projection Layer Vertex Shader"),
                source: wgpu::ShaderSource::Wgsl(vertex_src.into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Projection Layer Fragment Shader"),
                source: wgpu::ShaderSource::Wgsl(fragment_src.into()),
            });

        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Projection Layer Pipeline Layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Projection Layer Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: 8, // position (8)
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: 0,
                        }],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(MapError::Render(format!("Failed to build line program: {}", error)));
        }

        let handle = ProgramHandle(self.next_handle());
        self.programs.insert(handle, pipeline);
        Ok(handle)
    }

    fn create_buffer(&mut self) -> Result<BufferHandle> {
        let buffer = self.vertex_buffer(INITIAL_BUFFER_BYTES);
        let handle = BufferHandle(self.next_handle());
        self.buffers.insert(
            handle,
            GpuBuffer {
                buffer,
                capacity: INITIAL_BUFFER_BYTES,
            },
        );
        Ok(handle)
    }

    fn upload_vertices(&mut self, buffer: BufferHandle, vertices: &[f32]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let needed = bytes.len() as u64;

        let capacity = self
            .buffers
            .get(&buffer)
            .map(|b| b.capacity)
            .ok_or_else(|| MapError::Render(format!("Unknown vertex buffer {:?}", buffer)))?;

        if needed > capacity {
            let capacity = needed.next_power_of_two();
            let grown = GpuBuffer {
                buffer: self.vertex_buffer(capacity),
                capacity,
            };
            if let Some(old) = self.buffers.insert(buffer, grown) {
                old.buffer.destroy();
            }
        }
        if needed > 0 {
            if let Some(gpu) = self.buffers.get(&buffer) {
                self.queue.write_buffer(&gpu.buffer, 0, bytes);
            }
        }
        Ok(())
    }

    fn draw_line_strip(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        first: u32,
        count: u32,
    ) -> Result<()> {
        let pipeline = self
            .programs
            .get(&program)
            .ok_or_else(|| MapError::Render(format!("Unknown program {:?}", program)))?;
        let gpu = self
            .buffers
            .get(&buffer)
            .ok_or_else(|| MapError::Render(format!("Unknown vertex buffer {:?}", buffer)))?;
        let view = self
            .target
            .as_ref()
            .ok_or_else(|| MapError::Render("Render target not configured".to_string()))?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Projection Layer Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Projection Layer Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_vertex_buffer(0, gpu.buffer.slice(..));
            pass.draw(first..first + count, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(gpu) = self.buffers.remove(&buffer) {
            gpu.buffer.destroy();
        }
    }
}
