use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

#[cfg(target_os = "linux")]
use winit::platform::unix::EventLoopExtRunReturn;
#[cfg(target_os = "macos")]
use winit::platform::macos::EventLoopExtRunReturn;
#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopExtRunReturn;

use crate::error::Error;
use crate::particle::Particle;
use crate::visualizer::Visualizer;

// camera setup adapted from https://sotrh.github.io/learn-wgpu/beginner/tutorial6-uniforms
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PointVertex {
    pos: [f32; 3],
}

const SHADER_SOURCE: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
};
@group(0) @binding(0)
var<uniform> camera: CameraUniform;

struct VertexInput {
    @location(0) pos: vec3<f32>,
};

@vertex
fn main_vs(in: VertexInput) -> @builtin(position) vec4<f32> {
    return camera.view_proj * vec4<f32>(in.pos, 1.0);
}

@fragment
fn main_fs() -> @location(0) vec4<f32> {
    return vec4<f32>(0.9, 0.9, 1.0, 1.0);
}
"#;

/// A pure-CPU point-cloud sink: positions come from the step engine, the
/// GPU only rasterizes points. Requires the `render` feature.
pub struct WgpuVisualizer {
    event_loop: EventLoop<()>,
    window: Window,
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    closed: bool,
}

impl WgpuVisualizer {
    pub fn new(initial_radius: f64) -> Result<Self, Error> {
        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title("barnes-hut-step")
            .build(&event_loop)
            .map_err(|e| Error::RenderError(e.to_string()))?;

        let instance = wgpu::Instance::new(wgpu::Backends::all());
        // SAFETY: `window` outlives `surface`, both owned by this struct.
        let surface = unsafe { instance.create_surface(&window) };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or_else(|| Error::RenderError("no compatible GPU adapter".into()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("barnes-hut-step device"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
            },
            None,
        ))
        .map_err(|e| Error::RenderError(e.to_string()))?;

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface
                .get_preferred_format(&adapter)
                .ok_or_else(|| Error::RenderError("no preferred surface format".into()))?,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
        };
        surface.configure(&device, &surface_config);

        let camera_uniform = build_camera_uniform(initial_radius, size.width as f32 / size.height.max(1) as f32);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(&wgpu::ShaderModuleDescriptor {
            label: Some("point cloud shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER_SOURCE)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("point cloud pipeline layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("point cloud pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "main_vs",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "main_fs",
                targets: &[wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                }],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let vertex_capacity = 1;
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point vertex buffer"),
            size: (vertex_capacity * std::mem::size_of::<PointVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            event_loop,
            window,
            surface,
            device,
            queue,
            surface_config,
            pipeline,
            camera_buffer,
            camera_bind_group,
            vertex_buffer,
            vertex_capacity,
            closed: false,
        })
    }

    fn ensure_vertex_capacity(&mut self, needed: usize) {
        if needed <= self.vertex_capacity {
            return;
        }
        self.vertex_capacity = needed.next_power_of_two();
        self.vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("point vertex buffer"),
            size: (self.vertex_capacity * std::mem::size_of::<PointVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
    }

    fn pump_events(&mut self) {
        self.event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Exit;
            if let Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } = event
            {
                self.closed = true;
            }
        });
    }
}

fn build_camera_uniform(radius: f64, aspect: f32) -> CameraUniform {
    let eye = cgmath::Point3::new(0.0, 0.0, (radius * 2.2).max(1.0) as f32);
    let target = cgmath::Point3::new(0.0, 0.0, 0.0);
    let up = cgmath::Vector3::unit_y();
    let view = cgmath::Matrix4::look_at_rh(eye, target, up);
    let proj = cgmath::perspective(cgmath::Deg(45.0_f32), aspect, 0.1, (radius * 10.0).max(10.0) as f32);
    CameraUniform {
        view_proj: (OPENGL_TO_WGPU_MATRIX * proj * view).into(),
    }
}

impl Visualizer for WgpuVisualizer {
    fn present(&mut self, particles: &[Particle], radius: f64) -> bool {
        self.pump_events();
        if self.closed {
            return true;
        }

        let aspect = self.surface_config.width as f32 / self.surface_config.height.max(1) as f32;
        let camera_uniform = build_camera_uniform(radius, aspect);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        self.ensure_vertex_capacity(particles.len().max(1));
        let vertices: Vec<PointVertex> = particles
            .iter()
            .map(|p| PointVertex {
                pos: [p.pos.x as f32, p.pos.y as f32, p.pos.z as f32],
            })
            .collect();
        self.queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(_) => return self.closed,
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame encoder") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("point cloud pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r: 0.01, g: 0.0, b: 0.05, a: 1.0 }),
                        store: true,
                    },
                }],
                depth_stencil_attachment: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..vertices.len() as u32, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        output.present();

        self.closed
    }
}
