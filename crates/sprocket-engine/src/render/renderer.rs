//! wgpu quad renderer behind the [`Surface`] trait.
//!
//! Entities draw through [`CommandSurface`], which flattens every call --
//! rectangles, circles, bitmap text -- into colored quads in pixel space.
//! On present, [`QuadRenderer`] uploads the quads and issues a single
//! render pass. No depth buffer; draw order is paint order, matching the
//! surface contract.
//!
//! GPU setup is async (adapter and device selection), driven to completion
//! with `pollster` during platform construction. If no suitable adapter or
//! device exists the error is returned and callers can fall back to the
//! headless platform.

use std::sync::Arc;

use sprocket_core::draw::{Color, Font, Surface};
use sprocket_core::math::Vec2;
use wgpu::util::DeviceExt;

use super::text;

// ---------------------------------------------------------------------------
// Vertex
// ---------------------------------------------------------------------------

/// A single vertex with pixel-space position and RGBA color, sent to the
/// GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck_derive::Pod, bytemuck_derive::Zeroable)]
pub(crate) struct Vertex {
    position: [f32; 2],
    color: [f32; 4],
}

impl Vertex {
    /// Vertex buffer layout for the shader.
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// ScreenProjection
// ---------------------------------------------------------------------------

/// Maps pixel coordinates to clip space.
///
/// The drawing surface uses the window's pixel grid: origin at the top
/// left, y growing downward. The projection produces a column-major 4x4
/// matrix taking `(0, 0)` to clip `(-1, 1)` and `(width, height)` to clip
/// `(1, -1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenProjection {
    /// Surface width in pixels.
    pub width: f32,
    /// Surface height in pixels.
    pub height: f32,
}

impl ScreenProjection {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    /// Column-major projection matrix for the shader's uniform.
    pub fn matrix(&self) -> [f32; 16] {
        let sx = 2.0 / self.width;
        let sy = -2.0 / self.height;

        // Column-major layout; the y axis flips so pixel-down maps to
        // clip-up.
        [
            sx, 0.0, 0.0, 0.0, // column 0
            0.0, sy, 0.0, 0.0, // column 1
            0.0, 0.0, 1.0, 0.0, // column 2
            -1.0, 1.0, 0.0, 1.0, // column 3
        ]
    }
}

// ---------------------------------------------------------------------------
// CommandSurface
// ---------------------------------------------------------------------------

/// Triangle segments used to approximate a filled circle.
const CIRCLE_SEGMENTS: u32 = 24;

/// The windowed [`Surface`] implementation: accumulates one frame's drawing
/// as quads.
///
/// `fill` starts a frame over -- it records the clear color and discards
/// the quads drawn so far, matching a full-surface clear. Everything else
/// appends. The platform reads the accumulated frame on present and hands
/// it to [`QuadRenderer`].
#[derive(Debug)]
pub struct CommandSurface {
    width: u32,
    height: u32,
    clear_color: Color,
    vertices: Vec<Vertex>,
}

impl CommandSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear_color: Color::BLACK,
            vertices: Vec::new(),
        }
    }

    pub(crate) fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub(crate) fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub(crate) fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Number of quads accumulated for the current frame.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 6
    }

    fn push_quad(&mut self, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
        let (x0, y0, x1, y1) = (x, y, x + w, y + h);
        self.vertices.extend_from_slice(&[
            Vertex { position: [x0, y0], color },
            Vertex { position: [x1, y0], color },
            Vertex { position: [x1, y1], color },
            Vertex { position: [x0, y0], color },
            Vertex { position: [x1, y1], color },
            Vertex { position: [x0, y1], color },
        ]);
    }

    fn push_text(&mut self, font: Font, text: &str, origin: Vec2, color: Color) {
        let scale = text::scale_for_size(font.size());
        let color = color.as_f32_rgba();
        let advance = text::GLYPH_ADVANCE as f32 * scale;

        for (index, ch) in text.chars().enumerate() {
            let Some(glyph) = text::glyph(ch) else {
                continue;
            };
            let cell_x = origin.x as f32 + index as f32 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..text::GLYPH_COLS {
                    if (bits >> (text::GLYPH_COLS - 1 - col)) & 1 == 1 {
                        self.push_quad(
                            cell_x + col as f32 * scale,
                            origin.y as f32 + row as f32 * scale,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }
}

impl Surface for CommandSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill(&mut self, color: Color) {
        self.clear_color = color;
        self.vertices.clear();
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        self.push_quad(
            origin.x as f32,
            origin.y as f32,
            size.x as f32,
            size.y as f32,
            color.as_f32_rgba(),
        );
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let color = color.as_f32_rgba();
        let (cx, cy, r) = (center.x as f32, center.y as f32, radius as f32);
        let step = std::f32::consts::TAU / CIRCLE_SEGMENTS as f32;
        for segment in 0..CIRCLE_SEGMENTS {
            let a0 = segment as f32 * step;
            let a1 = a0 + step;
            self.vertices.extend_from_slice(&[
                Vertex { position: [cx, cy], color },
                Vertex {
                    position: [cx + r * a0.cos(), cy + r * a0.sin()],
                    color,
                },
                Vertex {
                    position: [cx + r * a1.cos(), cy + r * a1.sin()],
                    color,
                },
            ]);
        }
    }

    fn draw_text(&mut self, font: Font, text: &str, origin: Vec2, color: Color) {
        self.push_text(font, text, origin, color);
    }

    fn draw_text_centered(&mut self, font: Font, text: &str, center: Vec2, color: Color) {
        let scale = text::scale_for_size(font.size());
        let origin = Vec2::new(
            center.x - f64::from(text::text_width(text, scale)) / 2.0,
            center.y - f64::from(text::text_height(scale)) / 2.0,
        );
        self.push_text(font, text, origin, color);
    }
}

// ---------------------------------------------------------------------------
// Vertex budget
// ---------------------------------------------------------------------------

/// Upper bound on quads per frame (sizes the GPU vertex buffer). Bitmap
/// text spends one quad per lit glyph pixel, so the budget is generous.
const MAX_QUADS: usize = 8192;
const VERTICES_PER_QUAD: usize = 6;
const MAX_VERTICES: usize = MAX_QUADS * VERTICES_PER_QUAD;

// ---------------------------------------------------------------------------
// QuadRenderer
// ---------------------------------------------------------------------------

/// Owns the GPU objects and turns one frame's quads into a presented image.
///
/// The renderer does not own the event loop; the engine's frame loop drives
/// it through the platform's present call.
pub struct QuadRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    projection_buffer: wgpu::Buffer,
    projection_bind_group: wgpu::BindGroup,
    projection: ScreenProjection,
}

impl QuadRenderer {
    /// Initialize wgpu against `window`: surface, device, queue, pipeline.
    ///
    /// Async because adapter and device selection are; call through
    /// `pollster::block_on` from synchronous setup code.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable GPU adapter or device is available.
    pub async fn new(window: Arc<winit::window::Window>) -> Result<Self, anyhow::Error> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("sprocket_quad_renderer"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader_source = include_str!("shaders.wgsl");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quad_shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let projection = ScreenProjection::new(width, height);
        let projection_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen_projection_uniform"),
            contents: bytemuck::cast_slice(&projection.matrix()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let projection_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("screen_projection_bind_group_layout"),
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

        let projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("screen_projection_bind_group"),
            layout: &projection_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quad_pipeline_layout"),
            bind_group_layouts: &[&projection_bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quad_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
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
            cache: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_vertex_buffer"),
            size: (MAX_VERTICES * std::mem::size_of::<Vertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            vertex_buffer,
            projection_buffer,
            projection_bind_group,
            projection,
        })
    }

    /// Render one frame: clear to `clear_color`, draw `vertices`, present.
    ///
    /// # Errors
    ///
    /// Returns a [`wgpu::SurfaceError`] if the surface cannot provide an
    /// output texture (window minimized, surface lost).
    pub(crate) fn render(
        &mut self,
        clear_color: Color,
        vertices: &[Vertex],
    ) -> Result<(), wgpu::SurfaceError> {
        self.queue.write_buffer(
            &self.projection_buffer,
            0,
            bytemuck::cast_slice(&self.projection.matrix()),
        );

        if vertices.len() > MAX_VERTICES {
            tracing::warn!(
                quads = vertices.len() / VERTICES_PER_QUAD,
                budget = MAX_QUADS,
                "frame exceeds the quad budget, truncating"
            );
        }
        let vertices = &vertices[..vertices.len().min(MAX_VERTICES)];
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("quad_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear_color.r) / 255.0,
                            g: f64::from(clear_color.g) / 255.0,
                            b: f64::from(clear_color.b) / 255.0,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.projection_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

            let vertex_count = vertices.len() as u32;
            if vertex_count > 0 {
                render_pass.draw(0..vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    /// Reconfigure the surface after a window resize. Zero dimensions are
    /// ignored (minimized window).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.projection = ScreenProjection::new(width, height);
            self.surface.configure(&self.device, &self.config);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
