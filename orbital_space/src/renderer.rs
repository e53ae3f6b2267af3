//! wgpu renderer for the Earth-Moon scene
//!
//! The scene is rebuilt from the world every frame in camera-relative render
//! space: world positions minus the view origin, scaled to megametres, then
//! narrowed to `f32`.

use common::{Camera3D, CameraUniform, GraphicsContext, Vertex};
use glam::{DVec3, Vec3};
use orbital_space::math::{to_render_space, RENDER_SCALE};
use orbital_space::world::OrbitalWorld;
use wgpu::util::DeviceExt;

/// Samples per osculating orbit line
const ORBIT_SEGMENTS: usize = 256;
/// Angular radius of point markers, radians
const MARKER_SIZE: f32 = 0.006;
const MAX_BILLBOARDS: usize = 64;

/// Instance data for one billboard
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BillboardInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
    /// 1.0 for a shaded sphere, 0.0 for a flat marker
    pub lit: f32,
}

impl BillboardInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32,
        4 => Float32x4,
        5 => Float32,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BillboardInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }

    fn sphere(position: Vec3, radius: f32, rgb: [f32; 3]) -> Self {
        Self {
            position: position.to_array(),
            radius,
            color: [rgb[0], rgb[1], rgb[2], 1.0],
            lit: 1.0,
        }
    }

    fn marker(position: Vec3, rgb: [f32; 3]) -> Self {
        Self {
            position: position.to_array(),
            radius: MARKER_SIZE,
            color: [rgb[0], rgb[1], rgb[2], 1.0],
            lit: 0.0,
        }
    }
}

/// Quad vertex for billboards
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

impl QuadVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

const QUAD_VERTICES: &[QuadVertex] = &[
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
];

/// What `prepare` uploaded this frame
pub struct FrameCounts {
    pub billboards: u32,
    pub lines: Vec<(u32, u32)>,
}

pub struct Renderer {
    billboard_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    skybox_pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    max_line_vertices: usize,
}

impl Renderer {
    pub fn new(ctx: &GraphicsContext, trail_capacity: usize) -> Self {
        let device = &ctx.device;
        // Three trails and three orbits, each drawn as its own strip
        let max_line_vertices = 3 * (trail_capacity + ORBIT_SEGMENTS);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Orbital Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/orbital.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
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
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_texture = Self::create_depth_texture(device, ctx.size.width, ctx.size.height);

        let depth_stencil_state = Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let color_target = [Some(wgpu::ColorTargetState {
            format: ctx.config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let billboard_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Billboard Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_billboard",
                buffers: &[QuadVertex::layout(), BillboardInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_billboard",
                targets: &color_target,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: depth_stencil_state.clone(),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_line",
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_line",
                targets: &color_target,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                ..Default::default()
            },
            depth_stencil: depth_stencil_state,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let skybox_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Skybox Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_skybox",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_skybox",
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Buffer"),
            contents: bytemuck::cast_slice(QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Billboard Buffer"),
            size: (std::mem::size_of::<BillboardInstance>() * MAX_BILLBOARDS) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let line_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Buffer"),
            size: (std::mem::size_of::<Vertex>() * max_line_vertices) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            billboard_pipeline,
            line_pipeline,
            skybox_pipeline,
            quad_buffer,
            instance_buffer,
            line_buffer,
            camera_buffer,
            camera_bind_group,
            depth_texture,
            max_line_vertices,
        }
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn update_camera(&self, queue: &wgpu::Queue, camera: &Camera3D, light_dir: Vec3) {
        let uniform = CameraUniform::from_camera_3d(camera, light_dir);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Upload bodies, markers, trails and orbits relative to `origin`
    pub fn prepare(&self, queue: &wgpu::Queue, world: &OrbitalWorld, origin: DVec3) -> FrameCounts {
        let physics = &world.physics;
        let entities = &world.entities;
        let render = |pos: DVec3| to_render_space(pos, origin);

        let mut billboards = Vec::new();
        for planet in entities.planets() {
            let body = physics.grav_body(planet.grav_body);
            billboards.push(BillboardInstance::sphere(
                render(body.pos),
                (body.radius * RENDER_SCALE) as f32,
                planet.colour,
            ));
        }
        for moon in entities.moons() {
            let body = physics.grav_body(moon.grav_body);
            billboards.push(BillboardInstance::sphere(
                render(body.pos),
                (body.radius * RENDER_SCALE) as f32,
                moon.colour,
            ));
        }
        for ship in entities.ships() {
            billboards.push(BillboardInstance::marker(
                render(physics.position(ship.particle_body)),
                ship.colour,
            ));
        }
        for poi in entities.pois() {
            billboards.push(BillboardInstance::marker(render(poi.pos), poi.colour));
        }
        billboards.truncate(MAX_BILLBOARDS);
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&billboards));

        let mut vertices: Vec<Vertex> = Vec::new();
        let mut lines = Vec::new();
        let mut push_strip = |points: &mut dyn Iterator<Item = (DVec3, [f32; 3])>| {
            let start = vertices.len() as u32;
            for (pos, rgb) in points {
                if vertices.len() >= self.max_line_vertices {
                    break;
                }
                vertices.push(Vertex::new(render(pos).to_array(), [rgb[0], rgb[1], rgb[2], 1.0]));
            }
            let count = vertices.len() as u32 - start;
            if count > 1 {
                lines.push((start, count));
            }
        };

        for moon in entities.moons() {
            push_strip(&mut entities.trail(moon.trail).coloured_points());
            if let Some(orbit) = &moon.orbit {
                let colour = moon.orbit_colour;
                push_strip(&mut orbit.sample_points(ORBIT_SEGMENTS).into_iter().map(|p| (p, colour)));
            }
        }
        for ship in entities.ships() {
            push_strip(&mut entities.trail(ship.trail).coloured_points());
            if let Some(orbit) = &ship.orbit {
                let colour = ship.orbit_colour;
                push_strip(&mut orbit.sample_points(ORBIT_SEGMENTS).into_iter().map(|p| (p, colour)));
            }
        }

        if !vertices.is_empty() {
            queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(&vertices));
        }

        FrameCounts {
            billboards: billboards.len() as u32,
            lines,
        }
    }

    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, frame: &FrameCounts) {
        // Star field, no depth
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Skybox Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.skybox_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !frame.lines.is_empty() {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.line_buffer.slice(..));
                for (start, count) in &frame.lines {
                    render_pass.draw(*start..(*start + *count), 0..1);
                }
            }

            if frame.billboards > 0 {
                render_pass.set_pipeline(&self.billboard_pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                render_pass.draw(0..6, 0..frame.billboards);
            }
        }
    }
}
