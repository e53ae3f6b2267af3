//! Orbital Space viewer
//!
//! Earth, Moon and two ships in a wgpu window with an egui HUD.
//!
//! Controls:
//! - Right mouse drag: Orbit camera
//! - Scroll: Zoom in/out
//! - Tab: Next camera target
//! - F1 / F2: First-person (player ship) / third-person camera
//! - PageDown: Cycle integration method
//! - +/-: Double / halve time scale
//! - P: Pause/resume, N: single step while paused
//! - W/S/A/D, Up/Down: Player thrusters
//! - Escape: Quit

mod equations_ui;
mod renderer;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use common::{Camera3D, CameraMode, GraphicsContext};
use equations_ui::{draw_equations_sidebar, draw_status_bar, ORBITAL_EQUATIONS, ORBITAL_VARIABLES};
use glam::{DVec3, Vec3};
use orbital_space::thrust::Thruster;
use orbital_space::{OrbitalWorld, SimConfig};
use renderer::Renderer;
use winit::{
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ControlFlow,
    keyboard::{KeyCode, PhysicalKey},
};

/// Third-person distance from the target at startup, render units
const INITIAL_CAMERA_DISTANCE: f32 = 31.855;

#[derive(Parser, Debug)]
#[command(author, version, about = "Earth-Moon orbital mechanics sandbox")]
struct Args {
    /// YAML file overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,
}

struct EguiState {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct App {
    ctx: GraphicsContext,
    renderer: Renderer,
    world: OrbitalWorld,
    camera: Camera3D,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    egui: EguiState,
}

impl App {
    fn new(ctx: GraphicsContext, world: OrbitalWorld, trail_capacity: usize) -> Self {
        let renderer = Renderer::new(&ctx, trail_capacity);
        let mut camera = Camera3D::new(ctx.aspect_ratio());
        camera.distance = INITIAL_CAMERA_DISTANCE;
        camera.update_orbital();

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &ctx.window,
            Some(ctx.window.scale_factor() as f32),
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1);

        Self {
            ctx,
            renderer,
            world,
            camera,
            mouse_pressed: false,
            last_mouse_pos: None,
            egui: EguiState {
                ctx: egui_ctx,
                state: egui_state,
                renderer: egui_renderer,
            },
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.camera.update_aspect_ratio(self.ctx.aspect_ratio());
        self.renderer
            .resize(&self.ctx.device, new_size.width, new_size.height);
    }

    /// Place the camera for this frame and return the world-space origin of render space
    fn frame_origin(&mut self) -> DVec3 {
        match self.camera.mode {
            CameraMode::ThirdPerson => {
                self.camera.target = Vec3::ZERO;
                self.camera.up = Vec3::Y;
                self.camera.update_orbital();
                self.world.camera_target_pos()
            }
            CameraMode::FirstPerson => {
                let forward = self
                    .world
                    .player_vel()
                    .try_normalize()
                    .unwrap_or(DVec3::NEG_Z)
                    .as_vec3();
                self.camera.set_eye(Vec3::ZERO);
                self.camera.target = forward;
                self.camera.up = if forward.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
                self.world.player_pos()
            }
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let origin = self.frame_origin();
        self.renderer
            .update_camera(&self.ctx.queue, &self.camera, self.world.sun_dir().as_vec3());
        let frame = self.renderer.prepare(&self.ctx.queue, &self.world, origin);

        let status = self.world.status();
        let raw_input = self.egui.state.take_egui_input(&self.ctx.window);
        let full_output = self.egui.ctx.run(raw_input, |ctx| {
            draw_equations_sidebar(ctx, "Orbital Mechanics", ORBITAL_EQUATIONS, ORBITAL_VARIABLES);
            draw_status_bar(ctx, &status);
        });

        self.egui.state.handle_platform_output(&self.ctx.window, full_output.platform_output);
        let tris = self.egui.ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui.renderer.update_texture(&self.ctx.device, &self.ctx.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.ctx.size.width, self.ctx.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.render(&mut encoder, &view, &frame);

        self.egui.renderer.update_buffers(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            &tris,
            &screen_descriptor,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui.renderer.render(&mut render_pass, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }

    fn thruster_for(key: KeyCode) -> Option<Thruster> {
        match key {
            KeyCode::KeyW => Some(Thruster::Forward),
            KeyCode::KeyS => Some(Thruster::Back),
            KeyCode::KeyA => Some(Thruster::Left),
            KeyCode::KeyD => Some(Thruster::Right),
            KeyCode::ArrowUp => Some(Thruster::Up),
            KeyCode::ArrowDown => Some(Thruster::Down),
            _ => None,
        }
    }

    /// Returns false when the app should exit
    fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        if let Some(thruster) = Self::thruster_for(key) {
            self.world.set_thruster(thruster, state == ElementState::Pressed);
            return true;
        }

        if state != ElementState::Pressed {
            return true;
        }

        match key {
            KeyCode::Escape => return false,
            KeyCode::Tab => self.world.cycle_camera_target(),
            KeyCode::F1 => {
                self.camera.mode = CameraMode::FirstPerson;
                log::debug!("camera: first person");
            }
            KeyCode::F2 => {
                self.camera.mode = CameraMode::ThirdPerson;
                log::debug!("camera: third person");
            }
            KeyCode::PageDown => self.world.cycle_method(),
            KeyCode::Equal | KeyCode::NumpadAdd => self.world.clock.speed_up(),
            KeyCode::Minus | KeyCode::NumpadSubtract => self.world.clock.slow_down(),
            KeyCode::KeyP => self.world.clock.toggle_pause(),
            KeyCode::KeyN => self.world.clock.step_once(),
            _ => {}
        }
        true
    }

    fn handle_mouse_move(&mut self, x: f64, y: f64) {
        if self.mouse_pressed {
            if let Some((last_x, last_y)) = self.last_mouse_pos {
                let dx = (x - last_x) as f32 * 0.01;
                let dy = (y - last_y) as f32 * 0.01;
                self.camera.orbit(-dx, -dy);
            }
            self.last_mouse_pos = Some((x, y));
        }
    }

    fn handle_scroll(&mut self, notches: f32) {
        self.camera.zoom(notches);
    }

    fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui.state.on_window_event(&self.ctx.window, event).consumed
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = SimConfig::from_yaml_str(&yaml)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    log::info!("loaded config from {}", path.display());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let world = OrbitalWorld::new(&config).context("failed to build the Earth-Moon system")?;
    log::info!(
        "world ready: {} camera targets, method {}",
        world.entities.num_camera_targets(),
        world.method()
    );

    let (ctx, event_loop) = pollster::block_on(GraphicsContext::new(
        &config.window.title,
        config.window.width,
        config.window.height,
    ))?;

    let mut app = App::new(ctx, world, config.trail.capacity);
    let mut last_time = Instant::now();

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { ref event, .. } => {
                let consumed = app.handle_window_event(event);

                if !consumed {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(size) => app.resize(*size),
                        WindowEvent::MouseInput { state, button, .. } => {
                            if *button == MouseButton::Right {
                                app.mouse_pressed = *state == ElementState::Pressed;
                                if !app.mouse_pressed {
                                    app.last_mouse_pos = None;
                                }
                            }
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            app.handle_mouse_move(position.x, position.y);
                        }
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    physical_key: PhysicalKey::Code(key),
                                    state,
                                    repeat: false,
                                    ..
                                },
                            ..
                        } => {
                            if !app.handle_key(*key, *state) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::MouseWheel { delta, .. } => {
                            let notches = match delta {
                                MouseScrollDelta::LineDelta(_, y) => *y,
                                MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                            };
                            app.handle_scroll(notches);
                        }
                        WindowEvent::RedrawRequested => {
                            let now = Instant::now();
                            let elapsed = now - last_time;
                            last_time = now;

                            app.world.tick(elapsed);
                            match app.render() {
                                Ok(_) => {}
                                Err(wgpu::SurfaceError::Lost) => app.resize(app.ctx.size),
                                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                                Err(e) => log::error!("render error: {:?}", e),
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                app.ctx.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
