// Navmesh showcase host: loads a scene description, runs the agents on a
// fixed timestep and paints the scene through the egui overlay.
//
//   F1      toggle navmesh polygons
//   F2      toggle agent paths
//   F3      toggle stats panel
//   Escape  quit

use std::path::Path;
use std::sync::Arc;

use winit::{
    event::{Event as WinitEvent, WindowEvent, ElementState, KeyEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use navmesh_showcase::engine::debug_overlay::{DebugOverlay, DebugStats, OverlayTarget};
use navmesh_showcase::engine::{DrawList, PolyanyaLibrary, Scene, SceneConfig};

const DEFAULT_SCENE: &str = "assets/scene.ron";
const FIXED_DT: f32 = 1.0 / 60.0;
/// Longest frame the simulation tries to catch up on.
const MAX_FRAME_DT: f32 = 0.25;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// APPLICATION STATE
// ============================================================================

struct State {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    overlay: DebugOverlay,

    // Simulation
    scene: Scene,
    viewport: glam::Vec2,
    draw_list: DrawList,
    navmesh_polygons: usize,
    last_update: std::time::Instant,
    accumulator: f32,
    ticks_this_second: u32,

    // Stats
    fps: u32,
    sim_ticks: u32,
    frame_time_avg_ms: f32,
}

impl State {
    async fn new(window: Arc<Window>, scene: Scene, viewport: glam::Vec2) -> AppResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or("no suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
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
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let overlay = DebugOverlay::new(&window, &device, surface_format);
        let navmesh_polygons = scene.coordinator().navmesh_polygons().len();

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            overlay,
            scene,
            viewport,
            draw_list: DrawList::new(),
            navmesh_polygons,
            last_update: std::time::Instant::now(),
            accumulator: 0.0,
            ticks_this_second: 0,
            fps: 0,
            sim_ticks: 0,
            frame_time_avg_ms: 0.0,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => {
                let show = !self.scene.show_navmesh_polygons();
                self.scene.set_show_navmesh_polygons(show);
            }
            KeyCode::F2 => {
                let show = !self.scene.show_agent_paths();
                self.scene.set_show_agent_paths(show);
            }
            KeyCode::F3 => self.overlay.toggle(),
            _ => {}
        }
    }

    /// Fixed-timestep update: the scene always advances in `FIXED_DT` steps.
    fn update(&mut self) {
        let now = std::time::Instant::now();
        let dt = (now - self.last_update).as_secs_f32().min(MAX_FRAME_DT);
        self.last_update = now;

        self.accumulator += dt;
        while self.accumulator >= FIXED_DT {
            self.scene.tick(FIXED_DT);
            self.accumulator -= FIXED_DT;
            self.ticks_this_second += 1;
        }

        self.draw_list.clear();
        self.scene.draw(&mut self.draw_list);
    }

    /// Screen points per world unit, fitting the viewport into the window.
    fn world_scale(&self) -> f32 {
        let logical = self.size.to_logical::<f32>(self.window.scale_factor());
        (logical.width / self.viewport.x).min(logical.height / self.viewport.y)
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let stats = self.overlay.visible.then(|| DebugStats {
            fps: self.fps,
            frame_time_avg_ms: self.frame_time_avg_ms,
            sim_ticks: self.sim_ticks,
            agent_count: self.scene.agent_count(),
            navmesh_polygons: self.navmesh_polygons,
            draw_commands: self.draw_list.len(),
            resolution: (self.size.width, self.size.height),
            show_navmesh_polygons: self.scene.show_navmesh_polygons(),
            show_agent_paths: self.scene.show_agent_paths(),
        });

        let scale = self.world_scale();
        let mut target = OverlayTarget {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            view: &view,
            screen: &screen_descriptor,
        };
        self.overlay
            .render(&mut target, &self.window, &self.draw_list, scale, stats.as_ref());

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

// ============================================================================
// SCENE LOADING
// ============================================================================

/// First CLI argument, else `assets/scene.ron`, else built-in defaults.
fn load_scene_config() -> AppResult<SceneConfig> {
    if let Some(path) = std::env::args().nth(1) {
        log::info!("loading scene description {path}");
        return Ok(SceneConfig::load_from_file(path)?);
    }
    if Path::new(DEFAULT_SCENE).exists() {
        log::info!("loading scene description {DEFAULT_SCENE}");
        return Ok(SceneConfig::load_from_file(DEFAULT_SCENE)?);
    }
    log::warn!("{DEFAULT_SCENE} not found, using the built-in empty scene");
    Ok(SceneConfig::default())
}

// ============================================================================
// MAIN
// ============================================================================

fn run() -> AppResult<()> {
    let scene_config = load_scene_config()?;
    let scene = Scene::from_config(&scene_config, &PolyanyaLibrary)?;
    let viewport = scene_config.viewport_size();

    let event_loop = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title("Navmesh Showcase")
        .with_inner_size(winit::dpi::LogicalSize::new(viewport.x, viewport.y));

    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut state = pollster::block_on(State::new(window.clone(), scene, viewport))?;
    let mut frame_count = 0;
    let mut last_fps_update = std::time::Instant::now();

    event_loop.run(move |event, control_flow| {
        match event {
            WinitEvent::WindowEvent {
                ref event,
                window_id,
            } if window_id == window.id() => {
                let _ = state.overlay.handle_window_event(&window, event);
                match event {
                    WindowEvent::CloseRequested
                    | WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(KeyCode::Escape),
                                ..
                            },
                        ..
                    } => control_flow.exit(),
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                state: ElementState::Pressed,
                                physical_key: PhysicalKey::Code(key),
                                repeat: false,
                                ..
                            },
                        ..
                    } => state.handle_key(*key),
                    WindowEvent::Resized(physical_size) => {
                        state.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        state.update();
                        match state.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => state.resize(state.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                            Err(e) => log::warn!("{:?}", e),
                        }

                        frame_count += 1;
                        let now = std::time::Instant::now();
                        let elapsed = (now - last_fps_update).as_secs_f32();
                        if elapsed >= 1.0 {
                            state.fps = frame_count;
                            state.frame_time_avg_ms = elapsed * 1000.0 / frame_count.max(1) as f32;
                            state.sim_ticks = state.ticks_this_second;
                            state.ticks_this_second = 0;
                            log::debug!("FPS: {} | Agents: {}", frame_count, state.scene.agent_count());
                            frame_count = 0;
                            last_fps_update = now;
                        }
                    }
                    _ => {}
                }
            }
            WinitEvent::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
