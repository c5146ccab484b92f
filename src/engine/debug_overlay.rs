use egui::epaint::Shadow;
use glam::Vec2;

use super::render::{Color, DrawCommand, DrawList};

pub struct DebugStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub sim_ticks: u32,
    pub agent_count: usize,
    pub navmesh_polygons: usize,
    pub draw_commands: usize,
    pub resolution: (u32, u32),
    pub show_navmesh_polygons: bool,
    pub show_agent_paths: bool,
}

/// World units to egui screen points. `scale` is points per world unit.
pub fn to_screen(v: Vec2, scale: f32) -> egui::Pos2 {
    egui::pos2(v.x * scale, v.y * scale)
}

pub fn to_color32(color: Color) -> egui::Color32 {
    let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(byte(color.r), byte(color.g), byte(color.b), byte(color.a))
}

/// Turn recorded draw commands into egui shapes, in submission order.
pub fn scene_shapes(list: &DrawList, scale: f32) -> Vec<egui::Shape> {
    list.commands()
        .iter()
        .map(|command| match command {
            DrawCommand::Line { from, to, color } => egui::Shape::line_segment(
                [to_screen(*from, scale), to_screen(*to, scale)],
                egui::Stroke::new(1.5, to_color32(*color)),
            ),
            DrawCommand::FilledPolygon { points, color } => egui::Shape::convex_polygon(
                points.iter().map(|p| to_screen(*p, scale)).collect(),
                to_color32(*color),
                egui::Stroke::NONE,
            ),
        })
        .collect()
}

const PANEL_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(0, 0, 0, 180);

/// Where one overlay frame is painted.
pub struct OverlayTarget<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    pub screen: &'a egui_wgpu::ScreenDescriptor,
}

pub struct DebugOverlay {
    pub visible: bool,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl DebugOverlay {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = PANEL_FILL;
        visuals.window_stroke = egui::Stroke::NONE;
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::WHITE);
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            visible: true,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// Build this frame's egui output: the scene layer from `scene` (scaled
    /// by `scale` screen points per world unit) and, when `stats` is set,
    /// the F3 panel. Then paint it into `target`.
    pub fn render(
        &mut self,
        target: &mut OverlayTarget<'_>,
        window: &winit::window::Window,
        scene: &DrawList,
        scale: f32,
        stats: Option<&DebugStats>,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);
        let output = self.egui_ctx.run(raw_input, |ctx| {
            if !scene.is_empty() {
                ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("scene")))
                    .extend(scene_shapes(scene, scale));
            }
            if let Some(stats) = stats {
                stats_panel(ctx, stats);
            }
        });
        self.egui_state.handle_platform_output(window, output.platform_output);

        let primitives = self.egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        self.paint(target, &output.textures_delta, &primitives);
    }

    /// Upload textures and buffers, then draw over whatever `target.view`
    /// already holds.
    fn paint(
        &mut self,
        target: &mut OverlayTarget<'_>,
        textures: &egui::TexturesDelta,
        primitives: &[egui::ClippedPrimitive],
    ) {
        for (id, delta) in &textures.set {
            self.egui_renderer.update_texture(target.device, target.queue, *id, delta);
        }
        self.egui_renderer
            .update_buffers(target.device, target.queue, target.encoder, primitives, target.screen);

        let pass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("overlay pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view,
                resolve_target: None,
                ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.egui_renderer
            .render(&mut pass.forget_lifetime(), primitives, target.screen);

        for id in &textures.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

fn stats_panel(ctx: &egui::Context, stats: &DebugStats) {
    let lines = [
        format!("FPS: {}", stats.fps),
        format!("Frame: {:.2} ms  Ticks: {}", stats.frame_time_avg_ms, stats.sim_ticks),
        format!("Agents: {}", stats.agent_count),
        format!("Navmesh polygons: {}", stats.navmesh_polygons),
        format!("Draw commands: {}", stats.draw_commands),
        format!("Resolution: {} x {}", stats.resolution.0, stats.resolution.1),
        format!(
            "[F1] navmesh: {}  [F2] paths: {}",
            on_off(stats.show_navmesh_polygons),
            on_off(stats.show_agent_paths)
        ),
    ];
    egui::Area::new(egui::Id::new("stats"))
        .fixed_pos(egui::pos2(10.0, 10.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(PANEL_FILL)
                .inner_margin(egui::Margin::same(8.0))
                .rounding(4.0)
                .show(ui, |ui| {
                    for line in lines {
                        ui.label(line);
                    }
                });
        });
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
