// Rendering sink boundary.
// The simulation never touches the GPU: it emits draw commands into a
// `RenderSink`, and the host decides how to paint them.

use glam::Vec2;

/// RGBA colour, components in [0, 1], straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const AQUA: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const PURPLE: Color = Color::rgb(0.627, 0.125, 0.941);
    pub const PINK: Color = Color::rgb(1.0, 0.753, 0.796);
    pub const ORANGE: Color = Color::rgb(1.0, 0.647, 0.0);
    pub const GOLD: Color = Color::rgb(1.0, 0.843, 0.0);
    pub const DARK_CYAN: Color = Color::rgb(0.0, 0.545, 0.545);
    pub const DARK_ORANGE: Color = Color::rgb(1.0, 0.549, 0.0);
}

/// Anything that can paint lines and filled polygons.
///
/// `draw_filled_polygon` expects a convex outline; hosts are free to fan-
/// triangulate it.
pub trait RenderSink {
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color);
    fn draw_filled_polygon(&mut self, points: &[Vec2], color: Color);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line { from: Vec2, to: Vec2, color: Color },
    FilledPolygon { points: Vec<Vec2>, color: Color },
}

/// Records draw commands for one frame, in submission order.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = (Vec2, Vec2, Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Line { from, to, color } => Some((*from, *to, *color)),
            DrawCommand::FilledPolygon { .. } => None,
        })
    }

    pub fn polygons(&self) -> impl Iterator<Item = (&[Vec2], Color)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FilledPolygon { points, color } => Some((points.as_slice(), *color)),
            DrawCommand::Line { .. } => None,
        })
    }
}

impl RenderSink for DrawList {
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn draw_filled_polygon(&mut self, points: &[Vec2], color: Color) {
        self.commands.push(DrawCommand::FilledPolygon { points: points.to_vec(), color });
    }
}

/// Regular polygon approximating a circle, clockwise on a y-down screen.
pub fn circle_outline(center: Vec2, radius: f32, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            center + Vec2::from_angle(angle) * radius
        })
        .collect()
}
