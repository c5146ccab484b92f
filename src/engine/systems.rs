// Per-frame systems and the capabilities they drive.
// Systems walk the world and call into whatever implements the capability.

use bevy_ecs::prelude::*;

use super::agent::AgentController;
use super::render::RenderSink;

/// Advances its own state by one fixed simulation step.
pub trait Tickable {
    fn tick(&mut self, delta_time: f32);
}

/// Emits draw commands describing its current state.
pub trait Drawable {
    fn draw(&self, sink: &mut dyn RenderSink);
}

/// Advance every agent by one fixed step, sequentially.
pub fn agent_tick_system(world: &mut World, delta_time: f32) {
    let mut query = world.query::<&mut AgentController>();
    for mut agent in query.iter_mut(world) {
        agent.tick(delta_time);
    }
}

/// Draw every agent (body and, if enabled, its remaining path).
pub fn agent_draw_system(world: &mut World, sink: &mut dyn RenderSink) {
    let mut query = world.query::<&AgentController>();
    for agent in query.iter(world) {
        agent.draw(sink);
    }
}
