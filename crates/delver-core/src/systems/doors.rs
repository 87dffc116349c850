//! Door trigger system - opens doors as the viewer walks through them

use glam::Vec3;
use hecs::World;
use log::debug;

use crate::components::{DoorState, Transform};
use crate::generation::ExpansionDriver;

/// Distance from a door at which the viewer counts as inside its trigger.
pub const DOOR_TRIGGER_RADIUS: f32 = 1.5;

/// Door trigger transitions seen this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorEvents {
    pub entered: u32,
    pub exited: u32,
}

/// Update door trigger state for a viewer at `viewer`.
/// A door opens when the viewer enters its trigger and closes when they
/// leave. Any entry asks `driver` for a fill pass.
pub fn door_trigger_system(
    world: &mut World,
    viewer: Vec3,
    radius: f32,
    driver: &mut ExpansionDriver,
) -> DoorEvents {
    let mut events = DoorEvents::default();
    for (entity, (transform, state)) in world.query_mut::<(&Transform, &mut DoorState)>() {
        let inside = transform.position().distance(viewer) <= radius;
        match (state.agent_inside, inside) {
            (false, true) => {
                state.open = true;
                events.entered += 1;
                debug!("Door {:?} opened", entity);
            }
            (true, false) => {
                state.open = false;
                events.exited += 1;
            }
            _ => {}
        }
        state.agent_inside = inside;
    }
    if events.entered > 0 {
        driver.try_fill_reachable_sockets();
    }
    events
}
