//! Visibility system - hides modules outside the render capsule

use delver_logic::geometry::Capsule;
use hecs::World;
use log::debug;

use crate::components::{ModulePart, Transform, Visible};

/// Show modules whose bounds touch `render`, hide the rest.
/// Returns how many modules changed state.
pub fn visibility_system(world: &mut World, render: &Capsule) -> u32 {
    let mut changed = 0;
    for (_, (transform, part, visible)) in world.query_mut::<(&Transform, &ModulePart, &mut Visible)>() {
        let shown = render.intersects_aabb(&part.world_bounds(&transform.pose));
        if shown != visible.0 {
            debug!("'{}' {}", part.name, if shown { "shown" } else { "hidden" });
            visible.0 = shown;
            changed += 1;
        }
    }
    changed
}
