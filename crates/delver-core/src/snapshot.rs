//! Export the generated dungeon as a plain-data `LayoutSnapshot`.

use std::collections::HashMap;

use delver_logic::layout::{ConnectorRecord, LayoutSnapshot, LinkRecord, ModuleRecord, SocketRecord};
use hecs::Entity;

use crate::components::{Connector, Links, ModulePart, Transform};
use crate::generation::PlacementEngine;
use crate::spatial::SpatialQuery;

impl<S: SpatialQuery> PlacementEngine<S> {
    /// Snapshot of committed modules, their links and all connectors.
    /// Module ids follow placement order, so the entrance is id 0.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let world = self.world();
        let ids: HashMap<Entity, u32> = self
            .placed_modules()
            .iter()
            .enumerate()
            .map(|(i, &e)| (e, i as u32))
            .collect();

        let mut modules = Vec::with_capacity(ids.len());
        let mut links = Vec::new();
        for (i, &entity) in self.placed_modules().iter().enumerate() {
            let id = i as u32;
            let (Ok(part), Ok(transform)) = (
                world.get::<&ModulePart>(entity),
                world.get::<&Transform>(entity),
            ) else {
                continue;
            };
            let sockets = part
                .sockets()
                .map(|(sid, s)| SocketRecord {
                    index: sid.0,
                    size_class: s.size_class(),
                    position: transform.pose.compose(&s.local_pose()).position,
                    occupied: s.is_occupied(),
                })
                .collect();
            modules.push(ModuleRecord {
                id,
                prefab: part.name.clone(),
                kind: part.kind,
                bounds: part.world_bounds(&transform.pose),
                sockets,
            });

            if let Ok(module_links) = world.get::<&Links>(entity) {
                for link in &module_links.links {
                    // Each link is stored on both ends; emit it once.
                    match ids.get(&link.other) {
                        Some(&other) if id < other => links.push(LinkRecord {
                            module_a: id,
                            socket_a: link.socket.0,
                            module_b: other,
                            socket_b: link.other_socket.0,
                        }),
                        _ => {}
                    }
                }
            }
        }

        let connectors = world
            .query::<(&Connector, &Transform)>()
            .iter()
            .map(|(_, (c, t))| ConnectorRecord {
                kind: c.kind,
                position: t.position(),
            })
            .collect();

        LayoutSnapshot {
            entrance: self.entrance().and_then(|e| ids.get(&e).copied()),
            modules,
            links,
            connectors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PrefabCatalog;
    use delver_logic::config::GeneratorConfig;
    use delver_logic::layout::validate_all;

    #[test]
    fn test_snapshot_of_small_dungeon_validates() {
        let config = GeneratorConfig::seeded(21);
        let mut engine = PlacementEngine::new(PrefabCatalog::standard(), config.clone());
        engine.generate(8).unwrap();
        let snap = engine.snapshot();

        assert_eq!(snap.entrance, Some(0));
        assert_eq!(snap.modules.len(), engine.placed_modules().len());
        assert_eq!(snap.links.len(), snap.modules.len() - 1);
        let errors = validate_all(&snap, config.overlap_tolerance, config.connector_tolerance);
        assert!(errors.is_empty(), "{errors:?}");
    }
}
