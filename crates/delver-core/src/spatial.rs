//! Spatial queries over collider bounds.
//!
//! Generation never walks the world to answer "what is here?"; it asks a
//! [`SpatialQuery`]. The default [`ColliderIndex`] keeps a flat cache of
//! world bounds that is rebuilt by [`SpatialQuery::sync`]. Single spawns,
//! moves and despawns go through [`SpatialQuery::refresh`] and
//! [`SpatialQuery::forget`] instead, so the cache is current before the
//! next query.

use delver_logic::geometry::{Aabb, Capsule};
use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{Collider, Layer, Transform};

pub trait SpatialQuery {
    /// Refresh cached bounds from the world's transforms.
    fn sync(&mut self, world: &World);

    /// Refresh one entity after it was spawned or moved.
    fn refresh(&mut self, world: &World, entity: Entity) {
        let _ = entity;
        self.sync(world);
    }

    /// Drop a despawned entity.
    fn forget(&mut self, world: &World, entity: Entity) {
        let _ = entity;
        self.sync(world);
    }

    /// Entities on `mask` layers whose bounds overlap `volume`.
    fn overlap_box(&self, volume: &Aabb, mask: Layer) -> Vec<Entity>;

    /// Entities on `mask` layers touched by an upright capsule.
    fn overlap_capsule(&self, capsule: &Capsule, mask: Layer) -> Vec<Entity>;

    /// Entities on `mask` layers within `radius` of `center`.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Layer) -> Vec<Entity>;
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    entity: Entity,
    bounds: Aabb,
    layer: Layer,
}

/// Brute-force collider cache.
#[derive(Debug, Clone, Default)]
pub struct ColliderIndex {
    entries: Vec<IndexEntry>,
    /// Box overlaps shallower than this are treated as touching.
    margin: f32,
}

impl ColliderIndex {
    pub fn new(margin: f32) -> Self {
        Self {
            entries: Vec::new(),
            margin: margin.max(0.0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached bounds of an entity, as of the last sync.
    pub fn bounds_of(&self, entity: Entity) -> Option<Aabb> {
        self.entries
            .iter()
            .find(|e| e.entity == entity)
            .map(|e| e.bounds)
    }

    fn entry(world: &World, entity: Entity) -> Option<IndexEntry> {
        let transform = world.get::<&Transform>(entity).ok()?;
        let collider = world.get::<&Collider>(entity).ok()?;
        Some(IndexEntry {
            entity,
            bounds: collider.world_bounds(&transform.pose),
            layer: collider.layer,
        })
    }

    fn matching<'a>(
        &'a self,
        mask: Layer,
        hit: impl Fn(&Aabb) -> bool + 'a,
    ) -> impl Iterator<Item = Entity> + 'a {
        self.entries
            .iter()
            .filter(move |e| mask.intersects(e.layer) && hit(&e.bounds))
            .map(|e| e.entity)
    }
}

impl SpatialQuery for ColliderIndex {
    fn sync(&mut self, world: &World) {
        self.entries.clear();
        for (entity, (transform, collider)) in world.query::<(&Transform, &Collider)>().iter() {
            self.entries.push(IndexEntry {
                entity,
                bounds: collider.world_bounds(&transform.pose),
                layer: collider.layer,
            });
        }
    }

    fn refresh(&mut self, world: &World, entity: Entity) {
        let slot = self.entries.iter().position(|e| e.entity == entity);
        match (slot, Self::entry(world, entity)) {
            (Some(i), Some(entry)) => self.entries[i] = entry,
            (None, Some(entry)) => self.entries.push(entry),
            (Some(i), None) => {
                self.entries.remove(i);
            }
            (None, None) => {}
        }
    }

    fn forget(&mut self, _world: &World, entity: Entity) {
        self.entries.retain(|e| e.entity != entity);
    }

    fn overlap_box(&self, volume: &Aabb, mask: Layer) -> Vec<Entity> {
        let margin = self.margin;
        self.matching(mask, move |b| b.intersects(volume, margin)).collect()
    }

    fn overlap_capsule(&self, capsule: &Capsule, mask: Layer) -> Vec<Entity> {
        self.matching(mask, move |b| capsule.intersects_aabb(b)).collect()
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Layer) -> Vec<Entity> {
        self.matching(mask, move |b| b.intersects_sphere(center, radius))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delver_logic::geometry::LocalBox;

    fn spawn_box(world: &mut World, at: Vec3, half: f32, layer: Layer) -> Entity {
        world.spawn((
            Transform::at(at),
            Collider::new(LocalBox::new(Vec3::ZERO, Vec3::splat(half)), layer),
        ))
    }

    #[test]
    fn test_layer_mask_filters() {
        let mut world = World::new();
        let module = spawn_box(&mut world, Vec3::ZERO, 2.0, Layer::MODULE);
        let wall = spawn_box(&mut world, Vec3::new(1.0, 0.0, 0.0), 2.0, Layer::SCENERY);

        let mut index = ColliderIndex::new(0.05);
        index.sync(&world);
        let probe = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);

        assert_eq!(index.overlap_box(&probe, Layer::MODULE), vec![module]);
        assert_eq!(index.overlap_box(&probe, Layer::SCENERY), vec![wall]);
        assert_eq!(index.overlap_box(&probe, Layer::BLOCKING).len(), 2);
        assert!(index.overlap_box(&probe, Layer::CONNECTOR).is_empty());
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let mut world = World::new();
        spawn_box(&mut world, Vec3::new(4.0, 0.0, 0.0), 2.0, Layer::MODULE);
        let mut index = ColliderIndex::new(0.05);
        index.sync(&world);
        let probe = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(2.0));
        assert!(index.overlap_box(&probe, Layer::MODULE).is_empty());
    }

    #[test]
    fn test_stale_until_sync() {
        let mut world = World::new();
        let e = spawn_box(&mut world, Vec3::ZERO, 1.0, Layer::MODULE);
        let mut index = ColliderIndex::new(0.0);
        index.sync(&world);

        world.get::<&mut Transform>(e).unwrap().pose.position = Vec3::new(50.0, 0.0, 0.0);
        assert_eq!(index.overlap_sphere(Vec3::ZERO, 0.5, Layer::MODULE), vec![e]);

        index.sync(&world);
        assert!(index.overlap_sphere(Vec3::ZERO, 0.5, Layer::MODULE).is_empty());
        assert!(index.bounds_of(e).unwrap().contains_point(Vec3::new(50.0, 0.0, 0.0)));
    }

    #[test]
    fn test_refresh_and_forget_touch_one_entry() {
        let mut world = World::new();
        let a = spawn_box(&mut world, Vec3::ZERO, 1.0, Layer::MODULE);
        let mut index = ColliderIndex::new(0.0);
        index.sync(&world);

        let b = spawn_box(&mut world, Vec3::new(10.0, 0.0, 0.0), 1.0, Layer::CONNECTOR);
        index.refresh(&world, b);
        assert_eq!(index.len(), 2);
        assert_eq!(index.overlap_sphere(Vec3::new(10.0, 0.0, 0.0), 0.5, Layer::CONNECTOR), vec![b]);

        world.get::<&mut Transform>(a).unwrap().pose.position = Vec3::new(0.0, 0.0, 20.0);
        index.refresh(&world, a);
        assert_eq!(index.len(), 2);
        assert!(index.bounds_of(a).unwrap().contains_point(Vec3::new(0.0, 0.0, 20.0)));

        world.despawn(b).unwrap();
        index.forget(&world, b);
        assert_eq!(index.len(), 1);
        assert_eq!(index.bounds_of(b), None);
    }

    #[test]
    fn test_capsule_query() {
        let mut world = World::new();
        let near = spawn_box(&mut world, Vec3::new(3.0, 0.0, 0.0), 1.0, Layer::MODULE);
        spawn_box(&mut world, Vec3::new(30.0, 0.0, 0.0), 1.0, Layer::MODULE);
        let mut index = ColliderIndex::new(0.05);
        index.sync(&world);
        let cap = Capsule::new(Vec3::ZERO, 1.0, 2.5);
        assert_eq!(index.overlap_capsule(&cap, Layer::MODULE), vec![near]);
    }
}
