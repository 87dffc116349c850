//! The placement engine: socket-driven growth of a dungeon.
//!
//! Every growth path (batch, proximity, alternate entrances) goes through one
//! primitive, `grow`. A step picks an anchor socket, picks a pool and a
//! prefab, instantiates the candidate, aligns one of its sockets onto the
//! anchor, and either commits or rolls the candidate back.
//! Sockets are reserved before the overlap test and released again on
//! rollback, so an abandoned step leaves nothing behind.

use delver_logic::config::GeneratorConfig;
use delver_logic::constants::{ConnectorKind, SizeClass};
use delver_logic::geometry::{align_to_socket, Aabb, Capsule, LocalBox, Pose};
use glam::Vec3;
use hecs::{Entity, World};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use super::selection::{choose_pool, eligible_pools, pick_prefab};
use crate::catalog::{PrefabCatalog, PrefabId};
use crate::components::*;
use crate::error::{CatalogError, GenerationError};
use crate::spatial::{ColliderIndex, SpatialQuery};

/// Result of one growth step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A module was committed.
    Placed(Entity),
    /// Every placement retry overlapped or drew an anchor nothing fits.
    Abandoned,
    /// No placed module with a free socket was found.
    NoAnchor,
    /// Nothing in the catalog can attach to the given anchor socket. A
    /// sampled anchor that nothing fits is redrawn instead.
    Skipped,
}

/// Summary of a batch `generate` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GrowthReport {
    pub requested: u32,
    pub placed: u32,
    pub abandoned: u32,
    /// Growth stopped because no anchor could be found.
    pub stopped_early: bool,
}

/// Summary of one proximity pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Free sockets found inside the detection volume.
    pub sockets: u32,
    pub placed: u32,
    pub sealed: u32,
}

/// Running counters over the engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub placed: u32,
    pub overlaps: u32,
    pub size_mismatches: u32,
    pub abandoned_steps: u32,
    pub skipped_steps: u32,
    pub anchor_failures: u32,
    pub doors: u32,
    pub locked_doors: u32,
    pub fillers: u32,
}

/// Where a growth step attaches.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// Sample the placed-parts registry.
    Sample,
    /// A specific free socket (proximity growth).
    Fixed(Entity, SocketId),
}

/// What a growth step instantiates.
#[derive(Debug, Clone, Copy)]
enum Pick {
    Weighted(SpecialGate),
    Fixed(PrefabId),
}

/// Condition under which the special pool may win.
#[derive(Debug, Clone, Copy)]
enum SpecialGate {
    /// Some other placed module still has a free socket.
    OtherFreeSocket,
    /// Enough free sockets inside the activity volume.
    Activity(Aabb),
}

enum Attempt {
    Committed(Entity),
    Overlap,
    NoCompatibleSocket,
}

/// Owns the dungeon world and grows it.
pub struct PlacementEngine<S: SpatialQuery = ColliderIndex> {
    world: World,
    index: S,
    catalog: PrefabCatalog,
    config: GeneratorConfig,
    rng: StdRng,
    /// Registry of committed modules, in placement order.
    placed: Vec<Entity>,
    entrance: Option<Entity>,
    stats: GenerationStats,
}

impl PlacementEngine<ColliderIndex> {
    pub fn new(catalog: PrefabCatalog, config: GeneratorConfig) -> Self {
        let index = ColliderIndex::new(config.overlap_tolerance);
        Self::with_index(catalog, config, index)
    }
}

impl<S: SpatialQuery> PlacementEngine<S> {
    /// Engine backed by a custom spatial query.
    pub fn with_index(catalog: PrefabCatalog, config: GeneratorConfig, index: S) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            world: World::new(),
            index,
            catalog,
            config,
            rng,
            placed: Vec::new(),
            entrance: None,
            stats: GenerationStats::default(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn catalog(&self) -> &PrefabCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats
    }

    pub fn entrance(&self) -> Option<Entity> {
        self.entrance
    }

    /// Committed modules, entrance first.
    pub fn placed_modules(&self) -> &[Entity] {
        &self.placed
    }

    /// Rebuild the whole spatial cache from the world. Single changes made
    /// by the engine keep the cache current on their own.
    pub fn settle(&mut self) {
        self.index.sync(&self.world);
    }

    // ── Entry points ────────────────────────────────────────────────────

    /// Spawn the entrance at the configured origin. Idempotent.
    pub fn place_entrance(&mut self) -> Result<Entity, GenerationError> {
        if let Some(entrance) = self.entrance {
            return Ok(entrance);
        }
        let id = reported(self.catalog.require_entrance())?;
        let part = self.spawn_part(id, self.config.origin)?;
        self.index.refresh(&self.world, part);
        self.placed.push(part);
        self.entrance = Some(part);
        self.stats.placed += 1;
        info!(
            "Placed entrance '{}' at {:?}",
            self.part(part)?.name,
            self.config.origin.position
        );
        Ok(part)
    }

    /// Batch growth: place the entrance if needed, then run `count` growth
    /// steps minus one per alternate entrance, then attach the alternates.
    pub fn generate(&mut self, count: u32) -> Result<GrowthReport, GenerationError> {
        reported(self.catalog.validate())?;
        let alternates = self.catalog.alternate_entrances.clone();
        let mut report = GrowthReport {
            requested: count,
            ..Default::default()
        };

        let steps = count.saturating_sub(alternates.len() as u32);
        for _ in 0..steps {
            if self.entrance.is_none() {
                self.place_entrance()?;
                report.placed += 1;
                continue;
            }
            match self.generate_single()? {
                StepOutcome::Placed(_) => report.placed += 1,
                StepOutcome::NoAnchor => {
                    error!(
                        "Could not find a module with a free socket in {} draws; stopping growth",
                        self.config.retries.anchor
                    );
                    report.stopped_early = true;
                    break;
                }
                StepOutcome::Abandoned => report.abandoned += 1,
                StepOutcome::Skipped => {}
            }
        }

        if !report.stopped_early && self.entrance.is_some() {
            for id in alternates {
                match self.grow(Anchor::Sample, Pick::Fixed(id))? {
                    StepOutcome::Placed(_) => report.placed += 1,
                    StepOutcome::Abandoned => report.abandoned += 1,
                    outcome => warn!(
                        "Alternate entrance {:?} not attached: {:?}",
                        id, outcome
                    ),
                }
            }
        }

        info!(
            "Generated {} of {} modules ({} abandoned steps)",
            report.placed, report.requested, report.abandoned
        );
        Ok(report)
    }

    /// One growth step from a randomly sampled anchor.
    pub fn generate_single(&mut self) -> Result<StepOutcome, GenerationError> {
        reported(self.catalog.validate())?;
        self.grow(Anchor::Sample, Pick::Weighted(SpecialGate::OtherFreeSocket))
    }

    /// One growth step from a specific free socket.
    pub fn fill_socket(&mut self, part: Entity, socket: SocketId) -> Result<StepOutcome, GenerationError> {
        reported(self.catalog.validate())?;
        self.grow(
            Anchor::Fixed(part, socket),
            Pick::Weighted(SpecialGate::OtherFreeSocket),
        )
    }

    /// Proximity pass: one growth attempt per free socket on modules the
    /// detection capsule touches. Failed sockets are sealed with a filler
    /// when the config says so.
    pub fn fill_reachable(
        &mut self,
        detection: &Capsule,
        activity: Option<&Aabb>,
    ) -> Result<PassReport, GenerationError> {
        reported(self.catalog.validate())?;
        let sealing = self.config.proximity.seal_failed_sockets;
        if sealing {
            reported(self.catalog.connector(ConnectorKind::Filler).map(|_| ()))?;
        }
        self.settle();

        let mut targets = Vec::new();
        for hit in self.index.overlap_capsule(detection, Layer::MODULE) {
            if let Ok(part) = self.world.get::<&ModulePart>(hit) {
                targets.extend(part.open_sockets().map(|socket| (hit, socket)));
            }
        }

        let gate = match activity {
            Some(volume) => SpecialGate::Activity(*volume),
            None => SpecialGate::OtherFreeSocket,
        };
        let mut report = PassReport {
            sockets: targets.len() as u32,
            ..Default::default()
        };
        for (part, socket) in targets {
            // An earlier attempt in this pass may have taken or sealed it.
            if self.socket_state(part, socket)?.is_occupied() {
                continue;
            }
            match self.grow(Anchor::Fixed(part, socket), Pick::Weighted(gate))? {
                StepOutcome::Placed(_) => report.placed += 1,
                outcome => {
                    debug!("Socket {} of {:?} not filled: {:?}", socket.0, part, outcome);
                    if sealing {
                        self.seal_with(part, socket, ConnectorKind::Filler)?;
                        report.sealed += 1;
                    }
                }
            }
        }
        if report.sockets > 0 {
            debug!(
                "Proximity pass: {} sockets, {} placed, {} sealed",
                report.sockets, report.placed, report.sealed
            );
        }
        Ok(report)
    }

    /// Close every remaining free socket with a filler.
    pub fn seal_unoccupied_sockets(&mut self) -> Result<u32, GenerationError> {
        reported(self.catalog.connector(ConnectorKind::Filler).map(|_| ()))?;
        let mut sealed = 0;
        for part in self.placed.clone() {
            let open: Vec<SocketId> = self.part(part)?.open_sockets().collect();
            for socket in open {
                self.seal_with(part, socket, ConnectorKind::Filler)?;
                sealed += 1;
            }
        }
        info!("Sealed {} open sockets", sealed);
        Ok(sealed)
    }

    /// Add static scenery the generator must build around.
    pub fn spawn_scenery(&mut self, name: &str, bounds: Aabb) -> Entity {
        let entity = self.world.spawn((
            Transform::at(bounds.center()),
            Collider::new(LocalBox::new(Vec3::ZERO, bounds.half_extents()), Layer::SCENERY),
            Scenery {
                name: name.to_string(),
            },
        ));
        self.index.refresh(&self.world, entity);
        entity
    }

    // ── The growth primitive ────────────────────────────────────────────

    fn grow(&mut self, anchor: Anchor, pick: Pick) -> Result<StepOutcome, GenerationError> {
        let budget = self.config.retries.placement.max(1);
        for attempt in 1..=budget {
            let (anchor_part, anchor_socket) = match anchor {
                Anchor::Sample => match self.select_anchor() {
                    Some(found) => found,
                    None => {
                        self.stats.anchor_failures += 1;
                        return Ok(StepOutcome::NoAnchor);
                    }
                },
                Anchor::Fixed(part, socket) => {
                    if self.socket_state(part, socket)?.is_occupied() {
                        return Ok(StepOutcome::Skipped);
                    }
                    (part, socket)
                }
            };
            let class = self.socket_state(anchor_part, anchor_socket)?.size_class();

            let pool = match pick {
                Pick::Fixed(id) => vec![id],
                Pick::Weighted(gate) => {
                    let special_allowed = self.special_allowed(gate, anchor_part, anchor_socket)?;
                    let eligible = eligible_pools(&self.catalog, class);
                    match choose_pool(&mut self.rng, &self.config.weights, &eligible, special_allowed) {
                        Some(kind) => self.catalog.pool(kind).to_vec(),
                        // A sampled anchor is only a bad draw; another one may fit.
                        None if matches!(anchor, Anchor::Sample) => {
                            self.stats.size_mismatches += 1;
                            debug!(
                                "Placement attempt {}/{}: nothing attaches to {:?} socket {} of {:?}",
                                attempt, budget, class, anchor_socket.0, anchor_part
                            );
                            continue;
                        }
                        None => {
                            self.stats.skipped_steps += 1;
                            warn!(
                                "Nothing can attach to {:?} socket {} of {:?}",
                                class, anchor_socket.0, anchor_part
                            );
                            return Ok(StepOutcome::Skipped);
                        }
                    }
                }
            };

            match self.try_candidates(&pool, anchor_part, anchor_socket, class)? {
                Attempt::Committed(part) => return Ok(StepOutcome::Placed(part)),
                Attempt::Overlap => {
                    debug!("Placement attempt {}/{}: candidate overlapped", attempt, budget);
                }
                Attempt::NoCompatibleSocket => {
                    if pool_incompatible(&self.catalog, &pool, class) {
                        if matches!(anchor, Anchor::Fixed(..)) {
                            self.stats.skipped_steps += 1;
                            return Ok(StepOutcome::Skipped);
                        }
                        self.stats.size_mismatches += 1;
                    }
                    debug!(
                        "Placement attempt {}/{}: no candidate offered a {:?} socket",
                        attempt, budget, class
                    );
                }
            }
        }
        self.stats.abandoned_steps += 1;
        warn!("Abandoned growth step after {} placement attempts", budget);
        Ok(StepOutcome::Abandoned)
    }

    /// Draw placed modules at random until one has a free socket.
    fn select_anchor(&mut self) -> Option<(Entity, SocketId)> {
        for draw in 1..=self.config.retries.anchor {
            let candidate = *self.placed.choose(&mut self.rng)?;
            let socket = self
                .world
                .get::<&ModulePart>(candidate)
                .ok()
                .and_then(|p| p.find_available_socket(&mut self.rng));
            if let Some(socket) = socket {
                return Some((candidate, socket));
            }
            debug!("Anchor draw {}: {:?} has no free socket", draw, candidate);
        }
        None
    }

    fn special_allowed(
        &self,
        gate: SpecialGate,
        anchor_part: Entity,
        anchor_socket: SocketId,
    ) -> Result<bool, GenerationError> {
        match gate {
            SpecialGate::OtherFreeSocket => {
                for &e in &self.placed {
                    if e != anchor_part && self.part(e)?.has_open_socket() {
                        return Ok(true);
                    }
                }
                Ok(self
                    .part(anchor_part)?
                    .open_sockets()
                    .any(|s| s != anchor_socket))
            }
            SpecialGate::Activity(volume) => {
                let mut free = 0;
                for &e in &self.placed {
                    let pose = self.pose(e)?;
                    let part = self.part(e)?;
                    free += part
                        .open_sockets()
                        .filter_map(|s| part.socket_pose(&pose, s))
                        .filter(|p| volume.contains_point(p.position))
                        .count();
                }
                Ok(free >= self.config.proximity.min_free_sockets_for_special)
            }
        }
    }

    /// Up to `retries.candidate` instantiations from `pool`.
    fn try_candidates(
        &mut self,
        pool: &[PrefabId],
        anchor_part: Entity,
        anchor_socket: SocketId,
        class: SizeClass,
    ) -> Result<Attempt, GenerationError> {
        let anchor_pose = self.socket_pose(anchor_part, anchor_socket)?;
        for _ in 0..self.config.retries.candidate.max(1) {
            let Some(prefab) = pick_prefab(&mut self.rng, &self.catalog, pool, class) else {
                return Ok(Attempt::NoCompatibleSocket);
            };
            let candidate = self.spawn_part(prefab, self.config.origin)?;
            let found = self
                .world
                .get::<&ModulePart>(candidate)
                .ok()
                .and_then(|p| p.find_available_socket_typed(&mut self.rng));

            let Some((socket, socket_class)) = found else {
                self.destroy(candidate);
                continue;
            };
            if socket_class != class {
                self.stats.size_mismatches += 1;
                self.destroy(candidate);
                continue;
            }

            let socket_local = self.socket_state(candidate, socket)?.local_pose();
            let aligned = align_to_socket(&self.pose(candidate)?, &socket_local, &anchor_pose);
            self.set_pose(candidate, aligned)?;

            // Provisional reservation, undone if the candidate does not fit.
            self.part_mut(anchor_part)?.occupy(anchor_socket);
            self.part_mut(candidate)?.occupy(socket);

            if self.intersects(candidate)? {
                self.part_mut(anchor_part)?.release(anchor_socket);
                self.part_mut(candidate)?.release(socket);
                self.destroy(candidate);
                self.stats.overlaps += 1;
                return Ok(Attempt::Overlap);
            }

            self.commit(anchor_part, anchor_socket, candidate, socket, anchor_pose)?;
            return Ok(Attempt::Committed(candidate));
        }
        Ok(Attempt::NoCompatibleSocket)
    }

    fn commit(
        &mut self,
        anchor_part: Entity,
        anchor_socket: SocketId,
        part: Entity,
        socket: SocketId,
        at: Pose,
    ) -> Result<(), GenerationError> {
        if let Ok(mut links) = self.world.get::<&mut Links>(anchor_part) {
            links.add(anchor_socket, part, socket);
        }
        if let Ok(mut links) = self.world.get::<&mut Links>(part) {
            links.add(socket, anchor_part, anchor_socket);
        }
        self.placed.push(part);
        self.stats.placed += 1;
        self.place_connector(ConnectorKind::Door, at)?;
        self.probe_walls(part)?;
        debug!(
            "Placed '{}' at {:?} on {:?} socket {}",
            self.part(part)?.name,
            at.position,
            anchor_part,
            anchor_socket.0
        );
        Ok(())
    }

    /// Seal free sockets of a fresh module that face static scenery.
    fn probe_walls(&mut self, part: Entity) -> Result<(), GenerationError> {
        let probe = self.config.wall_probe;
        let shape = LocalBox::new(
            Vec3::new(0.0, probe.half_height, probe.depth * 0.5),
            Vec3::new(probe.half_width, probe.half_height, probe.depth * 0.5),
        );
        let open: Vec<SocketId> = self.part(part)?.open_sockets().collect();
        for socket in open {
            let pose = self.socket_pose(part, socket)?;
            let volume = shape.world_bounds(&pose);
            if !self.index.overlap_box(&volume, Layer::SCENERY).is_empty() {
                debug!("Socket {} of {:?} faces scenery; locking", socket.0, part);
                self.seal_with(part, socket, ConnectorKind::LockedDoor)?;
            }
        }
        Ok(())
    }

    fn seal_with(&mut self, part: Entity, socket: SocketId, kind: ConnectorKind) -> Result<(), GenerationError> {
        let pose = self.socket_pose(part, socket)?;
        self.part_mut(part)?.seal(socket);
        self.place_connector(kind, pose)?;
        Ok(())
    }

    /// Spawn a connector at `pose` unless one already sits there.
    fn place_connector(&mut self, kind: ConnectorKind, pose: Pose) -> Result<Option<Entity>, GenerationError> {
        let tolerance = self.config.connector_tolerance;
        let existing = self
            .index
            .overlap_sphere(pose.position, tolerance, Layer::CONNECTOR)
            .into_iter()
            .any(|e| {
                self.world
                    .get::<&Transform>(e)
                    .map(|t| t.position().distance(pose.position) <= tolerance)
                    .unwrap_or(false)
            });
        if existing {
            debug!("{:?} at {:?} skipped: a connector is already there", kind, pose.position);
            return Ok(None);
        }

        let shape = reported(self.catalog.connector(kind))?.local_box();
        let collider = Collider::new(shape, Layer::CONNECTOR);
        let entity = match kind {
            ConnectorKind::Door => {
                self.world
                    .spawn((Transform::new(pose), collider, Connector::new(kind), DoorState::default()))
            }
            _ => self.world.spawn((Transform::new(pose), collider, Connector::new(kind))),
        };
        match kind {
            ConnectorKind::Door => self.stats.doors += 1,
            ConnectorKind::LockedDoor => self.stats.locked_doors += 1,
            ConnectorKind::Filler => self.stats.fillers += 1,
        }
        self.index.refresh(&self.world, entity);
        Ok(Some(entity))
    }

    // ── World helpers ───────────────────────────────────────────────────

    fn spawn_part(&mut self, id: PrefabId, pose: Pose) -> Result<Entity, GenerationError> {
        let prefab = reported(self.catalog.part(id))?;
        let part = ModulePart::from_prefab(id, prefab);
        let collider = Collider::new(prefab.bounds, Layer::MODULE);
        Ok(self.world.spawn((
            Transform::new(pose),
            part,
            collider,
            Links::default(),
            Visible::default(),
        )))
    }

    fn destroy(&mut self, entity: Entity) {
        if self.world.despawn(entity).is_ok() {
            self.index.forget(&self.world, entity);
        }
    }

    /// Whether a module overlaps any blocking collider but itself.
    fn intersects(&self, part: Entity) -> Result<bool, GenerationError> {
        let bounds = self.part(part)?.world_bounds(&self.pose(part)?);
        Ok(self
            .index
            .overlap_box(&bounds, Layer::BLOCKING)
            .into_iter()
            .any(|e| e != part))
    }

    pub(crate) fn part(&self, entity: Entity) -> Result<hecs::Ref<'_, ModulePart>, GenerationError> {
        self.world
            .get::<&ModulePart>(entity)
            .map_err(|_| GenerationError::NotAModule(entity))
    }

    fn part_mut(&self, entity: Entity) -> Result<hecs::RefMut<'_, ModulePart>, GenerationError> {
        self.world
            .get::<&mut ModulePart>(entity)
            .map_err(|_| GenerationError::NotAModule(entity))
    }

    pub(crate) fn pose(&self, entity: Entity) -> Result<Pose, GenerationError> {
        self.world
            .get::<&Transform>(entity)
            .map(|t| t.pose)
            .map_err(|_| GenerationError::NotAModule(entity))
    }

    fn set_pose(&mut self, entity: Entity, pose: Pose) -> Result<(), GenerationError> {
        self.world
            .get::<&mut Transform>(entity)
            .map_err(|_| GenerationError::NotAModule(entity))?
            .pose = pose;
        self.index.refresh(&self.world, entity);
        Ok(())
    }

    fn socket_state(&self, entity: Entity, socket: SocketId) -> Result<EntrySocket, GenerationError> {
        self.part(entity)?
            .socket(socket)
            .copied()
            .ok_or(GenerationError::NoSuchSocket { entity, socket })
    }

    /// World pose of a module's socket.
    pub fn socket_pose(&self, entity: Entity, socket: SocketId) -> Result<Pose, GenerationError> {
        let pose = self.pose(entity)?;
        self.part(entity)?
            .socket_pose(&pose, socket)
            .ok_or(GenerationError::NoSuchSocket { entity, socket })
    }

    /// Free sockets on committed modules.
    pub fn open_sockets(&self) -> Vec<(Entity, SocketId)> {
        let mut open = Vec::new();
        for &e in &self.placed {
            if let Ok(part) = self.world.get::<&ModulePart>(e) {
                open.extend(part.open_sockets().map(|s| (e, s)));
            }
        }
        open
    }
}

fn pool_incompatible(catalog: &PrefabCatalog, pool: &[PrefabId], class: SizeClass) -> bool {
    super::selection::compatible_prefabs(catalog, pool, class).is_empty()
}

/// Log a configuration error once, at the call that hit it.
fn reported<T>(result: Result<T, CatalogError>) -> Result<T, GenerationError> {
    result.map_err(|e| {
        error!("Generation aborted: {}", e);
        GenerationError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConnectorPrefab, PartPrefab, SocketPrefab};
    use delver_logic::constants::PartKind;

    fn engine(seed: u64) -> PlacementEngine {
        PlacementEngine::new(PrefabCatalog::standard(), GeneratorConfig::seeded(seed))
    }

    #[test]
    fn test_place_entrance_idempotent() {
        let mut e = engine(1);
        let a = e.place_entrance().unwrap();
        let b = e.place_entrance().unwrap();
        assert_eq!(a, b);
        assert_eq!(e.placed_modules(), &[a]);
        assert_eq!(e.part(a).unwrap().kind, PartKind::Entrance);
    }

    #[test]
    fn test_generate_single_links_two_modules() {
        let mut e = engine(2);
        let entrance = e.place_entrance().unwrap();
        let outcome = e.generate_single().unwrap();
        let StepOutcome::Placed(part) = outcome else {
            panic!("expected a placement, got {outcome:?}");
        };
        let links = e.world().get::<&Links>(part).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links.links[0].other, entrance);
        assert_eq!(e.stats().doors, 1);
    }

    #[test]
    fn test_generate_single_without_entrance_has_no_anchor() {
        let mut e = engine(3);
        assert_eq!(e.generate_single().unwrap(), StepOutcome::NoAnchor);
    }

    #[test]
    fn test_fill_socket_on_taken_socket_is_skipped() {
        let mut e = engine(4);
        let entrance = e.place_entrance().unwrap();
        e.part_mut(entrance).unwrap().occupy(SocketId(0));
        assert_eq!(e.fill_socket(entrance, SocketId(0)).unwrap(), StepOutcome::Skipped);
    }

    #[test]
    fn test_unknown_socket_is_an_error() {
        let mut e = engine(5);
        let entrance = e.place_entrance().unwrap();
        assert!(matches!(
            e.fill_socket(entrance, SocketId(42)),
            Err(GenerationError::NoSuchSocket { .. })
        ));
    }

    #[test]
    fn test_seal_places_one_filler_per_socket() {
        let mut e = engine(6);
        e.place_entrance().unwrap();
        let sealed = e.seal_unoccupied_sockets().unwrap();
        assert_eq!(sealed, 3);
        assert_eq!(e.stats().fillers, 3);
        assert!(e.open_sockets().is_empty());
        assert_eq!(e.seal_unoccupied_sockets().unwrap(), 0);
    }

    #[test]
    fn test_index_tracks_world_without_full_sync() {
        let mut e = engine(8);
        e.generate(12).unwrap();
        e.seal_unoccupied_sockets().unwrap();

        let colliders: Vec<(Entity, Aabb)> = e
            .world
            .query::<(&Transform, &Collider)>()
            .iter()
            .map(|(entity, (t, c))| (entity, c.world_bounds(&t.pose)))
            .collect();
        assert_eq!(e.index.len(), colliders.len());
        for (entity, bounds) in colliders {
            assert_eq!(e.index.bounds_of(entity), Some(bounds));
        }
    }

    #[test]
    fn test_sampled_anchor_nothing_fits_is_redrawn() {
        // The entrance's Large socket can never be served.
        let catalog = PrefabCatalog::new()
            .with_entrance(PartPrefab::rect(
                "entrance",
                PartKind::Entrance,
                8.0,
                8.0,
                vec![
                    SocketPrefab::new(Vec3::new(0.0, 0.0, -4.0), -Vec3::Z, SizeClass::Large),
                    SocketPrefab::new(Vec3::new(0.0, 0.0, 4.0), Vec3::Z, SizeClass::Small),
                ],
            ))
            .with_room(PartPrefab::rect(
                "hall",
                PartKind::Room,
                10.0,
                10.0,
                vec![
                    SocketPrefab::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, SizeClass::Small),
                    SocketPrefab::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, SizeClass::Small),
                ],
            ))
            .with_door(ConnectorPrefab::new("door", Vec3::new(1.0, 1.25, 0.1)))
            .with_filler(ConnectorPrefab::new("filler", Vec3::new(1.5, 1.5, 0.1)));

        for seed in 0..30 {
            let mut e = PlacementEngine::new(catalog.clone(), GeneratorConfig::seeded(seed));
            let report = e.generate(6).unwrap();
            assert_eq!(report.placed, 6, "seed {seed}: {report:?}");
            assert_eq!(report.abandoned, 0);
            assert!(!report.stopped_early);
            assert_eq!(e.stats().skipped_steps, 0);
            // The Large socket plus the far end of the last hall.
            assert_eq!(e.open_sockets().len(), 2);
        }
    }

    #[test]
    fn test_missing_entrance_is_config_error() {
        let mut catalog = PrefabCatalog::standard();
        catalog.entrance = None;
        let mut e = PlacementEngine::new(catalog, GeneratorConfig::seeded(7));
        assert!(matches!(
            e.generate(5),
            Err(GenerationError::Catalog(CatalogError::MissingEntrance))
        ));
        assert_eq!(e.world().len(), 0);
    }
}
