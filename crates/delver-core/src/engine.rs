//! Dungeon engine - host-loop entry point tying generation to a viewer

use delver_logic::config::GeneratorConfig;
use delver_logic::geometry::{closest, Capsule};
use glam::Vec3;
use hecs::Entity;

use crate::catalog::PrefabCatalog;
use crate::components::{ModulePart, Transform};
use crate::error::GenerationError;
use crate::generation::{ExpansionDriver, FillReport, PassReport, PlacementEngine};
use crate::systems::{door_trigger_system, visibility_system, DoorEvents, DOOR_TRIGGER_RADIUS};

/// Default detection capsule: how far around the viewer the dungeon grows.
pub const DETECTION_RADIUS: f32 = 30.0;
/// Default render capsule: modules beyond this are hidden.
pub const RENDER_RADIUS: f32 = 45.0;
const CAPSULE_HALF_HEIGHT: f32 = 5.0;

/// What one `update` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub doors: DoorEvents,
    pub pass: Option<PassReport>,
    pub visibility_changes: u32,
}

/// Owns the placement engine and the expansion driver, and advances both
/// from the host loop.
pub struct DungeonEngine {
    pub placement: PlacementEngine,
    pub driver: ExpansionDriver,
    render: Capsule,
    viewer: Vec3,
    frames: u64,
}

impl DungeonEngine {
    pub fn new(catalog: PrefabCatalog, config: GeneratorConfig) -> Self {
        let origin = config.origin.position;
        Self::with_volumes(
            catalog,
            config,
            Capsule::new(origin, CAPSULE_HALF_HEIGHT, DETECTION_RADIUS),
            Capsule::new(origin, CAPSULE_HALF_HEIGHT, RENDER_RADIUS),
        )
    }

    pub fn with_volumes(catalog: PrefabCatalog, config: GeneratorConfig, detection: Capsule, render: Capsule) -> Self {
        let driver = ExpansionDriver::new(detection, &config.proximity);
        Self {
            placement: PlacementEngine::new(catalog, config),
            driver,
            render,
            viewer: detection.center,
            frames: 0,
        }
    }

    pub fn viewer(&self) -> Vec3 {
        self.viewer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Place the entrance and grow everything within reach of the viewer.
    pub fn start(&mut self) -> Result<FillReport, GenerationError> {
        let initial = self.driver.generate_initial(&mut self.placement)?;
        let report = if initial.stuck {
            initial
        } else {
            initial.then(self.driver.fill_until_stuck(&mut self.placement)?)
        };
        visibility_system(self.placement.world_mut(), &self.render);
        Ok(report)
    }

    /// Advance one frame with the viewer at `viewer`.
    ///
    /// Entering a door trigger requests a fill; a pending request runs one
    /// proximity pass; then visibility is refreshed.
    pub fn update(&mut self, viewer: Vec3) -> Result<FrameReport, GenerationError> {
        self.frames += 1;
        self.viewer = viewer;
        self.driver.move_to(viewer);
        self.render = self.render.moved_to(viewer);

        let doors = door_trigger_system(
            self.placement.world_mut(),
            viewer,
            DOOR_TRIGGER_RADIUS,
            &mut self.driver,
        );
        let pass = self.driver.tick(&mut self.placement)?;
        let visibility_changes = visibility_system(self.placement.world_mut(), &self.render);

        Ok(FrameReport {
            doors,
            pass,
            visibility_changes,
        })
    }

    /// Seal every socket still open. Call once the dungeon is final.
    pub fn finish(&mut self) -> Result<u32, GenerationError> {
        self.driver.cancel();
        self.placement.seal_unoccupied_sockets()
    }

    /// Placed module whose origin is closest to `point`.
    pub fn nearest_module(&self, point: Vec3) -> Option<Entity> {
        let world = self.placement.world();
        let modules = self.placement.placed_modules();
        let positions: Vec<Vec3> = modules
            .iter()
            .map(|&e| {
                world
                    .get::<&Transform>(e)
                    .map(|t| t.position())
                    .unwrap_or(Vec3::splat(f32::INFINITY))
            })
            .collect();
        closest(point, &positions).map(|i| modules[i])
    }

    /// Name of the module nearest to `point`, for display.
    pub fn nearest_module_name(&self, point: Vec3) -> Option<String> {
        let entity = self.nearest_module(point)?;
        self.placement
            .world()
            .get::<&ModulePart>(entity)
            .ok()
            .map(|p| p.name.clone())
    }
}
