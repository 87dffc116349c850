//! Proximity-driven expansion.
//!
//! The driver owns the detection capsule that follows the viewer and turns
//! fill requests into proximity passes. Work is split into ticks so a host
//! loop can interleave generation with everything else; `fill_until_stuck`
//! runs the same passes back to back.

use delver_logic::config::ProximitySettings;
use delver_logic::geometry::{Aabb, Capsule};
use glam::Vec3;
use log::{debug, info};
use serde::Serialize;

use super::placement::{PassReport, PlacementEngine};
use crate::error::GenerationError;
use crate::spatial::SpatialQuery;

/// Totals over several passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub passes: u32,
    pub placed: u32,
    pub sealed: u32,
    /// The last pass placed nothing.
    pub stuck: bool,
}

impl FillReport {
    fn absorb(&mut self, pass: PassReport) {
        self.passes += 1;
        self.placed += pass.placed;
        self.sealed += pass.sealed;
    }

    /// Totals of `self` followed by `later`.
    pub fn then(self, later: FillReport) -> FillReport {
        FillReport {
            passes: self.passes + later.passes,
            placed: self.placed + later.placed,
            sealed: self.sealed + later.sealed,
            stuck: later.stuck,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpansionDriver {
    detection: Capsule,
    activity_half_extents: Vec3,
    pending: bool,
}

impl ExpansionDriver {
    pub fn new(detection: Capsule, settings: &ProximitySettings) -> Self {
        Self {
            detection,
            activity_half_extents: settings.activity_half_extents,
            pending: false,
        }
    }

    pub fn detection(&self) -> &Capsule {
        &self.detection
    }

    /// Box around the detection centre used to gate special rooms.
    pub fn activity_volume(&self) -> Aabb {
        Aabb::from_center_half_extents(self.detection.center, self.activity_half_extents)
    }

    pub fn move_to(&mut self, center: Vec3) {
        self.detection = self.detection.moved_to(center);
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Ask for passes to run on upcoming ticks. Repeated calls while a
    /// request is pending collapse into one.
    pub fn request_fill(&mut self) {
        if !self.pending {
            debug!("Fill requested around {:?}", self.detection.center);
        }
        self.pending = true;
    }

    /// Entry point for collaborators such as door triggers. Safe to call
    /// any number of times; the work happens in [`tick`](Self::tick).
    pub fn try_fill_reachable_sockets(&mut self) {
        self.request_fill();
    }

    /// Drop a pending request.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// One proximity pass around the current detection volume.
    pub fn pass<S: SpatialQuery>(&self, engine: &mut PlacementEngine<S>) -> Result<PassReport, GenerationError> {
        engine.fill_reachable(&self.detection, Some(&self.activity_volume()))
    }

    /// Run one pass if a request is pending. The request stays pending
    /// until a pass places nothing.
    pub fn tick<S: SpatialQuery>(
        &mut self,
        engine: &mut PlacementEngine<S>,
    ) -> Result<Option<PassReport>, GenerationError> {
        if !self.pending {
            return Ok(None);
        }
        let pass = match self.pass(engine) {
            Ok(pass) => pass,
            Err(e) => {
                self.pending = false;
                return Err(e);
            }
        };
        if pass.placed == 0 {
            self.pending = false;
        }
        engine.settle();
        Ok(Some(pass))
    }

    /// Passes back to back until one places nothing, capped by
    /// `proximity.max_passes`.
    pub fn fill_until_stuck<S: SpatialQuery>(
        &mut self,
        engine: &mut PlacementEngine<S>,
    ) -> Result<FillReport, GenerationError> {
        let max_passes = engine.config().proximity.max_passes.max(1);
        let mut report = FillReport::default();
        for _ in 0..max_passes {
            let pass = self.pass(engine)?;
            report.absorb(pass);
            engine.settle();
            if pass.placed == 0 {
                report.stuck = true;
                break;
            }
        }
        self.pending = false;
        Ok(report)
    }

    /// Place the entrance, then run one proximity pass around the
    /// detection volume.
    pub fn generate_initial<S: SpatialQuery>(
        &mut self,
        engine: &mut PlacementEngine<S>,
    ) -> Result<FillReport, GenerationError> {
        engine.place_entrance()?;
        let pass = self.pass(engine)?;
        engine.settle();
        let mut report = FillReport::default();
        report.absorb(pass);
        report.stuck = pass.placed == 0;
        info!(
            "Initial expansion: {} modules placed, {} sockets sealed",
            report.placed + 1,
            report.sealed
        );
        Ok(report)
    }
}
