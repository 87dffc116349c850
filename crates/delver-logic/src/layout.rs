//! Layout validation for generated dungeons.
//!
//! Pure functions that take a plain-data `LayoutSnapshot` and return
//! validation errors. No ECS dependency. The generator exports a snapshot
//! and the harness or tests run these checks on it.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{ConnectorKind, PartKind, SizeClass};
use crate::geometry::Aabb;

/// One socket of a placed module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketRecord {
    pub index: u16,
    pub size_class: SizeClass,
    pub position: Vec3,
    pub occupied: bool,
}

/// One placed module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: u32,
    pub prefab: String,
    pub kind: PartKind,
    pub bounds: Aabb,
    pub sockets: Vec<SocketRecord>,
}

/// A committed socket pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkRecord {
    pub module_a: u32,
    pub socket_a: u16,
    pub module_b: u32,
    pub socket_b: u16,
}

/// A door, locked door, or filler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub kind: ConnectorKind,
    pub position: Vec3,
}

/// Everything needed to validate a layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub entrance: Option<u32>,
    pub modules: Vec<ModuleRecord>,
    pub links: Vec<LinkRecord>,
    pub connectors: Vec<ConnectorRecord>,
}

impl LayoutSnapshot {
    pub fn module(&self, id: u32) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.id == id)
    }

    fn socket(&self, module: u32, index: u16) -> Option<&SocketRecord> {
        self.module(module)
            .and_then(|m| m.sockets.iter().find(|s| s.index == index))
    }

    pub fn open_socket_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| m.sockets.iter())
            .filter(|s| !s.occupied)
            .count()
    }

    pub fn count_kind(&self, kind: PartKind) -> usize {
        self.modules.iter().filter(|m| m.kind == kind).count()
    }

    pub fn count_connectors(&self, kind: ConnectorKind) -> usize {
        self.connectors.iter().filter(|c| c.kind == kind).count()
    }
}

/// A layout validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Module geometry (pairwise) ───────────────────────────────────────

/// AABB overlap test: no two placed modules may overlap by more than
/// `tolerance` on every axis.
pub fn check_module_overlaps(modules: &[ModuleRecord], tolerance: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for i in 0..modules.len() {
        for j in (i + 1)..modules.len() {
            let a = &modules[i];
            let b = &modules[j];
            if a.bounds.intersects(&b.bounds, tolerance) {
                errors.push(ValidationError {
                    category: "module_overlap",
                    severity: Severity::Error,
                    message: format!(
                        "Modules #{} ({}) and #{} ({}) overlap",
                        a.id, a.prefab, b.id, b.prefab
                    ),
                });
            }
        }
    }
    errors
}

// ── B. Links ────────────────────────────────────────────────────────────

/// Check every link references existing, occupied sockets of equal size
/// class whose positions coincide.
pub fn check_links(layout: &LayoutSnapshot, tolerance: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for l in &layout.links {
        let a = layout.socket(l.module_a, l.socket_a);
        let b = layout.socket(l.module_b, l.socket_b);
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                errors.push(ValidationError {
                    category: "link_validity",
                    severity: Severity::Error,
                    message: format!(
                        "Link #{}:{} ↔ #{}:{} references a missing socket",
                        l.module_a, l.socket_a, l.module_b, l.socket_b
                    ),
                });
                continue;
            }
        };
        if a.size_class != b.size_class {
            errors.push(ValidationError {
                category: "size_class",
                severity: Severity::Error,
                message: format!(
                    "Link #{} ↔ #{} joins {:?} to {:?}",
                    l.module_a, l.module_b, a.size_class, b.size_class
                ),
            });
        }
        if !a.occupied || !b.occupied {
            errors.push(ValidationError {
                category: "link_validity",
                severity: Severity::Error,
                message: format!(
                    "Link #{} ↔ #{} has an unoccupied endpoint",
                    l.module_a, l.module_b
                ),
            });
        }
        if a.position.distance(b.position) > tolerance {
            errors.push(ValidationError {
                category: "alignment",
                severity: Severity::Error,
                message: format!(
                    "Link #{} ↔ #{} endpoints are {:.3} apart",
                    l.module_a,
                    l.module_b,
                    a.position.distance(b.position)
                ),
            });
        }
    }
    errors
}

// ── C. Connectivity (graph-level) ───────────────────────────────────────

/// Check that every module is reachable from the entrance via links.
pub fn check_connectivity(layout: &LayoutSnapshot) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if layout.modules.is_empty() {
        return errors;
    }
    let Some(start) = layout.entrance else {
        errors.push(ValidationError {
            category: "connectivity",
            severity: Severity::Error,
            message: format!("{} modules but no entrance", layout.modules.len()),
        });
        return errors;
    };

    let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
    for l in &layout.links {
        adj.entry(l.module_a).or_default().push(l.module_b);
        adj.entry(l.module_b).or_default().push(l.module_a);
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = adj.get(&current) {
            for &next in neighbors {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    let unreached: Vec<u32> = layout
        .modules
        .iter()
        .map(|m| m.id)
        .filter(|id| !visited.contains(id))
        .collect();
    if !unreached.is_empty() {
        errors.push(ValidationError {
            category: "connectivity",
            severity: Severity::Error,
            message: format!(
                "{} of {} modules unreachable from entrance (e.g. module #{})",
                unreached.len(),
                layout.modules.len(),
                unreached[0]
            ),
        });
    }
    errors
}

// ── D. Connectors ───────────────────────────────────────────────────────

/// Every occupied socket has exactly one connector within `tolerance`, and
/// no two connectors sit within `tolerance` of each other.
pub fn check_connectors(layout: &LayoutSnapshot, tolerance: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for m in &layout.modules {
        for s in m.sockets.iter().filter(|s| s.occupied) {
            let near = layout
                .connectors
                .iter()
                .filter(|c| c.position.distance(s.position) <= tolerance)
                .count();
            if near != 1 {
                errors.push(ValidationError {
                    category: "connector_conservation",
                    severity: Severity::Error,
                    message: format!(
                        "Module #{} socket {} has {} connectors (expected 1)",
                        m.id, s.index, near
                    ),
                });
            }
        }
    }

    for i in 0..layout.connectors.len() {
        for j in (i + 1)..layout.connectors.len() {
            let a = &layout.connectors[i];
            let b = &layout.connectors[j];
            if a.position.distance(b.position) <= tolerance {
                errors.push(ValidationError {
                    category: "connector_duplicate",
                    severity: Severity::Error,
                    message: format!(
                        "{:?} and {:?} coincide at ({:.2}, {:.2}, {:.2})",
                        a.kind, b.kind, a.position.x, a.position.y, a.position.z
                    ),
                });
            }
        }
    }
    errors
}

/// Open sockets left in a layout that was supposed to be sealed.
pub fn check_fully_sealed(layout: &LayoutSnapshot) -> Vec<ValidationError> {
    let open = layout.open_socket_count();
    if open == 0 {
        return Vec::new();
    }
    vec![ValidationError {
        category: "sealing",
        severity: Severity::Warning,
        message: format!("{} sockets left open", open),
    }]
}

// ── Aggregate ───────────────────────────────────────────────────────────

/// Run every structural check.
pub fn validate_all(
    layout: &LayoutSnapshot,
    overlap_tolerance: f32,
    connector_tolerance: f32,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    errors.extend(check_module_overlaps(&layout.modules, overlap_tolerance));
    errors.extend(check_links(layout, connector_tolerance));
    errors.extend(check_connectivity(layout));
    errors.extend(check_connectors(layout, connector_tolerance));
    errors
}

/// Keep only hard errors.
pub fn errors_only(errors: &[ValidationError]) -> Vec<&ValidationError> {
    errors
        .iter()
        .filter(|e| e.severity == Severity::Error)
        .collect()
}
