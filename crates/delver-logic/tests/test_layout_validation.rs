//! Integration tests for layout validation on hand-built dungeons.
//!
//! Modules are laid out with `align_to_socket` the same way the generator
//! does it, then the snapshot is broken in specific ways to make sure each
//! check reports its own category.
//!
//! All tests are pure logic: no ECS world, no RNG.

use delver_logic::constants::{ConnectorKind, PartKind, SizeClass};
use delver_logic::geometry::{align_to_socket, LocalBox, Pose};
use delver_logic::layout::{
    check_connectivity, check_fully_sealed, errors_only, validate_all, ConnectorRecord,
    LayoutSnapshot, LinkRecord, ModuleRecord, SocketRecord,
};
use glam::Vec3;

// ── Helpers ────────────────────────────────────────────────────────────

const OVERLAP_TOL: f32 = 0.05;
const CONNECTOR_TOL: f32 = 0.1;

/// 10x10 room with sockets on its south (-Z) and north (+Z) faces.
fn room_box() -> LocalBox {
    LocalBox::new(Vec3::new(0.0, 1.5, 0.0), Vec3::new(5.0, 1.5, 5.0))
}

fn south() -> Pose {
    Pose::looking(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z)
}

fn north() -> Pose {
    Pose::looking(Vec3::new(0.0, 0.0, 5.0), Vec3::Z)
}

fn record(id: u32, kind: PartKind, pose: &Pose, open: [bool; 2]) -> ModuleRecord {
    let sockets = [south(), north()]
        .iter()
        .enumerate()
        .map(|(i, s)| SocketRecord {
            index: i as u16,
            size_class: SizeClass::Small,
            position: pose.compose(s).position,
            occupied: !open[i],
        })
        .collect();
    ModuleRecord {
        id,
        prefab: format!("room{id}"),
        kind,
        bounds: room_box().world_bounds(pose),
        sockets,
    }
}

/// Entrance plus `n` rooms chained north to south, doors at every link.
fn corridor_of_rooms(n: u32) -> LayoutSnapshot {
    let mut poses = vec![Pose::IDENTITY];
    for _ in 0..n {
        let prev = *poses.last().unwrap();
        let anchor = prev.compose(&north());
        poses.push(align_to_socket(&Pose::IDENTITY, &south(), &anchor));
    }

    let last = poses.len() as u32 - 1;
    let modules = poses
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let i = i as u32;
            let kind = if i == 0 { PartKind::Entrance } else { PartKind::Room };
            record(i, kind, p, [i == 0, i == last])
        })
        .collect::<Vec<_>>();
    let links = (0..last)
        .map(|i| LinkRecord {
            module_a: i,
            socket_a: 1,
            module_b: i + 1,
            socket_b: 0,
        })
        .collect();
    let connectors = (0..last)
        .map(|i| ConnectorRecord {
            kind: ConnectorKind::Door,
            position: modules[i as usize].sockets[1].position,
        })
        .collect();
    LayoutSnapshot {
        entrance: Some(0),
        modules,
        links,
        connectors,
    }
}

fn categories(layout: &LayoutSnapshot) -> Vec<&'static str> {
    validate_all(layout, OVERLAP_TOL, CONNECTOR_TOL)
        .iter()
        .map(|e| e.category)
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_aligned_chain_is_clean() {
    let layout = corridor_of_rooms(6);
    assert!(categories(&layout).is_empty(), "{:?}", categories(&layout));
    // Entrance's south and the last room's north are still open.
    assert_eq!(layout.open_socket_count(), 2);
    assert_eq!(check_fully_sealed(&layout).len(), 1);
}

#[test]
fn test_rooms_sit_end_to_end() {
    let layout = corridor_of_rooms(3);
    for pair in layout.modules.windows(2) {
        let gap = pair[1].bounds.min.z - pair[0].bounds.max.z;
        assert!(gap.abs() < 1e-3, "gap {gap}");
    }
}

#[test]
fn test_shifted_module_reports_overlap_and_alignment() {
    let mut layout = corridor_of_rooms(3);
    let shift = Vec3::new(0.0, 0.0, -2.0);
    let m = &mut layout.modules[2];
    m.bounds.min += shift;
    m.bounds.max += shift;
    for s in &mut m.sockets {
        s.position += shift;
    }
    let cats = categories(&layout);
    assert!(cats.contains(&"module_overlap"));
    assert!(cats.contains(&"alignment"));
}

#[test]
fn test_broken_link_breaks_connectivity() {
    let mut layout = corridor_of_rooms(4);
    layout.links.remove(1);
    let errs = check_connectivity(&layout);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].message.starts_with("3 of 5"));
}

#[test]
fn test_missing_entrance_is_an_error() {
    let mut layout = corridor_of_rooms(1);
    layout.entrance = None;
    assert!(categories(&layout).contains(&"connectivity"));
}

#[test]
fn test_sealed_socket_without_filler() {
    let mut layout = corridor_of_rooms(2);
    layout.modules[0].sockets[0].occupied = true;
    let errs = validate_all(&layout, OVERLAP_TOL, CONNECTOR_TOL);
    let hard = errors_only(&errs);
    assert_eq!(hard.len(), 1);
    assert_eq!(hard[0].category, "connector_conservation");

    layout.connectors.push(ConnectorRecord {
        kind: ConnectorKind::Filler,
        position: layout.modules[0].sockets[0].position,
    });
    assert!(categories(&layout).is_empty());
}

#[test]
fn test_snapshot_json_round_trip() {
    let layout = corridor_of_rooms(2);
    let json = serde_json::to_string(&layout).unwrap();
    let back: LayoutSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.modules.len(), 3);
    assert!(categories(&back).is_empty());
}
