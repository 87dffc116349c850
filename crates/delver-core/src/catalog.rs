//! Prefab catalog: the module and connector templates generation draws from.
//!
//! A catalog is plain data. It can be built in code with the `with_*`
//! methods, loaded from JSON, or taken from [`PrefabCatalog::standard`].

use delver_logic::constants::{ConnectorKind, PartKind, SizeClass};
use delver_logic::geometry::{LocalBox, Pose};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Index of a part prefab in [`PrefabCatalog::parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabId(pub u32);

/// A socket as authored on a prefab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocketPrefab {
    pub position: Vec3,
    /// Direction pointing out of the module.
    pub facing: Vec3,
    #[serde(default)]
    pub size_class: SizeClass,
}

impl SocketPrefab {
    pub fn new(position: Vec3, facing: Vec3, size_class: SizeClass) -> Self {
        Self {
            position,
            facing,
            size_class,
        }
    }

    pub fn local_pose(&self) -> Pose {
        Pose::looking(self.position, self.facing)
    }
}

/// A module template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartPrefab {
    pub name: String,
    pub kind: PartKind,
    pub bounds: LocalBox,
    pub sockets: Vec<SocketPrefab>,
}

impl PartPrefab {
    /// Rectangular module `width` (x) by `depth` (z), standing on the floor.
    pub fn rect(name: &str, kind: PartKind, width: f32, depth: f32, sockets: Vec<SocketPrefab>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            bounds: LocalBox::new(
                Vec3::new(0.0, WALL_HEIGHT * 0.5, 0.0),
                Vec3::new(width * 0.5, WALL_HEIGHT * 0.5, depth * 0.5),
            ),
            sockets,
        }
    }

    pub fn has_socket_class(&self, class: SizeClass) -> bool {
        self.sockets.iter().any(|s| s.size_class == class)
    }
}

/// Door, locked door or filler template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorPrefab {
    pub name: String,
    pub half_extents: Vec3,
}

impl ConnectorPrefab {
    pub fn new(name: &str, half_extents: Vec3) -> Self {
        Self {
            name: name.to_string(),
            half_extents,
        }
    }

    /// Collision box standing on the socket, in the socket's frame.
    pub fn local_box(&self) -> LocalBox {
        LocalBox::new(Vec3::new(0.0, self.half_extents.y, 0.0), self.half_extents)
    }
}

/// Which pool a growth step draws its candidate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolKind {
    Hallway,
    Room,
    /// Special rooms; in practice dead ends.
    Special,
}

impl PoolKind {
    pub fn all() -> [PoolKind; 3] {
        [PoolKind::Hallway, PoolKind::Room, PoolKind::Special]
    }
}

const WALL_HEIGHT: f32 = 3.0;

/// Every template the generator may instantiate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabCatalog {
    pub parts: Vec<PartPrefab>,
    pub entrance: Option<PrefabId>,
    pub rooms: Vec<PrefabId>,
    pub special_rooms: Vec<PrefabId>,
    pub hallways: Vec<PrefabId>,
    /// Extra entrances attached after batch growth.
    pub alternate_entrances: Vec<PrefabId>,
    pub door: Option<ConnectorPrefab>,
    pub locked_door: Option<ConnectorPrefab>,
    pub filler: Option<ConnectorPrefab>,
}

impl PrefabCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: PrefabCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add_part(&mut self, prefab: PartPrefab) -> PrefabId {
        self.parts.push(prefab);
        PrefabId(self.parts.len() as u32 - 1)
    }

    pub fn with_entrance(mut self, prefab: PartPrefab) -> Self {
        let id = self.add_part(prefab);
        self.entrance = Some(id);
        self
    }

    pub fn with_room(mut self, prefab: PartPrefab) -> Self {
        let id = self.add_part(prefab);
        self.rooms.push(id);
        self
    }

    pub fn with_special_room(mut self, prefab: PartPrefab) -> Self {
        let id = self.add_part(prefab);
        self.special_rooms.push(id);
        self
    }

    pub fn with_hallway(mut self, prefab: PartPrefab) -> Self {
        let id = self.add_part(prefab);
        self.hallways.push(id);
        self
    }

    pub fn with_alternate_entrance(mut self, prefab: PartPrefab) -> Self {
        let id = self.add_part(prefab);
        self.alternate_entrances.push(id);
        self
    }

    pub fn with_door(mut self, door: ConnectorPrefab) -> Self {
        self.door = Some(door);
        self
    }

    pub fn with_locked_door(mut self, locked: ConnectorPrefab) -> Self {
        self.locked_door = Some(locked);
        self
    }

    pub fn with_filler(mut self, filler: ConnectorPrefab) -> Self {
        self.filler = Some(filler);
        self
    }

    pub fn part(&self, id: PrefabId) -> Result<&PartPrefab, CatalogError> {
        self.parts
            .get(id.0 as usize)
            .ok_or(CatalogError::UnknownPrefab(id))
    }

    pub fn pool(&self, kind: PoolKind) -> &[PrefabId] {
        match kind {
            PoolKind::Hallway => &self.hallways,
            PoolKind::Room => &self.rooms,
            PoolKind::Special => &self.special_rooms,
        }
    }

    pub fn require_entrance(&self) -> Result<PrefabId, CatalogError> {
        self.entrance.ok_or(CatalogError::MissingEntrance)
    }

    /// Template for a connector kind. A missing locked door falls back to
    /// the plain door.
    pub fn connector(&self, kind: ConnectorKind) -> Result<&ConnectorPrefab, CatalogError> {
        match kind {
            ConnectorKind::Door => self.door.as_ref().ok_or(CatalogError::MissingDoor),
            ConnectorKind::LockedDoor => self
                .locked_door
                .as_ref()
                .or(self.door.as_ref())
                .ok_or(CatalogError::MissingDoor),
            ConnectorKind::Filler => self.filler.as_ref().ok_or(CatalogError::MissingFiller),
        }
    }

    /// Everything growth needs: an entrance, a door, at least one
    /// non-empty pool, known ids and socketed prefabs.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.part(self.require_entrance()?)?;
        self.connector(ConnectorKind::Door)?;
        if PoolKind::all().iter().all(|&k| self.pool(k).is_empty()) {
            return Err(CatalogError::EmptyPools);
        }
        let referenced = self
            .rooms
            .iter()
            .chain(&self.special_rooms)
            .chain(&self.hallways)
            .chain(&self.alternate_entrances);
        for &id in referenced {
            self.part(id)?;
        }
        if let Some(p) = self.parts.iter().find(|p| p.sockets.is_empty()) {
            return Err(CatalogError::NoSockets(p.name.clone()));
        }
        Ok(())
    }

    /// Built-in stone dungeon set.
    pub fn standard() -> Self {
        use SizeClass::{Large, Small};
        let s = |x: f32, z: f32, facing: Vec3, class| SocketPrefab::new(Vec3::new(x, 0.0, z), facing, class);
        let (n, e, so, w) = (Vec3::Z, Vec3::X, -Vec3::Z, -Vec3::X);

        PrefabCatalog::new()
            .with_entrance(PartPrefab::rect(
                "Entrance Hall",
                PartKind::Entrance,
                8.0,
                8.0,
                vec![s(0.0, 4.0, n, Small), s(4.0, 0.0, e, Large), s(-4.0, 0.0, w, Small)],
            ))
            .with_room(PartPrefab::rect(
                "Guard Room",
                PartKind::Room,
                10.0,
                10.0,
                vec![
                    s(0.0, 5.0, n, Small),
                    s(0.0, -5.0, so, Small),
                    s(5.0, 0.0, e, Large),
                    s(-5.0, 0.0, w, Small),
                ],
            ))
            .with_room(PartPrefab::rect(
                "Great Hall",
                PartKind::Room,
                16.0,
                10.0,
                vec![
                    s(-8.0, 0.0, w, Large),
                    s(8.0, 0.0, e, Large),
                    s(0.0, 5.0, n, Small),
                    s(0.0, -5.0, so, Small),
                ],
            ))
            .with_room(PartPrefab::rect(
                "Cell Block",
                PartKind::Room,
                8.0,
                12.0,
                vec![s(0.0, -6.0, so, Small), s(0.0, 6.0, n, Small), s(4.0, 3.0, e, Small)],
            ))
            .with_room(PartPrefab::rect(
                "Armory",
                PartKind::Room,
                8.0,
                8.0,
                vec![s(0.0, -4.0, so, Large), s(-4.0, 0.0, w, Small)],
            ))
            .with_hallway(PartPrefab::rect(
                "Narrow Corridor",
                PartKind::Hallway,
                3.0,
                12.0,
                vec![s(0.0, -6.0, so, Small), s(0.0, 6.0, n, Small)],
            ))
            .with_hallway(PartPrefab::rect(
                "Wide Corridor",
                PartKind::Hallway,
                5.0,
                12.0,
                vec![s(0.0, -6.0, so, Large), s(0.0, 6.0, n, Large)],
            ))
            .with_hallway(PartPrefab::rect(
                "Corridor Bend",
                PartKind::Hallway,
                3.0,
                3.0,
                vec![s(0.0, -1.5, so, Small), s(1.5, 0.0, e, Small)],
            ))
            .with_hallway(PartPrefab::rect(
                "Reducer",
                PartKind::Hallway,
                4.0,
                8.0,
                vec![s(0.0, -4.0, so, Large), s(0.0, 4.0, n, Small)],
            ))
            .with_special_room(PartPrefab::rect(
                "Treasure Vault",
                PartKind::DeadEnd,
                6.0,
                6.0,
                vec![s(0.0, -3.0, so, Small)],
            ))
            .with_special_room(PartPrefab::rect(
                "Shrine",
                PartKind::DeadEnd,
                8.0,
                8.0,
                vec![s(0.0, -4.0, so, Large)],
            ))
            .with_alternate_entrance(PartPrefab::rect(
                "Collapsed Stair",
                PartKind::Entrance,
                6.0,
                6.0,
                vec![s(0.0, -3.0, so, Small)],
            ))
            .with_door(ConnectorPrefab::new("Wooden Door", Vec3::new(1.0, 1.25, 0.1)))
            .with_locked_door(ConnectorPrefab::new("Iron Gate", Vec3::new(1.0, 1.25, 0.1)))
            .with_filler(ConnectorPrefab::new("Rubble Wall", Vec3::new(1.5, 1.5, 0.15)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let c = PrefabCatalog::standard();
        c.validate().unwrap();
        assert_eq!(c.part(c.require_entrance().unwrap()).unwrap().kind, PartKind::Entrance);
        assert!(!c.rooms.is_empty() && !c.hallways.is_empty() && !c.special_rooms.is_empty());
    }

    #[test]
    fn test_sockets_sit_on_bounds_faces() {
        let c = PrefabCatalog::standard();
        for p in &c.parts {
            for s in &p.sockets {
                let h = p.bounds.half_extents;
                let on_face = (s.position.x.abs() - h.x).abs() < 1e-4
                    || (s.position.z.abs() - h.z).abs() < 1e-4;
                assert!(on_face, "{} socket at {:?} is not on a face", p.name, s.position);
                // Facing points outwards.
                assert!(s.facing.dot(s.position) > 0.0, "{} socket faces inwards", p.name);
            }
        }
    }

    #[test]
    fn test_missing_pieces_rejected() {
        let bare = PrefabCatalog::new();
        assert!(matches!(bare.validate(), Err(CatalogError::MissingEntrance)));

        let no_door = PrefabCatalog::new().with_entrance(PartPrefab::rect(
            "e",
            PartKind::Entrance,
            4.0,
            4.0,
            vec![SocketPrefab::new(Vec3::new(0.0, 0.0, 2.0), Vec3::Z, SizeClass::Small)],
        ));
        assert!(matches!(no_door.validate(), Err(CatalogError::MissingDoor)));

        let no_pools = no_door.with_door(ConnectorPrefab::new("d", Vec3::ONE));
        assert!(matches!(no_pools.validate(), Err(CatalogError::EmptyPools)));
    }

    #[test]
    fn test_unknown_pool_id_rejected() {
        let mut c = PrefabCatalog::standard();
        c.rooms.push(PrefabId(999));
        assert!(matches!(c.validate(), Err(CatalogError::UnknownPrefab(PrefabId(999)))));
    }

    #[test]
    fn test_locked_door_falls_back_to_door() {
        let mut c = PrefabCatalog::standard();
        c.locked_door = None;
        assert_eq!(c.connector(ConnectorKind::LockedDoor).unwrap().name, "Wooden Door");
        c.filler = None;
        assert!(matches!(c.connector(ConnectorKind::Filler), Err(CatalogError::MissingFiller)));
    }

    #[test]
    fn test_json_round_trip_keeps_pools() {
        let c = PrefabCatalog::standard();
        let json = c.to_json().unwrap();
        let back = PrefabCatalog::from_json(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(PrefabCatalog::from_json("{ nope"), Err(CatalogError::Parse(_))));
    }
}
