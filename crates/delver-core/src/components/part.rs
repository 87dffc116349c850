//! Module components: the placeable part and its committed links.

use delver_logic::constants::{PartKind, SizeClass};
use delver_logic::geometry::{Aabb, LocalBox, Pose};
use hecs::Entity;
use rand::seq::SliceRandom;
use rand::Rng;

use super::socket::{EntrySocket, SocketId};
use crate::catalog::{PartPrefab, PrefabId};

/// A dungeon module instance (room, hallway, dead end or entrance).
#[derive(Debug, Clone)]
pub struct ModulePart {
    pub prefab: PrefabId,
    pub name: String,
    pub kind: PartKind,
    /// Collision bounds in the module's local frame.
    pub bounds: LocalBox,
    sockets: Vec<EntrySocket>,
}

impl ModulePart {
    pub fn new(
        prefab: PrefabId,
        name: impl Into<String>,
        kind: PartKind,
        bounds: LocalBox,
        sockets: Vec<EntrySocket>,
    ) -> Self {
        Self {
            prefab,
            name: name.into(),
            kind,
            bounds,
            sockets,
        }
    }

    /// Fresh instance of a catalog prefab, every socket free.
    pub fn from_prefab(id: PrefabId, prefab: &PartPrefab) -> Self {
        let sockets = prefab
            .sockets
            .iter()
            .map(|s| EntrySocket::new(s.size_class, s.local_pose()))
            .collect();
        Self::new(id, prefab.name.clone(), prefab.kind, prefab.bounds, sockets)
    }

    pub fn sockets(&self) -> impl Iterator<Item = (SocketId, &EntrySocket)> {
        self.sockets
            .iter()
            .enumerate()
            .map(|(i, s)| (SocketId(i as u16), s))
    }

    pub fn socket(&self, id: SocketId) -> Option<&EntrySocket> {
        self.sockets.get(id.index())
    }

    pub fn socket_count(&self) -> usize {
        self.sockets.len()
    }

    pub fn open_sockets(&self) -> impl Iterator<Item = SocketId> + '_ {
        self.sockets()
            .filter(|(_, s)| !s.is_occupied())
            .map(|(id, _)| id)
    }

    pub fn has_open_socket(&self) -> bool {
        self.sockets.iter().any(|s| !s.is_occupied())
    }

    /// A uniformly random free socket, or `None` when all are taken.
    pub fn find_available_socket<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<SocketId> {
        if self.sockets.len() == 1 {
            return (!self.sockets[0].is_occupied()).then_some(SocketId(0));
        }
        let open: Vec<SocketId> = self.open_sockets().collect();
        open.choose(rng).copied()
    }

    /// Like [`find_available_socket`](Self::find_available_socket) but also
    /// reports the chosen socket's size class.
    pub fn find_available_socket_typed<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Option<(SocketId, SizeClass)> {
        let id = self.find_available_socket(rng)?;
        Some((id, self.sockets[id.index()].size_class()))
    }

    /// Mark a socket as taken. Returns false if it does not exist.
    pub fn occupy(&mut self, id: SocketId) -> bool {
        self.set_occupied(id, true)
    }

    /// Undo a provisional reservation.
    pub fn release(&mut self, id: SocketId) -> bool {
        self.set_occupied(id, false)
    }

    /// Close a socket for good. It will never be linked or released.
    pub fn seal(&mut self, id: SocketId) -> bool {
        self.set_occupied(id, true)
    }

    fn set_occupied(&mut self, id: SocketId, occupied: bool) -> bool {
        match self.sockets.get_mut(id.index()) {
            Some(s) => {
                s.set_occupied(occupied);
                true
            }
            None => false,
        }
    }

    pub fn world_bounds(&self, pose: &Pose) -> Aabb {
        self.bounds.world_bounds(pose)
    }

    /// World pose of one of this module's sockets.
    pub fn socket_pose(&self, pose: &Pose, id: SocketId) -> Option<Pose> {
        self.socket(id).map(|s| pose.compose(&s.local_pose()))
    }
}

/// One committed socket pair, seen from the module holding the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub socket: SocketId,
    pub other: Entity,
    pub other_socket: SocketId,
}

/// Links of one module to its neighbours.
#[derive(Debug, Clone, Default)]
pub struct Links {
    pub links: Vec<Link>,
}

impl Links {
    pub fn add(&mut self, socket: SocketId, other: Entity, other_socket: SocketId) {
        self.links.push(Link {
            socket,
            other,
            other_socket,
        });
    }

    pub fn neighbours(&self) -> impl Iterator<Item = Entity> + '_ {
        self.links.iter().map(|l| l.other)
    }

    pub fn is_linked(&self, other: Entity) -> bool {
        self.links.iter().any(|l| l.other == other)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn part(classes: &[SizeClass]) -> ModulePart {
        let sockets = classes
            .iter()
            .enumerate()
            .map(|(i, &c)| EntrySocket::new(c, Pose::looking(Vec3::new(i as f32, 0.0, 0.0), Vec3::X)))
            .collect();
        ModulePart::new(
            PrefabId(0),
            "test",
            PartKind::Room,
            LocalBox::new(Vec3::ZERO, Vec3::ONE),
            sockets,
        )
    }

    #[test]
    fn test_single_socket_shortcut() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = part(&[SizeClass::Small]);
        assert_eq!(p.find_available_socket(&mut rng), Some(SocketId(0)));
        p.occupy(SocketId(0));
        assert_eq!(p.find_available_socket(&mut rng), None);
    }

    #[test]
    fn test_only_free_sockets_are_returned() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut p = part(&[SizeClass::Small, SizeClass::Large, SizeClass::Small]);
        p.occupy(SocketId(0));
        p.occupy(SocketId(2));
        for _ in 0..20 {
            assert_eq!(
                p.find_available_socket_typed(&mut rng),
                Some((SocketId(1), SizeClass::Large))
            );
        }
    }

    #[test]
    fn test_all_free_sockets_get_picked() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = part(&[SizeClass::Small; 4]);
        let mut seen = [false; 4];
        for _ in 0..200 {
            if let Some(id) = p.find_available_socket(&mut rng) {
                seen[id.index()] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_release_and_unknown_socket() {
        let mut p = part(&[SizeClass::Small, SizeClass::Small]);
        assert!(p.occupy(SocketId(1)));
        assert_eq!(p.open_sockets().collect::<Vec<_>>(), vec![SocketId(0)]);
        assert!(p.release(SocketId(1)));
        assert_eq!(p.open_sockets().count(), 2);
        assert!(!p.occupy(SocketId(9)));
    }

    #[test]
    fn test_socket_pose_in_world() {
        let p = part(&[SizeClass::Small, SizeClass::Small]);
        let pose = Pose::from_position(Vec3::new(0.0, 0.0, 10.0));
        let s = p.socket_pose(&pose, SocketId(1)).unwrap();
        assert!(s.position.abs_diff_eq(Vec3::new(1.0, 0.0, 10.0), 1e-5));
        assert!(s.forward().abs_diff_eq(Vec3::X, 1e-5));
    }
}
