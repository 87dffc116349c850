//! Entry sockets: the attachment points on a module's boundary.

use delver_logic::constants::SizeClass;
use delver_logic::geometry::Pose;
use serde::{Deserialize, Serialize};

/// Index of a socket within its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketId(pub u16);

impl SocketId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "socket {}", self.0)
    }
}

/// One attachment point. Its pose is in the owning module's local frame and
/// its forward points out of the module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntrySocket {
    size_class: SizeClass,
    local: Pose,
    occupied: bool,
}

impl EntrySocket {
    pub fn new(size_class: SizeClass, local: Pose) -> Self {
        Self {
            size_class,
            local,
            occupied: false,
        }
    }

    pub fn size_class(&self) -> SizeClass {
        self.size_class
    }

    pub fn local_pose(&self) -> Pose {
        self.local
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_new_socket_is_free() {
        let mut s = EntrySocket::new(SizeClass::Large, Pose::looking(Vec3::Z, Vec3::Z));
        assert!(!s.is_occupied());
        s.set_occupied(true);
        assert!(s.is_occupied());
        assert_eq!(s.size_class(), SizeClass::Large);
    }
}
