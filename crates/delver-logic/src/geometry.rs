//! Geometry for module placement.
//!
//! Poses, axis-aligned bounds, vertical capsules, and the rigid alignment
//! that snaps one part's socket onto another's. Pure functions over `glam`
//! types; nothing here knows about the ECS world.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World up axis. Every part keeps this up when it is aligned.
pub const UP: Vec3 = Vec3::Y;

/// Local forward axis. A socket faces along its pose's forward.
pub const FORWARD: Vec3 = Vec3::Z;

/// Position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Pose facing `forward` with the world up kept upright.
    pub fn looking(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            rotation: look_rotation(forward, UP),
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    /// World pose of something expressed in this pose's local frame.
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose {
            position: self.transform_point(local.position),
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rotation that maps local +Z onto `forward` while keeping `up` as close to
/// local +Y as possible.
///
/// When `forward` is parallel to `up` there is no unique answer; the shortest
/// arc from +Z is used instead.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f = forward.normalize_or_zero();
    if f == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let right = up.cross(f);
    if right.length_squared() < 1e-8 {
        return Quat::from_rotation_arc(FORWARD, f);
    }
    let right = right.normalize();
    let true_up = f.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, true_up, f)).normalize()
}

/// Compute where a part must go so that one of its sockets meets `anchor`.
///
/// `part` is the part's current world pose and `socket_local` the candidate
/// socket in the part's local frame. The returned pose puts that socket at
/// the anchor's position, facing exactly opposite to the anchor.
pub fn align_to_socket(part: &Pose, socket_local: &Pose, anchor: &Pose) -> Pose {
    let current_socket = part.compose(socket_local);

    let target = look_rotation(-anchor.forward(), UP);
    let current = look_rotation(current_socket.forward(), UP);
    let offset = target * current.inverse();
    let rotation = (offset * part.rotation).normalize();

    let socket_after_rotation = part.position + rotation * socket_local.position;
    Pose {
        position: part.position + (anchor.position - socket_after_rotation),
        rotation,
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// True when the boxes overlap by more than `margin` on every axis.
    ///
    /// Faces that merely touch (or overlap by less than `margin`) do not
    /// count, so two parts joined at a socket are not reported as colliding.
    pub fn intersects(&self, other: &Aabb, margin: f32) -> bool {
        (self.min.x + margin < other.max.x && other.min.x + margin < self.max.x)
            && (self.min.y + margin < other.max.y && other.min.y + margin < self.max.y)
            && (self.min.z + margin < other.max.z && other.min.z + margin < self.max.z)
    }

    /// Smallest distance between the box and a point (0 inside).
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        point.distance(point.clamp(self.min, self.max))
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.distance_to_point(center) <= radius
    }

    pub fn expand(&self, amount: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }
}

/// A box in some local frame, turned into world bounds through a pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBox {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl LocalBox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Bounds of the box after it has been moved by `pose`.
    pub fn world_bounds(&self, pose: &Pose) -> Aabb {
        let m = Mat3::from_quat(pose.rotation);
        let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
        Aabb::from_center_half_extents(pose.transform_point(self.center), abs * self.half_extents)
    }
}

/// Upright capsule: a vertical segment swept by a radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub center: Vec3,
    /// Half the length of the inner segment, caps excluded.
    pub half_height: f32,
    pub radius: f32,
}

impl Capsule {
    pub fn new(center: Vec3, half_height: f32, radius: f32) -> Self {
        Self {
            center,
            half_height: half_height.max(0.0),
            radius: radius.max(0.0),
        }
    }

    /// Segment end points (top, bottom).
    pub fn segment(&self) -> (Vec3, Vec3) {
        (
            self.center + UP * self.half_height,
            self.center - UP * self.half_height,
        )
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(
            self.center,
            Vec3::new(self.radius, self.half_height + self.radius, self.radius),
        )
    }

    /// Exact capsule/box test for an upright capsule.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        // Horizontal distance from the segment's axis to the box footprint.
        let dx = (aabb.min.x - self.center.x).max(self.center.x - aabb.max.x).max(0.0);
        let dz = (aabb.min.z - self.center.z).max(self.center.z - aabb.max.z).max(0.0);
        // Vertical gap between the segment and the box's height range.
        let (top, bottom) = self.segment();
        let dy = (aabb.min.y - top.y).max(bottom.y - aabb.max.y).max(0.0);
        dx * dx + dy * dy + dz * dz <= self.radius * self.radius
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        let (top, bottom) = self.segment();
        let y = point.y.clamp(bottom.y, top.y);
        point.distance_squared(Vec3::new(self.center.x, y, self.center.z))
            <= self.radius * self.radius
    }

    pub fn moved_to(&self, center: Vec3) -> Capsule {
        Capsule { center, ..*self }
    }
}

/// Index of the point nearest to `origin`, if any.
pub fn closest(origin: Vec3, points: &[Vec3]) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            origin
                .distance_squared(**a)
                .total_cmp(&origin.distance_squared(**b))
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-4)
    }

    #[test]
    fn test_look_rotation_identity() {
        let q = look_rotation(FORWARD, UP);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn test_look_rotation_maps_forward() {
        for dir in [Vec3::X, -Vec3::X, -Vec3::Z, Vec3::new(1.0, 0.0, 1.0)] {
            let q = look_rotation(dir, UP);
            assert!(approx(q * FORWARD, dir.normalize()), "dir {dir:?}");
            assert!(approx(q * UP, UP), "up drifted for {dir:?}");
        }
    }

    #[test]
    fn test_look_rotation_straight_up() {
        let q = look_rotation(UP, UP);
        assert!(approx(q * FORWARD, UP));
    }

    #[test]
    fn test_align_faces_sockets_together() {
        // Anchor socket at (5,0,0) facing +X.
        let anchor = Pose::looking(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
        // Candidate part at origin with a socket at (0,0,-3) facing -Z.
        let part = Pose::IDENTITY;
        let socket = Pose::looking(Vec3::new(0.0, 0.0, -3.0), -Vec3::Z);

        let aligned = align_to_socket(&part, &socket, &anchor);
        let socket_world = aligned.compose(&socket);

        assert!(approx(socket_world.position, anchor.position));
        assert!(approx(socket_world.forward(), -anchor.forward()));
        assert!(approx(aligned.rotation * UP, UP));
        // Part centre ends up 3 units further along +X.
        assert!(approx(aligned.position, Vec3::new(8.0, 0.0, 0.0)));
    }

    #[test]
    fn test_align_from_rotated_start() {
        let anchor = Pose::looking(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        let part = Pose::new(Vec3::new(-4.0, 0.0, 2.0), Quat::from_rotation_y(FRAC_PI_2));
        let socket = Pose::looking(Vec3::new(2.0, 0.0, 0.0), Vec3::X);

        let aligned = align_to_socket(&part, &socket, &anchor);
        let socket_world = aligned.compose(&socket);
        assert!(approx(socket_world.position, anchor.position));
        assert!(approx(socket_world.forward(), -Vec3::Z));
    }

    #[test]
    fn test_aabb_touching_is_not_overlap() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(5.0));
        let b = Aabb::from_center_half_extents(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(5.0));
        assert!(!a.intersects(&b, 0.01));
        let c = Aabb::from_center_half_extents(Vec3::new(9.0, 0.0, 0.0), Vec3::splat(5.0));
        assert!(a.intersects(&c, 0.01));
    }

    #[test]
    fn test_local_box_world_bounds_rotated() {
        let b = LocalBox::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(2.0, 1.0, 5.0));
        let pose = Pose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let w = b.world_bounds(&pose);
        // +Z rotated a quarter turn about Y becomes +X.
        assert!(approx(w.center(), Vec3::new(6.0, 0.0, 0.0)));
        assert!(approx(w.half_extents(), Vec3::new(5.0, 1.0, 2.0)));
    }

    #[test]
    fn test_capsule_intersects_aabb() {
        let cap = Capsule::new(Vec3::ZERO, 2.0, 1.0);
        let near = Aabb::from_center_half_extents(Vec3::new(1.5, 0.0, 0.0), Vec3::splat(0.6));
        let far = Aabb::from_center_half_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::splat(1.0));
        let above = Aabb::from_center_half_extents(Vec3::new(0.0, 2.8, 0.0), Vec3::splat(0.4));
        assert!(cap.intersects_aabb(&near));
        assert!(!cap.intersects_aabb(&far));
        assert!(cap.intersects_aabb(&above));
        assert!(cap.bounds().contains_point(Vec3::new(0.0, 2.9, 0.0)));
    }

    #[test]
    fn test_capsule_contains_point() {
        let cap = Capsule::new(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.5);
        assert!(cap.contains_point(Vec3::new(0.2, 2.3, 0.0)));
        assert!(!cap.contains_point(Vec3::new(0.6, 1.0, 0.0)));
    }

    #[test]
    fn test_closest() {
        let pts = [Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(-3.0, 0.0, 0.0)];
        assert_eq!(closest(Vec3::ZERO, &pts), Some(1));
        assert_eq!(closest(Vec3::ZERO, &[]), None);
    }
}
