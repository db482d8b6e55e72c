use super::ids::{GroupId, ParticleId};
use crate::core::utils::geometry::{angle_between, rotation_about, unit_vector};
use nalgebra::{Isometry3, Point3, Rotation3, Vector3};
use std::f64::consts::PI;

/// Reference ghost-point geometry (nm) of one half of a port: middle, top, left, right.
const SUBPORT_GEOMETRY: [[f64; 3]; 4] = [
    [0.005, 0.0025, -0.0025],
    [0.005, 0.0225, -0.0025],
    [-0.015, -0.0075, -0.0025],
    [0.005, -0.0175, 0.0075],
];

const MIDDLE: usize = 0;
const TOP: usize = 1;
const PARALLEL_TOLERANCE: f64 = 1e-8;

/// A directional attachment point made of two sets of four ghost points.
///
/// The `up` and `down` halves are mirror images of each other rotated by half a turn
/// about the port normal, so two ports can be overlapped either face to face or back
/// to back. Ghost points are never written to output files; they exist only to
/// compute the rigid transform that joins two fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    /// The particle this port belongs to; bonds are formed from the anchor.
    pub anchor: Option<ParticleId>,
    /// Set once the port has taken part in a port-to-port overlap.
    pub used: bool,
    /// The group that directly contains this port.
    pub group: GroupId,
    up: [Point3<f64>; 4],
    down: [Point3<f64>; 4],
}

impl Default for Port {
    fn default() -> Self {
        Self::build(&Vector3::y(), 0.0)
    }
}

impl Port {
    /// Creates a port at the origin facing along `orientation`, shifted by
    /// `separation` along that direction.
    ///
    /// The port is positioned relative to its anchor when it is added to a compound.
    ///
    /// # Return
    ///
    /// Returns `None` if `orientation` is the zero vector.
    pub fn new(orientation: &Vector3<f64>, separation: f64) -> Option<Self> {
        let orientation = unit_vector(orientation)?;
        Some(Self::build(&orientation, separation))
    }

    fn build(orientation: &Vector3<f64>, separation: f64) -> Self {
        let up = SUBPORT_GEOMETRY.map(|[x, y, z]| Point3::new(x, y, z));
        let mut port = Self {
            anchor: None,
            used: false,
            group: GroupId::default(),
            up,
            down: up,
        };

        let default_direction = Vector3::y();
        let half_turn_z = rotation_about(&Vector3::z(), PI);
        if (default_direction + orientation).norm() < PARALLEL_TOLERANCE {
            port.rotate_down(&half_turn_z);
            port.rotate(&half_turn_z);
        } else if (default_direction - orientation).norm() < PARALLEL_TOLERANCE {
            port.rotate_down(&half_turn_z);
        } else {
            let normal = default_direction.cross(orientation);
            port.rotate(&rotation_about(
                &normal,
                angle_between(&default_direction, orientation),
            ));
            port.rotate_down(&rotation_about(&normal, PI));
        }

        port.translate(&(orientation * separation));
        port
    }

    pub fn up(&self) -> &[Point3<f64>; 4] {
        &self.up
    }

    pub fn down(&self) -> &[Point3<f64>; 4] {
        &self.down
    }

    /// The middle ghost point of the `up` half, used as the port's location when
    /// matching ports against pattern points.
    pub fn up_middle(&self) -> Point3<f64> {
        self.up[MIDDLE]
    }

    pub fn points(&self) -> impl Iterator<Item = &Point3<f64>> {
        self.up.iter().chain(self.down.iter())
    }

    /// The mean of all eight ghost points.
    pub fn center(&self) -> Point3<f64> {
        let sum = self.points().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / 8.0)
    }

    /// The unit vector the port faces.
    pub fn direction(&self) -> Vector3<f64> {
        (self.up[TOP] - self.up[MIDDLE]).normalize()
    }

    pub fn translate(&mut self, by: &Vector3<f64>) {
        for p in self.up.iter_mut().chain(self.down.iter_mut()) {
            *p += by;
        }
    }

    /// Rotates all ghost points about the origin.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        for p in self.up.iter_mut().chain(self.down.iter_mut()) {
            *p = rotation * *p;
        }
    }

    pub fn transform(&mut self, isometry: &Isometry3<f64>) {
        for p in self.up.iter_mut().chain(self.down.iter_mut()) {
            *p = isometry * *p;
        }
    }

    fn rotate_down(&mut self, rotation: &Rotation3<f64>) {
        for p in self.down.iter_mut() {
            *p = rotation * *p;
        }
    }
}
