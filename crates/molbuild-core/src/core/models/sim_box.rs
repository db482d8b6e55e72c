use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;
use tracing::warn;

const DETERMINANT_TOLERANCE: f64 = 1e-10;
const ANGLE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoxError {
    #[error("Box vectors are co-linear or co-planar and do not span a volume")]
    CoLinear,
    #[error("Box lengths must be positive and finite, got {0:?}")]
    InvalidLengths([f64; 3]),
    #[error("Box angles {0:?} (degrees) do not describe a valid parallelepiped")]
    InvalidAngles([f64; 3]),
    #[error("Box minimums {mins:?} exceed maximums {maxs:?}")]
    InvertedBounds { mins: [f64; 3], maxs: [f64; 3] },
}

/// A periodic simulation cell.
///
/// The cell is stored as three right-handed row vectors `a`, `b`, `c`. Cells built
/// from lengths and angles (or tilt factors) are in canonical lower-triangular form,
/// with `a` along x and `b` in the xy plane. Right-handed vectors keep the
/// orientation they were given, so the box stays in the frame of the particles it
/// was built around.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBox {
    vectors: Matrix3<f64>,
}

impl SimBox {
    /// Creates a box from row vectors.
    ///
    /// Right-handed vectors are stored as given. Left-handed input is accepted with a
    /// warning and converted to the canonical right-handed cell with identical
    /// lengths and angles.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::CoLinear`] if the vectors do not span a volume.
    pub fn from_vectors(vectors: Matrix3<f64>) -> Result<Self, BoxError> {
        if vectors.iter().any(|v| !v.is_finite()) {
            return Err(BoxError::CoLinear);
        }
        let det = vectors.determinant();
        if det.abs() < DETERMINANT_TOLERANCE {
            return Err(BoxError::CoLinear);
        }
        if det > 0.0 {
            return Ok(Self { vectors });
        }
        warn!(
            "Box vectors provided for a left-handed basis, these will be transformed into a right-handed basis automatically."
        );
        let rows: [Vector3<f64>; 3] = [
            vectors.row(0).transpose(),
            vectors.row(1).transpose(),
            vectors.row(2).transpose(),
        ];
        let lengths = [rows[0].norm(), rows[1].norm(), rows[2].norm()];
        let angles = [
            rows[1].angle(&rows[2]).to_degrees(),
            rows[0].angle(&rows[2]).to_degrees(),
            rows[0].angle(&rows[1]).to_degrees(),
        ];
        Self::from_lengths_angles(lengths, angles)
    }

    /// Creates a box from edge lengths `(a, b, c)` and angles `(alpha, beta, gamma)` in
    /// degrees.
    pub fn from_lengths_angles(lengths: [f64; 3], angles: [f64; 3]) -> Result<Self, BoxError> {
        validate_lengths(lengths)?;
        validate_angles(angles)?;

        let [a, b, c] = lengths;
        let [alpha, beta, gamma] = angles.map(f64::to_radians);

        let a_vec = Vector3::new(a, 0.0, 0.0);
        let b_vec = Vector3::new(b * gamma.cos(), b * gamma.sin(), 0.0);

        let c_x = c * beta.cos();
        let c_cos_y_term = (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let c_z_squared = 1.0 - beta.cos().powi(2) - c_cos_y_term.powi(2);
        if c_z_squared <= 0.0 {
            return Err(BoxError::InvalidAngles(angles));
        }
        let c_vec = Vector3::new(c_x, c * c_cos_y_term, c * c_z_squared.sqrt());

        Ok(Self {
            vectors: Matrix3::from_rows(&[
                a_vec.transpose(),
                b_vec.transpose(),
                c_vec.transpose(),
            ]),
        })
    }

    /// Creates an orthogonal box.
    pub fn from_lengths(lengths: [f64; 3]) -> Result<Self, BoxError> {
        Self::from_lengths_angles(lengths, [90.0, 90.0, 90.0])
    }

    /// Creates a box by scaling each row of `unit_vectors` by the matching length.
    pub fn from_uvec_lengths(
        unit_vectors: Matrix3<f64>,
        lengths: [f64; 3],
    ) -> Result<Self, BoxError> {
        validate_lengths(lengths)?;
        let mut scaled = unit_vectors;
        for (i, length) in lengths.iter().enumerate() {
            let row = scaled.row(i).normalize() * *length;
            scaled.set_row(i, &row);
        }
        Self::from_vectors(scaled)
    }

    /// Creates a box from LAMMPS-style bounds and tilt factors `(xy, xz, yz)`.
    pub fn from_lo_hi_tilt_factors(
        lo: [f64; 3],
        hi: [f64; 3],
        tilt_factors: [f64; 3],
    ) -> Result<Self, BoxError> {
        if lo.iter().zip(&hi).any(|(l, h)| l > h) {
            return Err(BoxError::InvertedBounds { mins: lo, maxs: hi });
        }
        let lengths = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
        Self::from_lengths_tilt_factors(lengths, tilt_factors)
    }

    pub fn from_lengths_tilt_factors(
        lengths: [f64; 3],
        tilt_factors: [f64; 3],
    ) -> Result<Self, BoxError> {
        validate_lengths(lengths)?;
        let [lx, ly, lz] = lengths;
        let [xy, xz, yz] = tilt_factors;
        let vectors = Matrix3::new(
            lx, 0.0, 0.0, //
            xy, ly, 0.0, //
            xz, yz, lz,
        );
        Self::from_vectors(vectors)
    }

    pub fn from_mins_maxs_angles(
        mins: [f64; 3],
        maxs: [f64; 3],
        angles: [f64; 3],
    ) -> Result<Self, BoxError> {
        if mins.iter().zip(&maxs).any(|(l, h)| l > h) {
            return Err(BoxError::InvertedBounds { mins, maxs });
        }
        Self::from_lengths_angles(
            [maxs[0] - mins[0], maxs[1] - mins[1], maxs[2] - mins[2]],
            angles,
        )
    }

    /// The cell vectors as matrix rows.
    pub fn vectors(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    pub fn vector(&self, axis: usize) -> Vector3<f64> {
        self.vectors.row(axis).transpose()
    }

    pub fn lengths(&self) -> [f64; 3] {
        [0, 1, 2].map(|i| self.vector(i).norm())
    }

    /// The cell angles `(alpha, beta, gamma)` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let (a, b, c) = (self.vector(0), self.vector(1), self.vector(2));
        [
            b.angle(&c).to_degrees(),
            a.angle(&c).to_degrees(),
            a.angle(&b).to_degrees(),
        ]
    }

    /// Tilt factors `(xy, xz, yz)` of the equivalent canonical cell.
    pub fn tilt_factors(&self) -> [f64; 3] {
        let (a, b, c) = (self.vector(0), self.vector(1), self.vector(2));
        let a_hat = a / a.norm();
        let xy = b.dot(&a_hat);
        let xz = c.dot(&a_hat);
        let ly = (b.norm_squared() - xy * xy).sqrt();
        [xy, xz, (b.dot(&c) - xy * xz) / ly]
    }

    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }

    pub fn is_orthogonal(&self) -> bool {
        self.angles()
            .iter()
            .all(|angle| (angle - 90.0).abs() < ANGLE_TOLERANCE)
    }

    /// Expresses a cartesian vector in units of the cell vectors.
    pub fn to_fractional(&self, v: &Vector3<f64>) -> Vector3<f64> {
        // Rows are the cell vectors, so cartesian = vectors^T * fractional.
        match self.vectors.transpose().try_inverse() {
            Some(inverse) => inverse * v,
            None => *v,
        }
    }

    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.vectors.transpose() * fractional
    }

    /// Returns a box whose vectors are multiplied per axis by `factors`.
    pub fn scaled(&self, factors: [f64; 3]) -> Result<Self, BoxError> {
        let mut vectors = self.vectors;
        for (i, factor) in factors.iter().enumerate() {
            let row = vectors.row(i) * *factor;
            vectors.set_row(i, &row);
        }
        Self::from_vectors(vectors)
    }
}

/// An axis-aligned bounding box around a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub mins: Point3<f64>,
    pub maxs: Point3<f64>,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            BoundingBox {
                mins: first,
                maxs: first,
            },
            |bb, p| BoundingBox {
                mins: bb.mins.inf(p),
                maxs: bb.maxs.sup(p),
            },
        ))
    }

    pub fn lengths(&self) -> Vector3<f64> {
        self.maxs - self.mins
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.mins, &self.maxs)
    }
}

fn validate_lengths(lengths: [f64; 3]) -> Result<(), BoxError> {
    if lengths.iter().any(|l| !l.is_finite() || *l <= 0.0) {
        return Err(BoxError::InvalidLengths(lengths));
    }
    Ok(())
}

fn validate_angles(angles: [f64; 3]) -> Result<(), BoxError> {
    let [alpha, beta, gamma] = angles;
    let in_range = angles
        .iter()
        .all(|a| a.is_finite() && *a > 0.0 && *a < 180.0);
    let sum = alpha + beta + gamma;
    let triangle = alpha < beta + gamma && beta < alpha + gamma && gamma < alpha + beta;
    if !in_range || sum >= 360.0 || !triangle {
        return Err(BoxError::InvalidAngles(angles));
    }
    Ok(())
}
