use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, Unit, UnitQuaternion, Vector3};

const DEGENERACY_EPSILON: f64 = 1e-12;

pub fn unit_vector(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    if norm < DEGENERACY_EPSILON {
        None
    } else {
        Some(v / norm)
    }
}

/// Angle between two vectors in radians, clamped so rounding never produces NaN.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < DEGENERACY_EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

pub fn rotation_about(axis: &Vector3<f64>, angle_radians: f64) -> Rotation3<f64> {
    match unit_vector(axis) {
        Some(axis) => Rotation3::from_axis_angle(&Unit::new_unchecked(axis), angle_radians),
        None => Rotation3::identity(),
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Computes the rigid transform that best maps `from` onto `to`.
///
/// The rotation is found with the Kabsch algorithm on the centred point sets; a
/// reflection in the SVD solution is corrected so the result is always a proper
/// rotation. A single point pair yields a pure translation.
///
/// # Return
///
/// Returns `None` when the inputs are empty or of different lengths.
pub fn equivalence_transform(from: &[Point3<f64>], to: &[Point3<f64>]) -> Option<Isometry3<f64>> {
    if from.is_empty() || from.len() != to.len() {
        return None;
    }
    let from_center = centroid(from)?;
    let to_center = centroid(to)?;

    if from.len() == 1 {
        return Some(Isometry3::from_parts(
            Translation3::from(to_center - from_center),
            UnitQuaternion::identity(),
        ));
    }

    let covariance = from
        .iter()
        .zip(to)
        .fold(Matrix3::zeros(), |acc, (p, q)| {
            acc + (p - from_center) * (q - to_center).transpose()
        });

    let svd = covariance.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let mut correction = Matrix3::identity();
    if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
        correction[(2, 2)] = -1.0;
    }
    let rotation_matrix = v_t.transpose() * correction * u.transpose();
    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(
        rotation_matrix,
    ));

    let translation = to_center.coords - rotation * from_center.coords;
    Some(Isometry3::from_parts(Translation3::from(translation), rotation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn assert_points_close(a: &Point3<f64>, b: &Point3<f64>) {
        assert!((a - b).norm() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn unit_vector_normalises_and_rejects_zero() {
        let u = unit_vector(&Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!(unit_vector(&Vector3::zeros()).is_none());
    }

    #[test]
    fn angle_between_handles_parallel_and_antiparallel() {
        let x = Vector3::x();
        assert!(angle_between(&x, &(2.0 * x)).abs() < 1e-12);
        assert!((angle_between(&x, &-x) - std::f64::consts::PI).abs() < 1e-12);
        assert!((angle_between(&x, &Vector3::y()) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn equivalence_transform_recovers_known_rigid_motion() {
        let from = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
        ];
        let expected = Isometry3::from_parts(
            Translation3::new(1.0, -2.0, 0.5),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7),
        );
        let to: Vec<_> = from.iter().map(|p| expected * p).collect();

        let found = equivalence_transform(&from, &to).unwrap();
        for (p, q) in from.iter().zip(&to) {
            assert_points_close(&(found * p), q);
        }
    }

    #[test]
    fn equivalence_transform_is_proper_rotation_for_mirror_images() {
        let from = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let to: Vec<_> = from.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        let found = equivalence_transform(&from, &to).unwrap();
        let det = found.rotation.to_rotation_matrix().matrix().determinant();
        assert!((det - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_pair_is_pure_translation() {
        let found = equivalence_transform(
            &[Point3::new(1.0, 1.0, 1.0)],
            &[Point3::new(2.0, 3.0, 4.0)],
        )
        .unwrap();
        assert_eq!(found.rotation, UnitQuaternion::identity());
        assert_points_close(&(found * Point3::origin()), &Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn mismatched_or_empty_inputs_return_none() {
        assert!(equivalence_transform(&[], &[]).is_none());
        assert!(equivalence_transform(&[Point3::origin()], &[]).is_none());
    }
}
