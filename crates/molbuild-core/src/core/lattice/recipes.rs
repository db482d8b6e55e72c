use super::cell::{Basis, Lattice, LatticeError};
use nalgebra::{Point3, Vector3};

fn basis(sites: &[(&str, [f64; 3])]) -> Basis {
    let mut basis = Basis::new();
    for (key, [x, y, z]) in sites {
        basis
            .entry((*key).to_string())
            .or_default()
            .push(Point3::new(*x, *y, *z));
    }
    basis
}

fn check_spacing(spacings: &[f64]) -> Result<(), LatticeError> {
    if spacings.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        let mut reported = [0.0; 3];
        for (slot, s) in reported.iter_mut().zip(spacings.iter().cycle()) {
            *slot = *s;
        }
        return Err(LatticeError::InvalidSpacing(reported));
    }
    Ok(())
}

/// Simple cubic lattice with edge `a` and a single site `A` at the origin.
pub fn simple_cubic(a: f64) -> Result<Lattice, LatticeError> {
    check_spacing(&[a])?;
    Lattice::new(
        Vector3::repeat(a),
        None,
        None,
        Some(basis(&[("A", [0.0, 0.0, 0.0])])),
    )
}

/// Body-centred cubic lattice: `A` at the corner, `B` at the body centre.
pub fn body_centered_cubic(a: f64) -> Result<Lattice, LatticeError> {
    check_spacing(&[a])?;
    Lattice::new(
        Vector3::repeat(a),
        None,
        None,
        Some(basis(&[("A", [0.0, 0.0, 0.0]), ("B", [0.5, 0.5, 0.5])])),
    )
}

/// Face-centred cubic lattice: `A` at the corner and `B`, `C`, `D` on the faces.
pub fn face_centered_cubic(a: f64) -> Result<Lattice, LatticeError> {
    check_spacing(&[a])?;
    Lattice::new(
        Vector3::repeat(a),
        None,
        None,
        Some(basis(&[
            ("A", [0.0, 0.0, 0.0]),
            ("B", [0.0, 0.5, 0.5]),
            ("C", [0.5, 0.0, 0.5]),
            ("D", [0.5, 0.5, 0.0]),
        ])),
    )
}

/// Hexagonal lattice with in-plane edge `a`, height `c` and gamma = 120 degrees.
pub fn hexagonal(a: f64, c: f64) -> Result<Lattice, LatticeError> {
    check_spacing(&[a, a, c])?;
    Lattice::new(
        Vector3::new(a, a, c),
        None,
        Some([90.0, 90.0, 120.0]),
        Some(basis(&[("A", [0.0, 0.0, 0.0])])),
    )
}

/// Rhombohedral lattice with equal edges `a` and equal angles `alpha` (degrees).
pub fn rhombohedral(a: f64, alpha: f64) -> Result<Lattice, LatticeError> {
    check_spacing(&[a])?;
    if (alpha - 90.0).abs() < f64::EPSILON {
        return Err(LatticeError::InvalidAngles([alpha; 3]));
    }
    Lattice::new(
        Vector3::repeat(a),
        None,
        Some([alpha; 3]),
        Some(basis(&[("A", [0.0, 0.0, 0.0])])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn cubic_recipes_have_expected_site_counts() {
        let cases = [
            (simple_cubic(1.0).unwrap(), 1),
            (body_centered_cubic(1.0).unwrap(), 2),
            (face_centered_cubic(1.0).unwrap(), 4),
        ];
        for (lattice, sites) in cases {
            let n: usize = lattice.basis().values().map(Vec::len).sum();
            assert_eq!(n, sites);
            let compound = lattice.populate(None, 2, 2, 2).unwrap();
            assert_eq!(compound.n_particles(), sites * 8);
        }
    }

    #[test]
    fn fcc_gold_has_expected_box() {
        let lattice = face_centered_cubic(0.408).unwrap();
        let compound = lattice.populate(None, 3, 3, 1).unwrap();
        let lengths = compound.sim_box().unwrap().lengths();
        assert_close(lengths[0], 1.224);
        assert_close(lengths[2], 0.408);
    }

    #[test]
    fn hexagonal_has_120_degree_gamma() {
        let lattice = hexagonal(0.25, 0.67).unwrap();
        assert_close(lattice.angles()[2], 120.0);
        assert_close(lattice.spacing().z, 0.67);
    }

    #[test]
    fn rhombohedral_rejects_right_angle() {
        assert!(matches!(
            rhombohedral(1.0, 90.0),
            Err(LatticeError::InvalidAngles(_))
        ));
        let lattice = rhombohedral(1.0, 70.0).unwrap();
        for angle in lattice.angles() {
            assert_close(angle, 70.0);
        }
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        for result in [simple_cubic(0.0), body_centered_cubic(-1.0), hexagonal(1.0, 0.0)] {
            assert!(matches!(result, Err(LatticeError::InvalidSpacing(_))));
        }
    }
}
