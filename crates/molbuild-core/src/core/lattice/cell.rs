use crate::core::models::compound::{Compound, CompoundError};
use crate::core::models::sim_box::{BoxError, SimBox};
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

const DUPLICATE_TOLERANCE: f64 = 1e-6;
const DEFAULT_BASIS_KEY: &str = "default";

/// Fractional basis positions keyed by site name.
pub type Basis = BTreeMap<String, Vec<Point3<f64>>>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    #[error("Lattice spacings must be non-negative and finite, got {0:?}")]
    InvalidSpacing([f64; 3]),
    #[error("Lattice vectors and angles cannot both be given")]
    OverDefined,
    #[error("Lattice vectors must be right-handed and span a volume")]
    InvalidVectors,
    #[error("Lattice angles {0:?} (degrees) do not describe a valid cell")]
    InvalidAngles([f64; 3]),
    #[error("Basis site '{key}' has coordinate {value} outside [0, 1)")]
    InvalidBasis { key: String, value: f64 },
    #[error("Repeat counts must be at least 1, got ({0}, {1}, {2})")]
    InvalidRepeat(usize, usize, usize),
    #[error("Compound map does not match the basis: {0}")]
    InvalidCompoundMap(String),
    #[error("Failed to place compound on a lattice site: {0}")]
    Compound(#[from] CompoundError),
    #[error("Failed to build the supercell box: {0}")]
    Box(#[from] BoxError),
}

/// A three-dimensional Bravais lattice with an arbitrary basis.
///
/// `vectors` holds unit row vectors; the actual cell edges are `spacing[d] * vectors[d]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    spacing: Vector3<f64>,
    vectors: Matrix3<f64>,
    angles: [f64; 3],
    basis: Basis,
}

impl Lattice {
    /// Creates and validates a lattice.
    ///
    /// Exactly one of `vectors` or `angles` may describe the cell shape; with neither
    /// the cell is cubic. Vector rows are normalised. Without a basis a single site
    /// named `default` sits at the origin.
    ///
    /// # Errors
    ///
    /// Returns a [`LatticeError`] describing the first invalid input.
    pub fn new(
        spacing: Vector3<f64>,
        vectors: Option<Matrix3<f64>>,
        angles: Option<[f64; 3]>,
        basis: Option<Basis>,
    ) -> Result<Self, LatticeError> {
        if spacing.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(LatticeError::InvalidSpacing([spacing.x, spacing.y, spacing.z]));
        }

        let vectors = match (vectors, angles) {
            (Some(_), Some(_)) => return Err(LatticeError::OverDefined),
            (Some(vectors), None) => normalized_vectors(vectors)?,
            (None, Some(angles)) => {
                let cell = SimBox::from_lengths_angles([1.0; 3], angles)
                    .map_err(|_| LatticeError::InvalidAngles(angles))?;
                *cell.vectors()
            }
            (None, None) => Matrix3::identity(),
        };

        let basis = basis.unwrap_or_else(|| {
            BTreeMap::from([(DEFAULT_BASIS_KEY.to_string(), vec![Point3::origin()])])
        });
        validate_basis(&basis)?;

        let rows = [0, 1, 2].map(|i| vectors.row(i).transpose());
        let angles = [
            rows[1].angle(&rows[2]).to_degrees(),
            rows[0].angle(&rows[2]).to_degrees(),
            rows[0].angle(&rows[1]).to_degrees(),
        ];

        Ok(Self {
            spacing,
            vectors,
            angles,
            basis,
        })
    }

    pub fn spacing(&self) -> &Vector3<f64> {
        &self.spacing
    }

    pub fn vectors(&self) -> &Matrix3<f64> {
        &self.vectors
    }

    /// Cell angles `(alpha, beta, gamma)` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// Cartesian position of fractional site `frac` in unit cell `(i, j, k)`.
    pub fn site_position(&self, frac: &Point3<f64>, cell: [usize; 3]) -> Point3<f64> {
        let mut position = Vector3::zeros();
        for d in 0..3 {
            let edge = self.vectors.row(d).transpose() * self.spacing[d];
            position += edge * (frac[d] + cell[d] as f64);
        }
        Point3::from(position)
    }

    /// Fills an `x` by `y` by `z` supercell.
    ///
    /// Without a compound map every site becomes a particle named after its basis
    /// key. With a map, each key's compound is copied and centred on the site. A map
    /// with a single entry fills every basis key.
    ///
    /// The result is periodic along every axis with a non-zero spacing and carries a
    /// box spanning the supercell when all three spacings are non-zero. The box rows
    /// are the lattice vectors themselves, so sites and box share one frame.
    pub fn populate(
        &self,
        compounds: Option<&BTreeMap<String, Compound>>,
        x: usize,
        y: usize,
        z: usize,
    ) -> Result<Compound, LatticeError> {
        if x == 0 || y == 0 || z == 0 {
            return Err(LatticeError::InvalidRepeat(x, y, z));
        }
        let compounds = compounds.map(|map| self.expand_compound_map(map)).transpose()?;

        let mut lattice = Compound::new("Lattice");
        let root = lattice.root();
        let mut placed: Vec<Point3<f64>> = Vec::new();

        for (key, sites) in &self.basis {
            for frac in sites {
                for i in 0..x {
                    for j in 0..y {
                        for k in 0..z {
                            let position = self.site_position(frac, [i, j, k]);
                            if placed
                                .iter()
                                .any(|p| (p - position).norm() < DUPLICATE_TOLERANCE)
                            {
                                continue;
                            }
                            placed.push(position);
                            let label = format!("{key}[$]");
                            match compounds.as_ref().and_then(|map| map.get(key.as_str())) {
                                Some(template) => {
                                    let mut copy = (*template).clone();
                                    let copy_root = copy.root();
                                    copy.translate_to(copy_root, &position)?;
                                    lattice.add(root, copy, Some(&label))?;
                                }
                                None => {
                                    lattice.add_particle(root, key, position, Some(&label))?;
                                }
                            }
                        }
                    }
                }
            }
        }
        debug!(sites = placed.len(), "Populated lattice sites");

        let counts = [x, y, z];
        lattice.set_periodicity([0, 1, 2].map(|d| self.spacing[d] > 0.0));
        if self.spacing.iter().all(|s| *s > 0.0) {
            let mut box_vectors = self.vectors;
            for d in 0..3 {
                let row = self.vectors.row(d) * self.spacing[d] * counts[d] as f64;
                box_vectors.set_row(d, &row);
            }
            lattice.set_sim_box(Some(SimBox::from_vectors(box_vectors)?));
        }
        Ok(lattice)
    }

    fn expand_compound_map<'a>(
        &self,
        map: &'a BTreeMap<String, Compound>,
    ) -> Result<BTreeMap<&str, &'a Compound>, LatticeError> {
        if map.len() == 1 {
            let Some(only) = map.values().next() else {
                return Err(LatticeError::InvalidCompoundMap("map is empty".into()));
            };
            if self.basis.len() > 1 {
                warn!(
                    "Multiple basis sites and only one compound given; \
                     filling every basis site with it."
                );
            }
            return Ok(self.basis.keys().map(|k| (k.as_str(), only)).collect());
        }

        if map.len() < self.basis.len() {
            return Err(LatticeError::InvalidCompoundMap(format!(
                "{} keys expected, {} provided",
                self.basis.len(),
                map.len()
            )));
        }
        if map.len() > self.basis.len() {
            return Err(LatticeError::InvalidCompoundMap(format!(
                "too many keys, {} expected, {} provided",
                self.basis.len(),
                map.len()
            )));
        }
        self.basis
            .keys()
            .map(|key| {
                map.get(key)
                    .map(|compound| (key.as_str(), compound))
                    .ok_or_else(|| {
                        LatticeError::InvalidCompoundMap(format!("no compound for '{key}'"))
                    })
            })
            .collect()
    }
}

fn normalized_vectors(vectors: Matrix3<f64>) -> Result<Matrix3<f64>, LatticeError> {
    if vectors.iter().any(|v| !v.is_finite()) || vectors.determinant() <= 0.0 {
        return Err(LatticeError::InvalidVectors);
    }
    let mut normalized = vectors;
    for i in 0..3 {
        let row = vectors.row(i).normalize();
        normalized.set_row(i, &row);
    }
    if normalized.determinant().abs() < 1e-10 {
        return Err(LatticeError::InvalidVectors);
    }
    Ok(normalized)
}

fn validate_basis(basis: &Basis) -> Result<(), LatticeError> {
    for (key, sites) in basis {
        for site in sites {
            if let Some(&value) = site.iter().find(|v| !(0.0..1.0).contains(*v)) {
                return Err(LatticeError::InvalidBasis {
                    key: key.clone(),
                    value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn cubic(spacing: f64) -> Lattice {
        Lattice::new(Vector3::repeat(spacing), None, None, None).unwrap()
    }

    #[test]
    fn zero_spacing_is_allowed_negative_is_not() {
        assert!(Lattice::new(Vector3::new(1.0, 0.0, 1.0), None, None, None).is_ok());
        assert!(matches!(
            Lattice::new(Vector3::new(1.0, -1.0, 1.0), None, None, None),
            Err(LatticeError::InvalidSpacing(_))
        ));
        assert!(matches!(
            Lattice::new(Vector3::new(f64::NAN, 1.0, 1.0), None, None, None),
            Err(LatticeError::InvalidSpacing(_))
        ));
    }

    #[test]
    fn vectors_and_angles_together_are_overdefined() {
        let result = Lattice::new(
            Vector3::repeat(1.0),
            Some(Matrix3::identity()),
            Some([90.0, 90.0, 90.0]),
            None,
        );
        assert_eq!(result, Err(LatticeError::OverDefined));
    }

    #[test]
    fn colinear_or_left_handed_vectors_are_rejected() {
        for vectors in [
            Matrix3::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0),
        ] {
            assert_eq!(
                Lattice::new(Vector3::repeat(1.0), Some(vectors), None, None),
                Err(LatticeError::InvalidVectors)
            );
        }
    }

    #[test]
    fn vector_rows_are_normalised() {
        let lattice = Lattice::new(
            Vector3::repeat(1.0),
            Some(Matrix3::new(2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0)),
            None,
            None,
        )
        .unwrap();
        assert_eq!(*lattice.vectors(), Matrix3::identity());
    }

    #[test]
    fn angles_define_vectors() {
        let lattice =
            Lattice::new(Vector3::repeat(1.0), None, Some([90.0, 90.0, 120.0]), None).unwrap();
        assert_close(lattice.angles()[2], 120.0);
        assert!(matches!(
            Lattice::new(Vector3::repeat(1.0), None, Some([90.0, 90.0, 180.0]), None),
            Err(LatticeError::InvalidAngles(_))
        ));
    }

    #[test]
    fn basis_coordinates_must_be_fractional() {
        let basis = BTreeMap::from([("A".to_string(), vec![Point3::new(0.0, 1.0, 0.0)])]);
        assert!(matches!(
            Lattice::new(Vector3::repeat(1.0), None, None, Some(basis)),
            Err(LatticeError::InvalidBasis { .. })
        ));
    }

    #[test]
    fn populate_places_one_particle_per_site() {
        let lattice = cubic(0.5);
        let compound = lattice.populate(None, 2, 3, 4).unwrap();
        assert_eq!(compound.n_particles(), 24);
        assert_eq!(compound.periodicity(), [true; 3]);
        let lengths = compound.sim_box().unwrap().lengths();
        assert_close(lengths[0], 1.0);
        assert_close(lengths[1], 1.5);
        assert_close(lengths[2], 2.0);
    }

    /// Every site of `compound` must sit at a fractional position of its box that is a
    /// multiple of `1 / counts` along each axis.
    fn assert_sites_on_box_grid(compound: &Compound, counts: [usize; 3]) {
        let sim_box = compound.sim_box().unwrap();
        for position in compound.xyz(compound.root()) {
            let fractional = sim_box.to_fractional(&position.coords);
            for d in 0..3 {
                let scaled = fractional[d] * counts[d] as f64;
                assert!(
                    (scaled - scaled.round()).abs() < 1e-9 && fractional[d] > -1e-9,
                    "site {position} lies off the box grid (fractional {fractional:?})"
                );
                assert!(fractional[d] < 1.0 - 1e-9);
            }
        }
    }

    #[test]
    fn rotated_vectors_keep_sites_inside_their_box() {
        // a along y and b along -x.
        let vectors = Matrix3::new(0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let lattice = Lattice::new(Vector3::repeat(1.0), Some(vectors), None, None).unwrap();
        let compound = lattice.populate(None, 2, 1, 1).unwrap();

        let sim_box = compound.sim_box().unwrap();
        assert!((sim_box.vector(0) - Vector3::new(0.0, 2.0, 0.0)).norm() < 1e-12);
        assert!((sim_box.vector(1) - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        let max_y = compound
            .xyz(compound.root())
            .iter()
            .map(|p| p.y)
            .fold(f64::MIN, f64::max);
        assert_close(max_y, 1.0);
        assert_sites_on_box_grid(&compound, [2, 1, 1]);
    }

    #[test]
    fn triclinic_cells_keep_sites_inside_their_box() {
        let basis = BTreeMap::from([
            ("A".to_string(), vec![Point3::origin()]),
            ("B".to_string(), vec![Point3::new(0.5, 0.5, 0.5)]),
        ]);
        let lattice = Lattice::new(
            Vector3::new(0.3, 0.4, 0.5),
            None,
            Some([80.0, 95.0, 110.0]),
            Some(basis),
        )
        .unwrap();
        let compound = lattice.populate(None, 2, 3, 2).unwrap();
        assert_eq!(compound.n_particles(), 2 * 12);
        let lengths = compound.sim_box().unwrap().lengths();
        assert_close(lengths[0], 0.6);
        assert_close(lengths[1], 1.2);
        assert_close(lengths[2], 1.0);
        for (got, want) in compound.sim_box().unwrap().angles().iter().zip([80.0, 95.0, 110.0]) {
            assert_close(*got, want);
        }
        // Half-cell offsets land on the doubled grid.
        assert_sites_on_box_grid(&compound, [4, 6, 4]);
    }

    #[test]
    fn populate_rejects_zero_repeats() {
        assert_eq!(
            cubic(1.0).populate(None, 1, 0, 1).unwrap_err(),
            LatticeError::InvalidRepeat(1, 0, 1)
        );
    }

    #[test]
    fn zero_spacing_axis_is_not_periodic_and_has_no_box() {
        let lattice = Lattice::new(Vector3::new(1.0, 1.0, 0.0), None, None, None).unwrap();
        let compound = lattice.populate(None, 2, 2, 3).unwrap();
        assert_eq!(compound.periodicity(), [true, true, false]);
        assert!(compound.sim_box().is_none());
        assert_eq!(compound.n_particles(), 4);
    }

    #[test]
    fn single_compound_fills_every_basis_key() {
        let basis = BTreeMap::from([
            ("A".to_string(), vec![Point3::origin()]),
            ("B".to_string(), vec![Point3::new(0.5, 0.5, 0.5)]),
        ]);
        let lattice = Lattice::new(Vector3::repeat(1.0), None, None, Some(basis)).unwrap();
        let map = BTreeMap::from([("A".to_string(), Compound::particle("Fe", Point3::origin()))]);
        let compound = lattice.populate(Some(&map), 2, 2, 2).unwrap();
        assert_eq!(compound.n_particles(), 16);
        let root = compound.root();
        let particle = compound.particle_by_label(root, "B[0]").unwrap();
        assert_eq!(compound.particle_ref(particle).unwrap().name, "Fe");
    }

    #[test]
    fn mismatched_compound_maps_are_rejected() {
        let basis = BTreeMap::from([
            ("A".to_string(), vec![Point3::origin()]),
            ("B".to_string(), vec![Point3::new(0.5, 0.5, 0.5)]),
            ("C".to_string(), vec![Point3::new(0.5, 0.0, 0.0)]),
        ]);
        let lattice = Lattice::new(Vector3::repeat(1.0), None, None, Some(basis)).unwrap();
        let particle = || Compound::particle("Cu", Point3::origin());

        let too_few =
            BTreeMap::from([("A".to_string(), particle()), ("B".to_string(), particle())]);
        assert!(matches!(
            lattice.populate(Some(&too_few), 1, 1, 1),
            Err(LatticeError::InvalidCompoundMap(_))
        ));

        let unknown = BTreeMap::from([
            ("A".to_string(), particle()),
            ("B".to_string(), particle()),
            ("X".to_string(), particle()),
        ]);
        assert!(matches!(
            lattice.populate(Some(&unknown), 1, 1, 1),
            Err(LatticeError::InvalidCompoundMap(_))
        ));
    }

    #[test]
    fn compound_templates_are_centred_on_sites() {
        let mut dimer = Compound::new("Dimer");
        let root = dimer.root();
        dimer.add_particle(root, "O", Point3::origin(), None).unwrap();
        dimer
            .add_particle(root, "O", Point3::new(0.12, 0.0, 0.0), None)
            .unwrap();
        let map = BTreeMap::from([("default".to_string(), dimer)]);
        let compound = cubic(1.0).populate(Some(&map), 2, 1, 1).unwrap();
        let second = compound.group_by_label(compound.root(), "default[1]").unwrap();
        let center = compound.center(second).unwrap();
        assert!((center - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-9);
    }
}
