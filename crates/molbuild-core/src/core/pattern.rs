use crate::core::models::compound::{Compound, CompoundError};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::f64::consts::PI;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Pattern contains no points")]
    Empty,
    #[error("Failed to read pattern points: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to place template on pattern: {0}")]
    Compound(#[from] CompoundError),
}

/// A set of points used to decide where guest compounds are placed.
///
/// Generated patterns live in fractional coordinates (the unit cube); callers scale
/// them onto a host before use.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub points: Vec<Point3<f64>>,
}

#[derive(Debug, Deserialize)]
struct CsvPoint {
    x: f64,
    y: f64,
    z: f64,
}

impl Pattern {
    pub fn from_points(points: Vec<Point3<f64>>) -> Result<Self, PatternError> {
        if points.is_empty() {
            return Err(PatternError::Empty);
        }
        Ok(Self { points })
    }

    /// Reads points from a CSV file with `x`, `y` and `z` columns.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, PatternError> {
        let mut reader = csv::Reader::from_path(path)?;
        let points = reader
            .deserialize::<CsvPoint>()
            .map(|row| row.map(|p| Point3::new(p.x, p.y, p.z)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_points(points)
    }

    /// An `n` by `m` grid in the xy plane. Point `i * m + j` sits at `(i/n, j/m, 0)`.
    pub fn grid_2d(n: usize, m: usize) -> Result<Self, PatternError> {
        let points = (0..n)
            .flat_map(|i| {
                (0..m).map(move |j| Point3::new(i as f64 / n as f64, j as f64 / m as f64, 0.0))
            })
            .collect();
        Self::from_points(points)
    }

    pub fn grid_3d(n: usize, m: usize, l: usize) -> Result<Self, PatternError> {
        let mut points = Vec::with_capacity(n * m * l);
        for i in 0..n {
            for j in 0..m {
                for k in 0..l {
                    points.push(Point3::new(
                        i as f64 / n as f64,
                        j as f64 / m as f64,
                        k as f64 / l as f64,
                    ));
                }
            }
        }
        Self::from_points(points)
    }

    /// `n` points drawn uniformly from the unit square.
    pub fn random_2d(n: usize, seed: u64) -> Result<Self, PatternError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = (0..n)
            .map(|_| Point3::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), 0.0))
            .collect();
        Self::from_points(points)
    }

    pub fn random_3d(n: usize, seed: u64) -> Result<Self, PatternError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let points = (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                )
            })
            .collect();
        Self::from_points(points)
    }

    /// A Vogel spiral filling the unit disk.
    pub fn disk(n: usize) -> Result<Self, PatternError> {
        let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
        let points = (0..n)
            .map(|k| {
                let radius = (k as f64 / n as f64).sqrt();
                let theta = k as f64 * golden_angle;
                Point3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
            })
            .collect();
        Self::from_points(points)
    }

    /// Points spread evenly over the unit sphere along a golden-section spiral.
    pub fn sphere(n: usize) -> Result<Self, PatternError> {
        let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let dz = 2.0 / n as f64;
        let points = (0..n)
            .map(|k| {
                let z = k as f64 * dz - 1.0 + dz / 2.0;
                let radius = (1.0 - z * z).sqrt();
                let azimuth = k as f64 * 2.0 * PI / phi;
                Point3::new(radius * azimuth.cos(), radius * azimuth.sin(), z)
            })
            .collect();
        Self::from_points(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Multiplies every point component-wise by `by`.
    pub fn scale(&mut self, by: &Vector3<f64>) {
        for p in &mut self.points {
            p.coords.component_mul_assign(by);
        }
    }

    pub fn translate(&mut self, by: &Vector3<f64>) {
        for p in &mut self.points {
            *p += by;
        }
    }

    /// Places a copy of `template` centred on every point.
    pub fn apply(&self, template: &Compound) -> Result<Vec<Compound>, PatternError> {
        self.points
            .iter()
            .map(|point| {
                let mut copy = template.clone();
                let root = copy.root();
                copy.translate_to(root, point)?;
                Ok(copy)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn grid_2d_orders_points_row_major() {
        let pattern = Pattern::grid_2d(2, 3).unwrap();
        assert_eq!(pattern.len(), 6);
        assert_eq!(pattern.points[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(pattern.points[1 * 3 + 2], Point3::new(0.5, 2.0 / 3.0, 0.0));
    }

    #[test]
    fn grid_3d_covers_product_of_axes() {
        let pattern = Pattern::grid_3d(2, 2, 2).unwrap();
        assert_eq!(pattern.len(), 8);
        assert_eq!(pattern.points[1], Point3::new(0.0, 0.0, 0.5));
        assert_eq!(pattern.points[7], Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn random_patterns_are_seeded_and_in_unit_range() {
        let a = Pattern::random_2d(50, 7).unwrap();
        let b = Pattern::random_2d(50, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.points.iter().all(|p| (0.0..1.0).contains(&p.x) && p.z == 0.0));

        let c = Pattern::random_3d(20, 1).unwrap();
        assert!(c.points.iter().all(|p| (0.0..1.0).contains(&p.z)));
    }

    #[test]
    fn disk_points_stay_inside_unit_circle() {
        let pattern = Pattern::disk(100).unwrap();
        assert_eq!(pattern.points[0], Point3::origin());
        assert!(pattern.points.iter().all(|p| p.coords.norm() <= 1.0 + 1e-12));
    }

    #[test]
    fn sphere_points_lie_on_unit_sphere() {
        let pattern = Pattern::sphere(64).unwrap();
        for p in &pattern.points {
            assert_close(p.coords.norm(), 1.0);
        }
    }

    #[test]
    fn zero_points_are_rejected() {
        assert!(matches!(Pattern::grid_2d(0, 3), Err(PatternError::Empty)));
        assert!(matches!(Pattern::disk(0), Err(PatternError::Empty)));
        assert!(matches!(Pattern::from_points(vec![]), Err(PatternError::Empty)));
    }

    #[test]
    fn scale_and_translate_apply_per_axis() {
        let mut pattern = Pattern::from_points(vec![Point3::new(0.5, 0.5, 1.0)]).unwrap();
        pattern.scale(&Vector3::new(2.0, 4.0, 0.0));
        pattern.translate(&Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(pattern.points[0], Point3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn from_csv_reads_xyz_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "x,y,z\n0.1,0.2,0.3\n1.0,0.0,0.5").unwrap();
        let pattern = Pattern::from_csv(file.path()).unwrap();
        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern.points[1], Point3::new(1.0, 0.0, 0.5));
    }

    #[test]
    fn apply_centres_template_copies_on_points() {
        let mut template = Compound::new("Dimer");
        let root = template.root();
        template
            .add_particle(root, "C", Point3::new(0.0, 0.0, 0.0), None)
            .unwrap();
        template
            .add_particle(root, "C", Point3::new(0.2, 0.0, 0.0), None)
            .unwrap();

        let pattern =
            Pattern::from_points(vec![Point3::new(1.0, 1.0, 1.0), Point3::new(-1.0, 0.0, 0.0)])
                .unwrap();
        let copies = pattern.apply(&template).unwrap();
        assert_eq!(copies.len(), 2);
        for (copy, point) in copies.iter().zip(&pattern.points) {
            assert!((copy.center(copy.root()).unwrap() - point).norm() < 1e-9);
        }
    }
}
