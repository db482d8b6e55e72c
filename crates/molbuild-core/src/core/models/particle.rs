use super::element::Element;
use super::ids::GroupId;
use nalgebra::Point3;

/// A single point mass inside a compound.
///
/// Particles carry their own name (which need not be a chemical symbol, e.g. a
/// coarse-grained bead), an optional element used by file writers, a position in
/// nanometres and a partial charge.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// The particle name (e.g., "C", "Si1", "_CH3").
    pub name: String,
    /// The chemical element, if one could be inferred or was set explicitly.
    pub element: Option<Element>,
    /// Cartesian position in nanometres.
    pub position: Point3<f64>,
    /// Partial charge in elementary charge units.
    pub charge: f64,
    /// The group that directly contains this particle.
    pub group: GroupId,
}

impl Particle {
    /// Creates a new particle and infers its element from `name`.
    pub fn new(name: &str, position: Point3<f64>, group: GroupId) -> Self {
        Self {
            name: name.to_string(),
            element: Element::infer(name),
            position,
            charge: 0.0,
            group,
        }
    }

    /// The atom type written to output files: the element symbol when known,
    /// otherwise the particle name.
    pub fn type_label(&self) -> &str {
        self.element.map_or(self.name.as_str(), |e| e.symbol)
    }
}
