use crate::core::models::compound::{Compound, Member};
use crate::core::models::ids::GroupId;
use crate::engine::error::EngineError;
use crate::engine::overlap::force_overlap;
use tracing::{debug, info, instrument};

/// Builds a linear chain of `n` copies of `monomer`.
///
/// Every new copy is moved so that its `head` port overlaps the `tail` port of the
/// copy before it, and the two anchors are bonded. The head of the first copy and
/// the tail of the last copy stay open and are exposed on the root under the same
/// labels, so the chain can itself be used as a monomer.
///
/// # Errors
///
/// Returns [`EngineError::InvalidArgument`] if `n` is zero and
/// [`EngineError::PortNotFound`] if the monomer lacks either port.
#[instrument(skip_all, name = "polymer_workflow", fields(monomer = monomer.name(), n = n))]
pub fn polymer(
    monomer: &Compound,
    n: usize,
    head: &str,
    tail: &str,
) -> Result<Compound, EngineError> {
    if n == 0 {
        return Err(EngineError::InvalidArgument(
            "a polymer needs at least one monomer".into(),
        ));
    }
    for label in [head, tail] {
        if monomer.port_by_label(monomer.root(), label).is_err() {
            return Err(EngineError::PortNotFound {
                compound: monomer.name().to_string(),
                label: label.to_string(),
            });
        }
    }

    let mut chain = Compound::new("Polymer");
    let root = chain.root();
    let mut groups: Vec<GroupId> = Vec::with_capacity(n);
    for index in 0..n {
        let Member::Group(group) = chain.add(root, monomer.clone(), Some("monomer[$]"))? else {
            return Err(EngineError::Internal("monomer was not added as a group".into()));
        };
        if let Some(&previous) = groups.last() {
            let from = chain.port_by_label(group, head)?;
            let to = chain.port_by_label(previous, tail)?;
            debug!(index, "Joining monomer to chain");
            force_overlap(&mut chain, group, from, to, true)?;
        }
        groups.push(group);
    }

    if let (Some(&first), Some(&last)) = (groups.first(), groups.last()) {
        let head_port = chain.port_by_label(first, head)?;
        let tail_port = chain.port_by_label(last, tail)?;
        chain.add_label(root, head, Member::Port(head_port))?;
        chain.add_label(root, tail, Member::Port(tail_port))?;
    }

    info!(
        monomers = n,
        particles = chain.n_particles(),
        bonds = chain.n_bonds(),
        "Built polymer"
    );
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::port::Port;
    use nalgebra::{Point3, Vector3};

    const BOND: f64 = 0.154;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{a} != {b}");
    }

    fn ch2() -> Compound {
        let mut c = Compound::new("CH2");
        let root = c.root();
        let carbon = c.add_particle(root, "C", Point3::origin(), None).unwrap();
        for x in [-0.109, 0.109] {
            let h = c.add_particle(root, "H", Point3::new(x, 0.0, 0.0), None).unwrap();
            c.add_bond(carbon, h).unwrap();
        }
        c.add_port(root, Port::new(&Vector3::y(), BOND / 2.0).unwrap(), Some(carbon), Some("up"))
            .unwrap();
        c.add_port(root, Port::new(&-Vector3::y(), BOND / 2.0).unwrap(), Some(carbon), Some("down"))
            .unwrap();
        c
    }

    #[test]
    fn chain_is_bonded_head_to_tail() {
        let chain = polymer(&ch2(), 5, "up", "down").unwrap();
        let root = chain.root();
        assert_eq!(chain.n_particles(), 15);
        assert_eq!(chain.n_bonds(), 10 + 4);
        assert_eq!(chain.n_ports(), 2);

        let carbons: Vec<_> = (0..5)
            .map(|i| {
                let group = chain.group_by_label(root, &format!("monomer[{i}]")).unwrap();
                chain.particle_by_label(group, "C[0]").unwrap()
            })
            .collect();
        for pair in carbons.windows(2) {
            let a = chain.particle_ref(pair[0]).unwrap().position;
            let b = chain.particle_ref(pair[1]).unwrap().position;
            assert_close((b - a).norm(), BOND);
            assert_close(b.y - a.y, -BOND);
            assert!(chain.neighbors(pair[0]).contains(&pair[1]));
        }
    }

    #[test]
    fn open_ends_are_exposed_on_the_root() {
        let chain = polymer(&ch2(), 3, "up", "down").unwrap();
        let root = chain.root();
        let head = chain.port_by_label(root, "up").unwrap();
        let tail = chain.port_by_label(root, "down").unwrap();
        let first = chain.group_by_label(root, "monomer[0]").unwrap();
        let last = chain.group_by_label(root, "monomer[2]").unwrap();
        assert!(chain.contains_port(first, head));
        assert!(chain.contains_port(last, tail));
    }

    #[test]
    fn single_monomer_exposes_both_of_its_ports() {
        let chain = polymer(&ch2(), 1, "up", "down").unwrap();
        assert_eq!(chain.n_bonds(), 2);
        assert_eq!(chain.available_ports(chain.root()).len(), 2);
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(matches!(
            polymer(&ch2(), 0, "up", "down"),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            polymer(&ch2(), 2, "up", "left"),
            Err(EngineError::PortNotFound { .. })
        ));
    }
}
