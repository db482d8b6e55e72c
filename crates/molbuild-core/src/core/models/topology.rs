use super::ids::ParticleId;

/// An undirected bond between two particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub a: ParticleId,
    pub b: ParticleId,
}

impl Bond {
    pub fn new(a: ParticleId, b: ParticleId) -> Self {
        Self { a, b }
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.a == id || self.b == id
    }

    /// Returns the partner of `id`, or `None` if `id` is not part of this bond.
    pub fn other(&self, id: ParticleId) -> Option<ParticleId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }

    /// Two bonds are the same if they join the same pair, in either order.
    pub fn same_pair(&self, other: &Bond) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_particle_id(n: u64) -> ParticleId {
        ParticleId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn bond_contains_returns_true_for_both_particles() {
        let (a, b) = (dummy_particle_id(1), dummy_particle_id(2));
        let bond = Bond::new(a, b);
        assert!(bond.contains(a));
        assert!(bond.contains(b));
        assert!(!bond.contains(dummy_particle_id(3)));
    }

    #[test]
    fn other_returns_partner() {
        let (a, b) = (dummy_particle_id(10), dummy_particle_id(20));
        let bond = Bond::new(a, b);
        assert_eq!(bond.other(a), Some(b));
        assert_eq!(bond.other(b), Some(a));
        assert_eq!(bond.other(dummy_particle_id(30)), None);
    }

    #[test]
    fn same_pair_ignores_order() {
        let (a, b) = (dummy_particle_id(1), dummy_particle_id(2));
        assert!(Bond::new(a, b).same_pair(&Bond::new(b, a)));
        assert!(!Bond::new(a, b).same_pair(&Bond::new(a, dummy_particle_id(3))));
    }
}
