use super::ids::{GroupId, ParticleId, PortId};
use super::particle::Particle;
use super::port::Port;
use super::sim_box::{BoundingBox, SimBox};
use super::topology::Bond;
use crate::core::utils::geometry::{centroid, rotation_about};
use nalgebra::{Isometry3, Point3, Rotation3, Vector3};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::BTreeMap;
use thiserror::Error;

const AUTO_INDEX_SUFFIX: &str = "[$]";
const PATH_SEPARATOR: char = '/';

/// A reference to anything a group can hold and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Group(GroupId),
    Particle(ParticleId),
    Port(PortId),
}

/// The target of a label: a single member, or the ordered list behind an
/// auto-indexed label such as `chain[$]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    One(Member),
    Many(Vec<Member>),
}

/// A node of the compound hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// The name of the group (e.g., "CH2", "Monolayer").
    pub name: String,
    /// The enclosing group, `None` for the root.
    pub parent: Option<GroupId>,
    /// Direct sub-groups in insertion order.
    pub children: Vec<GroupId>,
    /// Particles held directly by this group in insertion order.
    pub particles: Vec<ParticleId>,
    /// Ports held directly by this group in insertion order.
    pub ports: Vec<PortId>,
    /// Named references to members, which may live anywhere in the compound.
    pub labels: BTreeMap<String, Label>,
}

impl Group {
    fn new(name: &str, parent: Option<GroupId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            particles: Vec::new(),
            ports: Vec::new(),
            labels: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompoundError {
    #[error("Group {0:?} does not exist in this compound")]
    GroupNotFound(GroupId),
    #[error("Particle {0:?} does not exist in this compound")]
    ParticleNotFound(ParticleId),
    #[error("Port {0:?} does not exist in this compound")]
    PortNotFound(PortId),
    #[error("No member is labeled '{path}'")]
    LabelNotFound { path: String },
    #[error("Label '{0}' is already in use")]
    DuplicateLabel(String),
    #[error("Label '{0}' refers to several members")]
    AmbiguousLabel(String),
    #[error("Label '{label}' does not refer to a {expected}")]
    WrongMemberKind {
        label: String,
        expected: &'static str,
    },
    #[error("A particle cannot be bonded to itself")]
    SelfBond,
    #[error("Group '{0}' contains no particles")]
    EmptyGroup(String),
    #[error("The root group cannot be removed")]
    RootRemoval,
}

/// A hierarchical molecular building block.
///
/// A `Compound` owns a tree of [`Group`]s together with every particle, port and bond
/// below its root. All entities live in arenas keyed by typed ids, so merging another
/// compound remaps ids instead of sharing references, and `clone()` produces a fully
/// independent deep copy.
///
/// Lengths are in nanometres.
#[derive(Debug, Clone)]
pub struct Compound {
    groups: SlotMap<GroupId, Group>,
    particles: SlotMap<ParticleId, Particle>,
    ports: SlotMap<PortId, Port>,
    bonds: Vec<Bond>,
    adjacency: SecondaryMap<ParticleId, Vec<ParticleId>>,
    root: GroupId,
    periodicity: [bool; 3],
    sim_box: Option<SimBox>,
}

impl Compound {
    /// Creates an empty compound whose root group is called `name`.
    pub fn new(name: &str) -> Self {
        let mut groups = SlotMap::with_key();
        let root = groups.insert(Group::new(name, None));
        Self {
            groups,
            particles: SlotMap::with_key(),
            ports: SlotMap::with_key(),
            bonds: Vec::new(),
            adjacency: SecondaryMap::new(),
            root,
            periodicity: [false; 3],
            sim_box: None,
        }
    }

    /// Creates a compound holding a single particle named `name` at `position`.
    ///
    /// When such a compound is added to another one, the particle is inserted
    /// directly instead of creating a wrapper group.
    pub fn particle(name: &str, position: Point3<f64>) -> Self {
        let mut compound = Self::new(name);
        let root = compound.root;
        let id = compound
            .particles
            .insert(Particle::new(name, position, root));
        compound.adjacency.insert(id, Vec::new());
        compound.groups[root].particles.push(id);
        compound
    }

    pub fn root(&self) -> GroupId {
        self.root
    }

    pub fn name(&self) -> &str {
        &self.groups[self.root].name
    }

    pub fn set_name(&mut self, name: &str) {
        self.groups[self.root].name = name.to_string();
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn particle_ref(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id)
    }

    pub fn port_mut(&mut self, id: PortId) -> Option<&mut Port> {
        self.ports.get_mut(id)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn n_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub fn n_ports(&self) -> usize {
        self.ports.len()
    }

    /// Particles directly bonded to `id`.
    pub fn neighbors(&self, id: ParticleId) -> &[ParticleId] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn sim_box(&self) -> Option<&SimBox> {
        self.sim_box.as_ref()
    }

    pub fn set_sim_box(&mut self, sim_box: Option<SimBox>) {
        self.sim_box = sim_box;
    }

    pub fn periodicity(&self) -> [bool; 3] {
        self.periodicity
    }

    pub fn set_periodicity(&mut self, periodicity: [bool; 3]) {
        self.periodicity = periodicity;
    }

    /// Whether this compound is a lone particle with nothing else attached.
    fn is_bare_particle(&self) -> bool {
        let root = &self.groups[self.root];
        self.particles.len() == 1
            && self.ports.is_empty()
            && root.children.is_empty()
            && root.particles.len() == 1
    }

    // --- Construction ---

    /// Adds an empty sub-group under `parent`.
    pub fn add_group(
        &mut self,
        parent: GroupId,
        name: &str,
        label: Option<&str>,
    ) -> Result<GroupId, CompoundError> {
        self.ensure_group(parent)?;
        let id = self.groups.insert(Group::new(name, Some(parent)));
        self.groups[parent].children.push(id);
        let default_label = format!("{name}{AUTO_INDEX_SUFFIX}");
        self.insert_label(parent, label.unwrap_or(&default_label), Member::Group(id))?;
        Ok(id)
    }

    /// Adds a particle named `name` at `position` directly under `parent`.
    pub fn add_particle(
        &mut self,
        parent: GroupId,
        name: &str,
        position: Point3<f64>,
        label: Option<&str>,
    ) -> Result<ParticleId, CompoundError> {
        self.insert_particle(parent, Particle::new(name, position, parent), label)
    }

    fn insert_particle(
        &mut self,
        parent: GroupId,
        mut particle: Particle,
        label: Option<&str>,
    ) -> Result<ParticleId, CompoundError> {
        self.ensure_group(parent)?;
        let default_label = format!("{}{AUTO_INDEX_SUFFIX}", particle.name);
        particle.group = parent;
        let id = self.particles.insert(particle);
        self.adjacency.insert(id, Vec::new());
        self.groups[parent].particles.push(id);
        let label = label.unwrap_or(&default_label);
        if let Err(e) = self.insert_label(parent, label, Member::Particle(id)) {
            self.groups[parent].particles.pop();
            self.adjacency.remove(id);
            self.particles.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Adds `port` under `parent`, translated onto `anchor` when one is given.
    ///
    /// The port geometry is interpreted relative to the anchor position, so a port
    /// built with [`Port::new`] sits `separation` away from its anchor.
    pub fn add_port(
        &mut self,
        parent: GroupId,
        mut port: Port,
        anchor: Option<ParticleId>,
        label: Option<&str>,
    ) -> Result<PortId, CompoundError> {
        self.ensure_group(parent)?;
        if let Some(anchor_id) = anchor {
            let anchor_pos = self
                .particles
                .get(anchor_id)
                .ok_or(CompoundError::ParticleNotFound(anchor_id))?
                .position;
            port.translate(&anchor_pos.coords);
        }
        port.anchor = anchor;
        port.group = parent;
        let id = self.ports.insert(port);
        self.groups[parent].ports.push(id);
        if let Err(e) = self.insert_label(parent, label.unwrap_or("port[$]"), Member::Port(id)) {
            self.groups[parent].ports.pop();
            self.ports.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Merges `other` into this compound under `parent`.
    ///
    /// A bare single-particle compound contributes its particle directly; anything
    /// else is inserted as a sub-group that keeps its own labels, bonds and ports.
    /// When added at the root of a compound without a box, the box and periodicity
    /// of `other` are inherited.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` does not exist or the label is already taken.
    pub fn add(
        &mut self,
        parent: GroupId,
        other: Compound,
        label: Option<&str>,
    ) -> Result<Member, CompoundError> {
        self.ensure_group(parent)?;
        let default_label = format!("{}{AUTO_INDEX_SUFFIX}", other.name());
        let label = label.unwrap_or(&default_label);

        if other.is_bare_particle() {
            let particle = other
                .particles
                .values()
                .next()
                .cloned()
                .ok_or_else(|| CompoundError::EmptyGroup(other.name().to_string()))?;
            return self
                .insert_particle(parent, particle, Some(label))
                .map(Member::Particle);
        }

        if self.labels_conflict(parent, label) {
            return Err(CompoundError::DuplicateLabel(label.to_string()));
        }

        if parent == self.root && self.sim_box.is_none() && other.sim_box.is_some() {
            self.sim_box = other.sim_box.clone();
            self.periodicity = other.periodicity;
        }

        let other_root = other.root;
        let mut group_map: SecondaryMap<GroupId, GroupId> = SecondaryMap::new();
        for (old_id, group) in &other.groups {
            let new_id = self.groups.insert(Group::new(&group.name, None));
            group_map.insert(old_id, new_id);
        }

        let mut particle_map: SecondaryMap<ParticleId, ParticleId> = SecondaryMap::new();
        for (old_id, particle) in other.particles {
            let mut particle = particle;
            if let Some(&group) = group_map.get(particle.group) {
                particle.group = group;
            }
            let new_id = self.particles.insert(particle);
            self.adjacency.insert(new_id, Vec::new());
            particle_map.insert(old_id, new_id);
        }

        let mut port_map: SecondaryMap<PortId, PortId> = SecondaryMap::new();
        for (old_id, port) in other.ports {
            let mut port = port;
            if let Some(&group) = group_map.get(port.group) {
                port.group = group;
            }
            port.anchor = port.anchor.and_then(|a| particle_map.get(a).copied());
            let new_id = self.ports.insert(port);
            port_map.insert(old_id, new_id);
        }

        let remap = |member: &Member| -> Option<Member> {
            match *member {
                Member::Group(id) => group_map.get(id).copied().map(Member::Group),
                Member::Particle(id) => particle_map.get(id).copied().map(Member::Particle),
                Member::Port(id) => port_map.get(id).copied().map(Member::Port),
            }
        };

        for (old_id, group) in other.groups {
            let Some(&new_id) = group_map.get(old_id) else {
                continue;
            };
            let labels = group
                .labels
                .iter()
                .filter_map(|(name, target)| {
                    let target = match target {
                        Label::One(m) => Label::One(remap(m)?),
                        Label::Many(ms) => Label::Many(ms.iter().filter_map(&remap).collect()),
                    };
                    Some((name.clone(), target))
                })
                .collect();
            let new_group = &mut self.groups[new_id];
            new_group.parent = group.parent.and_then(|p| group_map.get(p).copied());
            new_group.children = group
                .children
                .iter()
                .filter_map(|c| group_map.get(*c).copied())
                .collect();
            new_group.particles = group
                .particles
                .iter()
                .filter_map(|p| particle_map.get(*p).copied())
                .collect();
            new_group.ports = group
                .ports
                .iter()
                .filter_map(|p| port_map.get(*p).copied())
                .collect();
            new_group.labels = labels;
        }

        for bond in other.bonds {
            if let (Some(&a), Some(&b)) = (particle_map.get(bond.a), particle_map.get(bond.b)) {
                self.push_bond(a, b);
            }
        }

        let new_root = group_map[other_root];
        self.groups[new_root].parent = Some(parent);
        self.groups[parent].children.push(new_root);
        self.insert_label(parent, label, Member::Group(new_root))?;
        Ok(Member::Group(new_root))
    }

    /// Adds a bond between two particles.
    ///
    /// Adding an existing bond succeeds without creating a duplicate.
    pub fn add_bond(&mut self, a: ParticleId, b: ParticleId) -> Result<(), CompoundError> {
        if a == b {
            return Err(CompoundError::SelfBond);
        }
        for id in [a, b] {
            if !self.particles.contains_key(id) {
                return Err(CompoundError::ParticleNotFound(id));
            }
        }
        self.push_bond(a, b);
        Ok(())
    }

    /// Removes the bond between `a` and `b`, returning whether one existed.
    pub fn remove_bond(&mut self, a: ParticleId, b: ParticleId) -> bool {
        let target = Bond::new(a, b);
        let before = self.bonds.len();
        self.bonds.retain(|bond| !bond.same_pair(&target));
        if self.bonds.len() == before {
            return false;
        }
        if let Some(neighbors) = self.adjacency.get_mut(a) {
            neighbors.retain(|&p| p != b);
        }
        if let Some(neighbors) = self.adjacency.get_mut(b) {
            neighbors.retain(|&p| p != a);
        }
        true
    }

    fn push_bond(&mut self, a: ParticleId, b: ParticleId) {
        if self.neighbors(a).contains(&b) {
            return;
        }
        self.bonds.push(Bond::new(a, b));
        if let Some(neighbors) = self.adjacency.get_mut(a) {
            neighbors.push(b);
        }
        if let Some(neighbors) = self.adjacency.get_mut(b) {
            neighbors.push(a);
        }
    }

    /// Attaches `label` in `group` to an existing member.
    ///
    /// Labels ending in `[$]` are auto-indexed: `chain[$]` becomes `chain[k]` and the
    /// member is appended to the list label `chain`.
    ///
    /// # Return
    ///
    /// The concrete label that was stored.
    pub fn add_label(
        &mut self,
        group: GroupId,
        label: &str,
        member: Member,
    ) -> Result<String, CompoundError> {
        self.ensure_group(group)?;
        self.ensure_member(member)?;
        self.insert_label(group, label, member)
    }

    fn labels_conflict(&self, group: GroupId, label: &str) -> bool {
        let labels = &self.groups[group].labels;
        match label.strip_suffix(AUTO_INDEX_SUFFIX) {
            Some(prefix) => matches!(labels.get(prefix), Some(Label::One(_))),
            None => labels.contains_key(label),
        }
    }

    fn insert_label(
        &mut self,
        group: GroupId,
        label: &str,
        member: Member,
    ) -> Result<String, CompoundError> {
        if self.labels_conflict(group, label) {
            let shown = label.strip_suffix(AUTO_INDEX_SUFFIX).unwrap_or(label);
            return Err(CompoundError::DuplicateLabel(shown.to_string()));
        }
        let labels = &mut self.groups[group].labels;
        let Some(prefix) = label.strip_suffix(AUTO_INDEX_SUFFIX) else {
            labels.insert(label.to_string(), Label::One(member));
            return Ok(label.to_string());
        };

        let mut index = match labels.get(prefix) {
            Some(Label::Many(members)) => members.len(),
            _ => 0,
        };
        let mut concrete = format!("{prefix}[{index}]");
        while labels.contains_key(&concrete) {
            index += 1;
            concrete = format!("{prefix}[{index}]");
        }
        if let Label::Many(members) = labels
            .entry(prefix.to_string())
            .or_insert_with(|| Label::Many(Vec::new()))
        {
            members.push(member);
        }
        labels.insert(concrete.clone(), Label::One(member));
        Ok(concrete)
    }

    // --- Removal ---

    /// Removes a particle together with its bonds, the ports anchored to it and
    /// every label that refers to it.
    pub fn remove_particle(&mut self, id: ParticleId) -> Result<Particle, CompoundError> {
        let particle = self
            .particles
            .remove(id)
            .ok_or(CompoundError::ParticleNotFound(id))?;
        if let Some(group) = self.groups.get_mut(particle.group) {
            group.particles.retain(|&p| p != id);
        }
        self.bonds.retain(|bond| !bond.contains(id));
        for neighbor in self.adjacency.remove(id).unwrap_or_default() {
            if let Some(adjacent) = self.adjacency.get_mut(neighbor) {
                adjacent.retain(|&p| p != id);
            }
        }
        let anchored: Vec<PortId> = self
            .ports
            .iter()
            .filter(|(_, port)| port.anchor == Some(id))
            .map(|(port_id, _)| port_id)
            .collect();
        for port_id in anchored {
            self.remove_port(port_id)?;
        }
        self.purge_labels(Member::Particle(id));
        Ok(particle)
    }

    pub fn remove_port(&mut self, id: PortId) -> Result<Port, CompoundError> {
        let port = self.ports.remove(id).ok_or(CompoundError::PortNotFound(id))?;
        if let Some(group) = self.groups.get_mut(port.group) {
            group.ports.retain(|&p| p != id);
        }
        self.purge_labels(Member::Port(id));
        Ok(port)
    }

    /// Removes a group and everything below it.
    pub fn remove_group(&mut self, id: GroupId) -> Result<(), CompoundError> {
        if id == self.root {
            return Err(CompoundError::RootRemoval);
        }
        self.ensure_group(id)?;
        for particle_id in self.particle_ids(id) {
            self.remove_particle(particle_id)?;
        }
        for port_id in self.port_ids(id) {
            self.remove_port(port_id)?;
        }
        let subtree = self.group_ids(id);
        if let Some(parent) = self.groups[id].parent {
            if let Some(parent_group) = self.groups.get_mut(parent) {
                parent_group.children.retain(|&c| c != id);
            }
        }
        for group_id in subtree {
            self.groups.remove(group_id);
            self.purge_labels(Member::Group(group_id));
        }
        Ok(())
    }

    fn purge_labels(&mut self, member: Member) {
        for group in self.groups.values_mut() {
            group.labels.retain(|_, target| match target {
                Label::One(m) => *m != member,
                Label::Many(ms) => {
                    ms.retain(|m| *m != member);
                    true
                }
            });
        }
    }

    // --- Lookup ---

    /// Resolves a `/`-separated label path starting at `group`, e.g.
    /// `"chain[0]/down"`.
    pub fn resolve(&self, group: GroupId, path: &str) -> Result<Member, CompoundError> {
        self.ensure_group(group)?;
        let not_found = || CompoundError::LabelNotFound {
            path: path.to_string(),
        };
        let mut current = Member::Group(group);
        for segment in path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
            let Member::Group(current_group) = current else {
                return Err(not_found());
            };
            current = match self.groups[current_group].labels.get(segment) {
                Some(Label::One(member)) => *member,
                Some(Label::Many(_)) => {
                    return Err(CompoundError::AmbiguousLabel(segment.to_string()));
                }
                None => return Err(not_found()),
            };
        }
        Ok(current)
    }

    /// All members behind a label in `group`; a single-member label yields one entry.
    pub fn resolve_all(&self, group: GroupId, label: &str) -> Result<Vec<Member>, CompoundError> {
        self.ensure_group(group)?;
        match self.groups[group].labels.get(label) {
            Some(Label::One(member)) => Ok(vec![*member]),
            Some(Label::Many(members)) => Ok(members.clone()),
            None => Err(CompoundError::LabelNotFound {
                path: label.to_string(),
            }),
        }
    }

    pub fn port_by_label(&self, group: GroupId, path: &str) -> Result<PortId, CompoundError> {
        match self.resolve(group, path)? {
            Member::Port(id) => Ok(id),
            _ => Err(CompoundError::WrongMemberKind {
                label: path.to_string(),
                expected: "port",
            }),
        }
    }

    pub fn group_by_label(&self, group: GroupId, path: &str) -> Result<GroupId, CompoundError> {
        match self.resolve(group, path)? {
            Member::Group(id) => Ok(id),
            _ => Err(CompoundError::WrongMemberKind {
                label: path.to_string(),
                expected: "group",
            }),
        }
    }

    pub fn particle_by_label(
        &self,
        group: GroupId,
        path: &str,
    ) -> Result<ParticleId, CompoundError> {
        match self.resolve(group, path)? {
            Member::Particle(id) => Ok(id),
            _ => Err(CompoundError::WrongMemberKind {
                label: path.to_string(),
                expected: "particle",
            }),
        }
    }

    /// `group` and all groups below it, in depth-first pre-order.
    pub fn group_ids(&self, group: GroupId) -> Vec<GroupId> {
        let mut out = Vec::new();
        let mut stack = vec![group];
        while let Some(id) = stack.pop() {
            let Some(g) = self.groups.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(g.children.iter().rev());
        }
        out
    }

    /// Every particle in the subtree of `group`, in depth-first order.
    pub fn particle_ids(&self, group: GroupId) -> Vec<ParticleId> {
        self.group_ids(group)
            .into_iter()
            .flat_map(|g| self.groups[g].particles.iter().copied())
            .collect()
    }

    /// Every port in the subtree of `group`, in depth-first order.
    pub fn port_ids(&self, group: GroupId) -> Vec<PortId> {
        self.group_ids(group)
            .into_iter()
            .flat_map(|g| self.groups[g].ports.iter().copied())
            .collect()
    }

    /// Ports in the subtree of `group` that have not been used yet.
    pub fn available_ports(&self, group: GroupId) -> Vec<PortId> {
        self.port_ids(group)
            .into_iter()
            .filter(|&id| !self.ports[id].used)
            .collect()
    }

    /// Whether `group` is `ancestor` or lies below it.
    pub fn is_descendant(&self, group: GroupId, ancestor: GroupId) -> bool {
        let mut current = Some(group);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.groups.get(id).and_then(|g| g.parent);
        }
        false
    }

    pub fn contains_port(&self, group: GroupId, port: PortId) -> bool {
        self.ports
            .get(port)
            .is_some_and(|p| self.is_descendant(p.group, group))
    }

    pub fn contains_particle(&self, group: GroupId, particle: ParticleId) -> bool {
        self.particles
            .get(particle)
            .is_some_and(|p| self.is_descendant(p.group, group))
    }

    // --- Geometry ---

    /// Positions of every particle in the subtree of `group`.
    pub fn xyz(&self, group: GroupId) -> Vec<Point3<f64>> {
        self.particle_ids(group)
            .into_iter()
            .map(|id| self.particles[id].position)
            .collect()
    }

    /// The geometric center of the particles in `group` (ports excluded).
    pub fn center(&self, group: GroupId) -> Result<Point3<f64>, CompoundError> {
        self.ensure_group(group)?;
        centroid(&self.xyz(group))
            .ok_or_else(|| CompoundError::EmptyGroup(self.groups[group].name.clone()))
    }

    pub fn bounding_box(&self, group: GroupId) -> Result<BoundingBox, CompoundError> {
        self.ensure_group(group)?;
        BoundingBox::from_points(&self.xyz(group))
            .ok_or_else(|| CompoundError::EmptyGroup(self.groups[group].name.clone()))
    }

    /// Applies a rigid transform to every particle and port in `group`.
    pub fn transform(
        &mut self,
        group: GroupId,
        isometry: &Isometry3<f64>,
    ) -> Result<(), CompoundError> {
        self.ensure_group(group)?;
        for id in self.particle_ids(group) {
            let particle = &mut self.particles[id];
            particle.position = isometry * particle.position;
        }
        for id in self.port_ids(group) {
            self.ports[id].transform(isometry);
        }
        Ok(())
    }

    pub fn translate(&mut self, group: GroupId, by: &Vector3<f64>) -> Result<(), CompoundError> {
        self.transform(group, &Isometry3::translation(by.x, by.y, by.z))
    }

    /// Moves `group` so that its center sits at `position`.
    pub fn translate_to(
        &mut self,
        group: GroupId,
        position: &Point3<f64>,
    ) -> Result<(), CompoundError> {
        let center = self.center(group)?;
        self.translate(group, &(position - center))
    }

    /// Rotates `group` by `angle` radians about `axis` through the origin.
    pub fn rotate(
        &mut self,
        group: GroupId,
        angle: f64,
        axis: &Vector3<f64>,
    ) -> Result<(), CompoundError> {
        let rotation = rotation_about(axis, angle);
        self.transform(group, &Isometry3::from_parts(Default::default(), rotation.into()))
    }

    /// Rotates `group` by `angle` radians about `axis` through its own center.
    pub fn spin(
        &mut self,
        group: GroupId,
        angle: f64,
        axis: &Vector3<f64>,
    ) -> Result<(), CompoundError> {
        let center = self.center(group)?;
        let rotation: Rotation3<f64> = rotation_about(axis, angle);
        let isometry = Isometry3::translation(center.x, center.y, center.z)
            * Isometry3::from_parts(Default::default(), rotation.into())
            * Isometry3::translation(-center.x, -center.y, -center.z);
        self.transform(group, &isometry)
    }

    /// Distance between two points using the minimum-image convention along the
    /// periodic axes of this compound's box. Without a box this is the plain
    /// Euclidean distance.
    pub fn min_periodic_distance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        let mut delta = b - a;
        if let Some(sim_box) = &self.sim_box {
            if self.periodicity.iter().any(|&p| p) {
                let mut fractional = sim_box.to_fractional(&delta);
                for axis in 0..3 {
                    if self.periodicity[axis] {
                        fractional[axis] -= fractional[axis].round();
                    }
                }
                delta = sim_box.to_cartesian(&fractional);
            }
        }
        delta.norm()
    }

    fn ensure_group(&self, id: GroupId) -> Result<(), CompoundError> {
        if self.groups.contains_key(id) {
            Ok(())
        } else {
            Err(CompoundError::GroupNotFound(id))
        }
    }

    fn ensure_member(&self, member: Member) -> Result<(), CompoundError> {
        match member {
            Member::Group(id) => self.ensure_group(id),
            Member::Particle(id) if !self.particles.contains_key(id) => {
                Err(CompoundError::ParticleNotFound(id))
            }
            Member::Port(id) if !self.ports.contains_key(id) => {
                Err(CompoundError::PortNotFound(id))
            }
            _ => Ok(()),
        }
    }
}
