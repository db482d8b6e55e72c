use crate::core::models::compound::{Compound, Member};
use crate::core::models::ids::ParticleId;
use crate::engine::error::EngineError;
use itertools::iproduct;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// A bond of the source whose partner lies in a neighbouring periodic image.
struct CrossingBond {
    a: usize,
    b: usize,
    shift: [i64; 3],
}

/// Replicates a periodic compound `counts[0] x counts[1] x counts[2]` times.
///
/// Each copy is added under a new root as `tile_{i}_{j}_{k}` and translated by
/// `i·a + j·b + k·c`. Bonds that crossed the source box are reconnected to the copy
/// of their partner in the neighbouring tile, wrapping at the edges of the supercell,
/// so the tiled compound keeps the periodic connectivity of the source.
///
/// # Errors
///
/// Returns [`EngineError::MissingBox`] if the source has no box and
/// [`EngineError::InvalidArgument`] if any count is zero.
#[instrument(skip_all, name = "tiling_workflow", fields(name = compound.name()))]
pub fn tile(compound: &Compound, counts: [usize; 3]) -> Result<Compound, EngineError> {
    let sim_box = compound.sim_box().ok_or_else(|| EngineError::MissingBox {
        name: compound.name().to_string(),
    })?;
    if counts.contains(&0) {
        return Err(EngineError::InvalidArgument(format!(
            "tile counts must be at least 1, got {counts:?}"
        )));
    }

    let source_particles = compound.particle_ids(compound.root());
    let crossing = crossing_bonds(compound, &source_particles, counts);
    debug!(crossing = crossing.len(), "Found bonds across the box boundary");

    let mut tiled = Compound::new(&format!("{}-tiled", compound.name()));
    let root = tiled.root();
    let [nx, ny, nz] = counts;
    let mut tiles: Vec<Vec<ParticleId>> = Vec::with_capacity(nx * ny * nz);
    for (i, j, k) in iproduct!(0..nx, 0..ny, 0..nz) {
        let offset = sim_box.to_cartesian(&Vector3::new(i as f64, j as f64, k as f64));
        let mut copy = compound.clone();
        let copy_root = copy.root();
        copy.translate(copy_root, &offset)?;
        let particles = match tiled.add(root, copy, Some(&format!("tile_{i}_{j}_{k}")))? {
            Member::Group(group) => tiled.particle_ids(group),
            Member::Particle(id) => vec![id],
            Member::Port(_) => {
                return Err(EngineError::Internal("tile was added as a port".into()));
            }
        };
        if particles.len() != source_particles.len() {
            return Err(EngineError::Internal(format!(
                "tile holds {} particles, expected {}",
                particles.len(),
                source_particles.len()
            )));
        }
        tiles.push(particles);
    }

    let tile_index = |cell: [usize; 3]| (cell[0] * ny + cell[1]) * nz + cell[2];
    for (i, j, k) in iproduct!(0..nx, 0..ny, 0..nz) {
        let cell = [i, j, k];
        let here = &tiles[tile_index(cell)];
        for bond in &crossing {
            let mut neighbour = [0usize; 3];
            for axis in 0..3 {
                let n = counts[axis] as i64;
                neighbour[axis] = (cell[axis] as i64 - bond.shift[axis]).rem_euclid(n) as usize;
            }
            let there = &tiles[tile_index(neighbour)];
            tiled.remove_bond(here[bond.a], here[bond.b]);
            tiled.add_bond(here[bond.a], there[bond.b])?;
        }
    }

    let factors = counts.map(|n| n as f64);
    tiled.set_sim_box(Some(sim_box.scaled(factors)?));
    tiled.set_periodicity(compound.periodicity());

    info!(
        tiles = tiles.len(),
        particles = tiled.n_particles(),
        bonds = tiled.n_bonds(),
        "Tiled compound"
    );
    Ok(tiled)
}

/// Bonds whose fractional displacement exceeds one half along a replicated axis.
fn crossing_bonds(
    compound: &Compound,
    particles: &[ParticleId],
    counts: [usize; 3],
) -> Vec<CrossingBond> {
    let Some(sim_box) = compound.sim_box() else {
        return Vec::new();
    };
    let index_of: HashMap<ParticleId, usize> = particles
        .iter()
        .enumerate()
        .map(|(index, &id)| (id, index))
        .collect();
    compound
        .bonds()
        .iter()
        .filter_map(|bond| {
            let a = *index_of.get(&bond.a)?;
            let b = *index_of.get(&bond.b)?;
            let pa = compound.particle_ref(bond.a)?.position;
            let pb = compound.particle_ref(bond.b)?.position;
            let fractional = sim_box.to_fractional(&(pb - pa));
            let mut shift = [0i64; 3];
            for axis in 0..3 {
                if counts[axis] > 1 && fractional[axis].abs() > 0.5 {
                    shift[axis] = fractional[axis].round() as i64;
                }
            }
            (shift != [0; 3]).then_some(CrossingBond { a, b, shift })
        })
        .collect()
}
