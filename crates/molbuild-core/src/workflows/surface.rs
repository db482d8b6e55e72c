use crate::core::models::compound::Compound;
use crate::core::models::ids::GroupId;
use crate::core::models::port::Port;
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::{info, instrument};

/// Adds a port to every particle on the outer face of `group` along `orientation`.
///
/// A particle belongs to the face when its projection onto `orientation` is within
/// `tolerance` of the largest projection in the group. Each new port is anchored to
/// its particle, faces `orientation` and sits `separation` away from it. Ports are
/// labeled under `group` with `label`, which defaults to `port[$]`.
///
/// # Return
///
/// The number of ports added.
#[instrument(skip_all, name = "surface_decoration")]
pub fn decorate_surface(
    compound: &mut Compound,
    group: GroupId,
    orientation: &Vector3<f64>,
    separation: f64,
    tolerance: f64,
    label: Option<&str>,
) -> Result<usize, EngineError> {
    let template = Port::new(orientation, separation).ok_or_else(|| {
        EngineError::InvalidArgument("port orientation must be a non-zero vector".into())
    })?;
    if tolerance.is_nan() || tolerance < 0.0 {
        return Err(EngineError::InvalidArgument(format!(
            "surface tolerance must be non-negative, got {tolerance}"
        )));
    }
    let direction = template.direction();

    let projections: Vec<_> = compound
        .particle_ids(group)
        .into_iter()
        .filter_map(|id| {
            let position = compound.particle_ref(id)?.position;
            Some((id, position.coords.dot(&direction)))
        })
        .collect();
    let Some(top) = projections
        .iter()
        .map(|(_, projection)| *projection)
        .max_by(f64::total_cmp)
    else {
        return Ok(0);
    };

    let label = label.unwrap_or("port[$]");
    let mut added = 0;
    for (id, projection) in projections {
        if top - projection <= tolerance {
            compound.add_port(group, template.clone(), Some(id), Some(label))?;
            added += 1;
        }
    }
    info!(ports = added, "Decorated surface with ports");
    Ok(added)
}
