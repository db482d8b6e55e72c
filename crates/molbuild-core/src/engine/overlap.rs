use super::error::EngineError;
use crate::core::models::compound::Compound;
use crate::core::models::ids::{GroupId, PortId};
use crate::core::utils::geometry::equivalence_transform;
use nalgebra::{Isometry3, Point3};
use tracing::{debug, warn};

/// Moves `move_this` so that port `from` coincides with port `to`.
///
/// Two candidate transforms are considered: one mapping the `up` half of `from` onto
/// the `up` half of `to`, and one mapping the `down` half of `from` onto it. The first
/// is used only if it leaves the two anchor particles farther apart, otherwise the
/// second. Without anchors on both ports the `down` mapping is used.
///
/// # Arguments
///
/// * `compound` - The compound holding both ports.
/// * `move_this` - The group that is moved rigidly; it must contain `from`.
/// * `from` - The port on the moving group.
/// * `to` - The stationary target port, outside `move_this`.
/// * `add_bond` - Whether to bond the two anchors and remove both ports.
///
/// # Errors
///
/// Returns an error if the ports are misplaced relative to `move_this`, either port
/// was used before, or the ghost points do not define a transform.
pub fn force_overlap(
    compound: &mut Compound,
    move_this: GroupId,
    from: PortId,
    to: PortId,
    add_bond: bool,
) -> Result<(), EngineError> {
    if !compound.contains_port(move_this, from) {
        return Err(EngineError::PortNotInGroup { port: from });
    }
    if compound.contains_port(move_this, to) {
        return Err(EngineError::PortInsideMovingGroup { port: to });
    }
    let from_port = compound
        .port(from)
        .ok_or(EngineError::PortNotInGroup { port: from })?
        .clone();
    let to_port = compound
        .port(to)
        .ok_or(EngineError::PortNotInGroup { port: to })?
        .clone();
    for (id, port) in [(from, &from_port), (to, &to_port)] {
        if port.used {
            return Err(EngineError::PortAlreadyUsed { port: id });
        }
    }

    let mismatch = || EngineError::Internal("port ghost points do not define a transform".into());
    let up_to_up = equivalence_transform(from_port.up(), to_port.up()).ok_or_else(mismatch)?;
    let down_to_up =
        equivalence_transform(from_port.down(), to_port.up()).ok_or_else(mismatch)?;

    let anchors = from_port
        .anchor
        .zip(to_port.anchor)
        .and_then(|(a, b)| {
            Some((
                compound.particle_ref(a)?.position,
                compound.particle_ref(b)?.position,
            ))
        });
    let transform = match anchors {
        Some((from_anchor, to_anchor)) => {
            let up_distance = (up_to_up * from_anchor - to_anchor).norm();
            let down_distance = (down_to_up * from_anchor - to_anchor).norm();
            debug!(up_distance, down_distance, "Choosing port half for overlap");
            if up_distance > down_distance {
                up_to_up
            } else {
                down_to_up
            }
        }
        None => down_to_up,
    };

    compound.transform(move_this, &transform)?;
    for id in [from, to] {
        if let Some(port) = compound.port_mut(id) {
            port.used = true;
        }
    }

    if !add_bond {
        return Ok(());
    }
    match (from_port.anchor, to_port.anchor) {
        (Some(a), Some(b)) => {
            compound.add_bond(a, b)?;
            compound.remove_port(from)?;
            compound.remove_port(to)?;
        }
        _ => {
            warn!(
                "Cannot bond ports {:?} and {:?} because at least one has no anchor; \
                 the ports are kept.",
                from, to
            );
        }
    }
    Ok(())
}

/// Moves `move_this` by the rigid transform that best maps `from` onto `to`.
///
/// # Return
///
/// The transform that was applied.
pub fn force_overlap_points(
    compound: &mut Compound,
    move_this: GroupId,
    from: &[Point3<f64>],
    to: &[Point3<f64>],
) -> Result<Isometry3<f64>, EngineError> {
    let transform = equivalence_transform(from, to).ok_or(EngineError::MismatchedPoints {
        from: from.len(),
        to: to.len(),
    })?;
    compound.transform(move_this, &transform)?;
    Ok(transform)
}
