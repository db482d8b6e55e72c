use super::error::EngineError;
use super::overlap::force_overlap;
use super::progress::{Progress, ProgressReporter};
use crate::core::models::compound::{Compound, Member};
use crate::core::models::ids::{GroupId, PortId};
use crate::core::pattern::Pattern;
use nalgebra::Point3;
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What to attach to a host and through which ports.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentSpec<'a> {
    pub guest: &'a Compound,
    pub guest_port: &'a str,
    pub backfill: Option<&'a Compound>,
    pub backfill_port: &'a str,
    /// Scale the pattern onto the host bounding box before matching.
    pub scale: bool,
    /// Group that receives the copies; the host group when `None`.
    pub destination: Option<GroupId>,
}

impl<'a> AttachmentSpec<'a> {
    pub fn new(guest: &'a Compound) -> Self {
        Self {
            guest,
            guest_port: "down",
            backfill: None,
            backfill_port: "up",
            scale: true,
            destination: None,
        }
    }

    pub fn guest_port(mut self, label: &'a str) -> Self {
        self.guest_port = label;
        self
    }

    pub fn backfill(mut self, backfill: &'a Compound, port: &'a str) -> Self {
        self.backfill = Some(backfill);
        self.backfill_port = port;
        self
    }

    pub fn scale(mut self, scale: bool) -> Self {
        self.scale = scale;
        self
    }

    pub fn destination(mut self, group: GroupId) -> Self {
        self.destination = Some(group);
        self
    }
}

/// Groups created by [`apply_to_compound`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentResult {
    pub guests: Vec<GroupId>,
    pub backfills: Vec<GroupId>,
}

/// Attaches a copy of the guest to the host port closest to each pattern point.
///
/// Ports are matched by their `up` middle ghost point using the host's
/// minimum-image distance, so points near a periodic boundary can claim ports on the
/// opposite side. Each port is used at most once. When a backfill is given, every
/// port left over receives a copy of it.
///
/// # Arguments
///
/// * `pattern` - Placement points; fractional when `spec.scale` is set.
/// * `host` - The compound receiving the copies.
/// * `host_group` - The group whose available ports are matched. Copies are added
///   under it unless `spec.destination` names another group.
/// * `spec` - Guest and optional backfill, with the labels of their bonding ports.
/// * `reporter` - Receives one increment per attached copy.
///
/// # Errors
///
/// Returns [`EngineError::NotEnoughPorts`] if the pattern has more points than the
/// host has free ports, and [`EngineError::PortNotFound`] if a template lacks its
/// bonding port.
#[instrument(skip_all, name = "apply_to_compound")]
pub fn apply_to_compound(
    pattern: &Pattern,
    host: &mut Compound,
    host_group: GroupId,
    spec: &AttachmentSpec,
    reporter: &ProgressReporter,
) -> Result<AttachmentResult, EngineError> {
    let ports = host.available_ports(host_group);
    if ports.len() < pattern.len() {
        return Err(EngineError::NotEnoughPorts {
            required: pattern.len(),
            available: ports.len(),
        });
    }
    require_port(spec.guest, spec.guest_port)?;
    if let Some(backfill) = spec.backfill {
        require_port(backfill, spec.backfill_port)?;
    }

    let mut points = pattern.clone();
    if spec.scale {
        let bounds = host.bounding_box(host_group)?;
        points.scale(&bounds.lengths());
        points.translate(&bounds.mins.coords);
    }

    let mut remaining: Vec<(PortId, Point3<f64>)> = ports
        .into_iter()
        .filter_map(|id| host.port(id).map(|port| (id, port.up_middle())))
        .collect();

    let backfill_count = spec.backfill.map_or(0, |_| remaining.len() - points.len());
    reporter.report(Progress::TaskStart {
        total_steps: (points.len() + backfill_count) as u64,
    });

    let destination = spec.destination.unwrap_or(host_group);
    let mut result = AttachmentResult::default();
    for point in &points.points {
        let index = nearest_port(host, &remaining, point).ok_or_else(|| {
            EngineError::Internal("ran out of ports while matching pattern points".into())
        })?;
        let (port, _) = remaining.remove(index);
        debug!(?port, ?point, "Attaching guest");
        result
            .guests
            .push(attach(host, destination, spec.guest, spec.guest_port, port)?);
        reporter.report(Progress::TaskIncrement);
    }

    if let Some(backfill) = spec.backfill {
        for (port, _) in remaining {
            result
                .backfills
                .push(attach(host, destination, backfill, spec.backfill_port, port)?);
            reporter.report(Progress::TaskIncrement);
        }
    }
    reporter.report(Progress::TaskFinish);

    info!(
        guests = result.guests.len(),
        backfills = result.backfills.len(),
        "Attached compounds to host ports"
    );
    Ok(result)
}

fn require_port(template: &Compound, label: &str) -> Result<(), EngineError> {
    template
        .port_by_label(template.root(), label)
        .map(|_| ())
        .map_err(|_| EngineError::PortNotFound {
            compound: template.name().to_string(),
            label: label.to_string(),
        })
}

fn attach(
    host: &mut Compound,
    parent: GroupId,
    template: &Compound,
    port_label: &str,
    target: PortId,
) -> Result<GroupId, EngineError> {
    let label = format!("{}[$]", template.name());
    let Member::Group(group) = host.add(parent, template.clone(), Some(&label))? else {
        return Err(EngineError::Internal(format!(
            "template '{}' was not added as a group",
            template.name()
        )));
    };
    let from = host.port_by_label(group, port_label)?;
    force_overlap(host, group, from, target, true)?;
    Ok(group)
}

/// Index of the candidate closest to `point`; ties go to the lowest index.
fn nearest_port(
    host: &Compound,
    candidates: &[(PortId, Point3<f64>)],
    point: &Point3<f64>,
) -> Option<usize> {
    #[cfg(not(feature = "parallel"))]
    let iterator = candidates.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = candidates.par_iter().enumerate();

    iterator
        .map(|(index, (_, location))| (index, host.min_periodic_distance(location, point)))
        .min_by(|a, b| match a.1.total_cmp(&b.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        })
        .map(|(index, _)| index)
}
