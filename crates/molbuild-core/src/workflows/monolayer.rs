use super::tiling::tile;
use crate::core::models::compound::{Compound, Member};
use crate::core::models::ids::GroupId;
use crate::core::pattern::{Pattern, PatternError};
use crate::engine::attachment::{AttachmentResult, AttachmentSpec, apply_to_compound};
use crate::engine::config::{ConfigError, MonolayerConfig, PatternSpec};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use tracing::{debug, info, instrument};

/// Builds a self-assembled monolayer of chains on a port-decorated surface.
///
/// The surface is tiled first when the configuration asks for it, then added under
/// a `Monolayer` root with the label `surface`. Pattern points are split between
/// the chain templates according to their fractions: every chain except the last
/// draws its share of points at random (seeded by `config.seed`), and the last chain
/// takes all remaining points together with the backfill. Chains and backfills are
/// added directly under the root, bonded to the surface ports they occupy.
///
/// # Errors
///
/// Returns an error if tiling fails, the pattern cannot be generated, the pattern
/// has more points than the surface has free ports, or a template lacks its port.
#[instrument(skip_all, name = "monolayer_workflow")]
pub fn build_monolayer(
    surface: &Compound,
    config: &MonolayerConfig,
    reporter: &ProgressReporter,
) -> Result<Compound, EngineError> {
    // === Phase 1: Surface preparation ===
    reporter.report(Progress::PhaseStart { name: "Surface" });
    let surface = if config.tile_x > 1 || config.tile_y > 1 {
        info!(
            "Tiling surface '{}' {}x{}.",
            surface.name(),
            config.tile_x,
            config.tile_y
        );
        tile(surface, [config.tile_x, config.tile_y, 1])?
    } else {
        surface.clone()
    };

    let mut monolayer = Compound::new("Monolayer");
    let root = monolayer.root();
    let Member::Group(surface_group) = monolayer.add(root, surface, Some("surface"))? else {
        return Err(EngineError::InvalidArgument(
            "the surface must be a compound with ports, not a single particle".into(),
        ));
    };
    let available = monolayer.available_ports(surface_group).len();
    info!("Surface ready with {} available port(s).", available);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Pattern ===
    reporter.report(Progress::PhaseStart { name: "Pattern" });
    let mut remaining = realise_pattern(&config.pattern, available, config.seed)?.points;
    info!("Pattern realised with {} point(s).", remaining.len());
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Chain attachment ===
    let total = remaining.len();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let Some(((last_chain, _), leading)) = config.chains.split_last() else {
        return Err(ConfigError::MissingParameter("chains").into());
    };

    for (chain, fraction) in leading {
        reporter.report(Progress::PhaseStart { name: "Chains" });
        let count = ((fraction * total as f64).round() as usize).min(remaining.len());
        let mut chosen: Vec<usize> = sample(&mut rng, remaining.len(), count).into_vec();
        chosen.sort_unstable_by(|a, b| b.cmp(a));
        let mut points: Vec<_> = chosen.into_iter().map(|index| remaining.remove(index)).collect();
        points.reverse();
        debug!(chain = chain.name(), count, "Selected pattern points");

        let result = attach(
            &mut monolayer,
            surface_group,
            points,
            AttachmentSpec::new(chain)
                .guest_port(&config.guest_port)
                .destination(root),
            reporter,
        )?;
        info!(
            "Attached {} '{}' chain(s).",
            result.guests.len(),
            chain.name()
        );
        reporter.report(Progress::PhaseFinish);
    }

    reporter.report(Progress::PhaseStart { name: "Chains" });
    let mut spec = AttachmentSpec::new(last_chain)
        .guest_port(&config.guest_port)
        .destination(root);
    if let Some(backfill) = &config.backfill {
        spec = spec.backfill(backfill, &config.backfill_port);
    }
    let result = attach(&mut monolayer, surface_group, remaining, spec, reporter)?;
    info!(
        "Attached {} '{}' chain(s) and {} backfill(s).",
        result.guests.len(),
        last_chain.name(),
        result.backfills.len()
    );
    reporter.report(Progress::PhaseFinish);

    info!(
        "Monolayer complete: {} particles, {} bonds.",
        monolayer.n_particles(),
        monolayer.n_bonds()
    );
    Ok(monolayer)
}

fn attach(
    monolayer: &mut Compound,
    surface: GroupId,
    points: Vec<Point3<f64>>,
    spec: AttachmentSpec,
    reporter: &ProgressReporter,
) -> Result<AttachmentResult, EngineError> {
    // An empty pattern is still attached so that a backfill covers every port.
    let pattern = Pattern { points };
    apply_to_compound(&pattern, monolayer, surface, &spec, reporter)
}

/// Generates the fractional placement points described by `spec`.
fn realise_pattern(
    spec: &PatternSpec,
    available: usize,
    seed: u64,
) -> Result<Pattern, PatternError> {
    match spec {
        PatternSpec::Auto => Pattern::random_2d(available, seed),
        PatternSpec::Grid2D { n, m } => Pattern::grid_2d(*n, *m),
        PatternSpec::Grid3D { n, m, l } => Pattern::grid_3d(*n, *m, *l),
        PatternSpec::Random2D { n, seed } => Pattern::random_2d(*n, *seed),
        PatternSpec::Disk { n } => Pattern::disk(*n),
        PatternSpec::Sphere { n } => Pattern::sphere(*n),
        PatternSpec::Points(points) => Pattern::from_points(points.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::recipes::simple_cubic;
    use crate::core::models::port::Port;
    use crate::engine::config::MonolayerConfigBuilder;
    use crate::workflows::surface::decorate_surface;
    use nalgebra::Vector3;
    use std::sync::Mutex;

    /// A 3x3 single-layer gold slab with one port per atom facing +z.
    fn surface() -> Compound {
        let mut slab = simple_cubic(0.4).unwrap().populate(None, 3, 3, 1).unwrap();
        slab.set_name("Au");
        let root = slab.root();
        decorate_surface(&mut slab, root, &Vector3::z(), 0.1, 1e-3, None).unwrap();
        slab
    }

    fn molecule(name: &str, port: &str) -> Compound {
        let mut c = Compound::new(name);
        let root = c.root();
        let head = c.add_particle(root, "S", Point3::origin(), None).unwrap();
        let tail = c
            .add_particle(root, "C", Point3::new(0.0, 0.0, 0.18), None)
            .unwrap();
        c.add_bond(head, tail).unwrap();
        c.add_port(root, Port::new(&-Vector3::z(), 0.1).unwrap(), Some(head), Some(port))
            .unwrap();
        c
    }

    fn count_labeled(monolayer: &Compound, prefix: &str) -> usize {
        monolayer
            .resolve_all(monolayer.root(), prefix)
            .map(|members| members.len())
            .unwrap_or(0)
    }

    #[test]
    fn single_chain_with_backfill_covers_every_port() {
        let config = MonolayerConfigBuilder::new()
            .chain(molecule("Alkane", "down"), 1.0)
            .backfill(molecule("Cap", "up"))
            .pattern(PatternSpec::Grid2D { n: 2, m: 2 })
            .build()
            .unwrap();

        let monolayer = build_monolayer(&surface(), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(monolayer.name(), "Monolayer");
        assert!(monolayer.group_by_label(monolayer.root(), "surface").is_ok());
        assert_eq!(count_labeled(&monolayer, "Alkane"), 4);
        assert_eq!(count_labeled(&monolayer, "Cap"), 5);
        assert_eq!(monolayer.n_ports(), 0);
        assert_eq!(monolayer.n_particles(), 9 + 9 * 2);
        assert_eq!(monolayer.n_bonds(), 9 * 2);
        assert!(monolayer.sim_box().is_some());
    }

    #[test]
    fn chains_are_split_by_fraction() {
        let config = MonolayerConfigBuilder::new()
            .chain(molecule("Short", "down"), 0.5)
            .chain(molecule("Long", "down"), 0.5)
            .pattern(PatternSpec::Grid2D { n: 2, m: 2 })
            .build()
            .unwrap();

        let monolayer = build_monolayer(&surface(), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(count_labeled(&monolayer, "Short"), 2);
        assert_eq!(count_labeled(&monolayer, "Long"), 2);
        assert_eq!(monolayer.n_ports(), 5);
    }

    #[test]
    fn same_seed_gives_the_same_monolayer() {
        let build = || {
            let config = MonolayerConfigBuilder::new()
                .chain(molecule("Short", "down"), 0.3)
                .chain(molecule("Long", "down"), 0.7)
                .seed(7)
                .build()
                .unwrap();
            build_monolayer(&surface(), &config, &ProgressReporter::new()).unwrap()
        };
        let (first, second) = (build(), build());
        assert_eq!(first.xyz(first.root()), second.xyz(second.root()));
    }

    #[test]
    fn automatic_pattern_fills_a_tiled_surface() {
        let config = MonolayerConfigBuilder::new()
            .chain(molecule("Alkane", "down"), 1.0)
            .tile_x(2)
            .build()
            .unwrap();

        let monolayer = build_monolayer(&surface(), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(count_labeled(&monolayer, "Alkane"), 18);
        assert_eq!(monolayer.n_ports(), 0);
        let lengths = monolayer.sim_box().unwrap().lengths();
        assert!((lengths[0] - 2.4).abs() < 1e-9);
        assert!((lengths[1] - 1.2).abs() < 1e-9);
    }

    #[test]
    fn chains_sit_above_their_surface_atom() {
        let config = MonolayerConfigBuilder::new()
            .chain(molecule("Alkane", "down"), 1.0)
            .pattern(PatternSpec::Points(vec![Point3::origin()]))
            .build()
            .unwrap();
        let monolayer = build_monolayer(&surface(), &config, &ProgressReporter::new()).unwrap();
        let chain = monolayer.group_by_label(monolayer.root(), "Alkane[0]").unwrap();
        let sulfur = monolayer.particle_by_label(chain, "S[0]").unwrap();
        let position = monolayer.particle_ref(sulfur).unwrap().position;
        assert!((position - Point3::new(0.0, 0.0, 0.2)).norm() < 1e-6);
    }

    #[test]
    fn too_dense_pattern_is_rejected() {
        let config = MonolayerConfigBuilder::new()
            .chain(molecule("Alkane", "down"), 1.0)
            .pattern(PatternSpec::Grid2D { n: 4, m: 4 })
            .build()
            .unwrap();
        assert!(matches!(
            build_monolayer(&surface(), &config, &ProgressReporter::new()),
            Err(EngineError::NotEnoughPorts { required: 16, available: 9 })
        ));
    }

    #[test]
    fn phases_are_reported_in_order() {
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        let config = MonolayerConfigBuilder::new()
            .chain(molecule("Short", "down"), 0.5)
            .chain(molecule("Long", "down"), 0.5)
            .build()
            .unwrap();
        build_monolayer(&surface(), &config, &reporter).unwrap();
        drop(reporter);
        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Surface", "Pattern", "Chains", "Chains"]
        );
    }
}
