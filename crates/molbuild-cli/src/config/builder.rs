use super::defaults::DefaultsConfig;
use super::file::{FileChain, FilePattern, FilePatternKind, FilePort, FileRecipe, FileSurface};
use super::models::AppConfig;
use crate::cli::{BuildArgs, LatticeKind};
use crate::error::{CliError, Result};
use crate::utils::parser;
use molbuild::core::io::format::load_compound;
use molbuild::core::lattice::recipes;
use molbuild::core::models::compound::Compound;
use molbuild::core::models::port::Port;
use molbuild::core::pattern::Pattern;
use molbuild::engine::config::{MonolayerConfigBuilder, PatternSpec};
use molbuild::engine::error::EngineError;
use molbuild::workflows::surface::decorate_surface;
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Resolves a `build` invocation into a surface and a monolayer configuration.
///
/// Values are taken from the command line first, then from the recipe (after `-S`
/// overrides), then from [`DefaultsConfig`]. Relative paths in the recipe are
/// resolved against the directory that contains it.
pub fn build_config(args: &BuildArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let recipe = FileRecipe::from_file(&args.config)?;
    let recipe = apply_set_values(recipe, &args.set_values)?;
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));

    let surface_file = recipe
        .surface
        .as_ref()
        .ok_or_else(|| CliError::Config("the recipe needs a [surface] section".to_string()))?;
    let surface = load_surface(surface_file, base_dir, &defaults)?;

    if recipe.chains.is_empty() {
        return Err(CliError::Config(
            "the recipe needs at least one [[chains]] entry".to_string(),
        ));
    }

    let seed = args.seed.or(recipe.seed).unwrap_or(defaults.seed);
    let tiling = recipe.tiling.clone().unwrap_or_default();
    let tile_x = args.tile_x.or(tiling.x).unwrap_or(defaults.tile_x);
    let tile_y = args.tile_y.or(tiling.y).unwrap_or(defaults.tile_y);
    let chain_port = recipe.chain_port.as_deref().unwrap_or(&defaults.chain_port);
    let backfill_port = recipe
        .backfill_port
        .as_deref()
        .unwrap_or(&defaults.backfill_port);

    let mut builder = MonolayerConfigBuilder::new()
        .pattern(resolve_pattern(recipe.pattern.as_ref(), base_dir, seed)?)
        .tile_x(tile_x)
        .tile_y(tile_y)
        .guest_port(chain_port)
        .backfill_port(backfill_port)
        .seed(seed);

    let single_chain = recipe.chains.len() == 1;
    for (index, chain) in recipe.chains.iter().enumerate() {
        let fraction = chain_fraction(chain, index, single_chain)?;
        let template = make_template(
            chain.file.as_deref(),
            chain.element.as_deref(),
            &chain.ports,
            base_dir,
        )?;
        builder = builder.chain(template, fraction);
    }
    if let Some(backfill) = &recipe.backfill {
        builder = builder.backfill(make_template(
            backfill.file.as_deref(),
            backfill.element.as_deref(),
            &backfill.ports,
            base_dir,
        )?);
    }

    let monolayer = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        surface,
        monolayer,
        output: args.output.clone(),
    })
}

fn chain_fraction(chain: &FileChain, index: usize, single_chain: bool) -> Result<f64> {
    match (chain.fraction, single_chain) {
        (Some(f), _) => Ok(f),
        (None, true) => Ok(1.0),
        (None, false) => Err(CliError::Config(format!(
            "chain {} needs a `fraction` when several chains are given",
            index + 1
        ))),
    }
}

/// Builds the surface from a lattice or a file and decorates its top face with ports.
fn load_surface(
    surface: &FileSurface,
    base_dir: &Path,
    defaults: &DefaultsConfig,
) -> Result<Compound> {
    let mut compound = match (surface.lattice, &surface.file) {
        (Some(kind), None) => {
            let spacing = surface.spacing.ok_or_else(|| {
                CliError::Config("`surface.spacing` is required with `surface.lattice`".to_string())
            })?;
            build_lattice(
                kind,
                spacing,
                surface.c,
                surface.alpha,
                surface.element.as_deref().unwrap_or(&defaults.element),
                surface.repeat.unwrap_or(defaults.repeat),
            )?
        }
        (None, Some(file)) => read_structure(&resolve_path(base_dir, file))?,
        _ => {
            return Err(CliError::Config(
                "[surface] needs exactly one of `lattice` or `file`".to_string(),
            ));
        }
    };

    let orientation = Vector3::from(surface.port_orientation.unwrap_or(defaults.port_orientation));
    let root = compound.root();
    let added = decorate_surface(
        &mut compound,
        root,
        &orientation,
        surface.port_separation.unwrap_or(defaults.port_separation),
        surface.port_tolerance.unwrap_or(defaults.port_tolerance),
        None,
    )?;
    if added == 0 {
        warn!("Surface '{}' received no ports.", compound.name());
    }
    info!("Surface '{}' prepared with {} port(s).", compound.name(), added);
    Ok(compound)
}

/// Populates one of the standard lattices with `element` on every site.
pub fn build_lattice(
    kind: LatticeKind,
    spacing: f64,
    c: Option<f64>,
    alpha: Option<f64>,
    element: &str,
    repeat: [usize; 3],
) -> Result<Compound> {
    let lattice = match kind {
        LatticeKind::Sc => recipes::simple_cubic(spacing),
        LatticeKind::Bcc => recipes::body_centered_cubic(spacing),
        LatticeKind::Fcc => recipes::face_centered_cubic(spacing),
        LatticeKind::Hexagonal => recipes::hexagonal(spacing, c.unwrap_or(spacing)),
        LatticeKind::Rhombohedral => {
            let alpha = alpha.ok_or_else(|| {
                CliError::Argument("rhombohedral lattices need an `alpha` angle".to_string())
            })?;
            recipes::rhombohedral(spacing, alpha)
        }
    }
    .map_err(EngineError::from)?;

    let atoms: BTreeMap<String, Compound> = lattice
        .basis()
        .keys()
        .map(|key| (key.clone(), Compound::particle(element, Point3::origin())))
        .collect();
    let [x, y, z] = repeat;
    let mut compound = lattice
        .populate(Some(&atoms), x, y, z)
        .map_err(EngineError::from)?;
    compound.set_name(element);
    Ok(compound)
}

/// Loads a template from a file or a single element and adds the requested ports.
pub fn make_template(
    file: Option<&Path>,
    element: Option<&str>,
    ports: &[FilePort],
    base_dir: &Path,
) -> Result<Compound> {
    let mut compound = match (file, element) {
        (Some(file), None) => read_structure(&resolve_path(base_dir, file))?,
        (None, Some(element)) => Compound::particle(element, Point3::origin()),
        _ => {
            return Err(CliError::Config(
                "a template needs exactly one of `file` or `element`".to_string(),
            ));
        }
    };

    let root = compound.root();
    let atoms = compound.particle_ids(root);
    for port in ports {
        let anchor = port
            .anchor
            .checked_sub(1)
            .and_then(|i| atoms.get(i).copied())
            .ok_or_else(|| {
                CliError::Config(format!(
                    "port '{}' anchors to atom {}, but '{}' has {} atom(s)",
                    port.label,
                    port.anchor,
                    compound.name(),
                    atoms.len()
                ))
            })?;
        let geometry = Port::new(&Vector3::from(port.orientation), port.separation)
            .ok_or_else(|| {
                CliError::Config(format!("port '{}' has a zero orientation", port.label))
            })?;
        compound
            .add_port(root, geometry, Some(anchor), Some(&port.label))
            .map_err(EngineError::from)?;
    }
    Ok(compound)
}

fn resolve_pattern(
    pattern: Option<&FilePattern>,
    base_dir: &Path,
    seed: u64,
) -> Result<PatternSpec> {
    let Some(pattern) = pattern else {
        return Ok(PatternSpec::Auto);
    };
    let require = |value: Option<usize>, key: &str| {
        value.ok_or_else(|| {
            CliError::Config(format!("`pattern.{key}` is required for this pattern type"))
        })
    };
    let spec = match pattern.kind {
        FilePatternKind::Auto => PatternSpec::Auto,
        FilePatternKind::Grid2D => PatternSpec::Grid2D {
            n: require(pattern.n, "n")?,
            m: require(pattern.m, "m")?,
        },
        FilePatternKind::Grid3D => PatternSpec::Grid3D {
            n: require(pattern.n, "n")?,
            m: require(pattern.m, "m")?,
            l: require(pattern.l, "l")?,
        },
        FilePatternKind::Random2D => PatternSpec::Random2D {
            n: require(pattern.n, "n")?,
            seed: pattern.seed.unwrap_or(seed),
        },
        FilePatternKind::Disk => PatternSpec::Disk {
            n: require(pattern.n, "n")?,
        },
        FilePatternKind::Sphere => PatternSpec::Sphere {
            n: require(pattern.n, "n")?,
        },
        FilePatternKind::Csv => {
            let path = pattern.path.as_ref().ok_or_else(|| {
                CliError::Config("`pattern.path` is required for csv patterns".to_string())
            })?;
            let path = resolve_path(base_dir, path);
            let points = Pattern::from_csv(&path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?;
            PatternSpec::Points(points.points)
        }
    };
    Ok(spec)
}

fn read_structure(path: &Path) -> Result<Compound> {
    load_compound(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn apply_set_values(mut recipe: FileRecipe, set_values: &[String]) -> Result<FileRecipe> {
    for kv_pair in set_values {
        let (key, value) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "seed" => recipe.seed = Some(parse_value(key, value)?),
            "chain-port" => recipe.chain_port = Some(value.to_string()),
            "backfill-port" => recipe.backfill_port = Some(value.to_string()),
            "surface.spacing" => {
                recipe.surface.get_or_insert_with(Default::default).spacing =
                    Some(parse_value(key, value)?);
            }
            "surface.element" => {
                recipe.surface.get_or_insert_with(Default::default).element =
                    Some(value.to_string());
            }
            "surface.port-separation" => {
                recipe
                    .surface
                    .get_or_insert_with(Default::default)
                    .port_separation = Some(parse_value(key, value)?);
            }
            "surface.port-tolerance" => {
                recipe
                    .surface
                    .get_or_insert_with(Default::default)
                    .port_tolerance = Some(parse_value(key, value)?);
            }
            "pattern.n" => {
                recipe.pattern.get_or_insert_with(Default::default).n =
                    Some(parse_value(key, value)?);
            }
            "pattern.m" => {
                recipe.pattern.get_or_insert_with(Default::default).m =
                    Some(parse_value(key, value)?);
            }
            "pattern.l" => {
                recipe.pattern.get_or_insert_with(Default::default).l =
                    Some(parse_value(key, value)?);
            }
            "pattern.seed" => {
                recipe.pattern.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value)?);
            }
            "pattern.path" => {
                recipe.pattern.get_or_insert_with(Default::default).path =
                    Some(PathBuf::from(value));
            }
            "tiling.x" => {
                recipe.tiling.get_or_insert_with(Default::default).x =
                    Some(parse_value(key, value)?);
            }
            "tiling.y" => {
                recipe.tiling.get_or_insert_with(Default::default).y =
                    Some(parse_value(key, value)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(recipe)
}
