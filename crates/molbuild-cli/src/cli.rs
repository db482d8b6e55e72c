use crate::utils::parser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "molbuild contributors",
    version,
    about = "molbuild CLI - Assemble molecular systems from fragments, ports, patterns and lattices.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a self-assembled monolayer from a TOML recipe.
    Build(BuildArgs),
    /// Populate a crystal lattice and write it to a file.
    Lattice(LatticeArgs),
    /// Chain copies of a monomer into a linear polymer.
    Polymer(PolymerArgs),
    /// Print a summary of a structure file.
    Info(InfoArgs),
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Path to the monolayer recipe in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path for the output structure (.mol2 or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Override the number of surface copies along x.
    #[arg(long, value_name = "INT")]
    pub tile_x: Option<usize>,

    /// Override the number of surface copies along y.
    #[arg(long, value_name = "INT")]
    pub tile_y: Option<usize>,

    /// Override the random seed used to distribute chains.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific recipe value, overriding the recipe file.
    /// Can be used multiple times. Example: -S pattern.n=4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Crystal lattices that can be generated without a custom basis.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LatticeKind {
    /// Simple cubic.
    Sc,
    /// Body-centred cubic.
    Bcc,
    /// Face-centred cubic.
    Fcc,
    /// Hexagonal; uses `c` for the height of the cell.
    Hexagonal,
    /// Rhombohedral; uses `alpha` for the cell angle.
    Rhombohedral,
}

/// Arguments for the `lattice` subcommand.
#[derive(Args, Debug, Clone)]
pub struct LatticeArgs {
    /// The kind of lattice to generate.
    #[arg(short, long, value_enum, required = true)]
    pub kind: LatticeKind,

    /// Lattice constant in nanometres.
    #[arg(short, long, required = true, value_name = "NM")]
    pub spacing: f64,

    /// Cell height for hexagonal lattices, in nanometres. Defaults to the spacing.
    #[arg(long, value_name = "NM")]
    pub c: Option<f64>,

    /// Cell angle for rhombohedral lattices, in degrees.
    #[arg(long, value_name = "DEG")]
    pub alpha: Option<f64>,

    /// Number of unit cells along each lattice vector.
    #[arg(short, long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [1, 1, 1])]
    pub repeat: Vec<usize>,

    /// Element placed on every lattice site.
    #[arg(short, long, default_value = "Au")]
    pub element: String,

    /// Path for the output structure (.mol2 or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `polymer` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PolymerArgs {
    /// Path to the monomer structure (.mol2 or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// 1-based index of the atom that bonds to the previous monomer.
    #[arg(long, required = true, value_name = "INDEX")]
    pub head_anchor: usize,

    /// 1-based index of the atom that bonds to the next monomer.
    #[arg(long, required = true, value_name = "INDEX")]
    pub tail_anchor: usize,

    /// Number of monomers in the chain.
    #[arg(short, required = true, value_name = "COUNT")]
    pub n: usize,

    /// Chain direction as `x,y,z`. The head port faces this way, the tail port the opposite way.
    #[arg(long, value_parser = parser::parse_vector, default_value = "0,1,0")]
    pub orientation: [f64; 3],

    /// Distance from each anchor to its port in nanometres; half the bond length.
    #[arg(long, default_value_t = 0.077, value_name = "NM")]
    pub separation: f64,

    /// Path for the output structure (.mol2 or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// The structure file to summarise.
    #[arg(required = true, value_name = "PATH")]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn build_command_collects_overrides() {
        let cli = Cli::parse_from([
            "molbuild", "-vv", "build", "-c", "sam.toml", "-o", "sam.mol2", "--tile-x", "3",
            "-S", "pattern.n=4", "-S", "seed=9",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.tile_x, Some(3));
        assert_eq!(args.tile_y, None);
        assert_eq!(args.set_values, vec!["pattern.n=4", "seed=9"]);
    }

    #[test]
    fn lattice_command_parses_kind_and_repeat() {
        let cli = Cli::parse_from([
            "molbuild", "lattice", "--kind", "fcc", "--spacing", "0.408", "--repeat", "2", "3",
            "1", "-o", "gold.xyz",
        ]);
        let Commands::Lattice(args) = cli.command else {
            panic!("expected lattice");
        };
        assert_eq!(args.kind, LatticeKind::Fcc);
        assert_eq!(args.repeat, vec![2, 3, 1]);
        assert_eq!(args.element, "Au");
    }

    #[test]
    fn polymer_command_parses_orientation() {
        let cli = Cli::parse_from([
            "molbuild", "polymer", "-i", "ch2.mol2", "--head-anchor", "1", "--tail-anchor", "1",
            "-n", "10", "--orientation", "0,0,1", "-o", "chain.mol2",
        ]);
        let Commands::Polymer(args) = cli.command else {
            panic!("expected polymer");
        };
        assert_eq!(args.orientation, [0.0, 0.0, 1.0]);
        assert_eq!(args.n, 10);
        assert!((args.separation - 0.077).abs() < 1e-12);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["molbuild", "-q", "-v", "info", "a.mol2"]).is_err());
    }
}
