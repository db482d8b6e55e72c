use crate::cli::PolymerArgs;
use crate::config::{FilePort, make_template};
use crate::error::{CliError, Result};
use molbuild::core::io::format::save_compound;
use molbuild::workflows::polymer::polymer;
use std::path::Path;
use tracing::info;

const HEAD: &str = "up";
const TAIL: &str = "down";

pub fn run(args: PolymerArgs) -> Result<()> {
    let [x, y, z] = args.orientation;
    let ports = [
        FilePort {
            label: HEAD.to_string(),
            anchor: args.head_anchor,
            orientation: [x, y, z],
            separation: args.separation,
        },
        FilePort {
            label: TAIL.to_string(),
            anchor: args.tail_anchor,
            orientation: [-x, -y, -z],
            separation: args.separation,
        },
    ];
    let monomer = make_template(Some(args.input.as_path()), None, &ports, Path::new("."))?;
    info!(
        "Loaded monomer '{}' with {} atoms from {:?}",
        monomer.name(),
        monomer.n_particles(),
        &args.input
    );

    let chain = polymer(&monomer, args.n, HEAD, TAIL)?;

    save_compound(&chain, &args.output).map_err(|e| CliError::FileParsing {
        path: args.output.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ Polymer of {} monomers ({} atoms) written to: {}",
        args.n,
        chain.n_particles(),
        args.output.display()
    );
    Ok(())
}
