use crate::cli::LatticeArgs;
use crate::config::build_lattice;
use crate::error::{CliError, Result};
use molbuild::core::io::format::save_compound;
use tracing::info;

pub fn run(args: LatticeArgs) -> Result<()> {
    let [x, y, z] = <[usize; 3]>::try_from(args.repeat.as_slice()).map_err(|_| {
        CliError::Argument(format!(
            "--repeat takes three counts, got {}",
            args.repeat.len()
        ))
    })?;
    info!(
        "Populating {:?} lattice (a = {} nm) {}x{}x{} with {}",
        args.kind, args.spacing, x, y, z, args.element
    );
    let crystal = build_lattice(
        args.kind,
        args.spacing,
        args.c,
        args.alpha,
        &args.element,
        [x, y, z],
    )?;

    save_compound(&crystal, &args.output).map_err(|e| CliError::FileParsing {
        path: args.output.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ Lattice with {} atoms written to: {}",
        crystal.n_particles(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LatticeKind;
    use molbuild::core::io::format::load_compound;
    use std::path::PathBuf;

    fn args(output: PathBuf) -> LatticeArgs {
        LatticeArgs {
            kind: LatticeKind::Bcc,
            spacing: 0.287,
            c: None,
            alpha: None,
            repeat: vec![2, 2, 2],
            element: "Fe".to_string(),
            output,
        }
    }

    #[test]
    fn lattice_is_written_in_the_requested_format() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("iron.xyz");
        run(args(output.clone())).unwrap();
        let iron = load_compound(&output).unwrap();
        assert_eq!(iron.n_particles(), 16);
    }

    #[test]
    fn unknown_extension_is_reported_with_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("iron.pdb");
        match run(args(output.clone())) {
            Err(CliError::FileParsing { path, .. }) => assert_eq!(path, output),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
