use crate::cli::BuildArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use molbuild::core::io::format::save_compound;
use molbuild::engine::progress::ProgressReporter;
use molbuild::workflows::monolayer::build_monolayer;
use tracing::info;

pub fn run(args: BuildArgs) -> Result<()> {
    info!("Resolving recipe {:?}", &args.config);
    let app = build_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Building monolayer...");
    info!("Invoking the monolayer workflow...");
    let monolayer = build_monolayer(&app.surface, &app.monolayer, &reporter)?;

    info!("Writing monolayer to {:?}", &app.output);
    save_compound(&monolayer, &app.output).map_err(|e| CliError::FileParsing {
        path: app.output.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ Monolayer with {} atoms and {} bonds written to: {}",
        monolayer.n_particles(),
        monolayer.n_bonds(),
        app.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use molbuild::core::io::format::load_compound;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn recipe_builds_and_writes_a_monolayer() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = dir.path().join("sam.toml");
        fs::write(
            &recipe,
            r#"
            [surface]
            lattice = "sc"
            spacing = 0.4
            repeat = [2, 2, 1]

            [[chains]]
            element = "S"
            [[chains.ports]]
            label = "down"
            anchor = 1
            orientation = [0.0, 0.0, -1.0]
            separation = 0.1

            [backfill]
            element = "H"
            [[backfill.ports]]
            label = "up"
            anchor = 1
            orientation = [0.0, 0.0, -1.0]
            separation = 0.05

            [pattern]
            type = "grid-2d"
            n = 1
            m = 2
            "#,
        )
        .unwrap();
        let output = dir.path().join("sam.mol2");

        run(BuildArgs {
            config: recipe,
            output: output.clone(),
            tile_x: Some(2),
            tile_y: None,
            seed: None,
            set_values: vec![],
        })
        .unwrap();

        let written = load_compound(&output).unwrap();
        assert_eq!(written.n_particles(), 8 + 8);
        assert_eq!(written.n_bonds(), 8);
        assert!(written.sim_box().is_some());
    }

    #[test]
    fn missing_recipe_is_an_io_error() {
        let result = run(BuildArgs {
            config: PathBuf::from("does/not/exist.toml"),
            output: PathBuf::from("out.mol2"),
            tile_x: None,
            tile_y: None,
            seed: None,
            set_values: vec![],
        });
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
