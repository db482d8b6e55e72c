use crate::cli::InfoArgs;
use crate::error::{CliError, Result};
use molbuild::core::io::format::load_compound;
use molbuild::core::models::compound::Compound;

pub fn run(args: InfoArgs) -> Result<()> {
    let compound = load_compound(&args.file).map_err(|e| CliError::FileParsing {
        path: args.file.clone(),
        source: e.into(),
    })?;
    print!("{}", summarize(&compound));
    Ok(())
}

/// A human-readable summary of `compound`; lengths in nanometres.
pub fn summarize(compound: &Compound) -> String {
    let root = compound.root();
    let mut out = String::new();
    out.push_str(&format!("Name:      {}\n", compound.name()));
    out.push_str(&format!("Particles: {}\n", compound.n_particles()));
    out.push_str(&format!("Bonds:     {}\n", compound.n_bonds()));
    out.push_str(&format!("Ports:     {}\n", compound.n_ports()));
    match compound.bounding_box(root) {
        Ok(bounds) => {
            let lengths = bounds.lengths();
            out.push_str(&format!(
                "Extent:    {:.4} x {:.4} x {:.4} nm\n",
                lengths.x, lengths.y, lengths.z
            ));
        }
        Err(_) => out.push_str("Extent:    (empty)\n"),
    }
    match compound.sim_box() {
        Some(sim_box) => {
            let [a, b, c] = sim_box.lengths();
            let [alpha, beta, gamma] = sim_box.angles();
            out.push_str(&format!(
                "Box:       {a:.4} x {b:.4} x {c:.4} nm, \
                 angles {alpha:.2} {beta:.2} {gamma:.2}\n"
            ));
        }
        None => out.push_str("Box:       none\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use molbuild::core::models::sim_box::SimBox;
    use nalgebra::Point3;
    use std::path::PathBuf;

    #[test]
    fn summary_lists_counts_extent_and_box() {
        let mut water = Compound::new("Water");
        let root = water.root();
        let o = water.add_particle(root, "O", Point3::origin(), None).unwrap();
        let h = water
            .add_particle(root, "H", Point3::new(0.0957, 0.0, 0.0), None)
            .unwrap();
        water.add_bond(o, h).unwrap();
        water.set_sim_box(Some(SimBox::from_lengths([1.0, 2.0, 3.0]).unwrap()));

        let summary = summarize(&water);
        assert!(summary.contains("Name:      Water"));
        assert!(summary.contains("Particles: 2"));
        assert!(summary.contains("Bonds:     1"));
        assert!(summary.contains("Extent:    0.0957 x 0.0000 x 0.0000 nm"));
        assert!(summary.contains("Ports:     0"));
        assert!(summary.contains(
            "Box:       1.0000 x 2.0000 x 3.0000 nm, angles 90.00 90.00 90.00\n"
        ));
        assert_eq!(summary.lines().count(), 6);
    }

    #[test]
    fn empty_compound_has_no_extent_or_box() {
        let summary = summarize(&Compound::new("Empty"));
        assert!(summary.contains("Extent:    (empty)"));
        assert!(summary.contains("Box:       none"));
    }

    #[test]
    fn unreadable_file_is_reported() {
        let result = run(InfoArgs {
            file: PathBuf::from("missing.mol2"),
        });
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
