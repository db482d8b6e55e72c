use molbuild::core::models::compound::Compound;
use molbuild::engine::config::MonolayerConfig;
use std::path::PathBuf;

/// Everything the `build` command needs once the recipe has been resolved.
pub struct AppConfig {
    pub surface: Compound,
    pub monolayer: MonolayerConfig,
    pub output: PathBuf,
}
