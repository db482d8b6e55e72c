pub struct DefaultsConfig {
    pub seed: u64,
    pub repeat: [usize; 3],
    pub element: String,
    pub port_orientation: [f64; 3],
    pub port_separation: f64,
    pub port_tolerance: f64,
    pub chain_port: String,
    pub backfill_port: String,
    pub tile_x: usize,
    pub tile_y: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            repeat: [1, 1, 1],
            element: "Au".to_string(),
            port_orientation: [0.0, 0.0, 1.0],
            port_separation: 0.1,
            port_tolerance: 0.01,
            chain_port: "down".to_string(),
            backfill_port: "up".to_string(),
            tile_x: 1,
            tile_y: 1,
        }
    }
}
