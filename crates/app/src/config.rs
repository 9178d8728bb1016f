//! Configuration for the bitwire demo application.
//!
//! Handles parsing command-line arguments and generating sensible defaults.
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments, using intelligent defaults.
//! The effective configuration (including the seed) is printed so every
//! run is reproducible with `--seed`.

/// Complete configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Random seed for entity generation and per-tick jitter
    pub seed: u64,

    /// Number of entities per snapshot
    pub entity_count: usize,

    /// Number of snapshot packets to assemble
    pub snapshots: usize,

    /// World units per quantization step for compressed points
    pub scale: f32,

    /// Whether to print the effective configuration
    pub print_config: bool,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// If `--seed` is absent, a time-based seed is chosen (and printed) so
    /// runs differ but stay reproducible.
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut seed: Option<u64> = None;
        let mut entity_count: Option<usize> = None;
        let mut snapshots: Option<usize> = None;
        let mut scale: Option<f32> = None;
        let mut print_config = true;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--seed requires a number".to_string());
                    }
                    seed = Some(args[i].parse().map_err(|_| "invalid seed")?);
                }
                "--entities" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--entities requires a number".to_string());
                    }
                    entity_count = Some(args[i].parse().map_err(|_| "invalid entity count")?);
                }
                "--snapshots" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--snapshots requires a number".to_string());
                    }
                    snapshots = Some(args[i].parse().map_err(|_| "invalid snapshot count")?);
                }
                "--scale" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--scale requires a number".to_string());
                    }
                    scale = Some(args[i].parse().map_err(|_| "invalid scale")?);
                }
                "--quiet" => {
                    print_config = false;
                }
                "--help" | "-h" => {
                    return Err(usage());
                }
                other => {
                    return Err(format!("unknown argument: {}\n{}", other, usage()));
                }
            }
            i += 1;
        }

        let seed = seed.unwrap_or_else(time_seed);

        let config = Self {
            seed,
            entity_count: entity_count.unwrap_or(48),
            snapshots: snapshots.unwrap_or(20),
            scale: scale.unwrap_or(0.01),
            print_config,
        };

        if config.entity_count == 0 {
            return Err("--entities must be at least 1".to_string());
        }
        // The snapshot layout carries the entity count in 8 bits.
        if config.entity_count > 255 {
            return Err("--entities must be at most 255".to_string());
        }
        if config.scale <= 0.0 {
            return Err("--scale must be positive".to_string());
        }

        Ok(config)
    }

    /// Print the effective configuration.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Seed: {}", self.seed);
        println!("Entities per snapshot: {}", self.entity_count);
        println!("Snapshots: {}", self.snapshots);
        println!("Point scale: {} units/step", self.scale);
        println!();
    }
}

fn usage() -> String {
    "usage: bitwire-sim [--seed N] [--entities N] [--snapshots N] [--scale F] [--quiet]"
        .to_string()
}

/// Time-based seed for runs without an explicit `--seed`.
fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_args(&[]).unwrap();
        assert_eq!(config.entity_count, 48);
        assert_eq!(config.snapshots, 20);
        assert!(config.print_config);
    }

    #[test]
    fn test_explicit_values() {
        let config =
            Config::from_args(&args(&["--seed", "7", "--entities", "10", "--quiet"])).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.entity_count, 10);
        assert!(!config.print_config);
    }

    #[test]
    fn test_rejects_bad_args() {
        assert!(Config::from_args(&args(&["--entities"])).is_err());
        assert!(Config::from_args(&args(&["--entities", "0"])).is_err());
        assert!(Config::from_args(&args(&["--entities", "300"])).is_err());
        assert!(Config::from_args(&args(&["--scale", "-1"])).is_err());
        assert!(Config::from_args(&args(&["--bogus"])).is_err());
    }
}
