// src/config.rs
// Server configuration from command-line flags with environment-variable fallbacks.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "double-pendulum-sim", version, about = "Double pendulum simulator with a browser UI")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "PENDULUM_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PENDULUM_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Directory holding index.html and other static assets
    #[arg(long, env = "PENDULUM_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory where saved trajectories are written
    #[arg(long, env = "PENDULUM_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Largest time grid a single request may ask for
    #[arg(long, env = "PENDULUM_MAX_SAMPLES", default_value_t = 200_000)]
    pub max_samples: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("static"),
            output_dir: PathBuf::from("."),
            max_samples: 200_000,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
