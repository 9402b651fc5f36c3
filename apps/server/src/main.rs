//! # Stockly Server
//!
//! ## Usage
//! ```bash
//! # Defaults, or ~/.config/stockly/server.toml if present
//! cargo run -p stockly-server
//!
//! # Explicit config file
//! cargo run -p stockly-server -- --config ./server.toml
//!
//! # Environment overrides
//! STOCKLY_PORT=9000 STOCKLY_DB_PATH=./dev.db cargo run -p stockly-server
//! ```

use std::env;
use std::path::PathBuf;

use stockly_server::config::ServerConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockly Server");
                println!();
                println!("Usage: stockly-server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    stockly_server::init_tracing();

    let config = ServerConfig::load(config_path)?;
    info!(
        addr = %config.server.bind_address(),
        db = %config.database.path.display(),
        "Configuration loaded"
    );

    stockly_server::run(config).await?;
    Ok(())
}
