use clap::{Arg, Command};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

mod config;
mod error;

use config::Config;
use error::ServerError;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt::init();

    let matches = Command::new("fs-simulator")
        .version(env!("CARGO_PKG_VERSION"))
        .about("File system simulator backend")
        .arg(
            Arg::new("host")
                .long("host")
                .help("Address to bind the API server to")
                .default_value("0.0.0.0")
        )
        .arg(
            Arg::new("port")
                .long("port")
                .help("Port to listen on")
                .default_value("4000")
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .help("Initial disk capacity in blocks")
                .default_value("256")
        )
        .get_matches();

    let host = IpAddr::from_str(matches.get_one::<String>("host").unwrap())
        .map_err(|e| ServerError::InvalidConfig(format!("Invalid host address: {}", e)))?;

    let port = matches.get_one::<String>("port")
        .unwrap()
        .parse::<u16>()
        .map_err(|e| ServerError::InvalidConfig(format!("Invalid port: {}", e)))?;

    let capacity = matches.get_one::<String>("capacity")
        .unwrap()
        .parse::<i64>()
        .map_err(|e| ServerError::InvalidConfig(format!("Invalid capacity: {}", e)))?;

    let config = Config::new(host, port, capacity);
    info!("Starting file system simulator backend on {}", config.bind_address());

    let ledger = Arc::new(simulator::DiskLedger::new(config.capacity));
    let server = api::Server::new(config.into(), ledger);
    server.start().await?;

    Ok(())
}
