use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub capacity: i64,
}

impl Config {
    pub fn new(host: IpAddr, port: u16, capacity: i64) -> Self {
        Self {
            host,
            port,
            capacity,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<Config> for api::Config {
    fn from(config: Config) -> Self {
        api::Config {
            host: config.host,
            port: config.port,
        }
    }
}
