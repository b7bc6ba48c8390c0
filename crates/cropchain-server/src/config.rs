use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn parses_from_toml() {
        let c: ServerConfig = toml::from_str(r#"bind_addr = "0.0.0.0:8080""#).unwrap();
        assert_eq!(c.bind_addr.port(), 8080);
    }

    #[test]
    fn missing_fields_fall_back() {
        let c: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(c, ServerConfig::default());
    }
}
