use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_AUTO_ADVANCE_MS: u64 = 1500;
const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub auto_advance: Duration,
    /// Sessions untouched this long are dropped. Zero keeps them until deleted.
    pub session_idle: Duration,
    pub store_kind: StoreKind,
    pub store_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let auto_advance = std::env::var("AUTO_ADVANCE_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_AUTO_ADVANCE_MS));

        let session_idle = std::env::var("SESSION_IDLE_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_SESSION_IDLE_SECS));

        let store_kind = match std::env::var("VOCAB_STORE")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Ok("memory") => StoreKind::Memory,
            _ => StoreKind::File,
        };

        let store_dir = std::env::var("VOCAB_STORE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_store_dir);

        Self {
            host,
            port,
            log_level,
            auto_advance,
            session_idle,
            store_kind,
            store_dir,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 3000,
            log_level: "info".to_string(),
            auto_advance: Duration::from_millis(DEFAULT_AUTO_ADVANCE_MS),
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            store_kind: StoreKind::Memory,
            store_dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tango")
}
