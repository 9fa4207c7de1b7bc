//! Server settings, layered: built-in defaults, then an optional `scribe.toml`
//! next to the binary, then `SCRIBE_*` environment variables
//! (`SCRIBE_DATABASE__URL`, `SCRIBE_SESSION__SECURE`, ...).

use config::{Config, ConfigError, Environment, File, FileFormat, Source};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// Socket address to bind.
    pub address: String,
    /// Base URL that share links are built on.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    /// Without a URL the server keeps everything in memory.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub secure: bool,
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Documents {
    pub default_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub session: Session,
    pub documents: Documents,
}

fn environment() -> Environment {
    Environment::with_prefix("SCRIBE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(
            File::with_name("scribe")
                .format(FileFormat::Toml)
                .required(false),
            environment(),
        )
    }

    fn load<F>(file: F, env: Environment) -> Result<Self, ConfigError>
    where
        F: Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .set_default("server.address", "127.0.0.1:8080")?
            .set_default("server.public_url", "http://localhost:8080")?
            .set_default("database.max_connections", 5)?
            .set_default("session.secure", false)?
            .set_default("session.expiry_days", 7)?
            .set_default("documents.default_title", "Untitled")?
            .add_source(file)
            .add_source(env)
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: Server {
                address: "127.0.0.1:8080".into(),
                public_url: "http://localhost:8080".into(),
            },
            database: Database {
                url: None,
                max_connections: 5,
            },
            session: Session {
                secure: false,
                expiry_days: 7,
            },
            documents: Documents {
                default_title: "Untitled".into(),
            },
        }
    }
}
