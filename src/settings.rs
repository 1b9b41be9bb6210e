// src/settings.rs

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use clap::Parser;
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use tracing::Level;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_DB_PATH: &str = "db";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Path to the certificate file. Serves HTTPS together with `--key`.
    #[arg(long, value_name = "CERT_PATH", requires = "key")]
    pub cert: Option<PathBuf>,

    /// Path to the key file.
    #[arg(long, value_name = "KEY_PATH", requires = "cert")]
    pub key: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Web {
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub address: SocketAddr,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(
        deserialize_with = "deserialize_level",
        serialize_with = "serialize_level"
    )]
    pub level: Level,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub web: Web,
    pub database: DatabaseSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults.
    ///
    /// Without a file, every setting takes its default.
    pub fn from_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::<DefaultState>::default()
            .set_default("web.address", DEFAULT_ADDR)?
            .set_default("database.path", DEFAULT_DB_PATH)?
            .set_default("log.level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder.build()?.try_deserialize()
    }
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

fn serialize_level<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(level.as_str())
}
