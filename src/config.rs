use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// Runtime settings, read from an optional TOML file.
// Command-line flags override individual fields after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    // `tracing_subscriber::EnvFilter` directive, `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: default_database(),
            bind: default_bind(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_database() -> PathBuf {
    PathBuf::from("db.sqlite3")
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Settings::parse(&content).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Settings> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_argument_gives_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.bind.port(), 8000);
        assert_eq!(settings.database, PathBuf::from("db.sqlite3"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = Settings::parse("bind = \"0.0.0.0:9000\"\n").unwrap();
        assert_eq!(settings.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database = \"/tmp/todos.sqlite3\"").unwrap();
        writeln!(file, "log_filter = \"todo_list=debug\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.database, PathBuf::from("/tmp/todos.sqlite3"));
        assert_eq!(settings.log_filter, "todo_list=debug");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::parse("bind = \"not an address\"").is_err());
        assert!(Settings::load(Some(Path::new("/definitely/missing.toml"))).is_err());
    }
}
