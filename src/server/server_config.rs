use std::{fs, net::SocketAddr, path::{Path, PathBuf}};
use serde::{Serialize, Deserialize, Deserializer};
use toml;
use anyhow::{self, Context};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,
    /// JSON file holding purchases and budget groups
    pub data_file: PathBuf,
    /// Directory with the browser UI, served for every non-API route.
    /// An empty string turns static serving off.
    #[serde(deserialize_with = "empty_path_is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_file: PathBuf::from("zakupy.json"),
            static_dir: Some(PathBuf::from("public")),
        }
    }
}

fn empty_path_is_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PathBuf>, D::Error> {
    let path = PathBuf::deserialize(deserializer)?;
    Ok(Some(path).filter(|path| !path.as_os_str().is_empty()))
}

impl ServerConfig {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(content)
            .with_context(|| "failed to parse config file")?;
        return Ok(config);
    }

    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(filepath)
            .with_context(|| "failed to read config file")?;
        return Self::parse(&file_content);
    }

    /// Like `read`, but a config file that doesn't exist means defaults.
    pub fn read_or_default(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        if !filepath.exists() {
            log::warn!("no config file at {}, using defaults", filepath.display());
            return Ok(Self::default());
        }
        return Self::read(filepath);
    }
}


#[cfg(test)]
mod tests {
    use super::ServerConfig;
    use std::path::PathBuf;

    #[test]
    fn full_config() {
        let config = ServerConfig::parse(r#"
            bind = "0.0.0.0:8080"
            data_file = "/var/lib/zakupy/zakupy.json"
            static_dir = "/srv/zakupy"
        "#).unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.data_file, PathBuf::from("/var/lib/zakupy/zakupy.json"));
        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/zakupy")));
    }

    #[test]
    fn missing_keys_use_defaults() {
        let config = ServerConfig::parse("data_file = \"dane.json\"").unwrap();
        assert_eq!(config.bind, ServerConfig::default().bind);
        assert_eq!(config.data_file, PathBuf::from("dane.json"));
        assert_eq!(config.static_dir, Some(PathBuf::from("public")));
    }

    #[test]
    fn empty_static_dir_disables_static_files() {
        let config = ServerConfig::parse("static_dir = \"\"").unwrap();
        assert_eq!(config.static_dir, None);
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(ServerConfig::parse("bind = \"not an address\"").is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::read_or_default(dir.path().join("server.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }
}
