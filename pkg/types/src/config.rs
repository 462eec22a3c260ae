use serde::{Deserialize, Serialize};

/// Log output format of the server binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// port: 9443
/// data-dir: /var/lib/appstudio/data
/// token: my-secret-token
/// log-format: json
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfigFile {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    /// Bearer token protecting the registry routes. Unset disables auth.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, alias = "log-format")]
    pub log_format: Option<LogFormat>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg: ServerConfigFile =
            load_config_file("/nonexistent/appstudio/config.yaml").unwrap();
        assert!(cfg.port.is_none());
        assert!(cfg.token.is_none());
    }

    #[test]
    fn kebab_case_keys() {
        let cfg: ServerConfigFile =
            serde_yaml::from_str("port: 8443\ndata-dir: /data\nlog-format: json\n").unwrap();
        assert_eq!(cfg.port, Some(8443));
        assert_eq!(cfg.data_dir.as_deref(), Some("/data"));
        assert_eq!(cfg.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: 10443\ntoken: s3cret\n").unwrap();

        let cfg: ServerConfigFile = load_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.port, Some(10443));
        assert_eq!(cfg.token.as_deref(), Some("s3cret"));
        assert!(cfg.log_format.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: [not, a, number]\n").unwrap();

        let result: anyhow::Result<ServerConfigFile> = load_config_file(path.to_str().unwrap());
        assert!(result.is_err());
    }
}
