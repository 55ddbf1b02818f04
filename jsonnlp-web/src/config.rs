//! Configuração do servidor lida de um arquivo TOML opcional.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Variável de ambiente com o caminho do arquivo de configuração
pub const CONFIG_ENV: &str = "JSONNLP_CONFIG";

/// Arquivo procurado no diretório de trabalho quando a variável não existe
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Modelo usado quando a requisição não pede outro
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_true")]
    pub coreferences: bool,
    #[serde(default = "default_true")]
    pub constituents: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9002
}

fn default_model() -> String {
    "en_core_web_sm".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model: default_model(),
            coreferences: true,
            constituents: true,
        }
    }
}

impl ServerConfig {
    /// Endereço `host:port` para o listener
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Caminho do arquivo: `$JSONNLP_CONFIG` ou `config.toml`
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Lê a configuração. Arquivo ausente dá os valores padrão; arquivo inválido é erro.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    if !path.exists() {
        return Ok(ServerConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Falha ao ler o arquivo de configuração: {}", path.display()))?;
    let config: ServerConfig = toml::from_str(&content)
        .with_context(|| format!("Falha ao interpretar o arquivo de configuração: {}", path.display()))?;

    if config.host.trim().is_empty() {
        anyhow::bail!("host não pode ser vazio");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "localhost:9002");
        assert_eq!(config.model, "en_core_web_sm");
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 8080\nconstituents = false").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.constituents);
        assert!(config.coreferences);
        assert_eq!(config.host, "localhost");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Falha ao interpretar"));
    }

    #[test]
    fn test_empty_host_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"\"").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
