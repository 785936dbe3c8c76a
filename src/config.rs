//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::search::TableKind;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    pub server: ServerConfig,
    /// Data source configuration / 数据源配置
    pub data: DataConfig,
    /// Search configuration / 搜索配置
    pub search: SearchConfig,
    /// Language model configuration / 大模型配置
    pub llm: LlmConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Data source configuration / 数据源配置
///
/// The four tables live side by side in `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub data_dir: String,
    pub project_file: String,
    pub address_file: String,
    pub configuration_file: String,
    pub variant_file: String,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum properties returned per response / 每次返回的最大房源数
    pub max_results: usize,
}

/// Language model configuration / 大模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base, without the trailing `/chat/completions`
    pub api_base: String,
    /// API key; empty means read from `GROQ_API_KEY` / 为空时读取环境变量
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            project_file: "project.csv".to_string(),
            address_file: "ProjectAddress.csv".to_string(),
            configuration_file: "ProjectConfiguration.csv".to_string(),
            variant_file: "ProjectConfigurationVariant.csv".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: 10 }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key: String::new(),
            model: "llama-3.1-8b-instant".to_string(),
            timeout_secs: 30,
        }
    }
}

impl DataConfig {
    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// File name configured for a table / 获取表对应的文件名
    pub fn file_name(&self, kind: TableKind) -> &str {
        match kind {
            TableKind::Project => &self.project_file,
            TableKind::ProjectAddress => &self.address_file,
            TableKind::ProjectConfiguration => &self.configuration_file,
            TableKind::ProjectConfigurationVariant => &self.variant_file,
        }
    }

    /// Full path of a table source / 获取表文件完整路径
    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        self.get_data_dir().join(self.file_name(kind))
    }
}

impl LlmConfig {
    /// Resolve the API key, falling back to the environment / 解析API密钥
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var("GROQ_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply environment overrides / 应用环境变量覆盖
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data.data_dir = dir;
            }
        }
        self
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists
/// 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path / 从指定路径加载配置
pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config_to(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_paths() {
        let config = AppConfig::default();
        assert_eq!(
            config.data.table_path(TableKind::Project),
            PathBuf::from("data").join("project.csv")
        );
        assert_eq!(
            config.data.table_path(TableKind::ProjectConfigurationVariant),
            PathBuf::from("data").join("ProjectConfigurationVariant.csv")
        );
        assert_eq!(config.get_bind_address(), "0.0.0.0:3000");
        assert_eq!(config.search.max_results, 10);
    }

    #[test]
    fn test_load_creates_default_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = load_config_from(&path).unwrap();
        assert!(path.exists());

        let mut edited = created.clone();
        edited.search.max_results = 25;
        edited.llm.model = "other-model".to_string();
        save_config_to(&edited, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.search.max_results, 25);
        assert_eq!(loaded.llm.model, "other-model");
        assert_eq!(loaded.data.address_file, "ProjectAddress.csv");
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_configured_api_key_wins() {
        let llm = LlmConfig {
            api_key: "  abc  ".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(llm.resolve_api_key().as_deref(), Some("abc"));
    }
}
