use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display(fmt = "读取配置文件失败: {}", _0)]
    Io(#[error(source)] std::io::Error),
    #[display(fmt = "解析配置文件失败: {}", _0)]
    Parse(#[error(source)] toml::de::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub thread: usize,
    pub log_level: String,
    pub log_format: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiConfig {
    /// e.g. `https://servicesbladi.ma/notifications/api`
    pub base_url: String,
    /// Raw `Cookie` header of the logged-in session, `csrftoken` included.
    #[serde(default)]
    pub cookie: String,
    #[serde(default)]
    pub form_token: Option<String>,
    #[serde(default)]
    pub meta_token: Option<String>,
    /// HTML page scanned for the hidden form field and the meta tag.
    #[serde(default)]
    pub page_file: Option<String>,
    pub connect_timeout: u64,
    pub whole_timeout: u64,
    pub pool_idle_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PanelConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    #[serde(default = "default_fade_out_millis")]
    pub fade_out_millis: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            fade_out_millis: default_fade_out_millis(),
            per_page: default_per_page(),
            snapshot_path: None,
        }
    }
}

fn default_user_agent() -> String {
    format!("servicesbladi-notifications/{}", env!("CARGO_PKG_VERSION"))
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_fade_out_millis() -> u64 {
    200
}

fn default_per_page() -> u32 {
    10
}

impl Config {
    pub fn new_from_file(file_path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file_path).map_err(ConfigError::Io)?;
        Self::new_from_str(&content)
    }

    pub fn new_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}
