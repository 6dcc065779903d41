//! 配置管理模块
//!
//! 负责应用程序配置的加载、保存和校验

use std::fs;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::types::CountdownSettings;

/// 覆盖配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "AUTO_HIBERNATE_CONFIG";

/// 配置相关错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法获取配置目录")]
    NoConfigDir,
    #[error("配置文件读写失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("配置序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 应用程序配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 倒计时设置
    pub countdown: CountdownSettings,
    /// 休眠设置
    pub hibernate: HibernateSettings,
    /// 界面设置
    pub ui: UISettings,
    /// 日志设置
    pub logging: LoggingSettings,
}

/// 休眠相关设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HibernateSettings {
    /// 演练模式：不真正调用休眠命令
    pub dry_run: bool,
}

/// 界面设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UISettings {
    /// 窗口置顶
    pub always_on_top: bool,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for UISettings {
    fn default() -> Self {
        Self {
            always_on_top: true,
            window_width: 310.0,
            window_height: 180.0,
        }
    }
}

/// 日志设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: String,
    /// 是否写入日志文件
    pub file_logging: bool,
    /// 日志文件保留天数
    pub keep_days: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            keep_days: 7,
        }
    }
}

impl AppConfig {
    /// 把不合法的值替换为默认值
    ///
    /// 返回被修正的字段名称
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let mut fixed = Vec::new();

        if self.countdown.duration_seconds == 0 {
            self.countdown.duration_seconds = CountdownSettings::DEFAULT_DURATION_SECONDS;
            fixed.push("countdown.duration_seconds");
        }
        if self.countdown.tick_rate_hz == 0 || self.countdown.tick_rate_hz > 1000 {
            self.countdown.tick_rate_hz = CountdownSettings::DEFAULT_TICK_RATE_HZ;
            fixed.push("countdown.tick_rate_hz");
        }

        let ui_default = UISettings::default();
        if !(self.ui.window_width > 0.0 && self.ui.window_width <= 10000.0) {
            self.ui.window_width = ui_default.window_width;
            fixed.push("ui.window_width");
        }
        if !(self.ui.window_height > 0.0 && self.ui.window_height <= 10000.0) {
            self.ui.window_height = ui_default.window_height;
            fixed.push("ui.window_height");
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace", "off"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            self.logging.level = LoggingSettings::default().level;
            fixed.push("logging.level");
        }
        if self.logging.keep_days == 0 {
            self.logging.keep_days = LoggingSettings::default().keep_days;
            fixed.push("logging.keep_days");
        }

        fixed
    }
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置文件路径
    config_path: PathBuf,
    /// 当前配置
    config: AppConfig,
    /// 加载时被修正为默认值的字段
    adjusted_fields: Vec<String>,
}

impl ConfigManager {
    /// 从默认位置加载配置
    ///
    /// 环境变量 `AUTO_HIBERNATE_CONFIG` 可以指定其他路径
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => PathBuf::from(path),
            None => Self::default_config_path()?,
        };
        Self::with_path(config_path)
    }

    /// 从指定路径加载配置
    pub fn with_path(config_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = config_path.into();
        let (mut config, mut adjusted_fields) = Self::load_config(&config_path)?;
        adjusted_fields.extend(config.sanitize().into_iter().map(String::from));

        Ok(Self {
            config_path,
            config,
            adjusted_fields,
        })
    }

    /// 默认配置文件路径
    fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("AutoHibernate").join("config.json"))
    }

    /// 加载配置文件，返回配置和被丢弃的字段
    ///
    /// 文件不存在时写入默认配置；不是合法的JSON对象时备份原文件并使用默认配置。
    /// 单个字段类型或取值错误只影响该字段。
    fn load_config(path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
        if !path.exists() {
            info!("配置文件不存在，使用默认配置: {:?}", path);
            let default_config = AppConfig::default();
            Self::save_config_to_file(&default_config, path)?;
            return Ok((default_config, Vec::new()));
        }

        info!("加载配置文件: {:?}", path);
        let content = fs::read_to_string(path)?;

        let sections = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(sections)) => sections,
            Ok(_) => return Self::replace_malformed(path, "顶层不是对象"),
            Err(e) => return Self::replace_malformed(path, &e.to_string()),
        };

        let (config, rejected) = Self::merge_fields(sections)?;
        info!("配置文件加载成功");
        Ok((config, rejected))
    }

    /// 逐个字段叠加到默认配置上，无法解析的字段保留默认值
    fn merge_fields(sections: Map<String, Value>) -> Result<(AppConfig, Vec<String>), ConfigError> {
        let mut merged = serde_json::to_value(AppConfig::default())?;
        let mut rejected = Vec::new();

        for (section, fields) in sections {
            if merged.get(&section).is_none() {
                continue;
            }
            let Value::Object(fields) = fields else {
                rejected.push(section);
                continue;
            };

            for (field, value) in fields {
                let mut candidate = merged.clone();
                candidate[section.as_str()][field.as_str()] = value;
                if serde_json::from_value::<AppConfig>(candidate.clone()).is_ok() {
                    merged = candidate;
                } else {
                    rejected.push(format!("{}.{}", section, field));
                }
            }
        }

        Ok((serde_json::from_value(merged)?, rejected))
    }

    /// 备份无法解析的配置文件并写入默认配置
    fn replace_malformed(path: &Path, reason: &str) -> Result<(AppConfig, Vec<String>), ConfigError> {
        warn!("配置文件格式错误: {}, 使用默认配置", reason);

        let backup_path = path.with_extension("json.backup");
        if let Err(backup_err) = fs::copy(path, &backup_path) {
            warn!("备份损坏的配置文件失败: {}", backup_err);
        }

        let default_config = AppConfig::default();
        Self::save_config_to_file(&default_config, path)?;
        Ok((default_config, Vec::new()))
    }

    /// 保存配置到文件
    fn save_config_to_file(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("创建配置目录: {:?}", parent);
            }
        }
        fs::write(path, serde_json::to_string_pretty(config)?)?;
        info!("配置文件保存成功: {:?}", path);
        Ok(())
    }

    /// 获取当前配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取配置文件路径
    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    /// 记录加载时被修正的字段
    ///
    /// 配置先于日志系统加载，因此由调用方在日志初始化之后调用
    pub fn report_adjustments(&self) {
        for field in self.adjusted_fields() {
            warn!("配置项 {} 无效，已使用默认值", field);
        }
    }

    pub fn adjusted_fields(&self) -> &[String] {
        &self.adjusted_fields
    }

    /// 取出配置
    pub fn into_config(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.countdown.duration_seconds, 10);
        assert_eq!(config.countdown.tick_rate_hz, 20);
        assert!(!config.countdown.show_decimal_seconds);
        assert!(!config.hibernate.dry_run);
        assert!(config.ui.always_on_top);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let manager = ConfigManager::with_path(&path).unwrap();
        assert_eq!(manager.get_config(), &AppConfig::default());
        assert!(path.exists());
        assert_eq!(manager.get_config_path(), path.as_path());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "countdown": { "duration_seconds": 30 }, "hibernate": { "dry_run": true } }"#).unwrap();

        let config = ConfigManager::with_path(&path).unwrap().into_config();
        assert_eq!(config.countdown.duration_seconds, 30);
        assert_eq!(config.countdown.tick_rate_hz, 20);
        assert!(config.hibernate.dry_run);
        assert_eq!(config.ui, UISettings::default());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "countdown": { "duration_seconds": 0, "tick_rate_hz": 0, "show_decimal_seconds": true }, "logging": { "level": "loud" } }"#,
        )
        .unwrap();

        let manager = ConfigManager::with_path(&path).unwrap();
        assert_eq!(
            manager.adjusted_fields(),
            &["countdown.duration_seconds", "countdown.tick_rate_hz", "logging.level"]
        );
        let config = manager.into_config();
        assert_eq!(config.countdown.duration_seconds, 10);
        assert_eq!(config.countdown.tick_rate_hz, 20);
        assert!(config.countdown.show_decimal_seconds);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_field_keeps_valid_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"countdown":{"duration_seconds":-5,"tick_rate_hz":60,"show_decimal_seconds":true}}"#,
        )
        .unwrap();

        let manager = ConfigManager::with_path(&path).unwrap();
        assert_eq!(manager.adjusted_fields(), &["countdown.duration_seconds"]);

        let config = manager.into_config();
        assert_eq!(config.countdown.duration_seconds, 10);
        assert_eq!(config.countdown.tick_rate_hz, 60);
        assert!(config.countdown.show_decimal_seconds);
        assert!(!dir.path().join("config.json.backup").exists());
    }

    #[test]
    fn test_wrong_types_fall_back_per_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "countdown": { "duration_seconds": "ten", "tick_rate_hz": 30 }, "ui": 5, "hibernate": { "dry_run": true }, "extra": {} }"#,
        )
        .unwrap();

        let manager = ConfigManager::with_path(&path).unwrap();
        assert_eq!(manager.adjusted_fields(), &["countdown.duration_seconds", "ui"]);

        let config = manager.into_config();
        assert_eq!(config.countdown.duration_seconds, 10);
        assert_eq!(config.countdown.tick_rate_hz, 30);
        assert!(config.hibernate.dry_run);
        assert_eq!(config.ui, UISettings::default());
    }

    #[test]
    fn test_malformed_file_is_backed_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "countdown": { "duration_seconds": 30 "#).unwrap();

        let config = ConfigManager::with_path(&path).unwrap().into_config();
        assert_eq!(config, AppConfig::default());
        assert!(dir.path().join("config.json.backup").exists());

        let rewritten: AppConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, AppConfig::default());
    }

    #[test]
    fn test_sanitize_reports_fields() {
        let mut config = AppConfig::default();
        config.ui.window_width = -1.0;
        config.logging.keep_days = 0;

        let fixed = config.sanitize();
        assert_eq!(fixed, vec!["ui.window_width", "logging.keep_days"]);
        assert_eq!(config.ui.window_width, 310.0);
        assert!(AppConfig::default().sanitize().is_empty());
    }
}
