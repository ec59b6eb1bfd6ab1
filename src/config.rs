use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 外部命令超时秒数。不设置则不限时，挂起的命令会一直阻塞。
    pub command_timeout_secs: Option<u64>,
    /// 升级检查快照的保存目录
    pub report_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_timeout_secs: None,
            report_dir: home_dir().join(".lian").join("winget"),
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let config_path = config_dir().join("lian-winget").join("config.toml");

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

/// Windows 上取 USERPROFILE，保留 HOME 作为兜底
fn home_dir() -> PathBuf {
    std::env::var("USERPROFILE")
        .or_else(|_| std::env::var("HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// 配置目录：Windows 下 %APPDATA%，否则 ~/.config
fn config_dir() -> PathBuf {
    std::env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_timeout() {
        let config = Config::default();
        assert_eq!(config.command_timeout_secs, None);
        assert!(config.report_dir.ends_with(".lian/winget"));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("command_timeout_secs = 120\n").unwrap();
        assert_eq!(config.command_timeout_secs, Some(120));
        assert_eq!(config.report_dir, Config::default().report_dir);
    }
}
