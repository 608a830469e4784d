//! 负责处理应用的持久化配置。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ArchiveError, Result};

const CONFIG_FILE_NAME: &str = "config.json";

/// 词云统计的配置项。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct StatisticsConfig {
    /// 最多输出的词数。
    pub limit: usize,
    /// 是否保留单字词。
    pub include_single: bool,
    /// 是否使用词典分词。关闭时只使用字二元组。
    pub word_segmentation: bool,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            limit: 120,
            include_single: false,
            word_segmentation: true,
        }
    }
}

/// 片段定位的配置项。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SnippetConfig {
    /// 最多返回的片段数。
    pub limit: usize,
    /// 每首曲目最多贡献的片段数。
    pub per_track_cap: usize,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            limit: 8,
            per_track_cap: crate::analysis::snippets::DEFAULT_PER_TRACK_CAP,
        }
    }
}

/// 导入的配置项。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportConfig {
    /// 文本中找不到歌手行时使用的歌手名。
    pub default_artist: Option<String>,
}

/// 归档的全部配置。缺失的字段使用默认值。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ArchiveConfig {
    /// 词云统计。
    pub statistics: StatisticsConfig,
    /// 片段定位。
    pub snippets: SnippetConfig,
    /// 导入。
    pub import: ImportConfig,
}

/// 获取应用配置目录下指定文件的完整路径。
///
/// # 参数
/// * `filename` - 目标配置文件的名称，例如 "config.json"。
pub(crate) fn get_config_file_path(filename: &str) -> Result<PathBuf> {
    if let Some(mut config_dir) = dirs::config_dir() {
        config_dir.push("lyrics-archive");
        fs::create_dir_all(&config_dir)?;
        config_dir.push(filename);
        Ok(config_dir)
    } else {
        Err(ArchiveError::Config("无法找到用户配置目录".to_string()))
    }
}

/// 从用户配置目录加载配置。文件不存在时返回默认配置。
pub fn load_config() -> Result<ArchiveConfig> {
    let config_path = get_config_file_path(CONFIG_FILE_NAME)?;
    load_config_from(&config_path)
}

/// 从指定文件加载配置。文件不存在时返回默认配置。
pub fn load_config_from(path: &Path) -> Result<ArchiveConfig> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let config: ArchiveConfig = serde_json::from_str(&content)
                .map_err(|e| ArchiveError::Config(format!("配置文件 {path:?} 格式错误: {e}")))?;
            info!("已从 {:?} 加载配置。", path);
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("配置文件不存在，使用默认配置。");
            Ok(ArchiveConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// 将配置保存到用户配置目录。
pub fn save_config(config: &ArchiveConfig) -> Result<()> {
    let config_path = get_config_file_path(CONFIG_FILE_NAME)?;
    save_config_to(config, &config_path)
}

/// 将配置序列化为 JSON 并保存到指定文件。
pub fn save_config_to(config: &ArchiveConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    info!("配置已保存到 {:?}。", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config, ArchiveConfig::default());
        assert_eq!(config.statistics.limit, 120);
        assert_eq!(config.snippets.limit, 8);
        assert_eq!(config.snippets.per_track_cap, 2);
        assert!(config.statistics.word_segmentation);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "statistics": { "includeSingle": true } }"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert!(config.statistics.include_single);
        assert_eq!(config.statistics.limit, 120, "缺失的字段应使用默认值");
        assert_eq!(config.import.default_artist, None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = ArchiveConfig::default();
        config.import.default_artist = Some("示例歌手".to_string());
        config.snippets.limit = 3;

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_from(&path), Err(ArchiveError::Config(_))));
    }
}
