#![warn(missing_docs)]

//! # Lyrics Archive RS
//!
//! 一个离线的歌词归档库：把歌手整理的歌词文档或结构化 JSON 导入为规范化的曲目记录，
//! 并基于这些记录生成词云统计和关键词片段。
//!
//! ## 主要功能
//!
//! - **文本规范化**: 解码 HTML 实体、统一换行、去除 BOM 和不换行空格。
//! - **曲目提取**: 从没有固定分隔符的自由文本中识别专辑行、标题、作词行和歌词正文。
//! - **校验与规范化**: 校验歌词包结构，补全默认值，计算稳定的曲目 ID。
//! - **词频统计**: 中文分词（或字二元组回退）后按频次排序，副歌重复只计一次。
//! - **片段定位**: 为词云中的词找出包含它的歌词行及上下文。
//!
//! ## 导入与统计
//!
//! ```rust
//! use lyrics_archive_rs::{LyricsArchive, TrackFilter};
//!
//! let mut archive = LyricsArchive::new();
//! let text = "《回声档案》2024 演示艺人\n\n【雾灯之外】\n作词：示例词作者\n我们在雾灯之外等待黎明";
//! archive.import_text(text, "回声档案.txt").unwrap();
//!
//! let cloud = archive.word_cloud(&TrackFilter::default()).unwrap();
//! for token in &cloud.tokens {
//!     println!("{} × {}", token.token, token.count);
//! }
//!
//! let snippets = archive.snippets("雾灯").unwrap();
//! assert_eq!(snippets[0].title, "雾灯之外");
//! ```
pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod store;
pub mod utils;

use std::collections::{BTreeMap, HashMap};

use tracing::{info, warn};

pub use crate::{
    analysis::{CloudResult, ContextWindow, FrequencyToken, Snippet, StatisticsEngine, TrackFilter},
    config::ArchiveConfig,
    error::{ArchiveError, Result},
    ingest::{ConvertedDocument, DocumentConverter, ImportFormat, ImportOptions},
    model::{CanonicalTrack, NormalizedPackage, RawPackage, SchemaVersion},
    store::{MemoryTrackStore, SearchIndex, SubstringIndex, TrackStore},
};

use crate::analysis::snippets::{context_windows, locate_snippets_with_cap};

/// 导出歌词包时写入的版本标记。
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// 上下文视图中每首曲目最多展示的匹配数。
const CONTEXT_MATCH_LIMIT: usize = 3;

// ==========================================================
//  顶层 API
// ==========================================================

/// 顶层歌词归档，串联导入、存储、检索与分析，为用户提供统一、简单的接口。
///
/// 这是与本库交互的主要入口点。存储和检索索引都可以替换为外部实现。
pub struct LyricsArchive<S: TrackStore = MemoryTrackStore, I: SearchIndex = SubstringIndex> {
    store: S,
    index: I,
    engine: StatisticsEngine,
    config: ArchiveConfig,
    converter: Option<Box<dyn DocumentConverter + Send + Sync>>,
}

impl Default for LyricsArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl LyricsArchive {
    /// 使用内存存储和默认配置创建一个空的归档。
    pub fn new() -> Self {
        Self::with_config(ArchiveConfig::default())
    }

    /// 使用内存存储和指定配置创建一个空的归档。
    pub fn with_config(config: ArchiveConfig) -> Self {
        Self::with_parts(MemoryTrackStore::new(), SubstringIndex::new(), config)
    }
}

impl<S: TrackStore, I: SearchIndex> LyricsArchive<S, I> {
    /// 使用外部提供的存储和索引创建归档。
    ///
    /// 索引会根据存储中已有的曲目重建。
    pub fn with_parts(store: S, mut index: I, config: ArchiveConfig) -> Self {
        let engine = if config.statistics.word_segmentation {
            StatisticsEngine::new()
        } else {
            StatisticsEngine::bigram_only()
        };

        index.clear();
        match store.all() {
            Ok(existing) => index.add(&existing),
            Err(e) => warn!("读取已有曲目失败，索引将从空开始: {}", e),
        }

        Self {
            store,
            index,
            engine,
            config,
            converter: None,
        }
    }

    /// 设置用于 `.docx` 等文档的外部转换器。
    pub fn set_document_converter(&mut self, converter: Box<dyn DocumentConverter + Send + Sync>) {
        self.converter = Some(converter);
    }

    /// 当前配置。
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// 底层存储。
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 导入一个 JSON 歌词包，返回写入的曲目数。
    pub fn import_json_str(&mut self, json: &str) -> Result<usize> {
        let package = ingest::package_from_json(json)?;
        self.commit(package)
    }

    /// 导入一段纯文本，返回写入的曲目数。所有曲目都会标记 `source_file`。
    pub fn import_text(&mut self, text: &str, source_file: &str) -> Result<usize> {
        let package = ingest::package_from_text(text, source_file, &self.import_options())?;
        self.commit(package)
    }

    /// 按文件扩展名导入文件内容，返回写入的曲目数。
    pub fn import_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<usize> {
        let converter = self
            .converter
            .as_deref()
            .map(|c| c as &dyn DocumentConverter);
        let package =
            ingest::package_from_file(file_name, bytes, converter, &self.import_options())?;
        self.commit(package)
    }

    /// 删除所有来自指定文件的曲目，返回删除的数量。
    pub fn remove_source(&mut self, source_file: &str) -> Result<usize> {
        let ids: Vec<String> = self
            .store
            .all()?
            .into_iter()
            .filter(|t| t.source_file.as_deref() == Some(source_file))
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let removed = self.store.delete_many(&ids)?;
        self.index.remove(&ids);
        info!("已删除来自 '{}' 的 {} 首曲目。", source_file, removed);
        Ok(removed)
    }

    /// 清空归档。
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.index.clear();
        info!("归档已清空。");
        Ok(())
    }

    /// 所有曲目。
    pub fn tracks(&self) -> Result<Vec<CanonicalTrack>> {
        self.store.all()
    }

    /// 全文检索，按索引返回的顺序给出曲目。
    pub fn search(&self, query: &str) -> Result<Vec<CanonicalTrack>> {
        let ids = self.index.search(query);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut by_id: HashMap<String, CanonicalTrack> = self
            .store
            .all()?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// 根据筛选条件生成词云。筛选结果为空时退回统计全部曲目。
    pub fn word_cloud(&self, filter: &TrackFilter) -> Result<CloudResult> {
        let tracks = self.store.all()?;
        let stats = &self.config.statistics;
        Ok(self
            .engine
            .statistics_with_fallback(&tracks, filter, stats.limit, stats.include_single))
    }

    /// 在全部曲目中定位包含关键词的歌词行。
    pub fn snippets(&self, term: &str) -> Result<Vec<Snippet>> {
        let tracks = self.store.all()?;
        let cfg = &self.config.snippets;
        Ok(locate_snippets_with_cap(
            &tracks,
            term,
            cfg.limit,
            cfg.per_track_cap,
        ))
    }

    /// 为指定曲目生成关键词的上下文窗口。曲目不存在时返回空列表。
    pub fn context(&self, track_id: &str, term: &str) -> Result<Vec<ContextWindow>> {
        Ok(self
            .store
            .all()?
            .iter()
            .find(|t| t.id == track_id)
            .map(|track| context_windows(track, term, CONTEXT_MATCH_LIMIT))
            .unwrap_or_default())
    }

    /// 按歌手分组导出所有曲目。导出的条目带有 ID，重新导入时会覆盖原记录。
    pub fn export_packages(&self) -> Result<Vec<RawPackage>> {
        let mut grouped: BTreeMap<String, Vec<CanonicalTrack>> = BTreeMap::new();
        for track in self.store.all()? {
            grouped.entry(track.artist.clone()).or_default().push(track);
        }

        Ok(grouped
            .into_iter()
            .map(|(artist, tracks)| RawPackage {
                schema_version: Some(SchemaVersion::Number(EXPORT_SCHEMA_VERSION.into())),
                artist,
                tracks: tracks.iter().map(CanonicalTrack::to_raw).collect(),
            })
            .collect())
    }

    fn import_options(&self) -> ImportOptions {
        ImportOptions {
            default_artist: self.config.import.default_artist.clone(),
        }
    }

    fn commit(&mut self, package: NormalizedPackage) -> Result<usize> {
        let count = package.tracks.len();
        self.store.upsert_many(package.tracks.clone())?;
        self.index.add(&package.tracks);
        info!("已为歌手 '{}' 写入 {} 首曲目。", package.artist, count);
        Ok(count)
    }
}
