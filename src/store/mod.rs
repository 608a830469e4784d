//! 存储与检索的协作者接口。
//!
//! 真正的持久化引擎和全文索引由外部提供；这里定义它们需要满足的约定，
//! 并给出内存实现，供归档门面和测试使用。

pub mod search;

use std::{collections::BTreeMap, fs, path::Path};

use tracing::{debug, info};

use crate::{error::Result, model::CanonicalTrack};

pub use search::{SearchIndex, SubstringIndex};

/// 以 ID 为键的有序曲目存储。
pub trait TrackStore {
    /// 按 ID 顺序返回所有曲目。
    fn all(&self) -> Result<Vec<CanonicalTrack>>;

    /// 写入多首曲目，已存在的 ID 会被覆盖。
    fn upsert_many(&mut self, tracks: Vec<CanonicalTrack>) -> Result<()>;

    /// 删除指定 ID 的曲目，返回实际删除的数量。
    fn delete_many(&mut self, ids: &[String]) -> Result<usize>;

    /// 清空所有曲目。
    fn clear(&mut self) -> Result<()>;
}

/// 基于 `BTreeMap` 的内存存储。
#[derive(Debug, Clone, Default)]
pub struct MemoryTrackStore {
    tracks: BTreeMap<String, CanonicalTrack>,
}

impl MemoryTrackStore {
    /// 创建一个空的存储。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前曲目数量。
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// 是否为空。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// 从 JSON 快照文件加载。
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let tracks: Vec<CanonicalTrack> = serde_json::from_str(&content)?;
        info!("已从 {:?} 加载 {} 首曲目。", path, tracks.len());
        Ok(Self {
            tracks: tracks.into_iter().map(|t| (t.id.clone(), t)).collect(),
        })
    }

    /// 将所有曲目保存为 JSON 快照文件。
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let tracks: Vec<&CanonicalTrack> = self.tracks.values().collect();
        fs::write(path, serde_json::to_string_pretty(&tracks)?)?;
        info!("已将 {} 首曲目保存到 {:?}。", tracks.len(), path);
        Ok(())
    }
}

impl TrackStore for MemoryTrackStore {
    fn all(&self) -> Result<Vec<CanonicalTrack>> {
        Ok(self.tracks.values().cloned().collect())
    }

    fn upsert_many(&mut self, tracks: Vec<CanonicalTrack>) -> Result<()> {
        for track in tracks {
            if self.tracks.insert(track.id.clone(), track).is_some() {
                debug!("覆盖了已存在的曲目。");
            }
        }
        Ok(())
    }

    fn delete_many(&mut self, ids: &[String]) -> Result<usize> {
        Ok(ids
            .iter()
            .filter(|id| self.tracks.remove(id.as_str()).is_some())
            .count())
    }

    fn clear(&mut self) -> Result<()> {
        self.tracks.clear();
        Ok(())
    }
}
