//! 全文检索的协作者接口与一个简单的子串索引。

use std::collections::BTreeMap;

use crate::{model::CanonicalTrack, utils::fold_case};

/// 全文检索索引。
pub trait SearchIndex {
    /// 加入或更新曲目。
    fn add(&mut self, tracks: &[CanonicalTrack]);

    /// 移除指定 ID 的曲目。
    fn remove(&mut self, ids: &[String]);

    /// 清空索引。
    fn clear(&mut self);

    /// 查询，返回命中曲目的 ID。
    fn search(&self, query: &str) -> Vec<String>;
}

/// 忽略大小写的子串索引：查询中所有以空白分隔的词都必须出现在
/// 标题、专辑、作词者或歌词之一中。
#[derive(Debug, Clone, Default)]
pub struct SubstringIndex {
    documents: BTreeMap<String, String>,
}

impl SubstringIndex {
    /// 创建一个空索引。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchIndex for SubstringIndex {
    fn add(&mut self, tracks: &[CanonicalTrack]) {
        for track in tracks {
            let document = [
                track.title.as_str(),
                track.album.as_str(),
                &track.lyricists.join(" "),
                track.lyrics.as_str(),
            ]
            .join("\n");
            self.documents.insert(track.id.clone(), fold_case(&document));
        }
    }

    fn remove(&mut self, ids: &[String]) {
        for id in ids {
            self.documents.remove(id);
        }
    }

    fn clear(&mut self) {
        self.documents.clear();
    }

    fn search(&self, query: &str) -> Vec<String> {
        let terms: Vec<String> = query.split_whitespace().map(fold_case).collect();
        if terms.is_empty() {
            return Vec::new();
        }
        self.documents
            .iter()
            .filter(|(_, doc)| terms.iter().all(|t| doc.contains(t.as_str())))
            .map(|(id, _)| id.clone())
            .collect()
    }
}
