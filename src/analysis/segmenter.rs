//! 分词策略。
//!
//! 有词典分词器时按词切分；没有时由统计引擎退回到字二元组。

use std::sync::LazyLock;

use jieba_rs::Jieba;
use tracing::info;

/// 全局 Jieba 分词器实例（延迟初始化）
static JIEBA: LazyLock<Jieba> = LazyLock::new(|| {
    info!("初始化 Jieba 分词器...");
    Jieba::new()
});

/// 把文本切分为最大的语言学词单元。
pub trait WordSegmenter: Send + Sync {
    /// 切分文本，返回的切片按原文顺序排列。
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// 基于 `jieba-rs` 的中文分词器，使用内置词典。
#[derive(Debug, Default, Clone, Copy)]
pub struct JiebaSegmenter;

impl JiebaSegmenter {
    /// 创建分词器。词典会在第一次切分时加载。
    pub fn new() -> Self {
        Self
    }
}

impl WordSegmenter for JiebaSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        JIEBA.cut(text, true)
    }
}
