//! 词频统计引擎。
//!
//! 为词云生成按频次降序排列的词表。每首歌内的重复行只计一次，
//! 避免副歌的反复出现主导排名。

use std::{collections::HashMap, sync::Arc};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    analysis::{
        segmenter::{JiebaSegmenter, WordSegmenter},
        stopwords::{is_stop_char, is_stop_word},
    },
    model::CanonicalTrack,
    utils::{dedup_preserving_order, grapheme_len, is_cjk_ideograph},
};

/// 一个词及其出现次数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyToken {
    /// 词。
    pub token: String,
    /// 出现次数。
    pub count: usize,
}

/// 词云统计的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloudResult {
    /// 排好序的词表。
    pub tokens: Vec<FrequencyToken>,
    /// 是否因为筛选结果为空而退回到了全部曲目。
    pub fell_back: bool,
}

/// 曲目筛选条件，所有已设置的条件都必须满足。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFilter {
    /// 专辑名。
    pub album: Option<String>,
    /// 年份文本。
    pub year_text: Option<String>,
    /// 作词者之一。
    pub lyricist: Option<String>,
}

impl TrackFilter {
    /// 是否没有设置任何条件。
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.album.is_none() && self.year_text.is_none() && self.lyricist.is_none()
    }

    /// 判断曲目是否满足条件。
    #[must_use]
    pub fn matches(&self, track: &CanonicalTrack) -> bool {
        self.album.as_ref().is_none_or(|a| &track.album == a)
            && self.year_text.as_ref().is_none_or(|y| &track.year_text == y)
            && self
                .lyricist
                .as_ref()
                .is_none_or(|l| track.lyricists.iter().any(|name| name == l))
    }
}

/// 词频统计引擎。分词策略在构造时确定一次。
#[derive(Clone)]
pub struct StatisticsEngine {
    segmenter: Option<Arc<dyn WordSegmenter>>,
}

impl std::fmt::Debug for StatisticsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsEngine")
            .field("word_segmentation", &self.segmenter.is_some())
            .finish()
    }
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsEngine {
    /// 使用 Jieba 分词的引擎。
    pub fn new() -> Self {
        Self::with_segmenter(Arc::new(JiebaSegmenter::new()))
    }

    /// 使用自定义分词器的引擎。
    pub fn with_segmenter(segmenter: Arc<dyn WordSegmenter>) -> Self {
        Self {
            segmenter: Some(segmenter),
        }
    }

    /// 只使用字二元组的引擎。
    pub fn bigram_only() -> Self {
        Self { segmenter: None }
    }

    /// 统计一组曲目的词频。
    ///
    /// 结果按次数降序排列，次数相同的词保持首次出现的顺序，最多 `limit` 个。
    pub fn build_statistics(
        &self,
        tracks: &[CanonicalTrack],
        limit: usize,
        include_single: bool,
    ) -> Vec<FrequencyToken> {
        let per_track: Vec<Vec<String>> = tracks
            .par_iter()
            .map(|track| self.tokenize_track(track, include_single))
            .collect();

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut ranked: Vec<FrequencyToken> = Vec::new();
        for token in per_track.into_iter().flatten() {
            match index.get(&token) {
                Some(&i) => ranked[i].count += 1,
                None => {
                    index.insert(token.clone(), ranked.len());
                    ranked.push(FrequencyToken { token, count: 1 });
                }
            }
        }

        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(limit);
        debug!(
            "统计了 {} 首曲目，输出 {} 个词。",
            tracks.len(),
            ranked.len()
        );
        ranked
    }

    /// 对筛选后的曲目统计；若筛选结果为空而全部曲目不为空，则退回统计全部曲目。
    pub fn statistics_with_fallback(
        &self,
        tracks: &[CanonicalTrack],
        filter: &TrackFilter,
        limit: usize,
        include_single: bool,
    ) -> CloudResult {
        let subset: Vec<CanonicalTrack> = tracks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        let tokens = self.build_statistics(&subset, limit, include_single);
        if !tokens.is_empty() || tracks.is_empty() || filter.is_empty() {
            return CloudResult {
                tokens,
                fell_back: false,
            };
        }

        info!("筛选后的曲目没有可统计的词，退回到全部曲目。");
        CloudResult {
            tokens: self.build_statistics(tracks, limit, include_single),
            fell_back: true,
        }
    }

    fn tokenize_track(&self, track: &CanonicalTrack, include_single: bool) -> Vec<String> {
        let text = unique_lines(&track.lyrics).join("\n");

        if let Some(segmenter) = &self.segmenter {
            let words: Vec<String> = segmenter
                .segment(&text)
                .into_iter()
                .map(str::trim)
                .filter(|w| keep_word(w, include_single))
                .map(str::to_string)
                .collect();
            if !words.is_empty() {
                return words;
            }
        }
        bigrams(&text)
    }
}

/// 去除首尾空白后按首次出现的顺序去重，空行被丢弃。
pub fn unique_lines(lyrics: &str) -> Vec<&str> {
    dedup_preserving_order(lyrics.lines().map(str::trim).filter(|l| !l.is_empty()))
}

fn keep_word(word: &str, include_single: bool) -> bool {
    if !word.chars().any(is_cjk_ideograph) {
        return false;
    }
    if word.chars().all(|c| !c.is_alphanumeric()) {
        return false;
    }
    if is_stop_word(word) {
        return false;
    }
    let len = grapheme_len(word);
    if len == 1 && word.chars().next().is_some_and(is_stop_char) {
        return false;
    }
    include_single || len >= 2
}

/// 字二元组回退：去掉空白后，相邻两个都是汉字且都不是停用字时组成一个词。
pub fn bigrams(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    chars
        .windows(2)
        .filter(|pair| {
            pair.iter()
                .all(|&c| is_cjk_ideograph(c) && !is_stop_char(c))
        })
        .map(|pair| pair.iter().collect::<String>())
        .filter(|token| !is_stop_word(token))
        .collect()
}
