//! 关键词片段定位。
//!
//! 给定关键词，在曲目中找出包含它的歌词行，供词云点击后展示。

use std::{collections::HashSet, ops::Range};

use serde::Serialize;

use crate::{
    model::CanonicalTrack,
    utils::{fold_case, fold_char},
};

/// 每首曲目最多贡献的片段数。
pub const DEFAULT_PER_TRACK_CAP: usize = 2;

/// 一条匹配的歌词行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    /// 去除首尾空白后的歌词行。
    pub line: String,
    /// 所属曲目的标题。
    pub title: String,
    /// 所属曲目的 ID。
    pub track_id: String,
}

/// 以匹配行为中心、前后各一行的上下文窗口。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    /// 窗口第一行的行号（从 0 开始）。
    pub start: usize,
    /// 窗口最后一行的行号（包含）。
    pub end: usize,
    /// 匹配行的行号。
    pub match_line: usize,
    /// 窗口内的歌词行。
    pub lines: Vec<String>,
}

/// 在所有曲目中定位包含 `term` 的歌词行，每首曲目最多 2 行。
pub fn locate_snippets(tracks: &[CanonicalTrack], term: &str, limit: usize) -> Vec<Snippet> {
    locate_snippets_with_cap(tracks, term, limit, DEFAULT_PER_TRACK_CAP)
}

/// 在所有曲目中定位包含 `term` 的歌词行。
///
/// 按曲目顺序、行顺序扫描；忽略大小写匹配；相同的行（去除首尾空白后）只返回一次；
/// 每首曲目最多 `per_track_cap` 行；总数达到 `limit` 时立即停止。
pub fn locate_snippets_with_cap(
    tracks: &[CanonicalTrack],
    term: &str,
    limit: usize,
    per_track_cap: usize,
) -> Vec<Snippet> {
    let needle = fold_case(term.trim());
    let mut snippets = Vec::new();
    if needle.is_empty() || limit == 0 || per_track_cap == 0 {
        return snippets;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    'tracks: for track in tracks {
        let mut taken = 0;
        for line in track.lyric_lines().map(str::trim) {
            if line.is_empty() || !fold_case(line).contains(&needle) {
                continue;
            }
            if !seen.insert(line) {
                continue;
            }
            snippets.push(Snippet {
                line: line.to_string(),
                title: track.title.clone(),
                track_id: track.id.clone(),
            });
            if snippets.len() >= limit {
                break 'tracks;
            }
            taken += 1;
            if taken >= per_track_cap {
                break;
            }
        }
    }
    snippets
}

/// 为一首曲目中前 `max_matches` 个匹配行生成上下文窗口，窗口按 (起, 止) 去重。
pub fn context_windows(
    track: &CanonicalTrack,
    term: &str,
    max_matches: usize,
) -> Vec<ContextWindow> {
    let needle = fold_case(term.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = track.lyric_lines().collect();
    let last = lines.len().saturating_sub(1);
    let mut seen = HashSet::new();

    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && fold_case(line).contains(&needle))
        .take(max_matches)
        .filter_map(|(i, _)| {
            let start = i.saturating_sub(1);
            let end = (i + 1).min(last);
            seen.insert((start, end)).then(|| ContextWindow {
                start,
                end,
                match_line: i,
                lines: lines[start..=end].iter().map(|l| (*l).to_string()).collect(),
            })
        })
        .collect()
}

/// 返回 `line` 中所有与 `term` 忽略大小写匹配的字节范围，用于高亮。
pub fn highlight_ranges(line: &str, term: &str) -> Vec<Range<usize>> {
    let needle: Vec<char> = fold_case(term.trim()).chars().collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let chars: Vec<(usize, char)> = line.char_indices().map(|(i, c)| (i, fold_char(c))).collect();
    let mut ranges = Vec::new();
    let mut i = 0;
    while i + needle.len() <= chars.len() {
        let window = &chars[i..i + needle.len()];
        if window.iter().map(|&(_, c)| c).eq(needle.iter().copied()) {
            let end = chars.get(i + needle.len()).map_or(line.len(), |&(b, _)| b);
            ranges.push(chars[i].0..end);
            i += needle.len();
        } else {
            i += 1;
        }
    }
    ranges
}
