//! 歌词包校验器与规范化器。
//!
//! 接收不可信的 JSON 值，按严格结构校验后补全默认值并计算稳定 ID。
//! 校验是全有或全无的：任何一首曲目不合法，整个包都会被拒绝。

use std::collections::HashSet;

use md5::{Digest, Md5};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{ArchiveError, Result},
    model::{
        CanonicalTrack, NormalizedPackage, RawPackage, RawTrack, YearValue,
        track::{UNARCHIVED_ALBUM, UNKNOWN_LYRICIST, UNKNOWN_YEAR},
    },
    utils::dedup_preserving_order,
};

/// 计算 ID 时各字段之间的分隔符（单元分隔符 U+001F）。
const ID_FIELD_SEPARATOR: char = '\u{1F}';

/// 将不可信的 JSON 值解析为 `RawPackage` 并做结构校验。
pub fn parse_package(value: &Value) -> Result<RawPackage> {
    if !value.is_object() {
        return Err(ArchiveError::schema("顶层必须是一个对象"));
    }
    if !value.get("tracks").is_some_and(Value::is_array) {
        return Err(ArchiveError::schema("缺少曲目列表 `tracks`"));
    }

    let package: RawPackage = serde_json::from_value(value.clone())
        .map_err(|e| ArchiveError::schema(e.to_string()))?;
    check_package(&package)?;
    Ok(package)
}

fn check_package(package: &RawPackage) -> Result<()> {
    if package.artist.trim().is_empty() {
        return Err(ArchiveError::schema("缺少歌手 `artist`"));
    }
    if package.tracks.is_empty() {
        return Err(ArchiveError::schema("曲目列表为空"));
    }
    for (index, track) in package.tracks.iter().enumerate() {
        if track.title.trim().is_empty() {
            return Err(ArchiveError::schema(format!("第 {} 首曲目缺少标题", index + 1)));
        }
        if track.lyrics.trim().is_empty() {
            return Err(ArchiveError::schema(format!(
                "曲目 '{}' 缺少歌词",
                track.title.trim()
            )));
        }
    }
    Ok(())
}

/// 校验并规范化一个不可信的 JSON 值。
pub fn canonicalize(value: &Value) -> Result<NormalizedPackage> {
    let package = parse_package(value)?;
    canonicalize_package(package)
}

/// 校验并规范化一个已反序列化的歌词包。
pub fn canonicalize_package(package: RawPackage) -> Result<NormalizedPackage> {
    check_package(&package)?;

    let artist = package.artist.trim().to_string();
    let mut seen_ids = HashSet::new();
    let mut tracks = Vec::with_capacity(package.tracks.len());

    for raw in package.tracks {
        let track = canonicalize_track(&artist, raw);
        if seen_ids.insert(track.id.clone()) {
            tracks.push(track);
        } else {
            debug!("包内重复的曲目 '{}' (ID {}) 已跳过。", track.title, track.id);
        }
    }

    Ok(NormalizedPackage {
        schema_version: package.schema_version,
        artist,
        tracks,
    })
}

fn canonicalize_track(artist: &str, raw: RawTrack) -> CanonicalTrack {
    let title = raw.title.trim().to_string();
    let album = raw
        .album
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNARCHIVED_ALBUM)
        .to_string();
    let (year, year_text) = parse_year(raw.year.as_ref());

    let mut lyricists = dedup_preserving_order(
        raw.lyricists
            .as_ref()
            .map(|v| v.split_names())
            .unwrap_or_default(),
    );
    if lyricists.is_empty() {
        lyricists.push(UNKNOWN_LYRICIST.to_string());
    }

    // 已有的 ID 原样保留，空字符串视为未提供
    let id = raw
        .id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| track_id(artist, &title, &album, &year_text));

    CanonicalTrack {
        id,
        title,
        album,
        artist: artist.to_string(),
        year,
        year_text,
        lyricists,
        lyrics: raw.lyrics.trim().to_string(),
        source_file: None,
    }
}

/// 解析年份，返回 `(年份, 显示文本)`。
///
/// * 缺失或为空：`(None, "未知")`
/// * 可解析为整数：`(Some(n), n 的文本)`
/// * 其余情况：`(None, 原始文本)`
pub fn parse_year(value: Option<&YearValue>) -> (Option<i32>, String) {
    let text = match value {
        None => return (None, UNKNOWN_YEAR.to_string()),
        Some(YearValue::Number(n)) => match n.as_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(year) => return (Some(year), year.to_string()),
            None => n.to_string(),
        },
        Some(YearValue::Text(s)) => s.trim().to_string(),
    };

    if text.is_empty() {
        return (None, UNKNOWN_YEAR.to_string());
    }
    match text.parse::<i32>() {
        Ok(year) => (Some(year), year.to_string()),
        Err(_) => (None, text),
    }
}

/// 由 (歌手, 标题, 专辑, 年份文本) 计算稳定的曲目 ID。
///
/// 同一首歌的重复导入会得到相同的 ID，从而覆盖而不是重复。
pub fn track_id(artist: &str, title: &str, album: &str, year_text: &str) -> String {
    let mut hasher = Md5::new();
    for (i, field) in [artist, title, album, year_text].into_iter().enumerate() {
        if i > 0 {
            let mut buf = [0u8; 4];
            hasher.update(ID_FIELD_SEPARATOR.encode_utf8(&mut buf).as_bytes());
        }
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
