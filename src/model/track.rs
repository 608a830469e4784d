//! 定义了歌词包的输入结构与规范化后的曲目记录。

use serde::{Deserialize, Serialize};

/// 专辑缺失时使用的占位值。
pub const UNARCHIVED_ALBUM: &str = "未归档";
/// 作词者缺失时使用的占位值。
pub const UNKNOWN_LYRICIST: &str = "未知作者";
/// 年份缺失时使用的显示文本。
pub const UNKNOWN_YEAR: &str = "未知";

/// 作词者名单的分隔符：全角/半角逗号、斜杠、竖线和间隔号。
pub const NAME_SEPARATORS: &[char] = &['，', ',', '/', '／', '|', '｜', '·', '・'];

/// 歌词包的版本标记，可以是字符串或数字。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaVersion {
    /// 数字版本号，例如 `1`。
    Number(serde_json::Number),
    /// 字符串版本号，例如 `"1.0"`。
    Text(String),
}

/// 原始输入中的年份，可以是字符串或整数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    /// JSON 数字。
    Number(serde_json::Number),
    /// 任意文本，例如 `"2024"` 或 `"2024年"`。
    Text(String),
}

/// 原始输入中的作词者，可以是单个字符串或字符串列表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LyricistsValue {
    /// 单个字符串，可能包含多个以分隔符连接的名字。
    One(String),
    /// 名字列表。
    Many(Vec<String>),
}

impl LyricistsValue {
    /// 按分隔符拆分并去除空白，返回所有非空的名字（未去重）。
    #[must_use]
    pub fn split_names(&self) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Self::One(s) => s.split(NAME_SEPARATORS).collect(),
            Self::Many(list) => list
                .iter()
                .flat_map(|s| s.split(NAME_SEPARATORS))
                .collect(),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 一个未经校验的曲目条目。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    /// 歌曲标题。
    pub title: String,
    /// 歌词正文。
    pub lyrics: String,
    /// 专辑名。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// 发行年份。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<YearValue>,
    /// 作词者。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyricists: Option<LyricistsValue>,
    /// 之前导出时已有的稳定 ID。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// 一个未经校验的歌词包：同一位歌手的一批歌曲。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPackage {
    /// 结构版本标记。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<SchemaVersion>,
    /// 歌手名。整个包只属于一位歌手。
    pub artist: String,
    /// 曲目列表。
    pub tracks: Vec<RawTrack>,
}

/// 经过校验、补全默认值并带有稳定 ID 的曲目记录。
///
/// 这是最终被持久化、被统计和片段定位消费的实体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTrack {
    /// 由 (歌手, 标题, 专辑, 年份文本) 计算出的稳定 ID。
    pub id: String,
    /// 歌曲标题。
    pub title: String,
    /// 专辑名，缺失时为 [`UNARCHIVED_ALBUM`]。
    pub album: String,
    /// 歌手名。
    pub artist: String,
    /// 解析成功的年份。
    pub year: Option<i32>,
    /// 用于显示和筛选的年份文本。
    pub year_text: String,
    /// 作词者列表，永不为空。
    pub lyricists: Vec<String>,
    /// 歌词正文，永不为空。
    pub lyrics: String,
    /// 来源文件名，仅对文档导入设置。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl CanonicalTrack {
    /// 按行遍历歌词正文。
    pub fn lyric_lines(&self) -> impl Iterator<Item = &str> {
        self.lyrics.lines()
    }

    /// 转换回可重新导入的原始条目，保留 ID。
    #[must_use]
    pub fn to_raw(&self) -> RawTrack {
        RawTrack {
            title: self.title.clone(),
            lyrics: self.lyrics.clone(),
            album: Some(self.album.clone()),
            year: Some(match self.year {
                Some(year) => YearValue::Number(year.into()),
                None => YearValue::Text(self.year_text.clone()),
            }),
            lyricists: Some(LyricistsValue::Many(self.lyricists.clone())),
            id: Some(self.id.clone()),
        }
    }
}

/// 校验通过后的歌词包。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPackage {
    /// 结构版本标记。
    pub schema_version: Option<SchemaVersion>,
    /// 歌手名。
    pub artist: String,
    /// 规范化后的曲目。
    pub tracks: Vec<CanonicalTrack>,
}

impl NormalizedPackage {
    /// 为包内所有曲目设置来源文件名。
    #[must_use]
    pub fn with_source_file(mut self, source_file: &str) -> Self {
        for track in &mut self.tracks {
            track.source_file = Some(source_file.to_string());
        }
        self
    }
}
