//! 歌词导入模块
//!
//! 负责把各种来源的原始内容变成规范化的歌词包：
//! 读取字节 → 解码 → 规范化 → 提取/校验。本模块不做任何持久化。

pub mod extractor;
pub mod markup;
pub mod normalizer;
pub mod validator;

use std::{collections::HashSet, path::Path, str::FromStr};

use strum_macros::EnumString;
use tracing::{debug, info};

use crate::{
    error::{ArchiveError, Result},
    ingest::{
        extractor::extract_tracks, markup::markup_to_text, normalizer::decode_bytes,
        normalizer::normalize_text, validator::parse_year,
    },
    model::{NormalizedPackage, RawPackage, RawTrack},
};

/// 支持导入的文件格式，由文件扩展名决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ImportFormat {
    /// 结构化的歌词包 JSON。
    #[strum(serialize = "json")]
    Json,
    /// 按行组织的纯文本。
    #[strum(serialize = "txt", serialize = "text")]
    PlainText,
    /// 轻量标记文本（HTML 片段）。
    #[strum(serialize = "html", serialize = "htm")]
    Markup,
    /// 文字处理文档，需要外部转换器。
    #[strum(serialize = "docx")]
    Document,
}

impl ImportFormat {
    /// 根据文件名的扩展名判断格式。
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
            .ok_or_else(|| ArchiveError::UnsupportedFormat(file_name.to_string()))
    }
}

/// 外部文档转换器的输出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertedDocument {
    /// 纯文本。
    Plain(String),
    /// 带有轻量标记的文本。
    Markup(String),
}

/// 文档格式转换器（例如 DOCX 转文本），由外部提供。
pub trait DocumentConverter {
    /// 将文档字节转换为文本。
    fn convert(&self, file_name: &str, bytes: &[u8]) -> Result<ConvertedDocument>;
}

/// 导入选项。
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// 文本中没有专辑行给出歌手时使用的歌手名。
    pub default_artist: Option<String>,
}

/// 从 JSON 文本导入一个歌词包。
///
/// JSON 语法错误返回 `JsonParse`，结构不符返回 `SchemaViolation`。
pub fn package_from_json(json: &str) -> Result<NormalizedPackage> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    validator::canonicalize(&value)
}

/// 从纯文本中提取曲目并规范化，所有曲目都会被标记来源文件。
pub fn package_from_text(
    text: &str,
    source_file: &str,
    options: &ImportOptions,
) -> Result<NormalizedPackage> {
    let normalized = normalize_text(text);
    let extraction = extract_tracks(&normalized);

    let artist = extraction
        .artist
        .clone()
        .or_else(|| options.default_artist.clone())
        .ok_or_else(|| ArchiveError::schema(format!("无法确定 '{source_file}' 的歌手")))?;

    let tracks = prepare_extracted(&artist, extraction.tracks);
    if tracks.is_empty() {
        return Err(ArchiveError::EmptyExtraction {
            source_file: source_file.to_string(),
        });
    }

    let package = RawPackage {
        schema_version: None,
        artist,
        tracks,
    };
    let normalized = validator::canonicalize_package(package)?.with_source_file(source_file);
    info!(
        "已从 '{}' 中提取 {} 首曲目。",
        source_file,
        normalized.tracks.len()
    );
    Ok(normalized)
}

/// 校验提取结果之前的准备工作：
///
/// 1. 丢弃歌词为空白的曲目。
/// 2. 按 (歌手, 标题, 年份文本) 去重，只保留第一次出现的曲目。
pub fn prepare_extracted(artist: &str, tracks: Vec<RawTrack>) -> Vec<RawTrack> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|track| !track.lyrics.trim().is_empty())
        .filter(|track| {
            let (_, year_text) = parse_year(track.year.as_ref());
            let key = (artist.to_string(), track.title.trim().to_string(), year_text);
            let fresh = seen.insert(key);
            if !fresh {
                debug!("重复的曲目 '{}' 已跳过。", track.title);
            }
            fresh
        })
        .collect()
}

/// 根据文件名分派格式并导入文件内容。
///
/// `.docx` 需要提供 `converter`，否则返回 `UnsupportedFormat`。
pub fn package_from_file(
    file_name: &str,
    bytes: &[u8],
    converter: Option<&dyn DocumentConverter>,
    options: &ImportOptions,
) -> Result<NormalizedPackage> {
    let format = ImportFormat::from_file_name(file_name)?;
    debug!("以 {:?} 格式导入 '{}'。", format, file_name);

    match format {
        ImportFormat::Json => package_from_json(&decode_bytes(bytes)),
        ImportFormat::PlainText => package_from_text(&decode_bytes(bytes), file_name, options),
        ImportFormat::Markup => {
            package_from_text(&markup_to_text(&decode_bytes(bytes)), file_name, options)
        }
        ImportFormat::Document => {
            let converter =
                converter.ok_or_else(|| ArchiveError::UnsupportedFormat(file_name.to_string()))?;
            let text = match converter.convert(file_name, bytes)? {
                ConvertedDocument::Plain(text) => text,
                ConvertedDocument::Markup(markup) => markup_to_text(&markup),
            };
            package_from_text(&text, file_name, options)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::YearValue;

    fn raw(title: &str, year: Option<&str>, lyrics: &str) -> RawTrack {
        RawTrack {
            title: title.to_string(),
            lyrics: lyrics.to_string(),
            year: year.map(|y| YearValue::Text(y.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_import_format_from_file_name() {
        assert_eq!(ImportFormat::from_file_name("a.JSON").unwrap(), ImportFormat::Json);
        assert_eq!(ImportFormat::from_file_name("歌词.txt").unwrap(), ImportFormat::PlainText);
        assert_eq!(ImportFormat::from_file_name("x.htm").unwrap(), ImportFormat::Markup);
        assert_eq!(ImportFormat::from_file_name("x.docx").unwrap(), ImportFormat::Document);
        assert!(matches!(
            ImportFormat::from_file_name("x.pdf"),
            Err(ArchiveError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ImportFormat::from_file_name("无扩展名"),
            Err(ArchiveError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_prepare_extracted_drops_empty_and_duplicates() {
        let tracks = vec![
            raw("一", Some("2020"), "第一版"),
            raw("二", None, "  \n "),
            raw("一", Some("2020"), "第二版"),
            raw("一", Some("2021"), "另一年"),
        ];
        let prepared = prepare_extracted("歌手", tracks);

        let summary: Vec<_> = prepared
            .iter()
            .map(|t| (t.title.as_str(), t.lyrics.as_str()))
            .collect();
        assert_eq!(summary, vec![("一", "第一版"), ("一", "另一年")]);
    }

    #[test]
    fn test_package_from_text_tags_source_file() {
        let text = "《回声档案》2024 演示艺人\r\n雾灯之外\r\n作词：甲\r\n第一行歌词";
        let package = package_from_text(text, "回声档案.txt", &ImportOptions::default()).unwrap();

        assert_eq!(package.artist, "演示艺人");
        assert_eq!(package.tracks.len(), 1);
        assert_eq!(package.tracks[0].source_file.as_deref(), Some("回声档案.txt"));
        assert_eq!(package.tracks[0].album, "回声档案");
        assert_eq!(package.tracks[0].year, Some(2024));
    }

    #[test]
    fn test_package_from_text_without_artist_uses_default() {
        let options = ImportOptions {
            default_artist: Some("默认歌手".to_string()),
        };
        let package = package_from_text("【歌】\n歌词", "a.txt", &options).unwrap();
        assert_eq!(package.artist, "默认歌手");

        let err = package_from_text("【歌】\n歌词", "a.txt", &ImportOptions::default());
        assert!(matches!(err, Err(ArchiveError::SchemaViolation(_))));
    }

    #[test]
    fn test_empty_extraction_is_reported() {
        let options = ImportOptions {
            default_artist: Some("歌手".to_string()),
        };
        let err = package_from_text("一大段没有换行的文字，所有段落都被转换器吞掉了。", "a.txt", &options);
        assert!(matches!(err, Err(ArchiveError::EmptyExtraction { .. })));
    }

    #[test]
    fn test_json_syntax_error_is_not_schema_violation() {
        assert!(matches!(
            package_from_json("{ 不是 json"),
            Err(ArchiveError::JsonParse(_))
        ));
    }

    struct FakeDocx;

    impl DocumentConverter for FakeDocx {
        fn convert(&self, _file_name: &str, _bytes: &[u8]) -> Result<ConvertedDocument> {
            Ok(ConvertedDocument::Markup(
                "<p>《甲辑》歌手</p><p>【歌】</p><p>第一句</p>".to_string(),
            ))
        }
    }

    #[test]
    fn test_docx_requires_converter() {
        let options = ImportOptions::default();
        assert!(matches!(
            package_from_file("a.docx", b"PK", None, &options),
            Err(ArchiveError::UnsupportedFormat(_))
        ));

        let package = package_from_file("a.docx", b"PK", Some(&FakeDocx), &options).unwrap();
        assert_eq!(package.artist, "歌手");
        assert_eq!(package.tracks[0].lyrics, "第一句");
        assert_eq!(package.tracks[0].source_file.as_deref(), Some("a.docx"));
    }

    #[test]
    fn test_json_file_has_no_source_file() {
        let json = r#"{"artist":"歌手","tracks":[{"title":"歌","lyrics":"词"}]}"#;
        let package =
            package_from_file("导出.json", json.as_bytes(), None, &ImportOptions::default())
                .unwrap();
        assert!(package.tracks[0].source_file.is_none());
    }
}
