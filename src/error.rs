//! 定义了整个 `lyrics-archive` 库的错误类型 `ArchiveError`。

use std::io;
use thiserror::Error;

/// `lyrics-archive` 库的通用错误枚举。
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// 输入不符合歌词包的结构（缺少歌手、标题、歌词或曲目列表为空）。
    ///
    /// 调用方应据此提示"缺少歌词"之类的针对性信息，而不是笼统的解析失败。
    #[error("歌词包结构无效: {0}")]
    SchemaViolation(String),

    /// 不支持的文件格式
    #[error("不支持的文件格式: '{0}'")]
    UnsupportedFormat(String),

    /// 文本格式正确，但没有识别出任何可用的歌词正文
    #[error("未能从 '{source_file}' 中识别出歌词正文，段落或换行可能已在转换中丢失")]
    EmptyExtraction {
        /// 来源文件名
        source_file: String,
    },

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O 错误 (源自 `io::Error`)
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

impl ArchiveError {
    /// 创建一个 `SchemaViolation` 错误。
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaViolation(message.into())
    }
}

/// `ArchiveError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, ArchiveError>;
