//! 歌词分析模块：词频统计与关键词片段定位。

pub mod segmenter;
pub mod snippets;
pub mod statistics;
pub mod stopwords;

pub use snippets::{ContextWindow, Snippet, context_windows, highlight_ranges, locate_snippets};
pub use statistics::{CloudResult, FrequencyToken, StatisticsEngine, TrackFilter};
