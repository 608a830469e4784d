//! 轻量标记文本转纯文本。
//!
//! 外部文档转换器可能返回带有 `<p>`、`<br>` 等标签的 HTML 片段，
//! 这里把块级结束标签和换行标签还原为换行，再丢弃其余标签。

use std::sync::LazyLock;

use regex::Regex;

use crate::ingest::normalizer::normalize_text;

/// 匹配 `<br>` 以及块级元素的结束标签。
static LINE_BREAK_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|h[1-6])\s*>").expect("编译 LINE_BREAK_TAG_REGEX 失败")
});

/// 匹配任意剩余的标签和注释。
static ANY_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").expect("编译 ANY_TAG_REGEX 失败"));

/// 将标记文本转换为规范化后的纯文本。
///
/// 空段落 `<p></p>` 会变成空行，从而保留段落之间的分隔。
pub fn markup_to_text(markup: &str) -> String {
    let with_breaks = LINE_BREAK_TAG_REGEX.replace_all(markup, "\n");
    let stripped = ANY_TAG_REGEX.replace_all(&with_breaks, "");
    normalize_text(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_lines() {
        let html = "<p>雾灯之外</p><p>作词：甲</p><p></p><p>第一行&nbsp;歌词</p>";
        assert_eq!(markup_to_text(html), "雾灯之外\n作词：甲\n\n第一行 歌词\n");
    }

    #[test]
    fn test_br_and_inline_tags() {
        let html = "<div><strong>第一行</strong><br/>第二行<BR></div><!-- 注释 -->";
        assert_eq!(markup_to_text(html), "第一行\n第二行\n\n");
    }

    #[test]
    fn test_escaped_angle_brackets_survive() {
        assert_eq!(markup_to_text("<p>&lt;标题&gt;</p>"), "<标题>\n");
    }
}
