//! 包含一些文本工具函数的模块。

use std::collections::HashSet;
use std::hash::Hash;

use unicode_segmentation::UnicodeSegmentation;

/// 判断字符是否为 CJK 统一表意文字（含扩展区与兼容区）。
pub fn is_cjk_ideograph(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2A6DF
        | 0x2A700..=0x2EBEF
        | 0x30000..=0x3134F
        | 0xF900..=0xFAFF
        | 0x2F800..=0x2FA1F
    )
}

/// 以扩展字素簇计算文本长度。
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// 按首次出现的顺序去重。
pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// 大小写折叠单个字符，只取小写映射的第一个字符以保持逐字符对齐。
pub(crate) fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// 对整段文本做逐字符的大小写折叠。
pub(crate) fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}
