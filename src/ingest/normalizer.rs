//! 文本规范化器。
//!
//! 在解析之前统一字符实体、换行符和不换行空格。所有函数都是全函数，永不失败。

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};
use tracing::warn;

/// 匹配命名实体和十进制/十六进制数字实体。
static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX](?P<hex>[0-9a-fA-F]{1,6})|#(?P<dec>[0-9]{1,7})|(?P<name>[A-Za-z][A-Za-z0-9]{1,31}));")
        .expect("编译 ENTITY_REGEX 失败")
});

/// 规范化一段原始文本。
///
/// 1. 解码 HTML/XML 命名实体与数字实体，直到文本不再变化。
/// 2. 去除开头的字节顺序标记。
/// 3. 将 `\r\n`、`\r` 以及各类行/段分隔符统一为 `\n`。
/// 4. 将不换行空格替换为普通空格。
///
/// 此函数是幂等的：`normalize_text(&normalize_text(x)) == normalize_text(x)`。
pub fn normalize_text(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let without_bom = decoded.trim_start_matches('\u{FEFF}');
    let unified = unify_line_endings(without_bom);
    replace_nbsp(&unified)
}

/// 反复解码字符实体直到结果稳定。
///
/// 每次有效替换都会缩短文本，所以循环必然终止。
fn decode_entities(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = ENTITY_REGEX
            .replace_all(&current, resolve_entity)
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn resolve_entity(caps: &Captures) -> String {
    let original = || caps[0].to_string();

    let code_point = if let Some(hex) = caps.name("hex") {
        u32::from_str_radix(hex.as_str(), 16).ok()
    } else if let Some(dec) = caps.name("dec") {
        dec.as_str().parse::<u32>().ok()
    } else {
        return caps
            .name("name")
            .and_then(|name| resolve_html5_entity(name.as_str()))
            .map_or_else(original, str::to_string);
    };

    code_point
        .filter(|&cp| cp != 0)
        .and_then(char::from_u32)
        .map_or_else(original, |c| c.to_string())
}

fn unify_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => out.push('\n'),
            _ => out.push(c),
        }
    }
    out
}

fn replace_nbsp(text: &str) -> String {
    text.replace(['\u{00A0}', '\u{2007}', '\u{202F}'], " ")
}

/// 将文件字节解码为字符串。
///
/// 识别 UTF-8、UTF-16LE 和 UTF-16BE 的字节顺序标记；
/// 无标记时按 UTF-8 解码，遇到非法序列则有损替换。
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return utf8_lossy(rest);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    utf8_lossy(bytes)
}

fn utf8_lossy(bytes: &[u8]) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => {
            warn!("输入不是有效的 UTF-8，已将非法字节替换为 U+FFFD。");
            s
        }
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
