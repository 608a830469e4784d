//! # 纯文本歌词提取器
//!
//! 从没有可靠分隔符的纯文本中恢复出一首首歌曲。
//!
//! 每一行先被 [`classify_line`] 归为 [`LineKind`] 中的一种，检查顺序为
//! 专辑行 → 括号标题行 → 裸标题行 → 署名行 → 空行 → 正文行；
//! 随后由 [`ExtractorState::step`] 这个纯粹的状态转移函数处理，
//! 每一步最多产出一首完成的曲目。

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::{
    model::{LyricistsValue, RawTrack, YearValue, track::NAME_SEPARATORS},
    utils::{dedup_preserving_order, grapheme_len, is_cjk_ideograph},
};

/// 匹配 `《专辑》2024 歌手` 形式的专辑行。年份与歌手由 [`split_year`] 从 `tail` 中拆出。
static ALBUM_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^《(?P<album>[^》]+)》\s*(?P<tail>.*)$").expect("编译 ALBUM_LINE_REGEX 失败")
});

/// 匹配署名标签。作词与作曲的名单会被保留，编曲只用于截断前一个标签的值。
static CREDIT_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<tag>作[词詞]|作曲|[编編]曲)\s*[:：]").expect("编译 CREDIT_TAG_REGEX 失败")
});

/// 可以包裹标题的成对括号。`《》` 专用于专辑行，不在此列。
const TITLE_BRACKETS: &[(char, char)] = &[
    ('【', '】'),
    ('「', '」'),
    ('『', '』'),
    ('〈', '〉'),
    ('＜', '＞'),
    ('<', '>'),
    ('[', ']'),
    ('〔', '〕'),
];

const MIDDLE_DOTS: &[char] = &['·', '・', '•'];

const BARE_TITLE_MIN_LEN: usize = 2;
const BARE_TITLE_MAX_LEN: usize = 12;

/// 一行署名中解析出的人名。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    /// 作词者。
    pub lyricists: Vec<String>,
    /// 作曲者。
    pub composers: Vec<String>,
    /// 该行是否只有署名，没有其他实质内容。
    pub credit_only: bool,
}

/// 单行文本的分类结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// 专辑上下文行。
    AlbumContext {
        /// 专辑名。
        album: String,
        /// 四位数年份。
        year: Option<String>,
        /// 歌手名。
        artist: Option<String>,
    },
    /// 括号包裹的标题行，括号后可能紧跟署名。
    TitleMarker {
        /// 括号内的标题。
        title: String,
        /// 同一行括号后的署名。
        credits: Option<Credits>,
    },
    /// 空行之后的短行，被视为隐式标题。
    BareTitle(String),
    /// 含有作词或作曲标签的行。
    Credit(Credits),
    /// 空行。
    Blank,
    /// 普通正文。
    Content,
}

/// 分类时需要的上下文。
#[derive(Debug, Clone, Copy)]
pub struct LineContext {
    /// 是否允许把短行当作裸标题。
    pub bare_title_allowed: bool,
}

/// 对一行已去除首尾空白的文本进行分类。
pub fn classify_line(line: &str, ctx: LineContext) -> LineKind {
    if let Some(caps) = ALBUM_LINE_REGEX.captures(line) {
        let album = caps["album"].trim().to_string();
        if !album.is_empty() {
            let (year, rest) = split_year(caps.name("tail").map_or("", |m| m.as_str()));
            let artist = Some(clean_artist(rest)).filter(|s| !s.is_empty());
            return LineKind::AlbumContext {
                album,
                year,
                artist,
            };
        }
    }

    if let Some((title, rest)) = parse_title_marker(line) {
        let credits = parse_credits(rest);
        if credits.is_none() && !rest.trim().is_empty() {
            trace!("标题行 '{title}' 后的文本 '{rest}' 不含署名标签，已忽略。");
        }
        return LineKind::TitleMarker { title, credits };
    }

    if ctx.bare_title_allowed && is_bare_title(line) {
        return LineKind::BareTitle(line.to_string());
    }

    if let Some(credits) = parse_credits(line) {
        return LineKind::Credit(credits);
    }

    if line.is_empty() {
        LineKind::Blank
    } else {
        LineKind::Content
    }
}

/// 拆出开头恰好四位的数字作为年份（可跟一个“年”字），其余部分作为歌手。
/// 数字不是恰好四位时整段都视为歌手。
fn split_year(tail: &str) -> (Option<String>, &str) {
    let digits = tail.len() - tail.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits != 4 {
        return (None, tail);
    }
    let (year, rest) = tail.split_at(digits);
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('年').unwrap_or(rest);
    (Some(year.to_string()), rest)
}

fn clean_artist(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | '|' | '/'))
        .to_string()
}

fn parse_title_marker(line: &str) -> Option<(String, &str)> {
    TITLE_BRACKETS.iter().find_map(|&(open, close)| {
        let inner = line.strip_prefix(open)?;
        let (title, rest) = inner.split_once(close)?;
        let title = title.trim();
        (!title.is_empty()).then(|| (title.to_string(), rest))
    })
}

fn is_bare_title(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let len = grapheme_len(&compact);
    if !(BARE_TITLE_MIN_LEN..=BARE_TITLE_MAX_LEN).contains(&len) {
        return false;
    }
    line.chars().all(|c| {
        is_cjk_ideograph(c)
            || c.is_ascii_alphanumeric()
            || c == ' '
            || c == '\u{3000}'
            || MIDDLE_DOTS.contains(&c)
    })
}

/// 解析一行中的署名标签。没有作词或作曲标签时返回 `None`，
/// 只有编曲标签的行仍是正文。
///
/// 每个标签的值延伸到下一个标签或行尾为止。
fn parse_credits(line: &str) -> Option<Credits> {
    let tags: Vec<_> = CREDIT_TAG_REGEX.captures_iter(line).collect();
    let has_primary_tag = tags
        .iter()
        .filter_map(|caps| caps.name("tag"))
        .any(|tag| matches!(tag.as_str(), "作词" | "作詞" | "作曲"));
    if !has_primary_tag {
        return None;
    }
    let first = tags.first()?.get(0)?;

    let mut credits = Credits {
        credit_only: line[..first.start()].chars().all(|c| !c.is_alphanumeric()),
        ..Default::default()
    };

    for (i, caps) in tags.iter().enumerate() {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.name("tag")) else {
            continue;
        };
        let value_end = tags
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(line.len(), |m| m.start());
        let names = split_credit_names(&line[whole.end()..value_end]);

        match tag.as_str() {
            "作词" | "作詞" => credits.lyricists.extend(names),
            "作曲" => credits.composers.extend(names),
            _ => {}
        }
    }

    Some(credits)
}

fn split_credit_names(value: &str) -> Vec<String> {
    value
        .split(NAME_SEPARATORS)
        .map(|s| s.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 正在累积中的曲目草稿，只存在于一次提取过程内。
#[derive(Debug, Clone, Default)]
struct DraftTrack {
    title: String,
    lyricists: Vec<String>,
    composers: Vec<String>,
    lines: Vec<String>,
    album: Option<String>,
    year: Option<String>,
}

impl DraftTrack {
    fn absorb_credits(&mut self, credits: Credits) {
        self.lyricists.extend(credits.lyricists);
        self.composers.extend(credits.composers);
    }

    /// 将草稿转为原始条目。没有标题或没有非空歌词行的草稿会被丢弃。
    fn finish(self) -> Option<RawTrack> {
        let title = self.title.trim().to_string();
        let first = self.lines.iter().position(|l| !l.trim().is_empty());
        let last = self.lines.iter().rposition(|l| !l.trim().is_empty());

        let (Some(first), Some(last)) = (first, last) else {
            debug!("丢弃没有歌词正文的草稿 '{}'。", title);
            return None;
        };
        if title.is_empty() {
            debug!("丢弃没有标题的草稿。");
            return None;
        }
        if !self.composers.is_empty() {
            trace!("草稿 '{}' 的作曲者: {:?}", title, self.composers);
        }

        let lyricists = dedup_preserving_order(self.lyricists);
        Some(RawTrack {
            title,
            lyrics: self.lines[first..=last].join("\n"),
            album: self.album,
            year: self.year.map(YearValue::Text),
            lyricists: (!lyricists.is_empty()).then_some(LyricistsValue::Many(lyricists)),
            id: None,
        })
    }
}

/// 提取器的状态：当前草稿、空行标记和专辑上下文。
#[derive(Debug, Clone)]
pub struct ExtractorState {
    draft: Option<DraftTrack>,
    previous_blank: bool,
    blank_run: usize,
    draft_started: bool,
    album: Option<String>,
    year: Option<String>,
    package_album: Option<String>,
    package_year: Option<String>,
    package_artist: Option<String>,
}

impl Default for ExtractorState {
    fn default() -> Self {
        Self {
            draft: None,
            previous_blank: true,
            blank_run: 0,
            draft_started: false,
            album: None,
            year: None,
            package_album: None,
            package_year: None,
            package_artist: None,
        }
    }
}

impl ExtractorState {
    /// 创建一个初始状态。
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否有一个打开的草稿。
    #[must_use]
    pub fn has_open_draft(&self) -> bool {
        self.draft.is_some()
    }

    /// 没有打开的草稿时，空行之后（或第一行）的短行可以作为标题；
    /// 草稿打开时，单个空行只是段落分隔，连续两个空行才允许开始新歌。
    fn line_context(&self) -> LineContext {
        LineContext {
            bare_title_allowed: if self.draft.is_none() {
                self.previous_blank
            } else {
                self.blank_run >= 2
            },
        }
    }

    /// 处理一行文本，返回新状态和可能完成的一首曲目。
    #[must_use]
    pub fn step(mut self, raw_line: &str) -> (Self, Option<RawTrack>) {
        let line = raw_line.trim();
        let kind = classify_line(line, self.line_context());
        let mut emitted = None;

        match kind {
            LineKind::AlbumContext {
                album,
                year,
                artist,
            } => {
                emitted = self.flush();
                if !self.draft_started && self.package_artist.is_none() {
                    self.package_artist = artist;
                }
                if self.package_album.is_none() {
                    self.package_album = Some(album.clone());
                    self.package_year.clone_from(&year);
                }
                self.album = Some(album);
                self.year = year;
                self.mark_blank();
                return (self, emitted);
            }
            LineKind::TitleMarker { title, credits } => {
                emitted = self.flush();
                self.open_draft(title);
                if let (Some(draft), Some(credits)) = (self.draft.as_mut(), credits) {
                    draft.absorb_credits(credits);
                }
            }
            LineKind::BareTitle(title) => {
                emitted = self.flush();
                self.open_draft(title);
            }
            LineKind::Credit(credits) => match self.draft.as_mut() {
                Some(draft) => {
                    let credit_only = credits.credit_only;
                    draft.absorb_credits(credits);
                    if !credit_only {
                        draft.lines.push(line.to_string());
                    }
                }
                None => trace!("署名行 '{line}' 出现在任何标题之前，已忽略。"),
            },
            LineKind::Blank => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.lines.push(String::new());
                }
                self.mark_blank();
                return (self, emitted);
            }
            LineKind::Content => match self.draft.as_mut() {
                Some(draft) => draft.lines.push(line.to_string()),
                None => trace!("正文行 '{line}' 出现在任何标题之前，已丢弃。"),
            },
        }

        self.previous_blank = false;
        self.blank_run = 0;
        (self, emitted)
    }

    /// 结束输入流，刷新剩余的草稿。
    #[must_use]
    pub fn finish(mut self) -> Extraction {
        let last = self.flush();
        Extraction {
            album: self.package_album,
            year: self.package_year,
            artist: self.package_artist,
            tracks: last.into_iter().collect(),
        }
    }

    fn mark_blank(&mut self) {
        self.previous_blank = true;
        self.blank_run += 1;
    }

    fn open_draft(&mut self, title: String) {
        self.draft_started = true;
        self.draft = Some(DraftTrack {
            title,
            album: self.album.clone(),
            year: self.year.clone(),
            ..Default::default()
        });
    }

    fn flush(&mut self) -> Option<RawTrack> {
        self.draft.take().and_then(DraftTrack::finish)
    }
}

/// 一次提取的结果：包级别的专辑/年份/歌手以及所有识别出的曲目。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// 第一条专辑行给出的专辑名。
    pub album: Option<String>,
    /// 第一条专辑行给出的年份。
    pub year: Option<String>,
    /// 包级别的歌手名。
    pub artist: Option<String>,
    /// 识别出的曲目。
    pub tracks: Vec<RawTrack>,
}

/// 从规范化后的文本中提取曲目。
///
/// 这是一个全函数：任何输入都不会失败，最坏情况下返回零首曲目。
pub fn extract_tracks(text: &str) -> Extraction {
    let mut tracks = Vec::new();
    let state = text.lines().fold(ExtractorState::new(), |state, line| {
        let (next, emitted) = state.step(line);
        tracks.extend(emitted);
        next
    });

    let mut extraction = state.finish();
    tracks.append(&mut extraction.tracks);
    extraction.tracks = tracks;
    debug!("文本提取完成，共识别出 {} 首曲目。", extraction.tracks.len());
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;

    const FREE: LineContext = LineContext {
        bare_title_allowed: true,
    };
    const BOUND: LineContext = LineContext {
        bare_title_allowed: false,
    };

    fn lyricists_of(track: &RawTrack) -> Vec<String> {
        match &track.lyricists {
            Some(LyricistsValue::Many(names)) => names.clone(),
            Some(LyricistsValue::One(name)) => vec![name.clone()],
            None => Vec::new(),
        }
    }

    #[test]
    fn test_classify_album_line() {
        assert_eq!(
            classify_line("《回声档案》2024 演示艺人", BOUND),
            LineKind::AlbumContext {
                album: "回声档案".to_string(),
                year: Some("2024".to_string()),
                artist: Some("演示艺人".to_string()),
            }
        );
        assert_eq!(
            classify_line("《回声档案》", BOUND),
            LineKind::AlbumContext {
                album: "回声档案".to_string(),
                year: None,
                artist: None,
            }
        );
    }

    #[test]
    fn test_album_year_must_be_exactly_four_digits() {
        assert_eq!(
            classify_line("《辑》12345 歌手", BOUND),
            LineKind::AlbumContext {
                album: "辑".to_string(),
                year: None,
                artist: Some("12345 歌手".to_string()),
            }
        );
        assert_eq!(
            classify_line("《辑》20245歌手", BOUND),
            LineKind::AlbumContext {
                album: "辑".to_string(),
                year: None,
                artist: Some("20245歌手".to_string()),
            }
        );
        assert_eq!(
            classify_line("《辑》2024歌手", BOUND),
            LineKind::AlbumContext {
                album: "辑".to_string(),
                year: Some("2024".to_string()),
                artist: Some("歌手".to_string()),
            }
        );
        assert_eq!(
            classify_line("《辑》2024 年 歌手", BOUND),
            LineKind::AlbumContext {
                album: "辑".to_string(),
                year: Some("2024".to_string()),
                artist: Some("歌手".to_string()),
            }
        );
    }

    #[test]
    fn test_five_digit_number_does_not_leak_into_package() {
        let extraction = extract_tracks("《辑》12345 歌手\n【歌】\n词");
        assert_eq!(extraction.year, None);
        assert_eq!(extraction.artist.as_deref(), Some("12345 歌手"));
        assert_eq!(extraction.tracks[0].year, None);
    }

    #[test]
    fn test_classify_title_marker_with_trailing_credits() {
        let kind = classify_line("【雾灯之外】作词：甲/乙 作曲：丙", BOUND);
        assert_eq!(
            kind,
            LineKind::TitleMarker {
                title: "雾灯之外".to_string(),
                credits: Some(Credits {
                    lyricists: vec!["甲".to_string(), "乙".to_string()],
                    composers: vec!["丙".to_string()],
                    credit_only: true,
                }),
            }
        );
    }

    #[test]
    fn test_classify_bare_title_only_when_allowed() {
        assert_eq!(
            classify_line("雾灯之外", FREE),
            LineKind::BareTitle("雾灯之外".to_string())
        );
        assert_eq!(classify_line("雾灯之外", BOUND), LineKind::Content);
    }

    #[test]
    fn test_bare_title_rejects_long_or_punctuated_lines() {
        assert_eq!(classify_line("一", FREE), LineKind::Content);
        assert_eq!(
            classify_line("这是一句非常非常长的歌词不会是标题", FREE),
            LineKind::Content
        );
        assert_eq!(classify_line("你好，世界", FREE), LineKind::Content);
        assert_eq!(
            classify_line("Night·Walk 2", FREE),
            LineKind::BareTitle("Night·Walk 2".to_string())
        );
    }

    #[test]
    fn test_classify_credit_lines() {
        assert_eq!(
            classify_line("作詞：甲 作曲：乙 编曲：丙", FREE),
            LineKind::Credit(Credits {
                lyricists: vec!["甲".to_string()],
                composers: vec!["乙".to_string()],
                credit_only: true,
            })
        );
        let embedded = classify_line("我唱着歌 作词：甲", BOUND);
        assert_eq!(
            embedded,
            LineKind::Credit(Credits {
                lyricists: vec!["甲".to_string()],
                composers: Vec::new(),
                credit_only: false,
            })
        );
    }

    #[test]
    fn test_classify_blank_and_content() {
        assert_eq!(classify_line("", FREE), LineKind::Blank);
        assert_eq!(
            classify_line("风吹过的街道，没有人回头", BOUND),
            LineKind::Content
        );
    }

    #[test]
    fn test_step_is_a_pure_reducer() {
        let state = ExtractorState::new();
        let (state, emitted) = state.step("【一】");
        assert!(emitted.is_none());
        assert!(state.has_open_draft());

        let (state, emitted) = state.step("歌词一");
        assert!(emitted.is_none());

        let (state, emitted) = state.step("【二】");
        let first = emitted.expect("开始新标题时应刷新上一首");
        assert_eq!(first.title, "一");
        assert_eq!(first.lyrics, "歌词一");
        assert!(state.has_open_draft());
    }

    #[test]
    fn test_canonical_fixture() {
        let text = "《回声档案》2024 演示艺人\n雾灯之外\n作词：示例词作者 作曲：示例作曲者\n第一行歌词\n\n第二行歌词";
        let extraction = extract_tracks(text);

        assert_eq!(extraction.album.as_deref(), Some("回声档案"));
        assert_eq!(extraction.year.as_deref(), Some("2024"));
        assert_eq!(extraction.artist.as_deref(), Some("演示艺人"));
        assert_eq!(extraction.tracks.len(), 1);

        let track = &extraction.tracks[0];
        assert_eq!(track.title, "雾灯之外");
        assert_eq!(lyricists_of(track), vec!["示例词作者"]);
        assert_eq!(track.lyrics, "第一行歌词\n\n第二行歌词");
        assert_eq!(track.album.as_deref(), Some("回声档案"));
        assert_eq!(track.year, Some(YearValue::Text("2024".to_string())));
    }

    #[test]
    fn test_drafts_without_lyrics_are_discarded() {
        let text = "【空歌】\n作词：甲\n\n【有词】\n一行歌词";
        let extraction = extract_tracks(text);
        assert_eq!(extraction.tracks.len(), 1);
        assert_eq!(extraction.tracks[0].title, "有词");
        assert!(extraction.tracks[0].lyricists.is_none(), "空名单应为 None");
    }

    #[test]
    fn test_lines_before_first_title_are_dropped() {
        let text = "这是文件的前言，介绍这张专辑。\n作词：无主\n\n雾灯之外\n歌词";
        let extraction = extract_tracks(text);
        assert_eq!(extraction.tracks.len(), 1);
        assert_eq!(extraction.tracks[0].lyrics, "歌词");
        assert!(extraction.tracks[0].lyricists.is_none());
    }

    #[test]
    fn test_trailing_blank_lines_trimmed_internal_kept() {
        let text = "【歌】\n\n第一段，开始唱\n\n\n第二段，继续唱\n\n\n";
        let extraction = extract_tracks(text);
        assert_eq!(
            extraction.tracks[0].lyrics,
            "第一段，开始唱\n\n\n第二段，继续唱"
        );
    }

    #[test]
    fn test_double_blank_line_allows_bare_title_inside_open_draft() {
        let text = "第一首\n歌词甲\n\n\n第二首\n歌词乙\n\n短句\n歌词丙";
        let extraction = extract_tracks(text);

        let titles: Vec<_> = extraction.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["第一首", "第二首"]);
        assert_eq!(extraction.tracks[1].lyrics, "歌词乙\n\n短句\n歌词丙");
    }

    #[test]
    fn test_album_line_switches_context_and_flushes() {
        let text = "《甲辑》2020 歌手\n【一】\n歌词\n《乙辑》2021\n【二】\n歌词";
        let extraction = extract_tracks(text);

        assert_eq!(extraction.artist.as_deref(), Some("歌手"));
        assert_eq!(extraction.album.as_deref(), Some("甲辑"));
        assert_eq!(extraction.tracks.len(), 2);
        assert_eq!(extraction.tracks[0].album.as_deref(), Some("甲辑"));
        assert_eq!(extraction.tracks[1].album.as_deref(), Some("乙辑"));
        assert_eq!(
            extraction.tracks[1].year,
            Some(YearValue::Text("2021".to_string()))
        );
    }

    #[test]
    fn test_later_album_line_does_not_replace_package_artist() {
        let text = "《甲辑》歌手甲\n【一】\n歌词\n《乙辑》歌手乙\n【二】\n歌词";
        let extraction = extract_tracks(text);
        assert_eq!(extraction.artist.as_deref(), Some("歌手甲"));
    }

    #[test]
    fn test_lyricists_are_deduplicated_in_order() {
        let text = "【歌】\n作词：乙/甲\n作词：甲\n歌词";
        let extraction = extract_tracks(text);
        assert_eq!(lyricists_of(&extraction.tracks[0]), vec!["乙", "甲"]);
    }

    // 行内嵌入的署名会被提取，同时整行仍作为歌词保留
    #[test]
    fn test_embedded_credit_leaks_into_lyrics() {
        let text = "【歌】\n第一句\n我唱着歌 作词：甲\n第三句";
        let extraction = extract_tracks(text);
        let track = &extraction.tracks[0];

        assert_eq!(lyricists_of(track), vec!["甲"]);
        assert_eq!(track.lyrics, "第一句\n我唱着歌 作词：甲\n第三句");
    }

    #[test]
    fn test_arranger_only_line_stays_in_lyrics() {
        assert_eq!(classify_line("编曲：某人", BOUND), LineKind::Content);

        let extraction = extract_tracks("【歌】\n第一句\n编曲：某人\n第二句");
        let track = &extraction.tracks[0];
        assert_eq!(track.lyrics, "第一句\n编曲：某人\n第二句");
        assert!(track.lyricists.is_none());
    }

    #[test]
    fn test_arranger_tag_still_ends_lyricist_value() {
        let extraction = extract_tracks("【歌】\n作词：甲 编曲：乙\n第一句");
        let track = &extraction.tracks[0];
        assert_eq!(lyricists_of(track), vec!["甲"]);
        assert_eq!(track.lyrics, "第一句");
    }

    #[test]
    fn test_garbage_input_yields_nothing() {
        let extraction = extract_tracks("：：：\n,,,\n\n!!!");
        assert!(extraction.tracks.is_empty());
        assert!(extraction.album.is_none());
    }
}
