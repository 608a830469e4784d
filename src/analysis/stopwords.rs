//! 停用词与停用字。
//!
//! 这些是静态配置数据，首次使用时构建一次，之后只读。

use std::collections::HashSet;
use std::sync::LazyLock;

/// 多字停用词：歌词里高频但不携带意象的虚词和代词组合。
pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "我们", "你们", "他们", "她们", "它们", "自己", "什么", "一个", "没有", "不是",
        "就是", "这样", "那样", "还是", "可以", "因为", "所以", "如果", "已经", "只是",
        "一样", "怎么", "这个", "那个", "这些", "那些", "时候", "不会", "不要", "一起",
        "为了", "还有", "然后", "但是", "而且", "或者", "虽然", "只有", "那么", "这么",
        "一切", "所有", "一些", "每个", "的话", "不能", "不再", "也许", "或许", "还要",
        "那里", "这里", "哪里", "为何", "如何", "之间", "之后", "之前", "起来", "下去",
    ]
    .into_iter()
    .collect()
});

/// 停用字：单独出现时不计入统计，也不参与二元组回退。
pub static STOP_CHARS: LazyLock<HashSet<char>> = LazyLock::new(|| {
    "的了着过是在和与也都就还又很把被让给对向从到我你他她它们这那哪啊呀吧吗呢哦哈嗯啦么之而一不有会要能说去来上下里中个没"
        .chars()
        .collect()
});

/// 是否为多字停用词。
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// 是否为停用字。
pub fn is_stop_char(c: char) -> bool {
    STOP_CHARS.contains(&c)
}
