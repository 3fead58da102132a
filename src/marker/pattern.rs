//! Regular expressions for the marker grammar.
//!
//! The English keyword is matched case-insensitively; the colon may be the
//! ASCII `:` or the full-width `：`.

use regex::Regex;
use std::sync::LazyLock;

/// `@font-tool:` keyword, any case, either colon.
pub static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:@font-tool)\s*[:：]").unwrap());

/// `@font-tool: <component> - <element> - fontSize<±N>`
pub static FULL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:@font-tool)\s*[:：]\s*([^-\r\n]+?)\s*-\s*([^-\r\n]+?)\s*-\s*fontSize\s*([+-]\s*\d+)",
    )
    .unwrap()
});

/// `@font-tool: <element>`
///
/// Stops at any character that can close a comment delimiter.
pub static ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:@font-tool)\s*[:：]\s*([^-\r\n*/<>{}]+)").unwrap()
});

/// `@font-tool: <±N>`
pub static SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:@font-tool)\s*[:：]\s*([+-]?\s*\d+)").unwrap()
});

/// `@font-tool组件: <component>` (also accepts `@font-tool-component:`)
pub static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i:@font-tool)(?:组件|(?i:-component))\s*[:：]\s*([^\r\n*/<>{}]+)").unwrap()
});

/// Any comment in one of the four delimiter families.
///
/// Group 1: brace body, 2: HTML body, 3: block body, 4: whole line comment,
/// 5: line body. A `//` right after `:` is a URL, not a comment.
pub static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{/\*(?s:(.*?))\*/\}|<!--(?s:(.*?))-->|/\*(?s:(.*?))\*/|(?:(?m:^)|[^:])(//([^\r\n]*))",
    )
    .unwrap()
});

/// Purely numeric (optionally signed) text.
pub static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\s*\d+$").unwrap());
