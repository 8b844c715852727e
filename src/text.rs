//! Text Helpers
//!
//! セル文字列の正規化に使う小さな文字列処理関数群。

use once_cell::sync::Lazy;
use regex::Regex;

static REPEATED_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

static SKU_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]*\d*").expect("valid sku stem regex"));

/// 複数行セルの1行目（前後の空白を除去）
pub(crate) fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("").trim()
}

/// 2文字以上連続する空白を1つの空白にまとめる
pub(crate) fn collapse_whitespace(text: &str) -> String {
    REPEATED_WHITESPACE.replace_all(text, " ").into_owned()
}

/// 単語の先頭文字を大文字、それ以外を小文字にする
///
/// 英字以外の文字（数字・記号・空白）の直後の英字を単語の先頭とみなします。
///
/// # 使用例
///
/// ```text
/// "ASCENT  X 42"  -> "Ascent  X 42"
/// "3sided"        -> "3Sided"
/// ```
pub(crate) fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }
    result
}

/// 大文字・小文字の区別がある文字を含み、そのすべてが大文字であるか
pub(crate) fn is_upper(text: &str) -> bool {
    text.chars().any(char::is_uppercase) && !text.chars().any(char::is_lowercase)
}

/// SKU先頭の英大文字と、それに続く数字
///
/// `"GSS42CFN"` -> `"GSS42"`, `"s20i"` -> `""`
pub(crate) fn sku_stem(sku: &str) -> &str {
    SKU_STEM.find(sku).map_or("", |m| m.as_str())
}

/// 大文字・小文字を無視した部分一致
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
