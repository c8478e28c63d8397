//! コメント本文の正規化処理。
//!
//! 小文字化 → URL除去 → `a-z` と空白以外の除去 → 空白の圧縮 → trim の順で適用する。
//! 順序を入れ替えると結果が変わるため、各ステップは必ずこの順で実行すること。
use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

// 学習側の `\s` は情報区切り文字 U+001C〜U+001F も空白として扱うため、どの正規表現でも揃える。
// `www.` の `.` は任意の1文字にマッチする。学習時のクリーニングと揃えるため意図的にこのまま。
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http[^\s\x1c-\x1f]+|www.[^\s\x1c-\x1f]+").expect("compile url regex")
});
static NON_ALPHA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s\x1c-\x1f]").expect("compile letter filter regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\x1c-\x1f]+").expect("compile whitespace regex"));

/// 任意の表示可能な値を文字列化し、分類器の入力形式に正規化する。
///
/// 出力は `[a-z ]*` のみで構成され、連続した空白や前後の空白を含まない。
/// 失敗することはなく、空入力には空文字列を返す。
#[must_use]
pub fn clean<T: Display + ?Sized>(text: &T) -> String {
    let lowered = text.to_string().to_lowercase();
    let without_urls = URL_RE.replace_all(&lowered, "");
    let letters_only = NON_ALPHA_RE.replace_all(&without_urls, "");
    let collapsed = WHITESPACE_RE.replace_all(&letters_only, " ");
    collapsed.trim_matches(is_separator).to_string()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::clean;

    #[rstest]
    #[case("", "")]
    #[case("Hello World", "hello world")]
    #[case("  spaced\t\tout \n text  ", "spaced out text")]
    #[case("You are so STUPID!!! visit www.spam.com", "you are so stupid visit")]
    #[case("check http://example.com now", "check now")]
    #[case("see https://a.b/c?d=1&e=2 and wwwxsite", "see and")]
    #[case("!!! 😀😀😀", "")]
    #[case("café über naïve", "caf ber nave")]
    #[case("r2d2 says 42", "rd says")]
    #[case("you\u{1f}idiot", "you idiot")]
    #[case("visit http://spam.com\u{1f}now", "visit now")]
    #[case("\u{1c}stupid\u{1d}\u{1e}take\u{1f}", "stupid take")]
    fn clean_applies_every_step(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean(raw), expected);
    }

    #[test]
    fn clean_stringifies_non_string_values() {
        assert_eq!(clean(&42), "");
        assert_eq!(clean(&'A'), "a");
    }

    #[test]
    fn clean_removes_punctuation_before_collapsing() {
        // "a - b" must not leave a double space once the dash is dropped.
        assert_eq!(clean("a - b"), "a b");
    }

    #[test]
    fn url_heuristic_keeps_protocol_relative_host() {
        // Only `http`/`www.` prefixes are recognised.
        assert_eq!(clean("//example.com/path"), "examplecompath");
    }
}
