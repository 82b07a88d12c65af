//! Plain markdown to HTML for read-only display.
//!
//! Raw markup is escaped before any replacement runs, so the only tags in the
//! output are the ones emitted here. Code is stashed behind placeholders once
//! matched and is untouched by later rules.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static FENCED_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^```[ \t]*([A-Za-z0-9_+#.-]*)[ \t]*\n(.*?)\n?^```[ \t]*$")
        .unwrap_or_else(|err| unreachable!("fenced code pattern: {err}"))
});
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`\n]+)`").unwrap_or_else(|err| unreachable!("inline code pattern: {err}"))
});
static BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^\n]+?)\*\*").unwrap_or_else(|err| unreachable!("bold pattern: {err}"))
});
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*([^*\n]+)\*").unwrap_or_else(|err| unreachable!("italic pattern: {err}"))
});
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b_([^_\n]+)_\b").unwrap_or_else(|err| unreachable!("italic pattern: {err}"))
});
static STRIKETHROUGH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"~~([^\n]+?)~~").unwrap_or_else(|err| unreachable!("strikethrough pattern: {err}"))
});
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]*)\]\(([^)\s]+)\)")
        .unwrap_or_else(|err| unreachable!("link pattern: {err}"))
});
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("\u{0}(\\d+)\u{0}").unwrap_or_else(|err| unreachable!("placeholder pattern: {err}"))
});

const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

/// Render `text` as HTML.
///
/// Supports fenced and inline code, bold, italic, strikethrough, links and
/// line breaks. Anything else is shown as escaped text.
pub fn render_markdown(text: &str) -> String {
    let mut stash = Vec::new();
    let escaped = escape_html(text);

    let html = FENCED_CODE.replace_all(&escaped, |caps: &Captures<'_>| {
        let class = match &caps[1] {
            "" => String::new(),
            lang => format!(" class=\"language-{lang}\""),
        };
        park(&mut stash, format!("<pre><code{class}>{}</code></pre>", &caps[2]))
    });
    let html = INLINE_CODE.replace_all(&html, |caps: &Captures<'_>| {
        park(&mut stash, format!("<code>{}</code>", &caps[1]))
    });
    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC_STAR.replace_all(&html, "<em>$1</em>");
    let html = ITALIC_UNDERSCORE.replace_all(&html, "<em>$1</em>");
    let html = STRIKETHROUGH.replace_all(&html, "<del>$1</del>");
    let html = LINK.replace_all(&html, |caps: &Captures<'_>| {
        let (label, href) = (&caps[1], &caps[2]);
        if is_safe_href(href) {
            format!("<a href=\"{href}\">{label}</a>")
        } else {
            label.to_string()
        }
    });
    let html = html.replace('\n', "<br>");

    PLACEHOLDER
        .replace_all(&html, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| stash.get(idx))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}

/// Escape the five HTML-significant characters.
///
/// NUL is reserved for code placeholders and becomes U+FFFD.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push('\u{FFFD}'),
            other => out.push(other),
        }
    }
    out
}

fn park(stash: &mut Vec<String>, html: String) -> String {
    stash.push(html);
    format!("\u{0}{}\u{0}", stash.len() - 1)
}

fn is_safe_href(href: &str) -> bool {
    let normalized: String = href
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !UNSAFE_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bold_and_escaped_script() {
        assert_eq!(
            render_markdown("**bold** <script>"),
            "<strong>bold</strong> &lt;script&gt;"
        );
    }

    #[test]
    fn test_italic_both_markers() {
        assert_eq!(render_markdown("*a* and _b_"), "<em>a</em> and <em>b</em>");
    }

    #[test]
    fn test_snake_case_is_not_italic() {
        assert_eq!(render_markdown("snake_case_name"), "snake_case_name");
    }

    #[test]
    fn test_strikethrough() {
        assert_eq!(render_markdown("~~gone~~"), "<del>gone</del>");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(render_markdown("a\nb"), "a<br>b");
    }

    #[test]
    fn test_inline_code_is_protected() {
        assert_eq!(
            render_markdown("`**not bold** <b>`"),
            "<code>**not bold** &lt;b&gt;</code>"
        );
    }

    #[test]
    fn test_fenced_code_keeps_language_and_newlines() {
        let html = render_markdown("```rust\nlet x = *y*;\nfoo()\n```\nafter");
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">let x = *y*;\nfoo()</code></pre><br>after"
        );
    }

    #[test]
    fn test_fenced_code_without_language() {
        assert_eq!(
            render_markdown("```\n_x_\n```"),
            "<pre><code>_x_</code></pre>"
        );
    }

    #[test]
    fn test_link() {
        assert_eq!(
            render_markdown("[home](https://example.com/?a=1&b=2)"),
            "<a href=\"https://example.com/?a=1&amp;b=2\">home</a>"
        );
    }

    #[test]
    fn test_script_scheme_link_is_text() {
        assert_eq!(render_markdown("[x](javascript:alert(1))"), "x)");
        assert_eq!(render_markdown("[y](JavaScript:void)"), "y");
        assert_eq!(render_markdown("[z](data:text/html,hi)"), "z");
    }

    #[test]
    fn test_attribute_quotes_cannot_escape_href() {
        let html = render_markdown("[a](https://x.test/\"onmouseover=\"alert)");
        assert!(!html.contains("\"onmouseover"));
    }

    #[test]
    fn test_nul_cannot_forge_placeholder() {
        assert_eq!(render_markdown("\u{0}0\u{0}"), "\u{FFFD}0\u{FFFD}");
    }

    proptest! {
        #[test]
        fn prop_no_raw_markup_survives(input in "[ -~\n]{0,200}") {
            let html = render_markdown(&input);
            prop_assert!(!html.contains("<script"));
            prop_assert!(!html.contains("href=\"javascript:"));
            let stripped = ["<strong>", "</strong>", "<em>", "</em>", "<del>", "</del>",
                "<code>", "</code>", "<pre>", "</pre>", "<br>", "</a>"]
                .iter()
                .fold(html.clone(), |acc, tag| acc.replace(tag, ""));
            for (idx, _) in stripped.match_indices('<') {
                let rest = &stripped[idx..];
                prop_assert!(rest.starts_with("<a href=\"") || rest.starts_with("<code class=\"language-"),
                    "unexpected tag in {html:?}");
            }
        }
    }
}
