//! Inline emphasis for lab transcript messages.
//!
//! Transcript bodies are plain text with three markdown-like markers:
//!
//! | Marker | Output |
//! |---|---|
//! | `**strong**` | `<strong>strong</strong>` |
//! | `*em*` | `<em>em</em>` |
//! | `` `code` `` | `<code>code</code>` |
//!
//! The body is HTML-escaped first, then each marker is replaced pairwise by
//! substring search. A marker without a closing partner is left as literal
//! text. Markers do not nest inside code spans because code is replaced
//! first and its contents are shielded from the later passes.

use maud::{Markup, PreEscaped, html};

/// Escape text for HTML element content.
fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Replace each `marker … marker` pair with `open … close`.
///
/// `shield` is called on the inner text, letting code spans protect their
/// contents from the passes that follow.
fn replace_pairs(
    text: &str,
    marker: &str,
    open: &str,
    close: &str,
    shield: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(marker) {
        let after = &rest[start + marker.len()..];
        match after.find(marker) {
            Some(end) if end > 0 => {
                out.push_str(&rest[..start]);
                out.push_str(open);
                out.push_str(&shield(&after[..end]));
                out.push_str(close);
                rest = &after[end + marker.len()..];
            }
            _ => {
                // unpaired (or empty) marker stays literal
                out.push_str(&rest[..start + marker.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// Private-use placeholders keep code-span contents out of the emphasis passes.
const SHIELD_STAR: char = '\u{E000}';

/// Render a transcript message body to HTML.
pub fn render_emphasis(body: &str) -> String {
    let escaped = escape(body);
    let coded = replace_pairs(&escaped, "`", "<code>", "</code>", |inner| {
        inner.replace('*', &SHIELD_STAR.to_string())
    });
    let strong = replace_pairs(&coded, "**", "<strong>", "</strong>", str::to_string);
    let em = replace_pairs(&strong, "*", "<em>", "</em>", str::to_string);
    em.replace(SHIELD_STAR, "*")
}

/// [`render_emphasis`] wrapped for direct interpolation into Maud templates.
pub fn emphasis_markup(body: &str) -> Markup {
    PreEscaped(render_emphasis(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(render_emphasis("just a message"), "just a message");
    }

    #[test]
    fn strong_em_and_code() {
        assert_eq!(
            render_emphasis("make it **pop**, *now*, with `tween()`"),
            "make it <strong>pop</strong>, <em>now</em>, with <code>tween()</code>"
        );
    }

    #[test]
    fn multiple_pairs_on_one_line() {
        assert_eq!(
            render_emphasis("*a* and *b*"),
            "<em>a</em> and <em>b</em>"
        );
    }

    #[test]
    fn html_is_escaped_before_markup() {
        assert_eq!(
            render_emphasis("<script>**x**</script>"),
            "&lt;script&gt;<strong>x</strong>&lt;/script&gt;"
        );
    }

    #[test]
    fn unpaired_markers_stay_literal() {
        assert_eq!(render_emphasis("5 * 3 = 15"), "5 * 3 = 15");
        assert_eq!(render_emphasis("**open only"), "**open only");
        assert_eq!(render_emphasis("a ` b"), "a ` b");
    }

    #[test]
    fn empty_pair_stays_literal() {
        assert_eq!(render_emphasis("****"), "****");
    }

    #[test]
    fn code_contents_are_not_emphasized() {
        assert_eq!(
            render_emphasis("`a * b * c` is *fine*"),
            "<code>a * b * c</code> is <em>fine</em>"
        );
    }

    #[test]
    fn markup_wrapper_is_pre_escaped() {
        let m = html! { p { (emphasis_markup("**hi**")) } };
        assert_eq!(m.into_string(), "<p><strong>hi</strong></p>");
    }
}
