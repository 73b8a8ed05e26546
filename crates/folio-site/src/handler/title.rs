use std::sync::LazyLock;

use regex::Regex;

static HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-6](?:\s[^>]*)?>(.*?)</h[1-6]\s*>").expect("invalid heading regex")
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

/// Text of the first `<h1>`..`<h6>` element in `html`.
///
/// Inner markup is stripped, named and numeric entities are decoded and
/// whitespace is collapsed. Returns `None` when there is no heading or it is empty.
pub fn extract_title(html: &str) -> Option<String> {
    let inner = HEADING_PATTERN.captures(html)?.get(1)?.as_str();
    let text = TAG_PATTERN.replace_all(inner, "");
    let title = html_escape::decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_first_heading() {
        let html = "<p>intro</p>\n<h2>Second</h2>\n<h1>First</h1>";
        assert_eq!(extract_title(html), Some("Second".to_owned()));
    }

    #[test]
    fn test_extract_strips_inner_tags_and_attributes() {
        let html = r#"<h1 id="setup" class="title">Set up <code>folio</code></h1>"#;
        assert_eq!(extract_title(html), Some("Set up folio".to_owned()));
    }

    #[test]
    fn test_extract_decodes_entities() {
        assert_eq!(
            extract_title("<h3>Q&amp;A &lt;draft&gt;</h3>"),
            Some("Q&A <draft>".to_owned())
        );
    }

    #[test]
    fn test_extract_decodes_numeric_and_named_entities() {
        assert_eq!(
            extract_title("<h1>Folio&#8217;s guide &mdash; setup&nbsp;notes</h1>"),
            Some("Folio\u{2019}s guide \u{2014} setup notes".to_owned())
        );
        assert_eq!(
            extract_title("<h1>&#x3C;tags&#x3E;</h1>"),
            Some("<tags>".to_owned())
        );
    }

    #[test]
    fn test_extract_multiline_heading() {
        assert_eq!(
            extract_title("<H1>\n  Multi\n  line\n</H1>"),
            Some("Multi line".to_owned())
        );
    }

    #[test]
    fn test_extract_none_without_heading() {
        assert_eq!(extract_title("<p>No heading</p>"), None);
        assert_eq!(extract_title("<h1>  </h1>"), None);
        assert_eq!(extract_title("<header>x</header>"), None);
    }
}
