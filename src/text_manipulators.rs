use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    collapse_whitespace(&node.text().collect::<String>())
}

/// Trims and folds every run of whitespace (including `&nbsp;`) into a
/// single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// sports-reference ships most secondary tables inside HTML comments and
/// un-comments them client side. Dropping the comment markers makes those
/// tables visible to a plain HTML parser.
pub fn reveal_commented_markup(html: &str) -> String {
    html.replace("<!--", "").replace("-->", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_nbsp() {
        assert_eq!(
            collapse_whitespace("  Position:\n   Power Forward\u{a0} and Center "),
            "Position: Power Forward and Center"
        );
        assert_eq!(collapse_whitespace(" \n\t "), "");
    }

    #[test]
    fn reveals_commented_tables() {
        let html = r#"<div><!-- <table id="totals"></table> --></div>"#;
        assert_eq!(
            reveal_commented_markup(html),
            r#"<div> <table id="totals"></table> </div>"#
        );
    }
}
