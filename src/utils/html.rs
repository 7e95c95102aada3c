// src/utils/html.rs

//! Small DOM helpers over `scraper` element references.

use scraper::node::Node;
use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

/// Parse a CSS selector, mapping failures into `AppError`.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// A child of an element seen as inline content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// A text node
    Text(&'a str),
    /// A `<br>` line break
    Break,
    /// Any other element
    Element(ElementRef<'a>),
}

/// Read-only traversal helpers shared by the page parsers.
pub trait NodeExt<'a> {
    /// Text of every descendant text node, each trimmed, concatenated.
    fn stripped_text(&self) -> String;

    /// First following sibling element with the given tag name.
    fn next_sibling_named(&self, name: &str) -> Option<ElementRef<'a>>;

    /// Direct children as inline fragments. Comments and other node kinds
    /// are skipped.
    fn fragments(&self) -> Vec<Fragment<'a>>;

    /// First descendant matching `selector`.
    fn first(&self, selector: &Selector) -> Option<ElementRef<'a>>;
}

impl<'a> NodeExt<'a> for ElementRef<'a> {
    fn stripped_text(&self) -> String {
        self.text().map(str::trim).collect()
    }

    fn next_sibling_named(&self, name: &str) -> Option<ElementRef<'a>> {
        self.next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == name)
    }

    fn fragments(&self) -> Vec<Fragment<'a>> {
        self.children()
            .filter_map(|child| match child.value() {
                Node::Text(text) => Some(Fragment::Text(&**text)),
                Node::Element(el) if el.name() == "br" => Some(Fragment::Break),
                Node::Element(_) => ElementRef::wrap(child).map(Fragment::Element),
                _ => None,
            })
            .collect()
    }

    fn first(&self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.select(selector).next()
    }
}

/// Cell texts of every non-empty `tr` under `table`, header row included.
pub fn table_rows(table: ElementRef<'_>) -> Result<Vec<Vec<String>>> {
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("td, th")?;

    Ok(table
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| cell.stripped_text())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::*;

    fn root(html: &Html) -> ElementRef<'_> {
        html.root_element()
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("#mainContent > div:nth-child(4)").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_stripped_text_trims_each_piece() {
        let html = Html::parse_fragment("<p>  期中考 <b> 筆試 </b>\n</p>");
        let p = root(&html).first(&parse_selector("p").unwrap()).unwrap();
        assert_eq!(p.stripped_text(), "期中考筆試");
    }

    #[test]
    fn test_next_sibling_named_skips_other_tags() {
        let html = Html::parse_fragment("<div><h2>A</h2><span>x</span><p>body</p></div>");
        let h2 = root(&html).first(&parse_selector("h2").unwrap()).unwrap();
        let p = h2.next_sibling_named("p").unwrap();
        assert_eq!(p.stripped_text(), "body");
        assert!(p.next_sibling_named("p").is_none());
    }

    #[test]
    fn test_fragments_mark_breaks() {
        let html = Html::parse_fragment("<p>a<br>b<span>c</span></p>");
        let p = root(&html).first(&parse_selector("p").unwrap()).unwrap();
        let fragments = p.fragments();
        assert_eq!(fragments.len(), 4);
        assert_eq!(fragments[0], Fragment::Text("a"));
        assert_eq!(fragments[1], Fragment::Break);
        assert!(matches!(fragments[3], Fragment::Element(_)));
    }

    #[test]
    fn test_table_rows_skips_empty_rows() {
        let html = Html::parse_fragment(
            "<table><tr><th>方式</th><th>比例</th></tr><tr></tr><tr><td> 期中考 </td><td>30</td></tr></table>",
        );
        let table = root(&html).first(&parse_selector("table").unwrap()).unwrap();
        let rows = table_rows(table).unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["方式".to_string(), "比例".to_string()],
                vec!["期中考".to_string(), "30".to_string()],
            ]
        );
    }
}
