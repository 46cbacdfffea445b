use crate::error::Reason;
use scraper::{ElementRef, Html, Selector};

/// How the raw string is pulled out of a matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'m> {
    /// Concatenated text content, entities decoded.
    Text,
    /// The named attribute's value.
    Attr(&'m str),
    /// Serialized markup of the node's children.
    InnerHtml,
    /// Serialized markup of the node itself.
    OuterHtml,
}

/// A response body parsed exactly once. The tree is immutable and is
/// dropped as soon as the mapping that owns it returns.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn scope(&self) -> Scope<'_> {
        Scope {
            root: self.html.root_element(),
        }
    }
}

/// An evaluation scope: either a whole document or a single container
/// node. Path expressions run against descendants of the root, so nested
/// schemas see only their own item's subtree.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    root: ElementRef<'a>,
}

impl<'a> Scope<'a> {
    pub(crate) fn rooted(root: ElementRef<'a>) -> Self {
        Self { root }
    }

    /// All nodes matched by `path`, in document order.
    pub fn select(&self, path: &str) -> Result<Vec<ElementRef<'a>>, Reason> {
        let selector =
            Selector::parse(path).map_err(|e| Reason::BadSelector(e.to_string()))?;
        Ok(self.root.select(&selector).collect())
    }

    /// The path extractor contract: zero or more raw strings for `path`
    /// under the given mode. Nodes without the requested attribute
    /// contribute nothing.
    pub fn extract(&self, path: &str, mode: Mode<'_>) -> Result<Vec<String>, Reason> {
        Ok(self
            .select(path)?
            .into_iter()
            .filter_map(|node| apply(node, mode))
            .collect())
    }

    /// Attribute of the scope's own root node. List containers carry
    /// their identity here (`id="r_123"` on a reply cell).
    pub fn root_attr(&self, name: &str) -> Option<&'a str> {
        self.root.value().attr(name)
    }
}

pub(crate) fn apply(node: ElementRef<'_>, mode: Mode<'_>) -> Option<String> {
    match mode {
        Mode::Text => Some(node.text().collect::<String>()),
        Mode::Attr(name) => node.value().attr(name).map(str::to_string),
        Mode::InnerHtml => Some(node.inner_html()),
        Mode::OuterHtml => Some(node.html()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_in_document_order() {
        let doc = Document::parse("<ul><li>one</li><li>two</li><li>three</li></ul>");
        let values = doc.scope().extract("li", Mode::Text).unwrap();
        assert_eq!(values, vec!["one", "two", "three"]);
    }

    #[test]
    fn extract_decodes_entities() {
        let doc = Document::parse("<p>a &amp; b &lt;c&gt;</p>");
        let values = doc.scope().extract("p", Mode::Text).unwrap();
        assert_eq!(values, vec!["a & b <c>"]);
    }

    #[test]
    fn extract_attr_skips_nodes_without_it() {
        let doc = Document::parse(r#"<a>no href</a><a href="/t/1">yes</a>"#);
        let values = doc.scope().extract("a", Mode::Attr("href")).unwrap();
        assert_eq!(values, vec!["/t/1"]);
    }

    #[test]
    fn extract_inner_and_outer_markup() {
        let doc = Document::parse(r#"<div class="c"><b>x</b></div>"#);
        let inner = doc.scope().extract("div.c", Mode::InnerHtml).unwrap();
        assert_eq!(inner, vec!["<b>x</b>"]);
        let outer = doc.scope().extract("div.c", Mode::OuterHtml).unwrap();
        assert_eq!(outer, vec![r#"<div class="c"><b>x</b></div>"#]);
    }

    #[test]
    fn extract_no_match_is_empty_not_error() {
        let doc = Document::parse("<p>x</p>");
        assert!(doc.scope().extract("table", Mode::Text).unwrap().is_empty());
    }

    #[test]
    fn bad_selector_is_reported() {
        let doc = Document::parse("<p>x</p>");
        assert!(matches!(
            doc.scope().extract("p[", Mode::Text),
            Err(Reason::BadSelector(_))
        ));
    }

    #[test]
    fn root_attr_reads_the_container_itself() {
        let doc = Document::parse(r#"<div id="r_42">reply</div>"#);
        let scope = doc.scope();
        let cells = scope.select("div[id^=\"r_\"]").unwrap();
        let item = Scope::rooted(cells[0]);
        assert_eq!(item.root_attr("id"), Some("r_42"));
    }
}
