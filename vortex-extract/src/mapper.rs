use crate::document::{apply, Mode, Scope};
use crate::error::{ExtractError, Reason, Result};
use chrono::{DateTime, FixedOffset};

/// Timestamp format the site puts in `title` attributes,
/// e.g. `2023-05-05 10:23:13 +08:00`.
const TITLE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S %z";

/// A type that can be populated from a document scope. The body of
/// `from_html` is the type's schema: one binding per field, evaluated in
/// declaration order. Mapping is pure; identical markup always yields an
/// identical instance.
pub trait FromHtml: Sized {
    fn from_html(scope: &Scope<'_>) -> Result<Self>;
}

impl crate::document::Document {
    pub fn map<T: FromHtml>(&self) -> Result<T> {
        T::from_html(&self.scope())
    }
}

impl<'a> Scope<'a> {
    /// Binding whose target node must exist.
    pub fn required(&self, field: &'static str, path: &'static str) -> Field<'_, 'a> {
        Field {
            scope: self,
            field,
            path,
            required: true,
        }
    }

    /// Binding that falls back to the target type's zero value when the
    /// node is absent.
    pub fn optional(&self, field: &'static str, path: &'static str) -> Field<'_, 'a> {
        Field {
            scope: self,
            field,
            path,
            required: false,
        }
    }

    /// Map every node matched by `path` through the nested schema `T`.
    /// Each item is evaluated in a scope rooted at its own container, so
    /// relative paths cannot leak across items.
    pub fn list<T: FromHtml>(&self, field: &'static str, path: &'static str) -> Result<Vec<T>> {
        self.select(path)
            .map_err(|reason| ExtractError::new(field, path, reason))?
            .into_iter()
            .map(|node| T::from_html(&Scope::rooted(node)))
            .collect()
    }
}

/// One field binding: path expression, presence policy, and (via the
/// finishing call) extraction mode and target type.
#[derive(Clone, Copy)]
pub struct Field<'s, 'a> {
    scope: &'s Scope<'a>,
    field: &'static str,
    path: &'static str,
    required: bool,
}

impl<'s, 'a> Field<'s, 'a> {
    pub fn text(self) -> Result<String> {
        self.string(Mode::Text)
    }

    pub fn attr(self, name: &str) -> Result<String> {
        self.string(Mode::Attr(name))
    }

    pub fn inner_html(self) -> Result<String> {
        self.string(Mode::InnerHtml)
    }

    pub fn outer_html(self) -> Result<String> {
        self.string(Mode::OuterHtml)
    }

    pub fn int(self) -> Result<i64> {
        self.int_via(Mode::Text)
    }

    pub fn int_attr(self, name: &str) -> Result<i64> {
        self.int_via(Mode::Attr(name))
    }

    /// Parse the named attribute as a site timestamp. `None` is the zero
    /// value for optional bindings.
    pub fn datetime_attr(self, name: &str) -> Result<Option<DateTime<FixedOffset>>> {
        match self.first(Mode::Attr(name))? {
            None => Ok(None),
            Some(raw) => {
                let raw = raw.trim();
                match DateTime::parse_from_str(raw, TITLE_TIMESTAMP) {
                    Ok(ts) => Ok(Some(ts)),
                    Err(_) if self.required => Err(self.err(Reason::FormatError(raw.to_string()))),
                    Err(_) => Ok(None),
                }
            }
        }
    }

    /// Text of every matched node. Zero matches is an error only under
    /// the required policy.
    pub fn texts(self) -> Result<Vec<String>> {
        let values: Vec<String> = self
            .scope
            .extract(self.path, Mode::Text)
            .map_err(|reason| self.err(reason))?
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if values.is_empty() && self.required {
            return Err(self.err(Reason::NoMatch));
        }
        Ok(values)
    }

    /// Map the first matched node through the nested schema `T`.
    pub fn nested<T: FromHtml>(self) -> Result<Option<T>> {
        let nodes = self
            .scope
            .select(self.path)
            .map_err(|reason| self.err(reason))?;
        match nodes.first() {
            Some(node) => Ok(Some(T::from_html(&Scope::rooted(*node))?)),
            None if self.required => Err(self.err(Reason::NoMatch)),
            None => Ok(None),
        }
    }

    fn string(self, mode: Mode<'_>) -> Result<String> {
        Ok(self
            .first(mode)?
            .map(|s| s.trim().to_string())
            .unwrap_or_default())
    }

    fn int_via(self, mode: Mode<'_>) -> Result<i64> {
        match self.first(mode)? {
            None => Ok(0),
            Some(raw) => {
                let raw = raw.trim();
                match raw.parse::<i64>() {
                    Ok(n) => Ok(n),
                    Err(_) if self.required => Err(self.err(Reason::IntFormat(raw.to_string()))),
                    Err(_) => Ok(0),
                }
            }
        }
    }

    /// First matched node only; later matches are ignored by design.
    fn first(self, mode: Mode<'_>) -> Result<Option<String>> {
        let nodes = self
            .scope
            .select(self.path)
            .map_err(|reason| self.err(reason))?;
        match nodes.first() {
            None if self.required => Err(self.err(Reason::NoMatch)),
            None => Ok(None),
            Some(node) => match apply(*node, mode) {
                Some(value) => Ok(Some(value)),
                None => {
                    let Mode::Attr(name) = mode else {
                        return Ok(None);
                    };
                    if self.required {
                        Err(self.err(Reason::MissingAttribute(name.to_string())))
                    } else {
                        Ok(None)
                    }
                }
            },
        }
    }

    fn err(&self, reason: Reason) -> ExtractError {
        ExtractError::new(self.field, self.path, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[derive(Debug)]
    struct Item {
        title: String,
        link: String,
        replies: i64,
    }

    impl FromHtml for Item {
        fn from_html(scope: &Scope<'_>) -> Result<Self> {
            Ok(Self {
                title: scope.required("title", "span.item_title a").text()?,
                link: scope.required("link", "span.item_title a").attr("href")?,
                replies: scope.optional("replies", "a.count_livid").int()?,
            })
        }
    }

    #[derive(Debug)]
    struct Listing {
        current_page: i64,
        maximum_page: i64,
        items: Vec<Item>,
    }

    impl FromHtml for Listing {
        fn from_html(scope: &Scope<'_>) -> Result<Self> {
            Ok(Self {
                current_page: scope.optional("current_page", "input.page_input").int_attr("min")?,
                maximum_page: scope.optional("maximum_page", "input.page_input").int_attr("max")?,
                items: scope.list("items", "div.cell.item")?,
            })
        }
    }

    const LISTING: &str = r#"
        <div id="Wrapper">
          <div class="cell item">
            <span class="item_title"><a href="/t/1">first</a></span>
            <a class="count_livid">7</a>
          </div>
          <div class="cell item">
            <span class="item_title"><a href="/t/2">second</a></span>
          </div>
          <input class="page_input" type="number" min="1" max="42">
        </div>"#;

    #[test]
    fn maps_required_and_optional_fields() {
        let doc = Document::parse(LISTING);
        let listing: Listing = doc.map().unwrap();
        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[0].title, "first");
        assert_eq!(listing.items[0].link, "/t/1");
        assert_eq!(listing.items[0].replies, 7);
    }

    #[test]
    fn list_items_do_not_cross_contaminate() {
        let doc = Document::parse(LISTING);
        let listing: Listing = doc.map().unwrap();
        // the second cell has no reply counter; it must not pick up the
        // first cell's
        assert_eq!(listing.items[1].replies, 0);
        assert_eq!(listing.items[1].title, "second");
    }

    #[test]
    fn range_input_drives_pagination() {
        let doc = Document::parse(LISTING);
        let listing: Listing = doc.map().unwrap();
        assert_eq!(listing.current_page, 1);
        assert_eq!(listing.maximum_page, 42);
    }

    #[test]
    fn absent_range_input_yields_zero_values_without_error() {
        let doc = Document::parse("<div id=\"Wrapper\"></div>");
        let listing: Listing = doc.map().unwrap();
        assert_eq!(listing.current_page, 0);
        assert_eq!(listing.maximum_page, 0);
        assert!(listing.items.is_empty());
    }

    #[test]
    fn required_field_with_zero_matches_fails_the_mapping() {
        let doc = Document::parse(r#"<div class="cell item">no title span</div>"#);
        let error = doc.map::<Listing>().unwrap_err();
        assert_eq!(error.field, "title");
        assert!(matches!(error.reason, Reason::NoMatch));
    }

    #[test]
    fn scalar_fields_take_the_first_match() {
        let doc = Document::parse(
            r#"<div><span class="item_title"><a href="/t/1">one</a></span>
               <span class="item_title"><a href="/t/2">two</a></span></div>"#,
        );
        let scope = doc.scope();
        assert_eq!(scope.required("t", "span.item_title a").text().unwrap(), "one");
    }

    #[test]
    fn required_attr_missing_is_an_error() {
        let doc = Document::parse("<a>bare</a>");
        let error = doc.scope().required("link", "a").attr("href").unwrap_err();
        assert!(matches!(error.reason, Reason::MissingAttribute(_)));
    }

    #[test]
    fn optional_coercion_failure_yields_zero_value() {
        let doc = Document::parse(r#"<a class="count_livid">lots</a>"#);
        assert_eq!(doc.scope().optional("n", "a.count_livid").int().unwrap(), 0);
    }

    #[test]
    fn required_coercion_failure_is_an_error() {
        let doc = Document::parse(r#"<a class="count_livid">lots</a>"#);
        let error = doc.scope().required("n", "a.count_livid").int().unwrap_err();
        assert!(matches!(error.reason, Reason::IntFormat(_)));
    }

    #[test]
    fn title_timestamp_parses() {
        let doc = Document::parse(r#"<span class="ago" title="2023-05-05 10:23:13 +08:00">1 小时前</span>"#);
        let ts = doc
            .scope()
            .optional("when", "span.ago")
            .datetime_attr("title")
            .unwrap()
            .unwrap();
        assert_eq!(ts.timestamp(), 1_683_253_393);
        assert_eq!(ts.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn malformed_timestamp_under_required_policy_fails() {
        let doc = Document::parse(r#"<span class="ago" title="yesterday">x</span>"#);
        let error = doc
            .scope()
            .required("when", "span.ago")
            .datetime_attr("title")
            .unwrap_err();
        assert!(matches!(error.reason, Reason::FormatError(_)));
    }

    #[test]
    fn malformed_timestamp_under_optional_policy_is_none() {
        let doc = Document::parse(r#"<span class="ago" title="yesterday">x</span>"#);
        let ts = doc
            .scope()
            .optional("when", "span.ago")
            .datetime_attr("title")
            .unwrap();
        assert!(ts.is_none());
    }

    #[test]
    fn texts_collects_every_match() {
        let doc = Document::parse("<ul><li>甲</li><li> 乙 </li><li></li></ul>");
        let texts = doc.scope().optional("msgs", "li").texts().unwrap();
        assert_eq!(texts, vec!["甲", "乙"]);
    }

    #[test]
    fn nested_single_schema() {
        struct Header {
            author: String,
        }
        impl FromHtml for Header {
            fn from_html(scope: &Scope<'_>) -> Result<Self> {
                Ok(Self {
                    author: scope.required("author", "small a").text()?,
                })
            }
        }
        let doc = Document::parse(r#"<div class="header"><small><a>alice</a></small></div>"#);
        let header: Option<Header> = doc.scope().optional("header", "div.header").nested().unwrap();
        assert_eq!(header.unwrap().author, "alice");

        let doc = Document::parse("<div></div>");
        let header: Option<Header> = doc.scope().optional("header", "div.header").nested().unwrap();
        assert!(header.is_none());
    }
}
