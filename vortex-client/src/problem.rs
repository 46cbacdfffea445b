use vortex_extract::{Document, FromHtml, Scope};

/// The problem payload: what the site renders instead of the requested
/// data. Validation failures arrive as a `div.problem` list; a login
/// wall arrives as a sign-in link with a `next` parameter inside the
/// main column.
#[derive(Debug, Default, Clone)]
pub struct Problem {
    pub messages: Vec<String>,
    restricted: Option<String>,
}

impl FromHtml for Problem {
    fn from_html(scope: &Scope<'_>) -> vortex_extract::error::Result<Self> {
        let mut messages = scope.optional("messages", "div.problem ul li").texts()?;
        if messages.is_empty() {
            // some pages render the problem box without a list
            let flat = scope.optional("problem", "div.problem").text()?;
            if !flat.is_empty() {
                messages.push(flat);
            }
        }
        let wall = scope
            .optional("restricted", "#Main a[href^=\"/signin?next=\"]")
            .text()?;
        Ok(Self {
            messages,
            restricted: (!wall.is_empty()).then_some(wall),
        })
    }
}

impl Problem {
    pub fn from_document(doc: &Document) -> vortex_extract::error::Result<Self> {
        doc.map()
    }

    /// A read that bounced to the sign-in page never produced a body to
    /// map; synthesize the restriction from the redirect itself.
    pub(crate) fn from_login_redirect() -> Self {
        Self {
            messages: Vec::new(),
            restricted: Some("你要查看的页面需要先登录".to_string()),
        }
    }

    /// True when the page carries neither error text nor a login wall —
    /// i.e. this is not a problem payload at all.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.restricted.is_none()
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted.is_some()
    }

    pub fn notice(&self) -> String {
        self.restricted
            .clone()
            .unwrap_or_else(|| "需要登录后才能查看".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_list_is_collected() {
        let doc = Document::parse(
            r#"<div class="problem">请解决以下问题：
                 <ul><li>内容不能为空</li><li>验证码错误</li></ul>
               </div>"#,
        );
        let problem = Problem::from_document(&doc).unwrap();
        assert_eq!(problem.messages, vec!["内容不能为空", "验证码错误"]);
        assert!(!problem.is_restricted());
    }

    #[test]
    fn flat_problem_box_without_list() {
        let doc = Document::parse(r#"<div class="problem">登录有点问题</div>"#);
        let problem = Problem::from_document(&doc).unwrap();
        assert_eq!(problem.messages, vec!["登录有点问题"]);
    }

    #[test]
    fn login_wall_sets_the_restricted_marker() {
        let doc = Document::parse(
            r#"<div id="Main"><div class="box"><div class="inner">
                 <p>你要查看的页面需要先 <a href="/signin?next=/my/topics">登录</a></p>
               </div></div></div>"#,
        );
        let problem = Problem::from_document(&doc).unwrap();
        assert!(problem.is_restricted());
        assert!(problem.messages.is_empty());
    }

    #[test]
    fn ordinary_page_is_empty() {
        let doc = Document::parse(r#"<div id="Main"><div class="cell item">data</div></div>"#);
        let problem = Problem::from_document(&doc).unwrap();
        assert!(problem.is_empty());
    }
}
