//! Page schemas: one `FromHtml` impl per server-rendered page the client
//! reads. Paths are CSS selectors over the site's markup; every page
//! that offers a mutating action also exposes its one-time `once` token
//! here, which callers must thread into the follow-up call themselves.

use chrono::{DateTime, FixedOffset};
use vortex_extract::error::Result;
use vortex_extract::{FromHtml, Scope};

/// Shared pagination state, read off the page-jump range input. The
/// input is absent on single-page listings; both counters then settle
/// at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: i64,
    pub maximum_page: i64,
}

impl FromHtml for Pagination {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        let current = scope
            .optional("current_page", "input.page_input")
            .int_attr("min")?
            .max(1);
        let maximum = scope
            .optional("maximum_page", "input.page_input")
            .int_attr("max")?
            .max(current);
        Ok(Self {
            current_page: current,
            maximum_page: maximum,
        })
    }
}

/// One topic cell as rendered on `/`, `/recent`, `/go/{node}`,
/// `/my/following` and `/my/topics`.
#[derive(Debug, Clone)]
pub struct TopicItem {
    pub title: String,
    pub link: String,
    pub author: String,
    pub author_link: String,
    pub avatar: String,
    pub node_name: String,
    pub node_link: String,
    pub replies: i64,
    pub created: Option<DateTime<FixedOffset>>,
    pub created_text: String,
    pub last_reply_by: String,
}

impl FromHtml for TopicItem {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            title: scope.required("title", "span.item_title a").text()?,
            link: scope.required("link", "span.item_title a").attr("href")?,
            author: scope
                .required("author", "span.topic_info strong:first-of-type a")
                .text()?,
            author_link: scope
                .required("author_link", "span.topic_info strong:first-of-type a")
                .attr("href")?,
            avatar: scope.optional("avatar", "td img.avatar").attr("src")?,
            // node listings drop the node link from each cell
            node_name: scope.optional("node_name", "span.topic_info a.node").text()?,
            node_link: scope
                .optional("node_link", "span.topic_info a.node")
                .attr("href")?,
            replies: scope.optional("replies", "a.count_livid").int()?,
            created: scope
                .optional("created", "span.topic_info span[title]")
                .datetime_attr("title")?,
            created_text: scope
                .optional("created_text", "span.topic_info span[title]")
                .text()?,
            last_reply_by: scope
                .optional("last_reply_by", "span.topic_info strong:nth-of-type(2) a")
                .text()?,
        })
    }
}

/// Any of the topic-cell listings. The tab pages, the node pages and the
/// account pages all share this shape.
#[derive(Debug)]
pub struct TopicListing {
    pub pagination: Pagination,
    pub items: Vec<TopicItem>,
}

impl FromHtml for TopicListing {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            pagination: Pagination::from_html(scope)?,
            items: scope.list("items", "div.cell.item")?,
        })
    }
}

/// Author card in a topic or reply header.
#[derive(Debug, Clone)]
pub struct MemberCard {
    pub username: String,
    pub link: String,
    pub avatar: String,
}

impl FromHtml for MemberCard {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            username: scope.required("username", "small.gray a").text()?,
            link: scope.required("link", "small.gray a").attr("href")?,
            avatar: scope.optional("avatar", "img.avatar").attr("src")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub id: String,
    pub content: String,
    pub username: String,
    pub user_link: String,
    pub avatar: String,
    pub created: Option<DateTime<FixedOffset>>,
    pub created_text: String,
    pub floor: i64,
    pub thanks: i64,
}

impl FromHtml for Reply {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            id: scope
                .root_attr("id")
                .unwrap_or_default()
                .trim_start_matches("r_")
                .to_string(),
            content: scope.optional("content", "div.reply_content").inner_html()?,
            username: scope.required("username", "strong a.dark").text()?,
            user_link: scope.required("user_link", "strong a.dark").attr("href")?,
            avatar: scope.optional("avatar", "img.avatar").attr("src")?,
            created: scope.optional("created", "span.ago").datetime_attr("title")?,
            created_text: scope.optional("created_text", "span.ago").text()?,
            floor: scope.optional("floor", "span.no").int()?,
            thanks: scope.optional("thanks", "span.small.fade").int()?,
        })
    }
}

#[derive(Debug)]
pub struct TopicDetail {
    pub title: String,
    pub content: String,
    pub author: Option<MemberCard>,
    pub node_name: String,
    pub node_link: String,
    pub created: Option<DateTime<FixedOffset>>,
    /// Token for replying, voting and favoriting from this page. Absent
    /// when browsing signed out.
    pub once: String,
    pub pagination: Pagination,
    pub replies: Vec<Reply>,
}

impl FromHtml for TopicDetail {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            title: scope.required("title", "div.header h1").text()?,
            content: scope.optional("content", "div.topic_content").inner_html()?,
            author: scope.optional("author", "div.header").nested()?,
            node_name: scope
                .optional("node_name", "div.header a[href^=\"/go/\"]")
                .text()?,
            node_link: scope
                .optional("node_link", "div.header a[href^=\"/go/\"]")
                .attr("href")?,
            created: scope
                .optional("created", "small.gray span[title]")
                .datetime_attr("title")?,
            once: scope.optional("once", "input[name=\"once\"]").attr("value")?,
            pagination: Pagination::from_html(scope)?,
            replies: scope.list("replies", "div[id^=\"r_\"]")?,
        })
    }
}

/// The sign-in form. Field names rotate per page load, so they are data,
/// not constants; the `once` token rotates with them.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub once: String,
    pub username_field: String,
    pub password_field: String,
    pub captcha_field: String,
    captcha_style: String,
}

impl FromHtml for LoginForm {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            once: scope.required("once", "input[name=\"once\"]").attr("value")?,
            username_field: scope
                .required("username_field", "input.sl[type=\"text\"][autofocus]")
                .attr("name")?,
            password_field: scope
                .required("password_field", "input.sl[type=\"password\"]")
                .attr("name")?,
            captcha_field: scope
                .required("captcha_field", "input.sl[type=\"text\"][placeholder]")
                .attr("name")?,
            captcha_style: scope
                .optional("captcha_style", "#captcha-image")
                .attr("style")?,
        })
    }
}

impl LoginForm {
    /// Path of the captcha image, dug out of the inline
    /// `background-image: url('...')` style. The query string is
    /// rebuilt by the caller with the current `once` token.
    pub fn captcha_path(&self) -> String {
        let embedded = self
            .captcha_style
            .split_once("url('")
            .and_then(|(_, rest)| rest.split_once('\''))
            .map(|(path, _)| path);
        let path = embedded.unwrap_or("/_captcha");
        path.split_once('?').map(|(p, _)| p).unwrap_or(path).to_string()
    }
}

#[derive(Debug, Clone)]
pub struct CreateTopicForm {
    pub once: String,
}

impl FromHtml for CreateTopicForm {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            once: scope.required("once", "input[name=\"once\"]").attr("value")?,
        })
    }
}

/// `/mission/daily`. The redeem token is embedded in the button's
/// `onclick` URL rather than a form input.
#[derive(Debug, Clone)]
pub struct DailyMission {
    redeem_onclick: String,
    button_label: String,
    pub streak_text: String,
}

impl FromHtml for DailyMission {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            redeem_onclick: scope
                .optional("redeem", "#Main input[type=\"button\"]")
                .attr("onclick")?,
            button_label: scope
                .optional("state", "#Main input[type=\"button\"]")
                .attr("value")?,
            streak_text: scope.optional("streak", "#Main div.cell span.gray").text()?,
        })
    }
}

impl DailyMission {
    pub fn claimed(&self) -> bool {
        self.button_label.contains("已领取")
    }

    /// The `once` token inside
    /// `location.href = '/mission/daily/redeem?once=123';`.
    pub fn once(&self) -> Option<String> {
        let (_, rest) = self.redeem_onclick.split_once("once=")?;
        let token: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        (!token.is_empty()).then_some(token)
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub summary: String,
    pub username: String,
    pub user_link: String,
    pub avatar: String,
    pub topic_title: String,
    pub topic_link: String,
    pub created_text: String,
    pub payload: String,
}

impl FromHtml for Notification {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            id: scope
                .root_attr("id")
                .unwrap_or_default()
                .trim_start_matches("n_")
                .to_string(),
            summary: scope.optional("summary", "td span.fade").text()?,
            username: scope.required("username", "a strong").text()?,
            user_link: scope
                .required("user_link", "a[href^=\"/member/\"]")
                .attr("href")?,
            avatar: scope.optional("avatar", "td a img.avatar").attr("src")?,
            topic_title: scope.required("topic_title", "a.topic-link").text()?,
            topic_link: scope
                .required("topic_link", "a.topic-link")
                .attr("href")?,
            created_text: scope.optional("created_text", "span.snow").text()?,
            payload: scope.optional("payload", "div.payload").inner_html()?,
        })
    }
}

#[derive(Debug)]
pub struct Notifications {
    pub total: i64,
    pub pagination: Pagination,
    pub items: Vec<Notification>,
}

impl FromHtml for Notifications {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            total: scope
                .optional("total", "#Main div.header strong")
                .int()?,
            pagination: Pagination::from_html(scope)?,
            items: scope.list("items", "div.cell[id^=\"n_\"]")?,
        })
    }
}

/// One card on `/my/nodes`.
#[derive(Debug, Clone)]
pub struct NodeCard {
    pub id: String,
    pub link: String,
    pub title: String,
    pub image: String,
    pub topics: i64,
}

impl FromHtml for NodeCard {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            id: scope
                .root_attr("id")
                .unwrap_or_default()
                .trim_start_matches("n_")
                .to_string(),
            link: scope.root_attr("href").unwrap_or_default().to_string(),
            title: scope.required("title", "div").text()?,
            image: scope.optional("image", "img").attr("src")?,
            topics: scope.optional("topics", "span.fade.f12").int()?,
        })
    }
}

#[derive(Debug)]
pub struct NodeCards {
    pub items: Vec<NodeCard>,
}

impl FromHtml for NodeCards {
    fn from_html(scope: &Scope<'_>) -> Result<Self> {
        Ok(Self {
            items: scope.list("items", "a.grid_item")?,
        })
    }
}
