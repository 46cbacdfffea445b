use crate::error::{ClientError, Result};
use crate::json::{HotTopic, MemberInfo, NodeInfo, NodeSummary, SearchResult};
use crate::pages::{
    CreateTopicForm, DailyMission, LoginForm, NodeCards, Notifications, TopicDetail, TopicListing,
};
use crate::problem::Problem;
use crate::protocol::{verdict, MutationOutcome, Verdict};
use crate::response::{classify, Classified, Page};
use crate::session::{Session, SnapshotStore};
use reqwest::header::{LOCATION, REFERER};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use url::Url;
use vortex_extract::{Document, FromHtml};

pub const BASE_URL: &str = "https://www.v2ex.com";
const SEARCH_URL: &str = "https://www.sov2ex.com/api/search";
const SEARCH_PAGE_SIZE: u32 = 50;

pub type RestrictedHandler = Arc<dyn Fn(&Problem) + Send + Sync>;

pub struct V2exBuilder {
    base: String,
    user_agent: String,
    timeout_secs: u64,
    store: Arc<dyn SnapshotStore>,
    on_restricted: Option<RestrictedHandler>,
}

impl V2exBuilder {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            base: BASE_URL.to_string(),
            user_agent: "Vortex/0.2 (https://github.com/trapdoorsec/vortex)".to_string(),
            timeout_secs: 15,
            store,
            on_restricted: None,
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Called with the problem payload whenever a response turns out to
    /// be access-restricted, before the `Restricted` error is returned.
    pub fn with_restricted_handler(mut self, handler: RestrictedHandler) -> Self {
        self.on_restricted = Some(handler);
        self
    }

    pub fn build(self) -> Result<V2ex> {
        let session = Session::new(self.store);
        // redirects stay un-followed: the confirmation protocol has to
        // see the Location header before deciding anything
        let http = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::none())
            .cookie_provider(session.jar())
            .build()?;
        Ok(V2ex {
            http,
            base: Url::parse(&self.base)?,
            session,
            on_restricted: self.on_restricted,
        })
    }
}

/// The client facade. Reads go straight to the classifier; writes go
/// through the mutation confirmation protocol. All methods borrow
/// `&self` and may run concurrently; the cookie jar is the only shared
/// mutable state underneath.
pub struct V2ex {
    http: reqwest::Client,
    base: Url,
    session: Session,
    on_restricted: Option<RestrictedHandler>,
}

impl V2ex {
    pub fn builder(store: Arc<dyn SnapshotStore>) -> V2exBuilder {
        V2exBuilder::new(store)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ---- JSON endpoints -------------------------------------------------

    pub async fn hot_topics(&self) -> Result<Vec<HotTopic>> {
        self.get_json(self.abs("/api/topics/hot.json")?).await
    }

    pub async fn node_info(&self, name: &str) -> Result<NodeInfo> {
        let mut url = self.abs("/api/nodes/show.json")?;
        url.query_pairs_mut().append_pair("name", name);
        self.get_json(url).await
    }

    pub async fn all_nodes(&self) -> Result<Vec<NodeSummary>> {
        self.get_json(self.abs("/api/nodes/s2.json")?).await
    }

    pub async fn member_info(&self, username: &str) -> Result<MemberInfo> {
        let mut url = self.abs("/api/members/show.json")?;
        url.query_pairs_mut().append_pair("username", username);
        self.get_json(url).await
    }

    pub async fn search(&self, keyword: &str, from: u32, sort: &str) -> Result<SearchResult> {
        let mut url = Url::parse(SEARCH_URL)?;
        url.query_pairs_mut()
            .append_pair("q", keyword)
            .append_pair("from", &from.to_string())
            .append_pair("sort", sort)
            .append_pair("size", &SEARCH_PAGE_SIZE.to_string());
        self.get_json(url).await
    }

    // ---- HTML reads -----------------------------------------------------

    pub async fn tab_topics(&self, tab: Option<&str>) -> Result<Page<TopicListing>> {
        let mut url = self.abs("/")?;
        if let Some(tab) = tab {
            url.query_pairs_mut().append_pair("tab", tab);
        }
        self.fetch_page(url, Some("/")).await
    }

    pub async fn recent_topics(&self, page: i64) -> Result<Page<TopicListing>> {
        self.fetch_page(self.paged("/recent", page)?, None).await
    }

    pub async fn node_topics(&self, node: &str, page: i64) -> Result<Page<TopicListing>> {
        self.fetch_page(self.paged(&format!("/go/{node}"), page)?, None)
            .await
    }

    pub async fn topic(&self, topic_id: &str, page: i64) -> Result<Page<TopicDetail>> {
        self.fetch_page(self.paged(&format!("/t/{topic_id}"), page)?, None)
            .await
    }

    pub async fn notifications(&self, page: i64) -> Result<Page<Notifications>> {
        self.fetch_page(self.paged("/notifications", page)?, None)
            .await
    }

    pub async fn following(&self, page: i64) -> Result<Page<TopicListing>> {
        self.fetch_page(self.paged("/my/following", page)?, None)
            .await
    }

    pub async fn my_topics(&self, page: i64) -> Result<Page<TopicListing>> {
        self.fetch_page(self.paged("/my/topics", page)?, None).await
    }

    pub async fn my_nodes(&self) -> Result<Page<NodeCards>> {
        self.fetch_page(self.abs("/my/nodes")?, None).await
    }

    pub async fn daily_mission(&self) -> Result<Page<DailyMission>> {
        self.fetch_page(self.abs("/mission/daily")?, None).await
    }

    pub async fn login_form(&self) -> Result<Page<LoginForm>> {
        self.fetch_page(self.abs("/signin?next=/")?, Some("/")).await
    }

    pub async fn create_topic_form(&self) -> Result<Page<CreateTopicForm>> {
        self.fetch_page(self.abs("/new")?, None).await
    }

    /// The captcha image for a freshly fetched sign-in form.
    pub async fn captcha_image(&self, form: &LoginForm) -> Result<Vec<u8>> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut url = self.abs(&form.captcha_path())?;
        url.query_pairs_mut()
            .append_pair("once", &form.once)
            .append_pair("now", &now.to_string());
        debug!(%url, "GET captcha");
        let response = self
            .http
            .get(url)
            .header(REFERER, self.abs("/signin")?.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- mutations ------------------------------------------------------

    /// Sign in with the rotating field names and token from `form`. On
    /// confirmation the landing page is returned and the cookie snapshot
    /// is written out; a failed write never fails the login.
    pub async fn login(
        &self,
        form: &LoginForm,
        username: &str,
        password: &str,
        captcha: &str,
    ) -> Result<Page<TopicListing>> {
        let params = [
            (form.username_field.as_str(), username),
            (form.password_field.as_str(), password),
            (form.captcha_field.as_str(), captcha),
            ("once", form.once.as_str()),
            ("next", "/"),
        ];
        let page = self.confirm_form("/signin", &params, "/signin").await?;
        self.session.persist();
        Ok(page)
    }

    pub async fn reply(&self, topic_id: &str, content: &str, once: &str) -> Result<Page<TopicDetail>> {
        let path = format!("/t/{topic_id}");
        self.confirm_form(&path, &[("content", content), ("once", once)], &path)
            .await
    }

    pub async fn create_topic(
        &self,
        title: &str,
        content: &str,
        node_name: &str,
        once: &str,
    ) -> Result<Page<TopicDetail>> {
        let params = [
            ("title", title),
            ("syntax", "default"),
            ("content", content),
            ("node_name", node_name),
            ("once", once),
        ];
        self.confirm_form("/new", &params, "/new").await
    }

    /// Redeem the daily check-in with the token from `daily_mission`.
    pub async fn check_in(&self, once: &str) -> Result<Page<DailyMission>> {
        self.toggle("/mission/daily/redeem", once, "/mission/daily")
            .await
    }

    pub async fn favorite_topic(&self, topic_id: &str, once: &str) -> Result<Page<TopicDetail>> {
        self.toggle(&format!("/favorite/topic/{topic_id}"), once, &format!("/t/{topic_id}"))
            .await
    }

    pub async fn unfavorite_topic(&self, topic_id: &str, once: &str) -> Result<Page<TopicDetail>> {
        self.toggle(&format!("/unfavorite/topic/{topic_id}"), once, &format!("/t/{topic_id}"))
            .await
    }

    /// Ignoring a topic lands back on the front page.
    pub async fn ignore_topic(&self, topic_id: &str, once: &str) -> Result<Page<TopicListing>> {
        self.toggle(&format!("/ignore/topic/{topic_id}"), once, &format!("/t/{topic_id}"))
            .await
    }

    pub async fn unignore_topic(&self, topic_id: &str, once: &str) -> Result<Page<TopicListing>> {
        self.toggle(&format!("/unignore/topic/{topic_id}"), once, &format!("/t/{topic_id}"))
            .await
    }

    /// Node favorites land on the node's own listing.
    pub async fn favorite_node(&self, node_id: &str, once: &str) -> Result<Page<TopicListing>> {
        self.toggle(&format!("/favorite/node/{node_id}"), once, "/my/nodes")
            .await
    }

    pub async fn unfavorite_node(&self, node_id: &str, once: &str) -> Result<Page<TopicListing>> {
        self.toggle(&format!("/unfavorite/node/{node_id}"), once, "/my/nodes")
            .await
    }

    // ---- plumbing -------------------------------------------------------

    fn abs(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn paged(&self, path: &str, page: i64) -> Result<Url> {
        let mut url = self.abs(path)?;
        if page > 1 {
            url.query_pairs_mut().append_pair("p", &page.to_string());
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET json");
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    async fn fetch_page<T: FromHtml>(&self, url: Url, referer: Option<&str>) -> Result<Page<T>> {
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, self.abs(referer)?.to_string());
        }
        let response = request.send().await?;
        self.read_page(response).await
    }

    /// Classify a read response. The site answers reads with 200 and
    /// encodes any trouble in the body; a redirect here means the page
    /// is behind the login wall.
    async fn read_page<T: FromHtml>(&self, response: reqwest::Response) -> Result<Page<T>> {
        let status = response.status();
        let url = response.url().clone();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if location.contains("/signin") {
                return Err(self.problem_error(Problem::from_login_redirect()));
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason: format!("unexpected redirect to {location}"),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason: "page fetch failed".to_string(),
            });
        }
        let body = response.text().await?;
        let doc = Document::parse(&body);
        match classify::<T>(&doc)? {
            Classified::Success(data) => Ok(Page { data, url }),
            Classified::Problem(problem) => Err(self.problem_error(problem)),
        }
    }

    async fn confirm_form<T: FromHtml>(
        &self,
        path: &str,
        form: &[(&str, &str)],
        referer: &str,
    ) -> Result<Page<T>> {
        let url = self.abs(path)?;
        debug!(%url, "POST");
        let request = self
            .http
            .post(url.clone())
            .header(REFERER, self.abs(referer)?.to_string())
            .form(form);
        self.confirm(request, url).await
    }

    /// Token-bearing GET mutations (`?once=` actions).
    async fn toggle<T: FromHtml>(&self, path: &str, once: &str, referer: &str) -> Result<Page<T>> {
        let mut url = self.abs(path)?;
        url.query_pairs_mut().append_pair("once", once);
        debug!(%url, "GET action");
        let request = self
            .http
            .get(url.clone())
            .header(REFERER, self.abs(referer)?.to_string());
        self.confirm(request, url).await
    }

    /// Drive one mutating request through the confirmation protocol.
    /// The follow-up GET is issued only after the initial response has
    /// been fully received and judged.
    async fn confirm<T: FromHtml>(
        &self,
        request: reqwest::RequestBuilder,
        request_url: Url,
    ) -> Result<Page<T>> {
        let response = request.send().await?;
        match self.outcome(&request_url, response).await? {
            MutationOutcome::Redirected(target) => {
                debug!(%target, "action confirmed, following redirect");
                let response = self.http.get(target).send().await?;
                self.read_page(response).await
            }
            MutationOutcome::InlineFailure(problem) => Err(self.problem_error(problem)),
            MutationOutcome::TransportFailure { status, reason } => {
                Err(ClientError::Status { status, reason })
            }
        }
    }

    async fn outcome(&self, request_url: &Url, response: reqwest::Response) -> Result<MutationOutcome> {
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        match verdict(request_url, status, location.as_deref()) {
            Verdict::Confirmed(target) => Ok(MutationOutcome::Redirected(target)),
            Verdict::Rejected => {
                let body = response.text().await?;
                let problem = Problem::from_document(&Document::parse(&body))?;
                if problem.is_empty() {
                    Ok(MutationOutcome::TransportFailure {
                        status: status.as_u16(),
                        reason: "action did not redirect".to_string(),
                    })
                } else {
                    Ok(MutationOutcome::InlineFailure(problem))
                }
            }
        }
    }

    fn problem_error(&self, problem: Problem) -> ClientError {
        if problem.is_restricted() {
            if let Some(handler) = &self.on_restricted {
                handler(&problem);
            }
            ClientError::Restricted {
                notice: problem.notice(),
            }
        } else {
            ClientError::Action {
                messages: problem.messages,
            }
        }
    }
}
