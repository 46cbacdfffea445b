use crate::problem::Problem;
use reqwest::StatusCode;
use url::Url;

/// What a state-changing request came back as. Produced once per
/// mutating call and consumed immediately; there is no retry state.
#[derive(Debug)]
pub enum MutationOutcome {
    /// The site confirmed the action by redirecting somewhere else.
    /// The landing page is fetched with a fresh GET.
    Redirected(Url),
    /// The site re-rendered the page with inline error text.
    InlineFailure(Problem),
    /// A status the mutation conventions don't account for.
    TransportFailure { status: u16, reason: String },
}

#[derive(Debug, PartialEq)]
pub(crate) enum Verdict {
    Confirmed(Url),
    Rejected,
}

/// The redirect-confirmation rule. A successful action always ends in a
/// redirect away from the request URI; a redirect back to the request
/// URI is the site re-prompting, and any non-redirect status means the
/// page was re-rendered inline. A redirect to a third, unexpected
/// location still counts as confirmation — the site occasionally lands
/// somewhere other than the canonical resource (e.g. `/` after signin).
pub(crate) fn verdict(request_url: &Url, status: StatusCode, location: Option<&str>) -> Verdict {
    if !status.is_redirection() {
        return Verdict::Rejected;
    }
    let Some(location) = location else {
        return Verdict::Rejected;
    };
    let Ok(target) = request_url.join(location) else {
        return Verdict::Rejected;
    };
    if same_resource(&target, request_url) {
        Verdict::Rejected
    } else {
        Verdict::Confirmed(target)
    }
}

/// Fragments don't survive the Location header; compare everything else.
fn same_resource(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin() && a.path() == b.path() && a.query() == b.query()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn redirect_elsewhere_confirms() {
        let request = url("https://www.v2ex.com/signin");
        let verdict = verdict(&request, StatusCode::FOUND, Some("/t/123"));
        assert_eq!(verdict, Verdict::Confirmed(url("https://www.v2ex.com/t/123")));
    }

    #[test]
    fn redirect_to_the_request_url_rejects() {
        let request = url("https://www.v2ex.com/signin");
        assert_eq!(
            verdict(&request, StatusCode::FOUND, Some("/signin")),
            Verdict::Rejected
        );
        assert_eq!(
            verdict(
                &request,
                StatusCode::FOUND,
                Some("https://www.v2ex.com/signin")
            ),
            Verdict::Rejected
        );
    }

    #[test]
    fn non_redirect_status_rejects() {
        let request = url("https://www.v2ex.com/t/1");
        assert_eq!(verdict(&request, StatusCode::OK, None), Verdict::Rejected);
        assert_eq!(
            verdict(&request, StatusCode::OK, Some("/t/2")),
            Verdict::Rejected
        );
    }

    #[test]
    fn redirect_without_location_rejects() {
        let request = url("https://www.v2ex.com/new");
        assert_eq!(verdict(&request, StatusCode::FOUND, None), Verdict::Rejected);
    }

    #[test]
    fn redirect_to_a_third_location_confirms() {
        // open question resolved: follow the site's convention and treat
        // any away-redirect as success
        let request = url("https://www.v2ex.com/mission/daily/redeem?once=9");
        let verdict = verdict(&request, StatusCode::MOVED_PERMANENTLY, Some("/balance"));
        assert_eq!(
            verdict,
            Verdict::Confirmed(url("https://www.v2ex.com/balance"))
        );
    }

    #[test]
    fn query_differences_are_not_the_same_resource() {
        let request = url("https://www.v2ex.com/signin?next=/");
        assert_eq!(
            verdict(&request, StatusCode::FOUND, Some("/signin")),
            Verdict::Confirmed(url("https://www.v2ex.com/signin"))
        );
    }
}
