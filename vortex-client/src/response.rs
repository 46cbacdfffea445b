use crate::problem::Problem;
use url::Url;
use vortex_extract::{Document, ExtractError, FromHtml};

/// A mapped page plus the URL it came from. The URL seeds `Referer`
/// headers on follow-up actions against the same resource.
#[derive(Debug)]
pub struct Page<T> {
    pub data: T,
    pub url: Url,
}

/// What a 200-status body turned out to be. The site returns HTTP 200
/// for both data and error banners; only the node structure tells them
/// apart, so callers pattern-match instead of catching.
#[derive(Debug)]
pub enum Classified<T> {
    Success(T),
    Problem(Problem),
}

/// Try the success schema first; if extraction fails, fall back to the
/// problem schema. A body that satisfies neither surfaces the original
/// extraction error — that means the page layout changed, not that the
/// site said no.
pub fn classify<T: FromHtml>(doc: &Document) -> Result<Classified<T>, ExtractError> {
    match doc.map::<T>() {
        Ok(data) => Ok(Classified::Success(data)),
        Err(extract_error) => {
            let problem = Problem::from_document(doc)?;
            if problem.is_empty() {
                Err(extract_error)
            } else {
                Ok(Classified::Problem(problem))
            }
        }
    }
}
