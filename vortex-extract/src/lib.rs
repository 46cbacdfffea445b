pub mod document;
pub mod error;
pub mod mapper;

pub use document::{Document, Mode, Scope};
pub use error::{ExtractError, Reason};
pub use mapper::FromHtml;
