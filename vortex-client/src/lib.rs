pub mod api;
pub mod error;
pub mod json;
pub mod pages;
pub mod problem;
pub mod protocol;
pub mod response;
pub mod session;

pub use api::{V2ex, V2exBuilder, BASE_URL};
pub use error::ClientError;
pub use problem::Problem;
pub use protocol::MutationOutcome;
pub use response::{Classified, Page};
pub use session::{CookieRecord, FileStore, Jar, Session, SnapshotStore};
