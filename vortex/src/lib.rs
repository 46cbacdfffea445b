// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    build_client,
    describe_error,
    format_notification_line,
    format_reply,
    format_topic_line,
    resolve_data_dir,
    strip_tags,
};
