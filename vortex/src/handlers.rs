use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vortex_client::pages::{Notification, Reply, TopicItem};
use vortex_client::{ClientError, FileStore, V2ex};

// Helper functions for the subcommand handlers

pub fn print_banner() {
    println!(
        "{}",
        r#"
 __   _____  ___ _____ _____  __
 \ \ / / _ \| _ \_   _| __\ \/ /
  \ V / (_) |   / | | | _| >  <
   \_/ \___/|_|_\ |_| |___/_/\_\
"#
        .cyan()
    );
    println!("  v2ex from your terminal · v{}\n", env!("CARGO_PKG_VERSION"));
}

/// Expand `~` in the configured data directory.
pub fn resolve_data_dir(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Build a client whose session is backed by files under `data_dir`.
pub fn build_client(data_dir: &Path) -> anyhow::Result<V2ex> {
    let store = Arc::new(FileStore::new(data_dir));
    Ok(V2ex::builder(store).build()?)
}

/// Strip markup from extracted HTML for terminal display. Entities were
/// already decoded during extraction; only the tags are left to drop.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

pub fn format_topic_line(index: usize, item: &TopicItem) -> String {
    let replies = if item.replies > 0 {
        format!(" [{}]", item.replies).cyan().to_string()
    } else {
        String::new()
    };
    let node = if item.node_name.is_empty() {
        String::new()
    } else {
        format!(" ({})", item.node_name).dimmed().to_string()
    };
    format!(
        "{:>3}. {}{}{}  {}",
        index,
        item.title.bold(),
        replies,
        node,
        item.author.green()
    )
}

pub fn format_reply(reply: &Reply) -> String {
    // prefer the absolute timestamp when the page carried one
    let when = reply
        .created
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| reply.created_text.clone());
    format!(
        "#{} {} {}\n    {}",
        reply.floor,
        reply.username.green(),
        when.dimmed(),
        strip_tags(&reply.content)
    )
}

pub fn format_notification_line(n: &Notification) -> String {
    let payload = strip_tags(&n.payload);
    if payload.is_empty() {
        format!("• {}  {}", n.summary, n.created_text.dimmed())
    } else {
        format!("• {}  {}\n    {}", n.summary, n.created_text.dimmed(), payload)
    }
}

/// One-line rendering of a client failure for the terminal.
pub fn describe_error(error: &ClientError) -> String {
    match error {
        ClientError::Action { messages } => {
            format!("the site rejected the action: {}", messages.join("；"))
        }
        ClientError::Restricted { notice } => {
            format!("{notice} (run `vortex login` first)")
        }
        other => other.to_string(),
    }
}
