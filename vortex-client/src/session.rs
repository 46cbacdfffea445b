use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use url::Url;

/// Key the cookie snapshot is stored under.
pub const COOKIE_SNAPSHOT_KEY: &str = "cookies.json";

/// One cookie, as persisted: a flat record with the site's attributes.
/// `expiry` is a unix timestamp; `None` means a session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expiry: Option<i64>,
    pub secure: bool,
    #[serde(rename = "http-only")]
    pub http_only: bool,
}

/// Key-value persistence boundary for the cookie snapshot. The store
/// only ever sees an opaque string; the snapshot is overwritten
/// wholesale, never merged.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Preferences-style store: one file per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(key), value)
    }
}

/// The shared cookie store. One instance per process, handed to the
/// HTTP client as its cookie provider and to the session manager for
/// snapshotting. All access goes through the interior lock; a snapshot
/// is taken under a single read acquisition so it can never observe a
/// half-applied response.
#[derive(Default)]
pub struct Jar {
    cookies: RwLock<Vec<CookieRecord>>,
}

impl Jar {
    pub fn snapshot(&self) -> Vec<CookieRecord> {
        let now = unix_now();
        self.cookies
            .read()
            .unwrap()
            .iter()
            .filter(|c| !expired(c, now))
            .cloned()
            .collect()
    }

    /// Replace the whole store with a previously persisted snapshot.
    pub fn restore(&self, records: Vec<CookieRecord>) {
        let now = unix_now();
        let mut cookies = self.cookies.write().unwrap();
        *cookies = records.into_iter().filter(|c| !expired(c, now)).collect();
    }

    fn upsert(cookies: &mut Vec<CookieRecord>, record: CookieRecord, now: i64) {
        cookies.retain(|c| {
            !(c.name == record.name && c.domain == record.domain && c.path == record.path)
        });
        if !expired(&record, now) {
            cookies.push(record);
        }
    }
}

impl reqwest::cookie::CookieStore for Jar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let now = unix_now();
        let default_domain = url.host_str().unwrap_or_default().to_string();
        let mut cookies = self.cookies.write().unwrap();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else { continue };
            let parsed = match cookie::Cookie::parse(raw.to_string()) {
                Ok(parsed) => parsed,
                Err(error) => {
                    debug!(%error, "ignoring unparsable Set-Cookie header");
                    continue;
                }
            };
            let expiry = parsed
                .max_age()
                .map(|age| now + age.whole_seconds())
                .or_else(|| parsed.expires_datetime().map(|t| t.unix_timestamp()));
            let record = CookieRecord {
                name: parsed.name().to_string(),
                value: parsed.value().to_string(),
                domain: parsed
                    .domain()
                    .map(|d| d.trim_start_matches('.').to_string())
                    .unwrap_or_else(|| default_domain.clone()),
                path: parsed.path().unwrap_or("/").to_string(),
                expiry,
                secure: parsed.secure().unwrap_or(false),
                http_only: parsed.http_only().unwrap_or(false),
            };
            Self::upsert(&mut cookies, record, now);
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let now = unix_now();
        let host = url.host_str()?;
        let https = url.scheme() == "https";
        let path = url.path();
        let header = self
            .cookies
            .read()
            .unwrap()
            .iter()
            .filter(|c| !expired(c, now))
            .filter(|c| domain_matches(host, &c.domain))
            .filter(|c| path_matches(path, &c.path))
            .filter(|c| https || !c.secure)
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn expired(cookie: &CookieRecord, now: i64) -> bool {
    cookie.expiry.is_some_and(|e| e <= now)
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/')
                || request_path.as_bytes().get(cookie_path.len()) == Some(&b'/')))
}

/// Owns cookie persistence for the process: preloads the persisted
/// snapshot into the jar at construction, and writes the jar back out
/// after a confirmed sign-in. A failed write is reported and swallowed;
/// the in-memory jar stays correct either way.
pub struct Session {
    jar: Arc<Jar>,
    store: Arc<dyn SnapshotStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        let session = Self {
            jar: Arc::new(Jar::default()),
            store,
        };
        session.restore();
        session
    }

    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }

    fn restore(&self) {
        let Some(raw) = self.store.get(COOKIE_SNAPSHOT_KEY) else {
            return;
        };
        match serde_json::from_str::<Vec<CookieRecord>>(&raw) {
            Ok(records) => {
                debug!(count = records.len(), "restored cookie snapshot");
                self.jar.restore(records);
            }
            Err(error) => warn!(%error, "ignoring unreadable cookie snapshot"),
        }
    }

    pub fn persist(&self) {
        let snapshot = self.jar.snapshot();
        let json = match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "could not serialize cookie snapshot");
                return;
            }
        };
        match self.store.set(COOKIE_SNAPSHOT_KEY, &json) {
            Ok(()) => debug!(count = snapshot.len(), "persisted cookie snapshot"),
            Err(error) => warn!(%error, "failed to persist cookie snapshot"),
        }
    }
}
