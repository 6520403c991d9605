//! Session cookie persistence.
//!
//! The panel hands out a session cookie on first contact and expects it back on
//! every later call. Cookies are kept per base URL under a [`SessionKey`]
//! (`md5_hex(base_url)`) in a [`SessionStore`]. [`FileSessionStore`] keeps one
//! Netscape cookie-jar file per key and is what a long-lived deployment wants;
//! [`InMemorySessionStore`] is isolated per instance and suits tests and
//! short-lived tools.
//!
//! Neither store locks across processes. Two clients writing the same cookie
//! file race, and the last writer wins.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use cookie::Cookie;
use dashmap::DashMap;
use url::Url;

use crate::auth::md5_hex;
use crate::{Result, Timestamp};

const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Identifies the cookie jar of one panel.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    #[must_use]
    pub fn for_base_url(base_url: &str) -> Self {
        Self(md5_hex(base_url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cookie as persisted in the jar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCookie {
    /// Host or domain without a leading dot.
    pub domain: String,
    /// Whether the cookie was set with a `Domain` attribute and therefore
    /// also applies to subdomains.
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    /// Unix timestamp, `0` for a session cookie.
    pub expires: Timestamp,
    pub name: String,
    pub value: String,
}

impl StoredCookie {
    fn is_expired(&self, now: Timestamp) -> bool {
        self.expires != 0 && self.expires <= now
    }

    fn matches(&self, url: &Url, now: Timestamp) -> bool {
        if self.is_expired(now) || (self.secure && url.scheme() != "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain_match = host == self.domain
            || (self.include_subdomains
                && host
                    .strip_suffix(self.domain.as_str())
                    .is_some_and(|rest| rest.ends_with('.')));

        domain_match && path_matches(url.path(), &self.path)
    }

    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    fn parse_line(line: &str) -> Option<Self> {
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        let mut fields = line.splitn(7, '\t');
        let domain = fields.next()?;
        let include_subdomains = parse_flag(fields.next()?)?;
        let path = fields.next()?;
        let secure = parse_flag(fields.next()?)?;
        let expires = fields.next()?.parse().ok()?;
        let name = fields.next()?;
        let value = fields.next().unwrap_or_default();

        Some(Self {
            domain: domain.trim_start_matches('.').to_ascii_lowercase(),
            include_subdomains,
            path: path.to_owned(),
            secure,
            http_only,
            expires,
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }

    fn write_line(&self, out: &mut String) {
        if self.http_only {
            out.push_str(HTTP_ONLY_PREFIX);
        }
        if self.include_subdomains {
            out.push('.');
        }
        out.push_str(&self.domain);
        for field in [
            flag(self.include_subdomains),
            self.path.as_str(),
            flag(self.secure),
            &self.expires.to_string(),
            self.name.as_str(),
            self.value.as_str(),
        ] {
            out.push('\t');
            out.push_str(field);
        }
        out.push('\n');
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

const fn flag(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    request_path.strip_prefix(cookie_path).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with('/') || cookie_path.ends_with('/')
    })
}

/// Default cookie path: the request path up to, not including, its last `/`.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_owned(),
        Some(idx) => path.chars().take(idx).collect(),
    }
}

/// The cookies remembered for one panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<StoredCookie>,
}

impl CookieJar {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredCookie> {
        self.cookies.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StoredCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Adds `cookie`, replacing any cookie with the same name, domain and path.
    pub fn insert(&mut self, cookie: StoredCookie) {
        match self.cookies.iter_mut().find(|c| c.same_slot(&cookie)) {
            Some(slot) => *slot = cookie,
            None => self.cookies.push(cookie),
        }
    }

    /// Parses the Netscape cookie-jar text format written by curl and browsers.
    ///
    /// Comment lines, blank lines and malformed entries are skipped.
    #[must_use]
    pub fn from_netscape(text: &str) -> Self {
        let mut jar = Self::default();
        for line in text.lines().map(str::trim_end) {
            if line.is_empty() || (line.starts_with('#') && !line.starts_with(HTTP_ONLY_PREFIX)) {
                continue;
            }
            match StoredCookie::parse_line(line) {
                Some(cookie) => jar.insert(cookie),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(line, "skipping malformed cookie jar line");
                }
            }
        }
        jar
    }

    #[must_use]
    pub fn to_netscape(&self) -> String {
        let mut out = String::from(NETSCAPE_HEADER);
        out.push_str("\n\n");
        for cookie in &self.cookies {
            cookie.write_line(&mut out);
        }
        out
    }

    /// Renders the `Cookie` request header value for `url`, if any cookie applies.
    #[must_use]
    pub fn header_for(&self, url: &Url, now: Timestamp) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| c.matches(url, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        (!pairs.is_empty()).then(|| pairs.join("; "))
    }

    /// Applies one `Set-Cookie` header received from `url`.
    ///
    /// Returns `false` when the header could not be parsed and was ignored.
    pub fn apply_set_cookie(&mut self, url: &Url, header: &str, now: Timestamp) -> bool {
        let Ok(parsed) = Cookie::parse(header) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(header, "ignoring unparsable Set-Cookie header");
            return false;
        };

        let (domain, include_subdomains) = match parsed.domain() {
            Some(domain) => (domain.trim_start_matches('.').to_ascii_lowercase(), true),
            None => (
                url.host_str().unwrap_or_default().to_ascii_lowercase(),
                false,
            ),
        };
        let path = parsed
            .path()
            .filter(|p| p.starts_with('/'))
            .map_or_else(|| default_path(url), str::to_owned);

        let expires = match (parsed.max_age(), parsed.expires_datetime()) {
            (Some(max_age), _) if max_age.whole_seconds() <= 0 => -1,
            (Some(max_age), _) => now.saturating_add(max_age.whole_seconds()),
            (None, Some(at)) => at.unix_timestamp(),
            (None, None) => 0,
        };

        let cookie = StoredCookie {
            domain,
            include_subdomains,
            path,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            expires,
            name: parsed.name().to_owned(),
            value: parsed.value().to_owned(),
        };

        if cookie.is_expired(now) {
            self.cookies.retain(|c| !c.same_slot(&cookie));
        } else {
            self.insert(cookie);
        }
        true
    }
}

/// Persistent storage for per-panel cookie jars.
pub trait SessionStore: fmt::Debug + Send + Sync {
    /// Returns the jar stored under `key`, creating an empty one when absent.
    fn load(&self, key: &SessionKey) -> Result<CookieJar>;

    fn save(&self, key: &SessionKey, jar: &CookieJar) -> Result<()>;
}

/// Stores each jar as `<dir>/<key>.cookie` in Netscape cookie-jar format.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// A store rooted at the current working directory.
    #[must_use]
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &SessionKey) -> PathBuf {
        self.dir.join(format!("{key}.cookie"))
    }
}

impl Default for FileSessionStore {
    fn default() -> Self {
        Self::current_dir()
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, key: &SessionKey) -> Result<CookieJar> {
        let path = self.path_for(key);
        if !path.try_exists()? {
            fs::create_dir_all(&self.dir)?;
            fs::File::create(&path)?;

            #[cfg(feature = "tracing")]
            tracing::debug!(path = %path.display(), "created empty cookie file");

            return Ok(CookieJar::default());
        }

        let text = fs::read_to_string(&path)?;
        Ok(CookieJar::from_netscape(&text))
    }

    fn save(&self, key: &SessionKey, jar: &CookieJar) -> Result<()> {
        fs::write(self.path_for(key), jar.to_netscape())?;
        Ok(())
    }
}

/// Keeps jars in process memory only.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    jars: DashMap<SessionKey, CookieJar>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.jars.contains_key(key)
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &SessionKey) -> Result<CookieJar> {
        Ok(self.jars.entry(key.clone()).or_default().clone())
    }

    fn save(&self, key: &SessionKey, jar: &CookieJar) -> Result<()> {
        self.jars.insert(key.clone(), jar.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Timestamp = 1_700_000_000;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid url")
    }

    fn panel_cookie(name: &str, value: &str) -> StoredCookie {
        StoredCookie {
            domain: "1.2.3.4".to_owned(),
            include_subdomains: false,
            path: "/".to_owned(),
            secure: false,
            http_only: true,
            expires: 0,
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }

    #[test]
    fn session_key_is_md5_of_base_url() {
        let key = SessionKey::for_base_url("https://1.2.3.4:8888");

        assert_eq!(key.as_str(), md5_hex("https://1.2.3.4:8888"));
        assert_eq!(key.to_string().len(), 32);
    }

    #[test]
    fn netscape_format_survives_a_rewrite() {
        let mut jar = CookieJar::default();
        jar.insert(panel_cookie("SESSID", "abc"));
        jar.insert(StoredCookie {
            domain: "panel.example.com".to_owned(),
            include_subdomains: true,
            path: "/site".to_owned(),
            secure: true,
            http_only: false,
            expires: NOW + 60,
            name: "lang".to_owned(),
            value: "en".to_owned(),
        });

        let text = jar.to_netscape();
        assert!(text.starts_with(NETSCAPE_HEADER));
        assert!(text.contains("#HttpOnly_1.2.3.4\tFALSE\t/\tFALSE\t0\tSESSID\tabc\n"));
        assert!(text.contains(".panel.example.com\tTRUE\t/site\tTRUE\t1700000060\tlang\ten\n"));
        assert_eq!(CookieJar::from_netscape(&text), jar);
    }

    #[test]
    fn reads_curl_written_jar() {
        let text = "# Netscape HTTP Cookie File\n\
                    # https://curl.se/docs/http-cookies.html\n\
                    # This file was generated by libcurl! Edit at your own risk.\n\
                    \n\
                    #HttpOnly_1.2.3.4\tFALSE\t/\tFALSE\t0\tSESSID\tabc\n\
                    broken line\n";
        let jar = CookieJar::from_netscape(text);

        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("SESSID").map(|c| c.value.as_str()), Some("abc"));
    }

    #[test]
    fn header_only_includes_matching_cookies() {
        let mut jar = CookieJar::default();
        jar.insert(panel_cookie("SESSID", "abc"));
        jar.insert(StoredCookie {
            secure: true,
            ..panel_cookie("secure_only", "1")
        });
        jar.insert(StoredCookie {
            expires: NOW - 1,
            ..panel_cookie("stale", "1")
        });
        jar.insert(StoredCookie {
            path: "/files".to_owned(),
            ..panel_cookie("files_only", "1")
        });

        let header = jar.header_for(&url("http://1.2.3.4:8888/ftp?action=AddFtp"), NOW);
        assert_eq!(header.as_deref(), Some("SESSID=abc"));

        let header = jar.header_for(&url("https://1.2.3.4:8888/files?action=UnZip"), NOW);
        assert_eq!(
            header.as_deref(),
            Some("SESSID=abc; secure_only=1; files_only=1")
        );

        assert_eq!(jar.header_for(&url("http://5.6.7.8/"), NOW), None);
    }

    #[test]
    fn path_match_respects_segment_boundaries() {
        assert!(path_matches("/site", "/site"));
        assert!(path_matches("/site/x", "/site"));
        assert!(path_matches("/anything", "/"));
        assert!(!path_matches("/sites", "/site"));
    }

    #[test]
    fn set_cookie_is_stored_for_request_host() {
        let mut jar = CookieJar::default();
        let origin = url("https://1.2.3.4:8888/ftp?action=AddFtp");

        assert!(jar.apply_set_cookie(&origin, "SESSID=abc; Path=/; HttpOnly", NOW));
        let cookie = jar.get("SESSID").expect("stored");
        assert_eq!(cookie.domain, "1.2.3.4");
        assert!(!cookie.include_subdomains);
        assert!(cookie.http_only);
        assert_eq!(cookie.expires, 0);

        assert!(jar.apply_set_cookie(&origin, "SESSID=def; Path=/", NOW));
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("SESSID").map(|c| c.value.as_str()), Some("def"));
    }

    #[test]
    fn set_cookie_defaults_and_expiry() {
        let mut jar = CookieJar::default();
        let origin = url("http://panel.example.com/site/list");

        jar.apply_set_cookie(&origin, "a=1; Max-Age=30", NOW);
        jar.apply_set_cookie(&origin, "b=2; Domain=.Example.com; Path=/", NOW);

        let a = jar.get("a").expect("a stored");
        assert_eq!(a.path, "/site");
        assert_eq!(a.expires, NOW + 30);

        let b = jar.get("b").expect("b stored");
        assert_eq!(b.domain, "example.com");
        assert!(b.include_subdomains);
        assert_eq!(
            jar.header_for(&url("http://api.example.com/"), NOW).as_deref(),
            Some("b=2")
        );

        jar.apply_set_cookie(&origin, "a=gone; Max-Age=0", NOW);
        assert!(jar.get("a").is_none());
    }

    #[test]
    fn garbage_set_cookie_is_ignored() {
        let mut jar = CookieJar::default();

        assert!(!jar.apply_set_cookie(&url("http://h/"), "=novalue", NOW));
        assert!(jar.is_empty());
    }

    #[test]
    fn file_store_creates_and_reuses_cookie_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path());
        let key = SessionKey::for_base_url("https://1.2.3.4:8888");
        let path = store.path_for(&key);

        assert!(!path.exists());
        assert!(store.load(&key).expect("load").is_empty());
        assert!(path.exists(), "first load creates the cookie file");

        let mut jar = CookieJar::default();
        jar.insert(panel_cookie("SESSID", "abc"));
        store.save(&key, &jar).expect("save");

        assert_eq!(store.load(&key).expect("reload"), jar);
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("{}.cookie", md5_hex("https://1.2.3.4:8888")).as_str())
        );
    }

    #[test]
    fn memory_store_isolates_keys() {
        let store = InMemorySessionStore::new();
        let a = SessionKey::for_base_url("https://a:8888");
        let b = SessionKey::for_base_url("https://b:8888");

        let mut jar = CookieJar::default();
        jar.insert(panel_cookie("SESSID", "abc"));
        store.save(&a, &jar).expect("save");

        assert_eq!(store.load(&a).expect("load"), jar);
        assert!(store.load(&b).expect("load").is_empty());
        assert!(store.contains(&b), "load creates an empty entry");
    }
}
