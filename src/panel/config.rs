use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::error::Error;
use crate::panel::policy::PanelPolicies;
use crate::session::SessionKey;

/// Per-request timeout unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Directory the panel creates site roots under.
pub const DEFAULT_WEB_ROOT: &str = "/www/wwwroot";

/// Raw connection values typically passed from app-level config.
#[derive(Clone, Debug)]
pub struct RawPanelConfig {
    pub api_key: SecretString,
    pub base_url: String,
}

/// Connection settings for one panel.
#[derive(Clone, Debug)]
pub struct PanelConfig {
    /// Scheme, host and port, without a trailing `/`.
    pub base_url: String,
    pub api_key: SecretString,
    pub timeout: Duration,
    pub web_root: String,
    pub policies: PanelPolicies,
}

impl PanelConfig {
    pub fn from_raw(raw: RawPanelConfig, policies: PanelPolicies) -> Result<Self> {
        Ok(Self::new(raw.api_key, &raw.base_url)?.with_policies(policies))
    }

    pub fn new(api_key: SecretString, base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            base_url,
            api_key,
            timeout: DEFAULT_TIMEOUT,
            web_root: DEFAULT_WEB_ROOT.to_owned(),
            policies: PanelPolicies::default(),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_web_root<S: Into<String>>(mut self, web_root: S) -> Self {
        self.web_root = web_root.into();
        self
    }

    #[must_use]
    pub fn with_policies(mut self, policies: PanelPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::validation("timeout must be greater than zero"));
        }
        if self.web_root.is_empty() {
            return Err(Error::validation("web root must not be empty"));
        }
        Ok(())
    }

    /// Full URL of a panel action such as `/ftp?action=AddFtp`.
    pub fn url_for(&self, action: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{action}", self.base_url))?)
    }

    /// Absolute site directory for a path relative to the web root.
    #[must_use]
    pub fn site_path(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.web_root.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn session_key(&self) -> SessionKey {
        SessionKey::for_base_url(&self.base_url)
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::validation("base url must not be empty"));
    }

    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::validation(format!(
            "base url must use http or https, got `{}`",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(Error::validation("base url must include a host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(Error::validation(
            "base url must not carry a query string or fragment",
        ));
    }

    Ok(trimmed.to_owned())
}
