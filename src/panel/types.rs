use bon::Builder;
use serde::Serialize;
use strum_macros::Display;

/// Whether a DNS manager call creates or removes a record.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DnsAction {
    Add,
    Delete,
}

/// FTP account created together with a site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FtpSetup {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

impl FtpSetup {
    #[must_use]
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            enabled: true,
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Database created together with a site.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatabaseSetup {
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

impl DatabaseSetup {
    #[must_use]
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            enabled: true,
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Input for creating a site.
///
/// `path` is relative to the configured web root. FTP and database fields are
/// only sent when `ftp` / `sql` are set.
#[derive(Clone, Debug, Builder)]
#[builder(on(String, into))]
pub struct AddSite {
    pub domain: String,
    pub path: String,
    pub description: String,
    #[builder(default)]
    pub type_id: u32,
    #[builder(default = String::from("php"))]
    pub site_type: String,
    #[builder(default = String::from("73"))]
    pub php_version: String,
    #[builder(default = 80)]
    pub port: u16,
    pub ftp: Option<FtpSetup>,
    pub sql: Option<DatabaseSetup>,
    #[builder(default = true)]
    pub set_ssl: bool,
    #[builder(default = true)]
    pub force_ssl: bool,
}

/// Certificate material installed by
/// [`PanelClient::apply_ssl_certificate`](crate::panel::PanelClient::apply_ssl_certificate).
#[derive(Clone, Debug, Builder)]
#[builder(on(String, into))]
pub struct SslCertificate {
    pub domain: String,
    pub domain_id: u64,
    pub private_key: String,
    pub certificate: String,
    pub root_certificate: String,
    #[builder(default)]
    pub auto_wildcard: bool,
}

impl SslCertificate {
    /// Certificate followed by the root chain, as the panel expects in `csr`.
    #[must_use]
    pub fn chain(&self) -> String {
        format!("{} {}", self.certificate, self.root_certificate)
    }
}
