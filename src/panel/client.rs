use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as ReqwestClient;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::auth::Signer;
use crate::panel::endpoint::{
    AddFtp, AddSiteForm, ApplyCert, DelFtp, DnsResolve, Endpoint, FtpFields, GetConfig,
    GetFtpList, GetFtpUser, GetLogs, GetSsl, HttpToHttps, InputSql, RenewCert, SaveFileBody,
    SetConfig, SetSsl, SiteNames, SiteStart, SiteStop, SqlFields, UnZip, encode_form,
};
use crate::panel::{AddSite, DnsAction, PanelConfig, SslCertificate};
use crate::session::{FileSessionStore, SessionKey, SessionStore};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Client for one panel.
///
/// Every method signs a form, posts it to the panel and hands back the decoded
/// JSON body unchanged. Panel-level failures (`{"status": false, "msg": ..}`)
/// are therefore `Ok` values; inspect them yourself.
#[derive(Clone, Debug)]
pub struct PanelClient {
    config: PanelConfig,
    signer: Signer,
    session_key: SessionKey,
    session: Arc<dyn SessionStore>,
    client: ReqwestClient,
}

impl PanelClient {
    /// Creates a client whose cookie jar lives in the current directory.
    ///
    /// Redirects are not followed: a `3xx` answer is decoded like any other
    /// response and its cookies are stored.
    pub fn new(config: PanelConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .danger_accept_invalid_certs(config.policies.tls.accepts_invalid_certs())
            .redirect(Policy::none())
            .build()?;

        Self::with_client(config, client)
    }

    /// Creates a client around a preconfigured HTTP client.
    ///
    /// The TLS policy of `config` is not applied to `client`. Build `client`
    /// with `redirect(Policy::none())`; a client that follows redirects drops
    /// the cookies set by the redirect response and returns the target's body.
    pub fn with_client(config: PanelConfig, client: ReqwestClient) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            signer: Signer::new(&config.api_key),
            session_key: config.session_key(),
            session: Arc::new(FileSessionStore::current_dir()),
            config,
            client,
        })
    }

    /// Replaces the cookie store.
    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = store;
        self
    }

    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    #[must_use]
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Signs and posts any [`Endpoint`] with the configured timeout.
    pub async fn call<E: Endpoint>(&self, endpoint: &E) -> Result<Value> {
        self.call_with_timeout(endpoint, self.config.timeout).await
    }

    pub async fn call_with_timeout<E: Endpoint>(
        &self,
        endpoint: &E,
        timeout: Duration,
    ) -> Result<Value> {
        let body = encode_form(&self.signer.sign(), endpoint)?;
        let request = self
            .client
            .request(Method::POST, self.config.url_for(E::ACTION)?)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .timeout(timeout)
            .build()?;

        crate::request(
            &self.client,
            self.session.as_ref(),
            &self.session_key,
            request,
            self.config.policies.decode,
        )
        .await
    }

    /// The ten most recent panel log entries.
    pub async fn fetch_logs(&self) -> Result<Value> {
        self.call(&GetLogs::default()).await
    }

    pub async fn add_site(&self, site: &AddSite) -> Result<Value> {
        let form = AddSiteForm {
            webname: SiteNames {
                domain: &site.domain,
                domainlist: Vec::new(),
                count: 0,
            },
            path: self.config.site_path(&site.path),
            ps: &site.description,
            type_id: site.type_id,
            site_type: &site.site_type,
            version: &site.php_version,
            port: site.port,
            ftp: site.ftp.as_ref().map(|ftp| FtpFields {
                ftp: ftp.enabled,
                ftp_username: &ftp.username,
                ftp_password: &ftp.password,
            }),
            sql: site.sql.as_ref().map(|sql| SqlFields {
                sql: sql.enabled,
                datauser: &sql.username,
                datapassword: &sql.password,
            }),
            codeing: "utf8",
            set_ssl: site.set_ssl,
            force_ssl: site.force_ssl,
        };

        self.call(&form).await
    }

    /// Adds an `A` record `subdomain.domain -> target` through the DNS manager plugin.
    pub async fn add_subdomain(&self, subdomain: &str, domain: &str, target: &str) -> Result<Value> {
        self.resolve_subdomain(DnsAction::Add, subdomain, domain, target)
            .await
    }

    pub async fn delete_subdomain(
        &self,
        subdomain: &str,
        domain: &str,
        target: &str,
    ) -> Result<Value> {
        self.resolve_subdomain(DnsAction::Delete, subdomain, domain, target)
            .await
    }

    async fn resolve_subdomain(
        &self,
        action: DnsAction,
        subdomain: &str,
        domain: &str,
        target: &str,
    ) -> Result<Value> {
        self.call(&DnsResolve::a_record(action, subdomain, domain, target))
            .await
    }

    pub async fn fetch_ftp_accounts(&self) -> Result<Value> {
        self.call(&GetFtpList).await
    }

    pub async fn add_ftp_account(&self, username: &str, password: &str) -> Result<Value> {
        self.call(&AddFtp { username, password }).await
    }

    pub async fn delete_ftp_account(&self, username: &str) -> Result<Value> {
        self.call(&DelFtp { username }).await
    }

    pub async fn get_ftp_account_details(&self, username: &str) -> Result<Value> {
        self.call(&GetFtpUser { user: username }).await
    }

    /// Imports a SQL dump that already exists on the server into `database`.
    pub async fn import_sql_file(&self, file: &str, database: &str) -> Result<Value> {
        self.call(&InputSql {
            file,
            name: database,
        })
        .await
    }

    /// Writes `content` to `path` on the server, UTF-8 encoded.
    pub async fn save_file(&self, content: &str, path: &str) -> Result<Value> {
        self.call(&SaveFileBody {
            data: content,
            path,
            encoding: "utf-8",
        })
        .await
    }

    /// Extracts a zip archive on the server. No password is sent as an empty one.
    pub async fn unzip_file(
        &self,
        source: &str,
        destination: &str,
        password: Option<&str>,
    ) -> Result<Value> {
        self.call(&UnZip {
            sfile: source,
            dfile: destination,
            archive_type: "zip",
            coding: "UTF-8",
            password: password.unwrap_or_default(),
        })
        .await
    }

    /// Requests a certificate through ACME, then installs the given certificate
    /// material on the site.
    ///
    /// The two steps are independent: the second request is always sent and
    /// only its response is returned. Whatever the first request produced,
    /// including an error, is discarded. Nothing is rolled back.
    pub async fn apply_ssl_certificate(&self, certificate: &SslCertificate) -> Result<Value> {
        let apply = ApplyCert {
            domains: [certificate.domain.as_str()],
            id: certificate.domain_id,
            auth_to: certificate.domain_id,
            auth_type: "http",
            auto_wildcard: certificate.auto_wildcard,
        };
        if let Err(_err) = self.call(&apply).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                domain = %certificate.domain,
                error = %_err,
                "certificate request failed, installing certificate anyway"
            );
        }

        self.call(&SetSsl {
            ssl_type: 1,
            site_name: &certificate.domain,
            key: &certificate.private_key,
            csr: certificate.chain(),
        })
        .await
    }

    /// Renews the certificate of `domain`.
    ///
    /// Returns `Value::Null` without calling the renewal action when the panel
    /// reports no certificate index for the domain.
    pub async fn renew_cert(&self, domain: &str) -> Result<Value> {
        let Some(index) = self.get_index_value(domain).await? else {
            #[cfg(feature = "tracing")]
            tracing::warn!(domain, "no certificate index, skipping renewal");
            return Ok(Value::Null);
        };

        self.call(&RenewCert {
            index: index_form_value(index),
        })
        .await
    }

    /// Looks up the certificate `index` the panel keeps for `domain`.
    ///
    /// Missing, `null`, `false`, `0`, `""` and `"0"` all count as no index.
    pub async fn get_index_value(&self, domain: &str) -> Result<Option<Value>> {
        let response = self.call(&GetSsl { site_name: domain }).await?;

        Ok(response
            .get("index")
            .filter(|index| is_truthy(index))
            .cloned())
    }

    pub async fn enable_https_redirection(&self, site_name: &str) -> Result<Value> {
        self.call(&HttpToHttps { site_name }).await
    }

    pub async fn disable_site(&self, id: u64, name: &str) -> Result<Value> {
        self.call(&SiteStop { id, name }).await
    }

    pub async fn enable_site(&self, id: u64, name: &str) -> Result<Value> {
        self.call(&SiteStart { id, name }).await
    }

    /// Sends `config` JSON-encoded in a single `config` field.
    pub async fn set_server_config<C: Serialize + ?Sized>(&self, config: &C) -> Result<Value> {
        let config = serde_json::to_string(config)?;
        self.call(&SetConfig { config }).await
    }

    pub async fn get_server_config(&self) -> Result<Value> {
        self.call(&GetConfig).await
    }
}

/// Form text of a truthy index; `true` goes out as `1` the way the panel expects.
fn index_form_value(index: Value) -> String {
    match index {
        Value::String(index) => index,
        Value::Bool(true) => "1".to_owned(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_i64() {
            Some(i) => i != 0,
            None => n.as_u64().map_or_else(|| n.as_f64().is_some_and(|f| f != 0.0), |u| u != 0),
        },
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
