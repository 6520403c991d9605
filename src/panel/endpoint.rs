//! Wire forms for each panel action.
//!
//! Every form is flattened into one `application/x-www-form-urlencoded` body
//! behind the [`RequestSignature`] fields. Field names follow the panel's own
//! naming, so several of them are terse or misspelled (`ps`, `codeing`).

use serde::Serialize;
use serde_with::json::JsonString;
use serde_with::{BoolFromInt, serde_as};

use crate::Result;
use crate::auth::RequestSignature;
use crate::panel::types::DnsAction;

/// A panel action: where it is posted and which fields it sends.
///
/// Implement this for actions the client has no dedicated method for and send
/// them with [`PanelClient::call`](crate::panel::PanelClient::call).
pub trait Endpoint: Serialize {
    /// Path and query appended to the base URL, e.g. `/ftp?action=AddFtp`.
    const ACTION: &'static str;
}

#[derive(Serialize)]
struct SignedForm<'a, B> {
    #[serde(flatten)]
    signature: &'a RequestSignature,
    #[serde(flatten)]
    body: &'a B,
}

/// Encodes `body` behind the signature fields.
pub(crate) fn encode_form<B: Serialize>(signature: &RequestSignature, body: &B) -> Result<String> {
    Ok(serde_html_form::to_string(SignedForm { signature, body })?)
}

#[derive(Serialize)]
pub(crate) struct GetLogs {
    pub table: &'static str,
    pub limit: u32,
    pub tojs: &'static str,
}

impl Default for GetLogs {
    fn default() -> Self {
        Self {
            table: "logs",
            limit: 10,
            tojs: "test",
        }
    }
}

impl Endpoint for GetLogs {
    const ACTION: &'static str = "/data?action=getData";
}

#[derive(Serialize)]
pub(crate) struct SiteNames<'a> {
    pub domain: &'a str,
    pub domainlist: Vec<&'a str>,
    pub count: u32,
}

#[derive(Serialize)]
pub(crate) struct FtpFields<'a> {
    pub ftp: bool,
    pub ftp_username: &'a str,
    pub ftp_password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SqlFields<'a> {
    pub sql: bool,
    pub datauser: &'a str,
    pub datapassword: &'a str,
}

#[serde_as]
#[derive(Serialize)]
pub(crate) struct AddSiteForm<'a> {
    #[serde_as(as = "JsonString")]
    pub webname: SiteNames<'a>,
    pub path: String,
    pub ps: &'a str,
    pub type_id: u32,
    #[serde(rename = "type")]
    pub site_type: &'a str,
    pub version: &'a str,
    pub port: u16,
    #[serde(flatten)]
    pub ftp: Option<FtpFields<'a>>,
    #[serde(flatten)]
    pub sql: Option<SqlFields<'a>>,
    pub codeing: &'static str,
    #[serde_as(as = "BoolFromInt")]
    pub set_ssl: bool,
    #[serde_as(as = "BoolFromInt")]
    pub force_ssl: bool,
}

impl Endpoint for AddSiteForm<'_> {
    const ACTION: &'static str = "/site?action=AddSite";
}

#[derive(Serialize)]
pub(crate) struct DnsResolve<'a> {
    pub host: &'a str,
    pub value: &'a str,
    pub domain: &'a str,
    pub ttl: &'static str,
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub act: DnsAction,
}

impl<'a> DnsResolve<'a> {
    pub fn a_record(act: DnsAction, host: &'a str, domain: &'a str, value: &'a str) -> Self {
        Self {
            host,
            value,
            domain,
            ttl: "600",
            record_type: "A",
            act,
        }
    }
}

impl Endpoint for DnsResolve<'_> {
    const ACTION: &'static str = "/plugin?action=a&name=dns_manager&s=act_resolve";
}

#[derive(Serialize)]
pub(crate) struct GetFtpList;

impl Endpoint for GetFtpList {
    const ACTION: &'static str = "/ftp?action=GetFtpList";
}

#[derive(Serialize)]
pub(crate) struct AddFtp<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl Endpoint for AddFtp<'_> {
    const ACTION: &'static str = "/ftp?action=AddFtp";
}

#[derive(Serialize)]
pub(crate) struct DelFtp<'a> {
    pub username: &'a str,
}

impl Endpoint for DelFtp<'_> {
    const ACTION: &'static str = "/ftp?action=DelFtp";
}

#[derive(Serialize)]
pub(crate) struct GetFtpUser<'a> {
    pub user: &'a str,
}

impl Endpoint for GetFtpUser<'_> {
    const ACTION: &'static str = "/ftp?action=GetUser";
}

#[derive(Serialize)]
pub(crate) struct InputSql<'a> {
    pub file: &'a str,
    pub name: &'a str,
}

impl Endpoint for InputSql<'_> {
    const ACTION: &'static str = "/database?action=InputSql";
}

#[derive(Serialize)]
pub(crate) struct SaveFileBody<'a> {
    pub data: &'a str,
    pub path: &'a str,
    pub encoding: &'static str,
}

impl Endpoint for SaveFileBody<'_> {
    const ACTION: &'static str = "/files?action=SaveFileBody";
}

#[derive(Serialize)]
pub(crate) struct UnZip<'a> {
    pub sfile: &'a str,
    pub dfile: &'a str,
    #[serde(rename = "type")]
    pub archive_type: &'static str,
    pub coding: &'static str,
    pub password: &'a str,
}

impl Endpoint for UnZip<'_> {
    const ACTION: &'static str = "/files?action=UnZip";
}

#[serde_as]
#[derive(Serialize)]
pub(crate) struct ApplyCert<'a> {
    #[serde_as(as = "JsonString")]
    pub domains: [&'a str; 1],
    pub id: u64,
    pub auth_to: u64,
    pub auth_type: &'static str,
    #[serde_as(as = "BoolFromInt")]
    pub auto_wildcard: bool,
}

impl Endpoint for ApplyCert<'_> {
    const ACTION: &'static str = "/acme?action=apply_cert_api";
}

#[derive(Serialize)]
pub(crate) struct SetSsl<'a> {
    #[serde(rename = "type")]
    pub ssl_type: u8,
    #[serde(rename = "siteName")]
    pub site_name: &'a str,
    pub key: &'a str,
    pub csr: String,
}

impl Endpoint for SetSsl<'_> {
    const ACTION: &'static str = "/site?action=SetSSL";
}

#[derive(Serialize)]
pub(crate) struct GetSsl<'a> {
    #[serde(rename = "siteName")]
    pub site_name: &'a str,
}

impl Endpoint for GetSsl<'_> {
    const ACTION: &'static str = "/site?action=GetSSL";
}

#[derive(Serialize)]
pub(crate) struct RenewCert {
    pub index: String,
}

impl Endpoint for RenewCert {
    const ACTION: &'static str = "/acme?action=renew_cert";
}

#[derive(Serialize)]
pub(crate) struct HttpToHttps<'a> {
    #[serde(rename = "siteName")]
    pub site_name: &'a str,
}

impl Endpoint for HttpToHttps<'_> {
    const ACTION: &'static str = "/site?action=HttpToHttps";
}

#[derive(Serialize)]
pub(crate) struct SiteStop<'a> {
    pub id: u64,
    pub name: &'a str,
}

impl Endpoint for SiteStop<'_> {
    const ACTION: &'static str = "/site?action=SiteStop";
}

#[derive(Serialize)]
pub(crate) struct SiteStart<'a> {
    pub id: u64,
    pub name: &'a str,
}

impl Endpoint for SiteStart<'_> {
    const ACTION: &'static str = "/site?action=SiteStart";
}

#[derive(Serialize)]
pub(crate) struct SetConfig {
    /// JSON-encoded configuration map.
    pub config: String,
}

impl Endpoint for SetConfig {
    const ACTION: &'static str = "/server?action=setConfig";
}

#[derive(Serialize)]
pub(crate) struct GetConfig;

impl Endpoint for GetConfig {
    const ACTION: &'static str = "/server?action=getConfig";
}
