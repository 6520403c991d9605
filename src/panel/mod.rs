//! Typed access to the panel's HTTP actions.
//!
//! Each action is one signed, form-encoded `POST`:
//! - sign the request with the API key and current time
//! - post the action's fields plus the signature
//! - decode the JSON body and return it as-is
//!
//! Certificate renewal and installation chain two actions; everything else is a
//! single round trip.

mod client;
mod config;
mod endpoint;
mod policy;
mod types;

pub use client::PanelClient;
pub use config::{DEFAULT_TIMEOUT, DEFAULT_WEB_ROOT, PanelConfig, RawPanelConfig};
pub use endpoint::Endpoint;
pub use policy::{DecodePolicy, PanelPolicies, TlsPolicy};
pub use types::{AddSite, DatabaseSetup, DnsAction, FtpSetup, SslCertificate};
