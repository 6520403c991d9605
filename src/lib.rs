#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod error;
pub mod panel;
pub mod session;

use reqwest::header::{COOKIE, HeaderValue, SET_COOKIE};
use reqwest::{Client as ReqwestClient, Request};
use serde_json::Value;

use crate::error::Error;
use crate::panel::DecodePolicy;
use crate::session::{SessionKey, SessionStore};

pub type Result<T> = std::result::Result<T, Error>;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// Sends `request` with the session cookies of `key` and decodes the body.
///
/// The status code is not inspected: the panel reports failures inside the
/// JSON body, and an error page is decoded like any other response.
pub(crate) async fn request(
    client: &ReqwestClient,
    store: &dyn SessionStore,
    key: &SessionKey,
    mut request: Request,
    decode: DecodePolicy,
) -> Result<Value> {
    let now = chrono::Utc::now().timestamp();
    let mut jar = store.load(key)?;
    if let Some(cookies) = jar.header_for(request.url(), now) {
        request
            .headers_mut()
            .insert(COOKIE, HeaderValue::from_str(&cookies)?);
    }

    #[cfg(feature = "tracing")]
    let (method, path, query) = (
        request.method().clone(),
        request.url().path().to_owned(),
        request.url().query().unwrap_or_default().to_owned(),
    );

    let response = client.execute(request).await?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        status = %response.status(),
        %method,
        path = %path,
        query = %query,
        "panel request completed"
    );

    let origin = response.url().clone();
    for header in response.headers().get_all(SET_COOKIE) {
        match header.to_str() {
            Ok(value) => {
                jar.apply_set_cookie(&origin, value, now);
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "ignoring non-ASCII Set-Cookie header");
            }
        }
    }
    store.save(key, &jar)?;

    let body = response.text().await?;
    decode_body(body, decode)
}

pub(crate) fn decode_body(body: String, policy: DecodePolicy) -> Result<Value> {
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => Ok(value),
        Err(e) => match policy {
            DecodePolicy::Lenient => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, len = body.len(), "response is not JSON, returning null");
                Ok(Value::Null)
            }
            DecodePolicy::Strict => Err(Error::decode(body, e)),
        },
    }
}
