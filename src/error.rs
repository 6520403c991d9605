use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

/// Broad classification of every failure the client can report.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Network, TLS or timeout failure while talking to the panel.
    Transport,
    /// The panel answered with a body that is not valid JSON.
    Decode,
    /// The session cookie store could not be read or written.
    Session,
    /// Invalid client configuration or request input.
    Validation,
    /// Anything else.
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let e = self.source.as_deref()?;
        e.downcast_ref::<E>()
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Validation {
            reason: message.into(),
        }
        .into()
    }

    pub(crate) fn decode(body: String, source: serde_json::Error) -> Self {
        Decode { body, source }.into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Rejected configuration or request input.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

/// A response body that could not be parsed as JSON.
#[non_exhaustive]
#[derive(Debug)]
pub struct Decode {
    /// The raw body as returned by the panel.
    pub body: String,
    pub source: serde_json::Error,
}

impl fmt::Display for Decode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 64;

        let preview: String = self.body.chars().take(PREVIEW).collect();
        write!(f, "response is not valid JSON ({}): {preview:?}", self.source)
    }
}

impl StdError for Decode {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<Decode> for Error {
    fn from(err: Decode) -> Self {
        Error::with_source(Kind::Decode, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Error::with_source(Kind::Internal, err)
        } else {
            Error::with_source(Kind::Transport, err)
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(err: serde_html_form::ser::Error) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(Kind::Session, err)
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Error::with_source(Kind::Session, err)
    }
}
