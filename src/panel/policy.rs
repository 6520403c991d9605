/// How the transport treats the panel's TLS certificate.
///
/// Panels are commonly installed with a self-signed certificate on an IP
/// address, which only `AcceptInvalidCerts` can talk to.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TlsPolicy {
    #[default]
    Verify,
    /// Accept any certificate and host name. Only for panels you reach over a
    /// trusted network.
    AcceptInvalidCerts,
}

impl TlsPolicy {
    pub(crate) const fn accepts_invalid_certs(self) -> bool {
        matches!(self, TlsPolicy::AcceptInvalidCerts)
    }
}

/// What to return when a response body is not valid JSON.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Fail with [`Kind::Decode`](crate::error::Kind::Decode).
    #[default]
    Strict,
    /// Yield `Value::Null`, indistinguishable from a panel that answered `null`.
    Lenient,
}

/// Transport behaviour shared by every call of a client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelPolicies {
    pub tls: TlsPolicy,
    pub decode: DecodePolicy,
}

impl PanelPolicies {
    #[must_use]
    pub const fn with_tls(mut self, tls: TlsPolicy) -> Self {
        self.tls = tls;
        self
    }

    #[must_use]
    pub const fn with_decode(mut self, decode: DecodePolicy) -> Self {
        self.decode = decode;
        self
    }

    /// Accept self-signed certificates and map undecodable bodies to `null`.
    #[must_use]
    pub const fn permissive() -> Self {
        Self {
            tls: TlsPolicy::AcceptInvalidCerts,
            decode: DecodePolicy::Lenient,
        }
    }
}
