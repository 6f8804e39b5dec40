//! Network origin as observed by the reverse proxy.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// First hop of `X-Forwarded-For`, if any: the origin the proxy observed.
#[derive(Debug, Clone, Default)]
pub struct ForwardedOrigin(pub Option<String>);

impl ForwardedOrigin {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let origin = headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Self(origin)
    }

    /// The proxy-observed origin always wins; a body value is only used when
    /// no forwarded hop exists (direct connections in local setups).
    pub fn resolve(self, claimed: Option<String>) -> Option<String> {
        self.0.or_else(|| {
            claimed
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ForwardedOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
