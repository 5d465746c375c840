//! The seam between the pipeline and the network. Everything that talks HTTP
//! goes through [`HttpTransport`]; the only production implementation is
//! [`crate::policy::egress::EgressClient`].

pub mod fallback;

use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> CoreResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turns a non-2xx response into a network error naming `what`.
    pub fn ensure_success(self, what: &str) -> CoreResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CoreError::Network(format!(
                "{} returned HTTP {}",
                what, self.status
            )))
        }
    }
}

pub trait HttpTransport {
    fn get(&self, url: &Url, timeout: Duration) -> CoreResult<HttpResponse>;

    fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> CoreResult<HttpResponse>;

    /// Lets a user-supplied destination through the egress policy until
    /// [`HttpTransport::revoke_destination`] is called.
    fn permit_destination(&self, _url: &Url, _purpose: &str) -> CoreResult<()> {
        Ok(())
    }

    fn revoke_destination(&self, _url: &Url) {}
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get(&self, url: &Url, timeout: Duration) -> CoreResult<HttpResponse> {
        (**self).get(url, timeout)
    }

    fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> CoreResult<HttpResponse> {
        (**self).post_json(url, body, bearer, timeout)
    }

    fn permit_destination(&self, url: &Url, purpose: &str) -> CoreResult<()> {
        (**self).permit_destination(url, purpose)
    }

    fn revoke_destination(&self, url: &Url) {
        (**self).revoke_destination(url)
    }
}

/// Keeps a destination outside the static allowlist reachable while alive.
pub struct DestinationPermit<'a, T: HttpTransport + ?Sized> {
    transport: &'a T,
    url: Url,
}

impl<'a, T: HttpTransport + ?Sized> DestinationPermit<'a, T> {
    pub fn new(transport: &'a T, url: &Url, purpose: &str) -> CoreResult<Self> {
        transport.permit_destination(url, purpose)?;
        Ok(Self {
            transport,
            url: url.clone(),
        })
    }
}

impl<T: HttpTransport + ?Sized> Drop for DestinationPermit<'_, T> {
    fn drop(&mut self) {
        self.transport.revoke_destination(&self.url);
    }
}

/// Parses a URL coming from configuration or user input.
pub fn parse_url(raw: &str, what: &str) -> CoreResult<Url> {
    Url::parse(raw.trim())
        .map_err(|e| CoreError::InvalidInput(format!("invalid {} URL '{}': {}", what, raw, e)))
}
