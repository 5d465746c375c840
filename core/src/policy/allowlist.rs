//! Origins the egress client may reach. A permit names one origin (scheme,
//! ASCII host, port) and the feature that needs it; a request is allowed when
//! its URL has exactly that origin.

use crate::error::{CoreError, CoreResult};
use idna::domain_to_ascii;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    fn parse(raw: &str) -> CoreResult<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "https" => Ok(Scheme::Https),
            "http" => Ok(Scheme::Http),
            other => Err(CoreError::InvalidInput(format!(
                "destinations must be http or https, not {}",
                other
            ))),
        }
    }

    fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Origin {
    pub scheme: Scheme,
    /// Punycode, lowercase.
    pub host: String,
    pub port: u16,
}

impl Origin {
    pub fn of(url: &Url) -> CoreResult<Self> {
        let scheme = Scheme::parse(url.scheme())?;
        let host = url
            .host_str()
            .ok_or_else(|| CoreError::InvalidInput(format!("{} has no host", url)))?;
        Ok(Self {
            scheme,
            host: ascii_host(host)?,
            port: url.port().unwrap_or_else(|| scheme.default_port()),
        })
    }

    /// A bare host name from configuration, reached over HTTPS on 443.
    pub fn https_host(host: &str) -> CoreResult<Self> {
        Ok(Self {
            scheme: Scheme::Https,
            host: ascii_host(host.trim())?,
            port: Scheme::Https.default_port(),
        })
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        write!(f, "{}://{}:{}", scheme, self.host, self.port)
    }
}

fn ascii_host(host: &str) -> CoreResult<String> {
    let ascii = domain_to_ascii(host)
        .map_err(|_| CoreError::InvalidInput(format!("invalid host name {:?}", host)))?;
    if ascii.is_empty() {
        return Err(CoreError::InvalidInput("empty host name".to_string()));
    }
    Ok(ascii.to_ascii_lowercase())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct OriginPermit {
    pub origin: Origin,
    pub purpose: String,
}

impl OriginPermit {
    pub fn for_url(url: &Url, purpose: &str) -> CoreResult<Self> {
        Ok(Self {
            origin: Origin::of(url)?,
            purpose: purpose.to_string(),
        })
    }

    pub fn covers(&self, url: &Url) -> bool {
        Origin::of(url).is_ok_and(|o| o == self.origin)
    }
}

/// Sorted, duplicate-free permits. Rule ids are positions in this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    permits: Vec<OriginPermit>,
}

impl Allowlist {
    pub fn permit(&mut self, permit: OriginPermit) {
        if let Err(pos) = self.permits.binary_search(&permit) {
            self.permits.insert(pos, permit);
        }
    }

    /// Drops the permits granted for `purpose` that cover `url`.
    pub fn revoke(&mut self, url: &Url, purpose: &str) {
        self.permits
            .retain(|p| !(p.purpose == purpose && p.covers(url)));
    }

    pub fn rule_for(&self, url: &Url) -> Option<usize> {
        self.permits.iter().position(|p| p.covers(url))
    }

    pub fn permits(&self) -> &[OriginPermit] {
        &self.permits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_origin_fills_default_port() {
        let o = Origin::of(&url("https://Raw.GitHubUserContent.com/techniques/T0001.md")).unwrap();
        assert_eq!(o.scheme, Scheme::Https);
        assert_eq!(o.host, "raw.githubusercontent.com");
        assert_eq!(o.port, 443);
        assert_eq!(o.to_string(), "https://raw.githubusercontent.com:443");
    }

    #[test]
    fn test_configured_host_is_punycoded() {
        let o = Origin::https_host(" Bücher.example ").unwrap();
        assert_eq!(o.host, "xn--bcher-kva.example");
        assert!(Origin::https_host("").is_err());
    }

    #[test]
    fn test_permit_needs_same_scheme_and_port() {
        let p = OriginPermit::for_url(&url("https://reports.example/a.pdf"), "report").unwrap();
        assert!(p.covers(&url("https://reports.example/other/b.pdf")));
        assert!(!p.covers(&url("http://reports.example/a.pdf")));
        assert!(!p.covers(&url("https://reports.example:8443/a.pdf")));
        assert!(!p.covers(&url("https://sub.reports.example/a.pdf")));
    }

    #[test]
    fn test_non_web_schemes_rejected() {
        assert!(OriginPermit::for_url(&url("ftp://files.example/x"), "x").is_err());
        let p = OriginPermit::for_url(&url("https://files.example/"), "x").unwrap();
        assert!(!p.covers(&url("file:///etc/passwd")));
    }

    #[test]
    fn test_permits_dedup_and_revoke_by_purpose() {
        let u = url("https://reports.example.net/doc.pdf");
        let mut list = Allowlist::default();
        list.permit(OriginPermit::for_url(&u, "report").unwrap());
        list.permit(OriginPermit::for_url(&u, "report").unwrap());
        assert_eq!(list.permits().len(), 1);
        assert_eq!(list.rule_for(&u), Some(0));
        list.revoke(&u, "other");
        assert_eq!(list.permits().len(), 1);
        list.revoke(&u, "report");
        assert!(list.rule_for(&u).is_none());
    }
}
