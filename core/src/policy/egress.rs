use crate::config::NetworkConfig;
use crate::error::{CoreError, CoreResult};
use crate::policy::allowlist::{Allowlist, Origin, OriginPermit};
use crate::policy::types::NetworkMode;
use crate::transport::{HttpResponse, HttpTransport};
use sha2::{Digest, Sha256};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const USER_DESTINATION_PURPOSE: &str = "user-supplied destination";

#[derive(Debug, Clone)]
pub struct EgressPolicy {
    pub network_mode: NetworkMode,
    pub allowlist: Allowlist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EgressDecision {
    Allowed { allowlist_rule_id: String },
    Blocked { reason: String },
}

impl EgressPolicy {
    /// Allowlists every endpoint named in the network configuration.
    pub fn from_config(cfg: &NetworkConfig) -> CoreResult<Self> {
        let mut allowlist = Allowlist::default();
        let technique = cfg.technique_title_url.replace("{id}", "T0001");
        let fixed = [
            (technique.as_str(), "technique titles"),
            (cfg.summarizer_url.as_str(), "summarizer"),
            (cfg.sheets_base_url.as_str(), "sheets data"),
        ];
        for (raw, purpose) in fixed {
            let url = crate::transport::parse_url(raw, purpose)?;
            allowlist.permit(OriginPermit::for_url(&url, purpose)?);
        }
        for proxy in &cfg.pdf_proxies {
            let url = crate::transport::parse_url(proxy, "pdf proxy")?;
            allowlist.permit(OriginPermit::for_url(&url, "pdf proxy")?);
        }
        for host in &cfg.extra_allowlist_hosts {
            allowlist.permit(OriginPermit {
                origin: Origin::https_host(host)?,
                purpose: "configured host".to_string(),
            });
        }
        Ok(Self {
            network_mode: NetworkMode::from_offline_flag(cfg.offline),
            allowlist,
        })
    }

    pub fn decide(&self, url: &Url) -> EgressDecision {
        match self.network_mode {
            NetworkMode::OFFLINE => EgressDecision::Blocked {
                reason: "OFFLINE_MODE".to_string(),
            },
            NetworkMode::ONLINE_ALLOWLISTED => match self.allowlist.rule_for(url) {
                Some(idx) => EgressDecision::Allowed {
                    allowlist_rule_id: format!("ALW{:04}", idx),
                },
                None => EgressDecision::Blocked {
                    reason: "NOT_ALLOWLISTED".to_string(),
                },
            },
        }
    }
}

/// The one place the pipeline reaches the network.
pub struct EgressClient {
    policy: RwLock<EgressPolicy>,
    http: reqwest::blocking::Client,
}

impl EgressClient {
    pub fn new(policy: EgressPolicy) -> CoreResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("incident-alert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::Network(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            policy: RwLock::new(policy),
            http,
        })
    }

    pub fn from_config(cfg: &NetworkConfig) -> CoreResult<Self> {
        Self::new(EgressPolicy::from_config(cfg)?)
    }

    pub fn decide(&self, url: &Url) -> EgressDecision {
        match self.policy.read() {
            Ok(p) => p.decide(url),
            Err(_) => EgressDecision::Blocked {
                reason: "POLICY_UNAVAILABLE".to_string(),
            },
        }
    }

    fn check(&self, method: &str, url: &Url, body: &[u8]) -> CoreResult<()> {
        let decision = self.decide(url);
        record_attempt(method, url, &decision, body);
        match decision {
            EgressDecision::Allowed { .. } => Ok(()),
            EgressDecision::Blocked { reason } => Err(CoreError::PolicyBlocked(format!(
                "{} {} blocked: {}",
                method,
                url.host_str().unwrap_or(""),
                reason
            ))),
        }
    }

    fn finish(
        &self,
        url: &Url,
        timeout: Duration,
        sent: reqwest::Result<reqwest::blocking::Response>,
    ) -> CoreResult<HttpResponse> {
        let resp = sent.map_err(|e| describe_reqwest_error(url, timeout, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| describe_reqwest_error(url, timeout, e))?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

impl HttpTransport for EgressClient {
    fn get(&self, url: &Url, timeout: Duration) -> CoreResult<HttpResponse> {
        self.check("GET", url, b"")?;
        let sent = self.http.get(url.clone()).timeout(timeout).send();
        self.finish(url, timeout, sent)
    }

    fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        bearer: Option<&str>,
        timeout: Duration,
    ) -> CoreResult<HttpResponse> {
        let bytes = serde_json::to_vec(body)?;
        self.check("POST", url, &bytes)?;
        let mut req = self
            .http
            .post(url.clone())
            .timeout(timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(bytes);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let sent = req.send();
        self.finish(url, timeout, sent)
    }

    fn permit_destination(&self, url: &Url, purpose: &str) -> CoreResult<()> {
        let permit = OriginPermit::for_url(url, USER_DESTINATION_PURPOSE)?;
        let mut policy = self
            .policy
            .write()
            .map_err(|_| CoreError::PolicyBlocked("egress policy lock poisoned".to_string()))?;
        policy.allowlist.permit(permit);
        info!(host = url.host_str().unwrap_or(""), purpose, "destination permitted");
        Ok(())
    }

    fn revoke_destination(&self, url: &Url) {
        if let Ok(mut policy) = self.policy.write() {
            policy.allowlist.revoke(url, USER_DESTINATION_PURPOSE);
        }
    }
}

fn describe_reqwest_error(url: &Url, timeout: Duration, e: reqwest::Error) -> CoreError {
    let host = url.host_str().unwrap_or("");
    if e.is_timeout() {
        CoreError::Network(format!("{} timed out after {}s", host, timeout.as_secs()))
    } else if e.is_connect() {
        CoreError::Network(format!("could not connect to {}: {}", host, e))
    } else {
        CoreError::Network(format!("request to {} failed: {}", host, e))
    }
}

fn record_attempt(method: &str, url: &Url, decision: &EgressDecision, request_bytes: &[u8]) {
    let mut h = Sha256::new();
    h.update(method.as_bytes());
    h.update(url.as_str().as_bytes());
    h.update(request_bytes);
    let request_hash_sha256 = hex::encode(h.finalize());

    match decision {
        EgressDecision::Allowed { allowlist_rule_id } => info!(
            method,
            scheme = url.scheme(),
            host = url.host_str().unwrap_or(""),
            path = url.path(),
            allowlist_rule_id = allowlist_rule_id.as_str(),
            request_hash_sha256 = request_hash_sha256.as_str(),
            "egress request allowed"
        ),
        EgressDecision::Blocked { reason } => warn!(
            method,
            scheme = url.scheme(),
            host = url.host_str().unwrap_or(""),
            path = url.path(),
            block_reason = reason.as_str(),
            request_hash_sha256 = request_hash_sha256.as_str(),
            "egress request blocked"
        ),
    }
}
