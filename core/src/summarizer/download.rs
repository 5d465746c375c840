use crate::config::NetworkConfig;
use crate::error::{CoreError, CoreResult};
use crate::policy::egress::USER_DESTINATION_PURPOSE;
use crate::transport::fallback::first_success;
use crate::transport::{parse_url, DestinationPermit, HttpTransport};
use std::time::Duration;
use tracing::info;
use url::form_urlencoded::byte_serialize;
use url::Url;

pub const PDF_MAGIC: &[u8] = b"%PDF-";
pub const DIRECT_SOURCE: &str = "direct";

/// `prefix` with the percent-encoded target appended.
pub fn proxied_url(prefix: &str, target: &Url) -> CoreResult<Url> {
    let encoded: String = byte_serialize(target.as_str().as_bytes()).collect();
    parse_url(&format!("{}{}", prefix, encoded), "proxy")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPdf {
    pub bytes: Vec<u8>,
    /// `direct` or the proxy prefix that served the file.
    pub source: String,
}

/// Direct fetch first, then each configured proxy in order. The first source
/// that returns a 2xx body starting with `%PDF-` wins.
pub fn download_pdf<T: HttpTransport>(
    transport: &T,
    url: &Url,
    cfg: &NetworkConfig,
) -> CoreResult<DownloadedPdf> {
    let _permit = DestinationPermit::new(transport, url, USER_DESTINATION_PURPOSE)?;

    let mut sources = vec![DIRECT_SOURCE.to_string()];
    sources.extend(cfg.pdf_proxies.iter().cloned());

    let (idx, bytes) = first_success(&sources, |idx, source| {
        let (target, timeout) = if idx == 0 {
            (url.clone(), cfg.pdf_direct_timeout())
        } else {
            (proxied_url(source, url)?, cfg.pdf_proxy_timeout())
        };
        fetch_pdf(transport, &target, timeout)
    })?;

    info!(
        source = sources[idx].as_str(),
        bytes = bytes.len(),
        "pdf downloaded"
    );
    Ok(DownloadedPdf {
        bytes,
        source: sources[idx].clone(),
    })
}

fn fetch_pdf<T: HttpTransport>(transport: &T, url: &Url, timeout: Duration) -> CoreResult<Vec<u8>> {
    let host = url.host_str().unwrap_or("source");
    let resp = transport.get(url, timeout)?.ensure_success(host)?;
    if !resp.body.starts_with(PDF_MAGIC) {
        return Err(CoreError::Network(format!(
            "{} did not return a PDF",
            host
        )));
    }
    Ok(resp.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use serde_json::Value;
    use std::cell::RefCell;

    /// Answers by host; records every URL and every permit/revoke.
    struct ScriptedTransport {
        answers: Vec<(&'static str, CoreResult<HttpResponse>)>,
        log: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(answers: Vec<(&'static str, CoreResult<HttpResponse>)>) -> Self {
            Self {
                answers,
                log: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for ScriptedTransport {
        fn get(&self, url: &Url, timeout: Duration) -> CoreResult<HttpResponse> {
            self.log
                .borrow_mut()
                .push(format!("GET {} {}s", url, timeout.as_secs()));
            let host = url.host_str().unwrap_or("");
            match self.answers.iter().find(|(h, _)| *h == host) {
                Some((_, Ok(r))) => Ok(r.clone()),
                Some((_, Err(e))) => Err(CoreError::Network(e.to_string())),
                None => Err(CoreError::Network(format!("{} unreachable", host))),
            }
        }

        fn post_json(
            &self,
            _url: &Url,
            _body: &Value,
            _bearer: Option<&str>,
            _timeout: Duration,
        ) -> CoreResult<HttpResponse> {
            unreachable!()
        }

        fn permit_destination(&self, url: &Url, _purpose: &str) -> CoreResult<()> {
            self.log.borrow_mut().push(format!("PERMIT {}", url));
            Ok(())
        }

        fn revoke_destination(&self, url: &Url) {
            self.log.borrow_mut().push(format!("REVOKE {}", url));
        }
    }

    fn cfg() -> NetworkConfig {
        NetworkConfig {
            pdf_proxies: vec![
                "https://proxy-a.example/raw?url=".to_string(),
                "https://proxy-b.example/?".to_string(),
            ],
            ..NetworkConfig::default()
        }
    }

    fn pdf() -> HttpResponse {
        HttpResponse::new(200, b"%PDF-1.7 body".to_vec())
    }

    #[test]
    fn test_proxy_url_encodes_target() {
        let target = Url::parse("https://r.example/a b.pdf?x=1&y=2").unwrap();
        let u = proxied_url("https://proxy-a.example/raw?url=", &target).unwrap();
        assert_eq!(
            u.as_str(),
            "https://proxy-a.example/raw?url=https%3A%2F%2Fr.example%2Fa%2520b.pdf%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_direct_success_skips_proxies() {
        let t = ScriptedTransport::new(vec![("r.example", Ok(pdf()))]);
        let url = Url::parse("https://r.example/report.pdf").unwrap();
        let got = download_pdf(&t, &url, &cfg()).unwrap();
        assert_eq!(got.source, DIRECT_SOURCE);
        let log = t.log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1], "GET https://r.example/report.pdf 8s");
        assert!(log[2].starts_with("REVOKE"));
    }

    #[test]
    fn test_html_error_page_falls_through_to_next_proxy() {
        let t = ScriptedTransport::new(vec![
            ("proxy-a.example", Ok(HttpResponse::new(200, b"<html>blocked</html>".to_vec()))),
            ("proxy-b.example", Ok(pdf())),
        ]);
        let url = Url::parse("https://r.example/report.pdf").unwrap();
        let got = download_pdf(&t, &url, &cfg()).unwrap();
        assert_eq!(got.source, "https://proxy-b.example/?");
        assert!(t.log.borrow().iter().any(|l| l.contains("proxy-a.example") && l.ends_with("15s")));
    }

    #[test]
    fn test_exhaustion_names_last_proxy_and_revokes() {
        let t = ScriptedTransport::new(vec![(
            "proxy-b.example",
            Ok(HttpResponse::new(502, Vec::new())),
        )]);
        let url = Url::parse("https://r.example/report.pdf").unwrap();
        match download_pdf(&t, &url, &cfg()) {
            Err(CoreError::FallbackExhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("proxy-b.example returned HTTP 502"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(t.log.borrow().last().is_some_and(|l| l.starts_with("REVOKE")));
    }
}
