use crate::error::{CoreError, CoreResult};
use crate::transport::HttpTransport;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const TRUNCATION_MARKER: &str = "...[truncated]";

const PROMPT_HEAD: &str = "Please analyze the following cybersecurity incident report and provide a concise half-page summary that includes:

1. **Incident Overview**: What happened and when
2. **Threat Actor**: Who was responsible (if identified)
3. **Attack Methods**: How the attack was carried out
4. **Impact**: What systems, data, or operations were affected
5. **Key Findings**: Important technical details or indicators
6. **Timeline**: Key dates and progression of the incident

Please write this as a professional incident description suitable for a cybersecurity report. Focus on factual information and avoid speculation.

Document text:
";

/// At most `max_chars` characters of `text`, marked when cut.
pub fn truncate_input(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

pub fn build_prompt(text: &str, max_chars: usize) -> String {
    format!("{}{}", PROMPT_HEAD, truncate_input(text, max_chars))
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Text of `choices[0].message.content`, trimmed.
pub fn parse_completion(body: &[u8]) -> CoreResult<String> {
    let invalid = || CoreError::Summarizer("Invalid response format from summarizer endpoint".to_string());
    let parsed: Completion = serde_json::from_slice(body).map_err(|_| invalid())?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|s| s.trim().to_string())
        .ok_or_else(invalid)
}

pub struct SummaryClient<'a, T: HttpTransport> {
    transport: &'a T,
    endpoint: Url,
    timeout: Duration,
    api_key: Option<String>,
}

impl<'a, T: HttpTransport> SummaryClient<'a, T> {
    pub fn new(transport: &'a T, endpoint: Url, timeout: Duration, api_key: Option<String>) -> Self {
        Self {
            transport,
            endpoint,
            timeout,
            api_key,
        }
    }

    pub fn summarize(&self, prompt: &str) -> CoreResult<String> {
        let resp = self.transport.post_json(
            &self.endpoint,
            &json!({ "prompt": prompt }),
            self.api_key.as_deref(),
            self.timeout,
        )?;
        if !resp.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&resp.body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(CoreError::Summarizer(format!(
                "endpoint returned {} - {}",
                resp.status, detail
            )));
        }
        let summary = parse_completion(&resp.body)?;
        info!(chars = summary.len(), "summary received");
        Ok(summary)
    }
}
