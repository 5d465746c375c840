mod common;

use common::{pdf_with_pages, FakeTransport, Reply};
use incident_alert_core::config::{NetworkConfig, SummarizerConfig};
use incident_alert_core::error::CoreError;
use incident_alert_core::form::FormSnapshot;
use incident_alert_core::state::AppState;
use incident_alert_core::summarizer::extract::extract_text;
use incident_alert_core::summarizer::{Summarizer, SummarizerObserver, SummarizerStage};
use std::time::Duration;

const PDF_URL: &str = "https://reports.example/incident.pdf";
const LINE: &str = "Coordinated accounts amplified a fabricated story about the election process.";

#[derive(Default)]
struct Recorder {
    stages: Vec<(SummarizerStage, String)>,
    changed: Vec<String>,
    hidden: Vec<Duration>,
}

impl SummarizerObserver for Recorder {
    fn progress(&mut self, stage: SummarizerStage, message: &str) {
        self.stages.push((stage, message.to_string()));
    }

    fn field_changed(&mut self, field: &str) {
        self.changed.push(field.to_string());
    }

    fn hide_after(&mut self, delay: Duration) {
        self.hidden.push(delay);
    }
}

fn network() -> NetworkConfig {
    NetworkConfig {
        summarizer_url: "https://summarize.example/generate-text".to_string(),
        pdf_proxies: vec![
            "https://proxy-a.example/raw?url=".to_string(),
            "https://proxy-b.example/?url=".to_string(),
        ],
        ..NetworkConfig::default()
    }
}

fn completion(text: &str) -> Vec<u8> {
    serde_json::json!({"choices": [{"message": {"content": text}}]})
        .to_string()
        .into_bytes()
}

#[test]
fn all_sources_failing_leaves_description_untouched() {
    let transport = FakeTransport::new()
        .route("https://reports.example/", Reply::Fail("reports.example timed out".into()))
        .route("https://proxy-a.example/", Reply::Status(500, Vec::new()))
        .route("https://proxy-b.example/", Reply::Status(502, Vec::new()));
    let net = network();
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot {
        incident_description: "typed by hand".to_string(),
        ..FormSnapshot::default()
    };
    let mut rec = Recorder::default();

    let err = Summarizer::new(&transport, &net, &settings, None)
        .run(&state, &mut snapshot, PDF_URL, &mut rec)
        .unwrap_err();

    assert!(matches!(err, CoreError::FallbackExhausted { attempts: 3, .. }));
    assert!(err.to_string().contains("proxy-b.example returned HTTP 502"));
    assert_eq!(snapshot.incident_description, "typed by hand");
    let (last_stage, last_msg) = rec.stages.last().unwrap();
    assert_eq!(*last_stage, SummarizerStage::Failed);
    assert!(last_msg.starts_with("Error: "));
    assert_eq!(rec.hidden, vec![Duration::from_secs(settings.error_display_secs)]);
    assert!(rec.changed.is_empty());
    assert!(!state.summarizer_flight.is_running());
}

#[test]
fn every_route_timing_out_spends_the_whole_download_budget() {
    let net = network();
    let transport = FakeTransport::new()
        .route("https://reports.example/", Reply::Fail("reports.example timed out".into()))
        .route("https://proxy-a.example/", Reply::Fail("proxy-a.example timed out".into()))
        .route("https://proxy-b.example/", Reply::Fail("proxy-b.example timed out".into()));
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot::default();
    let mut rec = Recorder::default();

    let err = Summarizer::new(&transport, &net, &settings, None)
        .run(&state, &mut snapshot, PDF_URL, &mut rec)
        .unwrap_err();

    let expected_attempts = 1 + net.pdf_proxies.len();
    match &err {
        CoreError::FallbackExhausted {
            attempts,
            failures,
            last_error,
        } => {
            assert_eq!(*attempts, expected_attempts);
            assert_eq!(failures.len(), expected_attempts);
            assert!(last_error.contains("proxy-b.example timed out"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let requests = transport.requests.borrow();
    assert_eq!(requests.len(), expected_attempts);
    assert!(requests.iter().all(|r| r.method == "GET"));
    assert_eq!(requests[0].timeout, net.pdf_direct_timeout());
    assert!(requests[1..].iter().all(|r| r.timeout == net.pdf_proxy_timeout()));
    let budget: Duration = requests.iter().map(|r| r.timeout).sum();
    assert_eq!(budget, Duration::from_secs(8 + 2 * 15));
    assert_eq!(
        budget,
        net.pdf_direct_timeout() + net.pdf_proxy_timeout() * net.pdf_proxies.len() as u32
    );

    let stages: Vec<SummarizerStage> = rec.stages.iter().map(|(s, _)| *s).collect();
    assert_eq!(stages, vec![SummarizerStage::Downloading, SummarizerStage::Failed]);
    assert!(snapshot.incident_description.is_empty());
}

#[test]
fn success_writes_description_and_reports_every_stage() {
    let pdf = pdf_with_pages(&[LINE, LINE]);
    let transport = FakeTransport::new()
        .ok("https://reports.example/", pdf)
        .ok("https://summarize.example/", completion("  A short summary.  "));
    let net = network();
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot::default();
    let mut rec = Recorder::default();

    let outcome = Summarizer::new(&transport, &net, &settings, Some("sk-test".to_string()))
        .run(&state, &mut snapshot, PDF_URL, &mut rec)
        .unwrap();

    assert_eq!(outcome.summary, "A short summary.");
    assert_eq!(outcome.source, "direct");
    assert_eq!(outcome.pages, 2);
    assert_eq!(snapshot.incident_description, "A short summary.");
    assert_eq!(rec.changed, vec!["incidentDescription".to_string()]);

    let stages: Vec<SummarizerStage> = rec.stages.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        stages,
        vec![
            SummarizerStage::Downloading,
            SummarizerStage::Extracting,
            SummarizerStage::Summarizing,
            SummarizerStage::Done,
        ]
    );
    assert_eq!(rec.stages[0].1, "Downloading PDF...");
    assert_eq!(rec.stages[3].1, "Summary generated successfully!");
    assert_eq!(rec.hidden, vec![Duration::from_secs(settings.success_display_secs)]);

    let requests = transport.requests.borrow();
    let post = requests.iter().find(|r| r.method == "POST").unwrap();
    assert_eq!(post.bearer.as_deref(), Some("sk-test"));
    let prompt = post.body.as_ref().unwrap()["prompt"].as_str().unwrap();
    assert!(prompt.ends_with(&format!("{}\n\n{}", LINE, LINE)));
}

#[test]
fn image_based_pdf_fails_while_extracting() {
    let transport = FakeTransport::new().ok("https://reports.example/", pdf_with_pages(&["tiny"]));
    let net = network();
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot::default();
    let mut rec = Recorder::default();

    let err = Summarizer::new(&transport, &net, &settings, None)
        .run(&state, &mut snapshot, PDF_URL, &mut rec)
        .unwrap_err();

    assert!(matches!(err, CoreError::PdfExtraction(_)));
    assert!(err.to_string().contains("image-based"));
    let stages: Vec<SummarizerStage> = rec.stages.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        stages,
        vec![
            SummarizerStage::Downloading,
            SummarizerStage::Extracting,
            SummarizerStage::Failed,
        ]
    );
    assert!(transport.requests.borrow().iter().all(|r| r.method == "GET"));
}

#[test]
fn summarizer_error_body_is_reported() {
    let transport = FakeTransport::new()
        .ok("https://reports.example/", pdf_with_pages(&[LINE, LINE]))
        .route(
            "https://summarize.example/",
            Reply::Status(429, br#"{"error":{"message":"Rate limited"}}"#.to_vec()),
        );
    let net = network();
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot::default();
    let mut rec = Recorder::default();

    let err = Summarizer::new(&transport, &net, &settings, None)
        .run(&state, &mut snapshot, PDF_URL, &mut rec)
        .unwrap_err();

    assert!(matches!(err, CoreError::Summarizer(_)));
    assert!(err.to_string().contains("429 - Rate limited"));
    assert!(snapshot.incident_description.is_empty());
}

#[test]
fn second_run_while_busy_is_refused() {
    let transport = FakeTransport::new();
    let net = network();
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot::default();
    let mut rec = Recorder::default();

    let _running = state.summarizer_flight.try_begin().unwrap();
    let err = Summarizer::new(&transport, &net, &settings, None)
        .run(&state, &mut snapshot, PDF_URL, &mut rec)
        .unwrap_err();

    assert!(matches!(err, CoreError::Busy(_)));
    assert!(rec.stages.is_empty());
    assert!(transport.requests.borrow().is_empty());
}

#[test]
fn empty_url_is_rejected_without_network() {
    let transport = FakeTransport::new();
    let net = network();
    let settings = SummarizerConfig::default();
    let state = AppState::new();
    let mut snapshot = FormSnapshot::default();
    let mut rec = Recorder::default();

    let err = Summarizer::new(&transport, &net, &settings, None)
        .run(&state, &mut snapshot, "   ", &mut rec)
        .unwrap_err();

    assert_eq!(err.to_string(), "PDF URL is required");
    assert!(transport.requests.borrow().is_empty());
}

#[test]
fn text_is_collected_from_each_page() {
    let extracted = extract_text(&pdf_with_pages(&["First   page", "Second page"]), 5).unwrap();
    assert_eq!(extracted.pages, 2);
    assert_eq!(extracted.text, "First page\n\nSecond page");
    assert!(extracted.skipped_pages.is_empty());
}
