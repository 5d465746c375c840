use incident_alert_core::error::CoreResult;
use incident_alert_core::sheets::SheetEditor;
use incident_alert_core::summarizer::{SummarizerObserver, SummarizerStage};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{BufRead, IsTerminal, Write};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Spinner on stderr that mirrors the summarizer stages.
pub struct SpinnerObserver {
    bar: Option<ProgressBar>,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        let bar = std::io::stderr().is_terminal().then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_draw_target(ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        Self { bar }
    }
}

impl SummarizerObserver for SpinnerObserver {
    fn progress(&mut self, stage: SummarizerStage, message: &str) {
        match &self.bar {
            Some(pb) => match stage {
                SummarizerStage::Done => pb.finish_with_message(message.to_string()),
                SummarizerStage::Failed => pb.abandon_with_message(message.to_string()),
                _ => pb.set_message(message.to_string()),
            },
            None => eprintln!("{}", message),
        }
    }

    fn field_changed(&mut self, field: &str) {
        debug!(field, "form field updated");
    }

    fn hide_after(&mut self, delay: Duration) {
        debug!(delay_secs = delay.as_secs(), "progress indicator done");
    }
}

/// Shows the sheet link and waits for the user on stdin.
pub struct TerminalEditor;

impl SheetEditor for TerminalEditor {
    fn open(&mut self, sheet_url: &Url) -> CoreResult<()> {
        eprintln!("Open and edit the sheet, then come back here:\n  {}", sheet_url);
        Ok(())
    }

    fn confirm(&mut self, _sheet_url: &Url) -> CoreResult<bool> {
        eprint!("Press Enter to load the data (or type 'n' to cancel): ");
        std::io::stderr().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(!matches!(line.trim().to_ascii_lowercase().as_str(), "n" | "no"))
    }
}
