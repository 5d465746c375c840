use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SummarizerStage {
    Idle,
    Downloading,
    Extracting,
    Summarizing,
    Done,
    Failed,
}

impl SummarizerStage {
    pub fn can_transition(self, next: SummarizerStage) -> bool {
        use SummarizerStage::*;
        matches!(
            (self, next),
            (Idle, Downloading)
                | (Downloading, Extracting)
                | (Extracting, Summarizing)
                | (Summarizing, Done)
                | (Downloading, Failed)
                | (Extracting, Failed)
                | (Summarizing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SummarizerStage::Done | SummarizerStage::Failed)
    }

    /// Indicator text for the non-terminal stages.
    pub fn progress_message(self) -> &'static str {
        match self {
            SummarizerStage::Idle => "",
            SummarizerStage::Downloading => "Downloading PDF...",
            SummarizerStage::Extracting => "Extracting text from PDF...",
            SummarizerStage::Summarizing => "Generating AI summary...",
            SummarizerStage::Done => "Summary generated successfully!",
            SummarizerStage::Failed => "Error",
        }
    }
}

impl fmt::Display for SummarizerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Receives every visible effect of a summarize run.
pub trait SummarizerObserver {
    fn progress(&mut self, stage: SummarizerStage, message: &str);

    /// A form field was rewritten; dependents should refresh.
    fn field_changed(&mut self, _field: &str) {}

    /// The indicator should disappear after `delay`.
    fn hide_after(&mut self, _delay: Duration) {}
}

/// Observer that drops everything.
#[derive(Debug, Default)]
pub struct SilentObserver;

impl SummarizerObserver for SilentObserver {
    fn progress(&mut self, _stage: SummarizerStage, _message: &str) {}
}

/// Current stage plus the observer that is told about each move.
pub struct StageTracker<'o> {
    stage: SummarizerStage,
    observer: &'o mut dyn SummarizerObserver,
}

impl<'o> StageTracker<'o> {
    pub fn new(observer: &'o mut dyn SummarizerObserver) -> Self {
        Self {
            stage: SummarizerStage::Idle,
            observer,
        }
    }

    pub fn stage(&self) -> SummarizerStage {
        self.stage
    }

    pub fn advance(&mut self, next: SummarizerStage) -> CoreResult<()> {
        self.move_to(next, next.progress_message())
    }

    pub fn fail(&mut self, message: &str) -> CoreResult<()> {
        self.move_to(SummarizerStage::Failed, &format!("Error: {}", message))
    }

    pub fn observer(&mut self) -> &mut dyn SummarizerObserver {
        &mut *self.observer
    }

    fn move_to(&mut self, next: SummarizerStage, message: &str) -> CoreResult<()> {
        if !self.stage.can_transition(next) {
            return Err(CoreError::Transition(format!(
                "summarizer {} -> {}",
                self.stage, next
            )));
        }
        self.stage = next;
        self.observer.progress(next, message);
        Ok(())
    }
}
