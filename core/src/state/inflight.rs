use crate::error::{CoreError, CoreResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-action re-entrancy flag. A second `try_begin` while a guard is alive
/// fails with [`CoreError::Busy`].
#[derive(Debug, Clone)]
pub struct InFlight {
    action: &'static str,
    busy: Arc<AtomicBool>,
}

#[must_use = "the action is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new(action: &'static str) -> Self {
        Self {
            action,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn try_begin(&self) -> CoreResult<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::Busy(self.action.to_string()))?;
        Ok(InFlightGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn action(&self) -> &'static str {
        self.action
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_busy_until_release() {
        let f = InFlight::new("pdf summarizer");
        let g = f.try_begin().unwrap();
        assert!(f.is_running());
        let err = f.try_begin().unwrap_err();
        assert_eq!(err.to_string(), "pdf summarizer is already running");
        drop(g);
        assert!(!f.is_running());
        assert!(f.try_begin().is_ok());
    }

    #[test]
    fn test_guard_released_on_error_path() {
        let f = InFlight::new("navigator import");
        let run = || -> CoreResult<()> {
            let _g = f.try_begin()?;
            Err(CoreError::Validation("bad file".to_string()))
        };
        assert!(run().is_err());
        assert!(!f.is_running());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let f = InFlight::new("sheets import");
        let other = f.clone();
        let _g = f.try_begin().unwrap();
        assert!(matches!(other.try_begin(), Err(CoreError::Busy(_))));
    }
}
