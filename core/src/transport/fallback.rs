use crate::error::{CoreError, CoreResult};
use tracing::{debug, warn};

/// Tries `sources` in order and returns the first success together with the
/// index of the source that produced it.
///
/// On exhaustion the error lists every attempt as `label: error` and carries
/// the last failure separately so callers can surface it.
pub fn first_success<S, T, F>(sources: &[S], mut attempt: F) -> CoreResult<(usize, T)>
where
    S: AsRef<str>,
    F: FnMut(usize, &S) -> CoreResult<T>,
{
    if sources.is_empty() {
        return Err(CoreError::InvalidInput(
            "fallback chain has no sources".to_string(),
        ));
    }

    let mut failures = Vec::with_capacity(sources.len());
    let mut last_error = String::new();
    for (idx, source) in sources.iter().enumerate() {
        debug!(attempt = idx + 1, source = source.as_ref(), "trying source");
        match attempt(idx, source) {
            Ok(v) => return Ok((idx, v)),
            Err(e) => {
                warn!(attempt = idx + 1, source = source.as_ref(), error = %e, "source failed");
                last_error = e.to_string();
                failures.push(format!("{}: {}", source.as_ref(), last_error));
            }
        }
    }

    Err(CoreError::FallbackExhausted {
        attempts: failures.len(),
        failures,
        last_error,
    })
}
