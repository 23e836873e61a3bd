use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extraction::{BackendKind, RawExtraction};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

/// Run every backend concurrently and pick the best extraction.
///
/// Selection among successful backends: higher quality score wins, then
/// more tables, then attempt order. A backend that exceeds the configured
/// timeout counts as failed. Only when every backend fails does this
/// return `AllBackendsFailed`.
pub fn run_backends(
    pdf_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<RawExtraction, ExtractError> {
    let bytes: Arc<Vec<u8>> = Arc::new(pdf_bytes.to_vec());
    let timeout = config.backend_timeout();
    let started = Instant::now();

    let mut receivers = Vec::with_capacity(BackendKind::ALL.len());
    for kind in BackendKind::ALL {
        let (tx, rx) = mpsc::channel();
        let bytes = Arc::clone(&bytes);
        thread::spawn(move || {
            // Receiver may have given up on us; a send error is fine then.
            let _ = tx.send(kind.extract(&bytes));
        });
        receivers.push((kind, rx));
    }

    let mut successes: Vec<RawExtraction> = Vec::new();
    let mut failures: Vec<String> = Vec::new();

    for (kind, rx) in receivers {
        let remaining = timeout.saturating_sub(started.elapsed());
        match rx.recv_timeout(remaining) {
            Ok(Ok(raw)) => {
                debug!(
                    backend = kind.name(),
                    pages = raw.pages.len(),
                    tables = raw.tables.len(),
                    quality = raw.quality_score(),
                    "backend finished"
                );
                successes.push(raw);
            }
            Ok(Err(e)) => {
                warn!(backend = kind.name(), error = %e, "backend failed");
                failures.push(format!("{}: {e}", kind.name()));
            }
            Err(_) => {
                // Timed out or the worker panicked; the thread is detached
                // and its eventual result is dropped.
                let e = ExtractError::BackendTimeout {
                    backend: kind.name(),
                };
                warn!(backend = kind.name(), "backend timed out");
                failures.push(format!("{}: {e}", kind.name()));
            }
        }
    }

    let Some(best_index) = select_best(&successes) else {
        return Err(ExtractError::AllBackendsFailed(failures.join("; ")));
    };
    let mut chosen = successes.swap_remove(best_index);

    // Degraded run: the result stands, but the caller should know one
    // backend contributed nothing.
    for failure in failures {
        chosen.warnings.push(format!("backend failed: {failure}"));
    }

    debug!(backend = chosen.backend, "selected extraction");
    Ok(chosen)
}

fn select_best(successes: &[RawExtraction]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, raw) in successes.iter().enumerate() {
        let better = match best {
            None => true,
            Some(b) => {
                let (bq, q) = (successes[b].quality_score(), raw.quality_score());
                // Strict comparisons keep attempt order as the final tie-break.
                q > bq || (q == bq && raw.tables.len() > successes[b].tables.len())
            }
        };
        if better {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::RawTable;

    fn raw(backend: &'static str, pages: Vec<&str>, tables: usize) -> RawExtraction {
        RawExtraction {
            backend,
            pages: pages.into_iter().map(String::from).collect(),
            tables: (0..tables)
                .map(|i| RawTable {
                    page: i + 1,
                    rows: vec![vec!["x".into(), "1".into()]],
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_select_best_prefers_quality() {
        let a = raw("pdftotext", vec!["text", ""], 0);
        let b = raw("lopdf", vec!["text", "text"], 0);
        assert_eq!(select_best(&[a, b]), Some(1));
    }

    #[test]
    fn test_select_best_tie_breaks_on_tables() {
        // Table yield saturates at 10 in the quality score, so these two
        // tie on quality and the raw table count decides.
        let a = raw("pdftotext", vec!["text"], 10);
        let b = raw("lopdf", vec!["text"], 12);
        assert_eq!(select_best(&[a, b]), Some(1));
    }

    #[test]
    fn test_select_best_full_tie_keeps_attempt_order() {
        let a = raw("pdftotext", vec!["text"], 2);
        let b = raw("lopdf", vec!["text"], 2);
        assert_eq!(select_best(&[a, b]), Some(0));
    }

    #[test]
    fn test_select_best_empty() {
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_all_backends_failed_on_garbage() {
        // Garbage bytes defeat lopdf outright; pdftotext either fails on
        // them or is absent from the test environment.
        let config = ExtractionConfig::default();
        let result = run_backends(b"definitely not a pdf", &config);
        assert!(matches!(result, Err(ExtractError::AllBackendsFailed(_))));
    }
}
