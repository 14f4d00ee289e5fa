//! Batch worker loop.
//!
//! Pulls screenshots off the shared queue and extracts each one on its own.
//! Failures are logged and recorded, never retried.

use chrono::NaiveDate;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;

use super::queue::BatchItem;
use crate::boxscore::{BoxScoreSource, ExtractError, Extraction};
use crate::export::append_stats;
use crate::log;

/// Outcome for one queued screenshot.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub item: BatchItem,
    pub outcome: Extraction,
}

/// Where successful rows are appended. The mutex keeps concurrent
/// workers from interleaving partial lines.
pub struct CsvSink<'a> {
    pub path: &'a Path,
    pub lock: Mutex<()>,
}

/// Runs the worker loop until the channel closes (sender dropped).
///
/// Several workers may share one receiver; each takes the lock only long
/// enough to pull the next item. Rows without a detected date get
/// `default_date` before they are recorded.
pub fn run_batch_worker<S: BoxScoreSource + ?Sized>(
    worker_id: usize,
    receiver: &Mutex<Receiver<BatchItem>>,
    source: &S,
    sink: Option<&CsvSink<'_>>,
    default_date: NaiveDate,
) -> Vec<BatchResult> {
    log(&format!("Batch worker {} started", worker_id));
    let mut results = Vec::new();

    loop {
        let next = match receiver.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => {
                log(&format!("Batch worker {}: queue lock poisoned, exiting", worker_id));
                break;
            }
        };
        let Ok(item) = next else {
            break;
        };

        log(&format!(
            "Batch worker {}: processing #{} ({})",
            worker_id,
            item.index + 1,
            item.image_path.display()
        ));

        let result = match std::fs::read(&item.image_path) {
            Ok(bytes) => source
                .extract(&bytes, &item.username)
                .map(|stats| stats.with_default_date(default_date)),
            Err(e) => Err(ExtractError::OcrUnavailable {
                reason: format!("failed to read {}: {}", item.image_path.display(), e),
            }),
        };

        match &result {
            Ok(stats) => {
                log(&format!(
                    "#{}: {} {} pts {} reb {} ast",
                    item.index + 1,
                    stats.username,
                    stats.points,
                    stats.rebounds,
                    stats.assists
                ));
                if let Some(sink) = sink {
                    let _guard = sink.lock.lock();
                    if let Err(e) = append_stats(sink.path, &item.image_path, stats) {
                        log(&format!("#{}: failed to write CSV: {}", item.index + 1, e));
                    }
                }
            }
            Err(e) => log(&format!("#{}: {} ({})", item.index + 1, e, e.kind())),
        }

        results.push(BatchResult {
            item,
            outcome: Extraction::from(result),
        });
    }

    log(&format!("Batch worker {} finished", worker_id));
    results
}
