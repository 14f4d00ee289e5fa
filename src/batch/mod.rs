//! Batch extraction over many screenshots.
//!
//! Every extraction is independent, so several workers drain one queue in
//! parallel. Results come back in request order.

pub mod queue;
pub mod worker;

pub use queue::{BatchItem, create_work_queue};
pub use worker::{BatchResult, CsvSink, run_batch_worker};

use chrono::NaiveDate;
use std::path::Path;
use std::sync::Mutex;
use std::thread;

use crate::boxscore::BoxScoreSource;
use crate::log;

/// Extracts every item with `workers` threads and returns outcomes sorted
/// by `BatchItem::index`. Undated rows take `default_date`, in the CSV and
/// in the returned outcomes alike.
pub fn run_batch<S: BoxScoreSource + Sync + ?Sized>(
    items: Vec<BatchItem>,
    source: &S,
    workers: usize,
    csv_path: Option<&Path>,
    default_date: NaiveDate,
) -> Vec<BatchResult> {
    let workers = workers.clamp(1, items.len().max(1));
    log(&format!(
        "Batch: {} screenshots, {} workers",
        items.len(),
        workers
    ));

    let (sender, receiver) = create_work_queue();
    for item in items {
        // The receiver is still alive here, so sending cannot fail
        let _ = sender.send(item);
    }
    drop(sender);

    let receiver = Mutex::new(receiver);
    let sink = csv_path.map(|path| CsvSink {
        path,
        lock: Mutex::new(()),
    });

    let mut results: Vec<BatchResult> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let receiver = &receiver;
                let sink = sink.as_ref();
                s.spawn(move || run_batch_worker(id, receiver, source, sink, default_date))
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(results) => results,
                Err(_) => {
                    log("Batch worker panicked; its results are lost");
                    Vec::new()
                }
            })
            .collect()
    });

    results.sort_by_key(|r| r.item.index);

    let succeeded = results.iter().filter(|r| r.outcome.is_success()).count();
    log(&format!(
        "Batch complete: {} succeeded, {} failed",
        succeeded,
        results.len() - succeeded
    ));

    results
}
