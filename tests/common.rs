use std::thread::JoinHandle;
use std::time::Duration;

use boomer::prelude::*;

type WorkerHandles = Vec<JoinHandle<()>>;

// Not all functions are used by all tests, so we enable allow(dead_code) to avoid
// compiler warnings during testing.

/// Build successful outcomes with the given latencies in milliseconds, all returning
/// `200 OK` and 100 bytes.
#[allow(dead_code)]
pub fn successes(latencies: &[u64]) -> Vec<OutcomeRecord> {
    latencies
        .iter()
        .map(|latency| OutcomeRecord::success(Duration::from_millis(*latency), 200, 100))
        .collect()
}

/// Build successful outcomes with the given status codes, all taking 1 millisecond.
#[allow(dead_code)]
pub fn status_codes(codes: &[u16]) -> Vec<OutcomeRecord> {
    codes
        .iter()
        .map(|code| OutcomeRecord::success(Duration::from_millis(1), *code, 100))
        .collect()
}

/// Send all outcomes from the test thread, close the channel, and aggregate them.
#[allow(dead_code)]
pub fn aggregate(outcomes: Vec<OutcomeRecord>, total: Duration) -> Report {
    let (tx, rx) = flume::unbounded();
    for outcome in outcomes {
        tx.send(outcome).expect("failed to send outcome");
    }
    // Dropping the only sender closes the channel.
    drop(tx);

    ReportAggregator::new(rx, ReportFormat::Summary, total).finalize()
}

/// Launch each worker in its own thread, each sending a copy of `outcomes` with an
/// optional delay before every send. Returns the receiving end of the channel, which
/// closes once every worker exits, together with the worker handles.
#[allow(dead_code)]
pub fn launch_workers(
    // The number of workers to launch.
    workers: usize,
    // Outcomes sent by each worker.
    outcomes: Vec<OutcomeRecord>,
    // How long each worker waits before sending an outcome.
    delay: Duration,
) -> (flume::Receiver<OutcomeRecord>, WorkerHandles) {
    let (tx, rx) = flume::unbounded();

    let mut worker_handles = Vec::new();
    for _ in 0..workers {
        let worker_tx = tx.clone();
        let worker_outcomes = outcomes.clone();
        worker_handles.push(std::thread::spawn(move || {
            for outcome in worker_outcomes {
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                worker_tx.send(outcome).expect("failed to send outcome");
            }
        }));
    }

    // Only the workers hold senders now.
    drop(tx);

    (rx, worker_handles)
}

/// Sum the counts of every histogram bucket.
#[allow(dead_code)]
pub fn histogram_total(report: &Report) -> usize {
    report.histogram.iter().map(|bucket| bucket.count).sum()
}
