//! Outcome records, and the aggregator that reduces them into a [`Report`].
//!
//! Load generator workers send one [`OutcomeRecord`] per completed request to the
//! parent process using an
//! [`unbounded Flume channel`](https://docs.rs/flume/*/flume/fn.unbounded.html).
//! Workers spend all their time generating load: nothing is aggregated until the
//! load test is over and [`ReportAggregator::finalize`] drains the channel.
//!
//! The channel is drained until it is both empty and closed. Every worker must drop
//! its [`flume::Sender`] when it finishes: that is the signal that no further
//! outcomes will arrive. A sender kept alive by the caller makes `finalize` wait
//! for it.
//!
//! When the channel can't be closed, join the workers first and call
//! [`ReportAggregator::finalize_available`], which drains only what is already
//! queued and never waits.

mod nullable;

pub use nullable::NullableFloat;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ReportFormat;
use crate::report::{Bucket, Percentile, Report};

/// Percentiles included in every report, in ascending order.
pub const PERCENTILES: [u8; 7] = [10, 25, 50, 75, 90, 95, 99];

/// How many equal-width buckets the latency histogram is split into. The histogram
/// has one more boundary than this, the last being the slowest latency.
pub const HISTOGRAM_BUCKETS: usize = 10;

/// The outcome of a single request made during a load test.
///
/// An outcome is either a success, carrying the latency, status code and size of
/// the response, or a failure carrying only an error. Build them with
/// [`OutcomeRecord::success`] and [`OutcomeRecord::failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// How long the request took.
    pub duration: Duration,
    /// The HTTP response code.
    pub status_code: u16,
    /// How many bytes were received, negative if unknown.
    pub content_length: i64,
    /// Why the request failed, `None` if it succeeded.
    pub error: Option<String>,
}

impl OutcomeRecord {
    /// A request that completed and returned a response.
    pub fn success(duration: Duration, status_code: u16, content_length: i64) -> Self {
        OutcomeRecord {
            duration,
            status_code,
            content_length,
            error: None,
        }
    }

    /// A request that failed before returning a response.
    pub fn failure<E: ToString>(error: E) -> Self {
        OutcomeRecord {
            duration: Duration::default(),
            status_code: 0,
            content_length: 0,
            error: Some(error.to_string()),
        }
    }

    /// Whether or not the request succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Reduces the outcomes of a load test into a [`Report`].
///
/// # Example
/// ```rust
/// use boomer::prelude::*;
/// use std::time::Duration;
///
/// let (tx, rx) = flume::unbounded();
/// let workers: Vec<_> = (1..=4)
///     .map(|worker| {
///         let tx = tx.clone();
///         std::thread::spawn(move || {
///             for _ in 0..25 {
///                 let latency = Duration::from_millis(worker * 10);
///                 tx.send(OutcomeRecord::success(latency, 200, 100)).unwrap();
///             }
///         })
///     })
///     .collect();
/// // Only the workers hold senders now: the channel closes when they finish.
/// drop(tx);
///
/// let report = ReportAggregator::new(rx, ReportFormat::Json, Duration::from_secs(10))
///     .finalize();
/// for worker in workers {
///     worker.join().unwrap();
/// }
/// assert_eq!(report.lats.len(), 100);
/// assert_eq!(report.fastest, 10.0);
/// assert_eq!(report.slowest, 40.0);
/// assert_eq!(*report.rps, 10.0);
/// ```
#[derive(Debug)]
pub struct ReportAggregator {
    /// Where workers send their outcomes.
    results: flume::Receiver<OutcomeRecord>,
    /// The report being built.
    report: Report,
}

impl ReportAggregator {
    /// Prepare to aggregate the outcomes of a load test that ran for `total`.
    pub fn new(
        results: flume::Receiver<OutcomeRecord>,
        output: ReportFormat,
        total: Duration,
    ) -> Self {
        ReportAggregator {
            results,
            report: Report::new(output, total),
        }
    }

    /// Drain every outcome and derive the final [`Report`].
    ///
    /// Blocks until all senders have been dropped and the channel is empty.
    pub fn finalize(self) -> Report {
        let ReportAggregator {
            results,
            mut report,
        } = self;

        let mut received: usize = 0;
        for outcome in results.iter() {
            report.record(outcome);
            received += 1;
        }
        debug!("drained {} outcome records", received);

        report.summarize();
        report
    }

    /// Drain the outcomes already queued and derive the final [`Report`], without
    /// waiting for senders to be dropped.
    ///
    /// Returns as soon as no outcome is immediately available. Only call this once
    /// every worker has stopped sending (for example after joining them): outcomes
    /// sent afterwards are not counted.
    pub fn finalize_available(self) -> Report {
        let ReportAggregator {
            results,
            mut report,
        } = self;

        let mut received: usize = 0;
        for outcome in results.drain() {
            report.record(outcome);
            received += 1;
        }
        debug!("drained {} queued outcome records", received);

        report.summarize();
        report
    }

    /// Drain every outcome and derive the final [`Report`] from within an async
    /// runtime.
    ///
    /// Yields while waiting for senders, and completes once all senders have been
    /// dropped and the channel is empty.
    pub async fn finalize_async(self) -> Report {
        let ReportAggregator {
            results,
            mut report,
        } = self;

        let mut received: usize = 0;
        while let Ok(outcome) = results.recv_async().await {
            report.record(outcome);
            received += 1;
        }
        debug!("drained {} outcome records", received);

        report.summarize();
        report
    }
}

/// Get the latency of each of the [`PERCENTILES`] from a list of latencies sorted in
/// ascending order.
///
/// Latencies are walked once. The rank of index `i` is `floor(i * 100 / N)`, and
/// each percentile takes the first latency whose rank meets or exceeds it.
///
/// Percentiles that could not be determined are omitted, as are percentiles with a
/// latency of exactly `0`: reports have never included those.
///
/// # Example
/// ```rust
/// use boomer::metrics::calculate_percentiles;
///
/// let latencies: Vec<f64> = (1..=100).map(f64::from).collect();
/// let percentiles = calculate_percentiles(&latencies);
/// assert_eq!(percentiles.len(), 7);
/// assert_eq!(percentiles[2].percent, 50);
/// assert_eq!(percentiles[2].latency, 51.0);
/// ```
pub fn calculate_percentiles(latencies: &[f64]) -> Vec<Percentile> {
    let total = latencies.len();
    let mut slots: [Option<f64>; PERCENTILES.len()] = [None; PERCENTILES.len()];

    let mut next = 0;
    for (index, latency) in latencies.iter().enumerate() {
        if next >= PERCENTILES.len() {
            break;
        }
        let rank = index * 100 / total;
        if rank >= PERCENTILES[next] as usize {
            trace!("percentile {}: rank {} of {}", PERCENTILES[next], rank, total);
            slots[next] = Some(*latency);
            next += 1;
        }
    }

    PERCENTILES
        .iter()
        .zip(slots.iter())
        .filter_map(|(percent, slot)| match slot {
            Some(latency) if *latency != 0.0 => Some(Percentile {
                percent: *percent,
                latency: *latency,
            }),
            _ => None,
        })
        .collect()
}

/// Build a latency histogram from a list of latencies sorted in ascending order.
///
/// The range from fastest to slowest is split into [`HISTOGRAM_BUCKETS`] equal-width
/// buckets. Each [`Bucket`] is identified by its upper boundary, and the final
/// boundary is the slowest latency. A latency is counted in the first bucket whose
/// boundary is greater than or equal to it.
///
/// When every latency is identical all boundaries collapse onto the same value, and
/// every latency is counted in the first bucket.
///
/// # Example
/// ```rust
/// use boomer::metrics::calculate_histogram;
///
/// let histogram = calculate_histogram(&[1.0, 2.0, 3.0, 11.0]);
/// assert_eq!(histogram.len(), 11);
/// assert_eq!(histogram[0].bucket, 1.0);
/// assert_eq!(histogram[10].bucket, 11.0);
/// assert_eq!(histogram.iter().map(|b| b.count).collect::<Vec<_>>(),
///     vec![1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1]);
/// ```
pub fn calculate_histogram(latencies: &[f64]) -> Vec<Bucket> {
    let (fastest, slowest) = match (latencies.first(), latencies.last()) {
        (Some(fastest), Some(slowest)) => (*fastest, *slowest),
        _ => return Vec::new(),
    };

    let width = (slowest - fastest) / HISTOGRAM_BUCKETS as f64;
    let mut boundaries: Vec<f64> = (0..HISTOGRAM_BUCKETS)
        .map(|bucket| fastest + width * bucket as f64)
        .collect();
    boundaries.push(slowest);
    debug!(
        "histogram from {} to {} with bucket width {}",
        fastest, slowest, width
    );

    let last = boundaries.len() - 1;
    let mut counts = vec![0; boundaries.len()];
    for latency in latencies {
        // The boundaries are ascending, so this is the first boundary >= latency.
        let bucket = boundaries
            .partition_point(|boundary| boundary < latency)
            .min(last);
        counts[bucket] += 1;
    }

    boundaries
        .into_iter()
        .zip(counts)
        .map(|(bucket, count)| Bucket { bucket, count })
        .collect()
}
