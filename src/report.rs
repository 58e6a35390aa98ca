//! The summary report derived from the outcomes of a load test.
//!
//! A [`Report`] is built by the [`ReportAggregator`](../metrics/struct.ReportAggregator.html)
//! and returned by value once every outcome has been drained. After that it's a plain
//! value: downstream printers read its public fields, serialize it, or render it with
//! [`std::fmt::Display`].
//!
//! # Example
//! When viewed with [`std::fmt::Display`], a report is rendered as:
//! ```text
//! Summary:
//!   Total:          10.0000 secs
//!   Slowest:        40.0000 ms
//!   Fastest:        10.0000 ms
//!   Average:        25.0000 ms
//!   Requests/sec:   10.0000
//!   Total data:     10,000 bytes
//!   Size/request:   100 bytes
//!
//! Status code distribution:
//!   [200] 100 responses (OK)
//!
//! Latency distribution:
//!   10% in 10.0000 ms
//!   25% in 20.0000 ms
//!   50% in 30.0000 ms
//!   75% in 40.0000 ms
//!   90% in 40.0000 ms
//!   95% in 40.0000 ms
//!   99% in 40.0000 ms
//!
//! Response time histogram:
//!   10.000 [25]  |∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎∎
//!   13.000 [0]   |
//!   ...
//! ```

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::convert::TryFrom;
use std::fmt;
use std::time::Duration;

use crate::config::ReportFormat;
use crate::metrics::{self, NullableFloat, OutcomeRecord};
use crate::{util, BoomerError};

/// Character used to draw histogram bars.
const BAR_CHAR: &str = "∎";

/// Length of the bar drawn for the largest histogram bucket.
const BAR_LENGTH: usize = 40;

/// Errors longer than this are truncated when displayed.
const ERROR_LENGTH: usize = 60;

/// The latency of one percentile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentile {
    /// The percentile, for example `90`.
    pub percent: u8,
    /// How many milliseconds requests in this percentile completed within.
    #[serde(rename = "count")]
    pub latency: f64,
}

/// One bucket of the latency histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// The upper boundary of the bucket, in milliseconds.
    pub bucket: f64,
    /// How many latencies fell in the bucket.
    pub count: usize,
}

/// How many times a status code was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCodeMetric {
    pub code: u16,
    pub count: usize,
}

/// How many times an error occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMetric {
    pub error: String,
    pub count: usize,
}

/// The summary of a load test.
///
/// All latencies are in milliseconds. When no request succeeded there's nothing to
/// derive statistics from: `rps` and `average` are [`NullableFloat::NONE`], and the
/// latency lists are empty.
///
/// Serialized reports always carry the tabulated error distribution, and loading a
/// report rebuilds the status code and error counters from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ReportDocument", into = "ReportDocument")]
pub struct Report {
    /// Total seconds spent on successful requests.
    pub avg_total: f64,
    /// The fastest successful request.
    pub fastest: f64,
    /// The slowest successful request.
    pub slowest: f64,
    /// The average successful request.
    pub average: NullableFloat,
    /// Successful requests per second of the load test.
    pub rps: NullableFloat,
    /// How many milliseconds the load test ran.
    pub total_duration: u64,
    /// Error distribution, populated by [`Report::error_distribution`] or when loading
    /// a serialized report.
    pub errors: Vec<ErrorMetric>,
    /// Status code distribution, sorted by status code.
    pub status_codes: Vec<StatusCodeMetric>,
    /// See [`PERCENTILES`](../metrics/constant.PERCENTILES.html).
    pub percentiles: Vec<Percentile>,
    /// See [`calculate_histogram`](../metrics/fn.calculate_histogram.html).
    pub histogram: Vec<Bucket>,
    /// Latency of every successful request, ascending.
    pub lats: Vec<f64>,
    /// Total bytes received by successful requests with a known content length.
    pub size_total: i64,

    /// Occurrences of each status code.
    pub status_code_counts: HashMap<u16, usize>,
    /// Occurrences of each error.
    pub error_counts: BTreeMap<String, usize>,
    /// How downstream printers should render this report.
    pub output: ReportFormat,
    /// How long the load test ran.
    total: Duration,
}

/// The serialized fields of a [`Report`]. Percentiles keep their historical
/// `percentiales` key.
#[derive(Serialize, Deserialize)]
struct ReportDocument {
    avg_total: f64,
    fastest: f64,
    slowest: f64,
    average: NullableFloat,
    rps: NullableFloat,
    total_duration: u64,
    errors: Vec<ErrorMetric>,
    status_codes: Vec<StatusCodeMetric>,
    #[serde(rename = "percentiales")]
    percentiles: Vec<Percentile>,
    histogram: Vec<Bucket>,
    lats: Vec<f64>,
    size_total: i64,
}

impl From<Report> for ReportDocument {
    fn from(report: Report) -> Self {
        let errors = tabulate_errors(&report.error_counts);
        ReportDocument {
            avg_total: report.avg_total,
            fastest: report.fastest,
            slowest: report.slowest,
            average: report.average,
            rps: report.rps,
            total_duration: report.total_duration,
            errors,
            status_codes: report.status_codes,
            percentiles: report.percentiles,
            histogram: report.histogram,
            lats: report.lats,
            size_total: report.size_total,
        }
    }
}

impl From<ReportDocument> for Report {
    fn from(document: ReportDocument) -> Self {
        let status_code_counts = document
            .status_codes
            .iter()
            .map(|status_code| (status_code.code, status_code.count))
            .collect();
        let error_counts = document
            .errors
            .iter()
            .map(|error| (error.error.to_string(), error.count))
            .collect();
        Report {
            avg_total: document.avg_total,
            fastest: document.fastest,
            slowest: document.slowest,
            average: document.average,
            rps: document.rps,
            total_duration: document.total_duration,
            errors: document.errors,
            status_codes: document.status_codes,
            percentiles: document.percentiles,
            histogram: document.histogram,
            lats: document.lats,
            size_total: document.size_total,
            status_code_counts,
            error_counts,
            output: ReportFormat::default(),
            total: Duration::from_millis(document.total_duration),
        }
    }
}

impl Report {
    pub(crate) fn new(output: ReportFormat, total: Duration) -> Self {
        Report {
            avg_total: 0.0,
            fastest: 0.0,
            slowest: 0.0,
            average: NullableFloat::NONE,
            rps: NullableFloat::NONE,
            total_duration: u64::try_from(total.as_millis()).unwrap_or(u64::MAX),
            errors: Vec::new(),
            status_codes: Vec::new(),
            percentiles: Vec::new(),
            histogram: Vec::new(),
            lats: Vec::new(),
            size_total: 0,
            status_code_counts: HashMap::new(),
            error_counts: BTreeMap::new(),
            output,
            total,
        }
    }

    /// Classify a single outcome.
    ///
    /// Failures only count towards the error distribution, successes towards
    /// everything else.
    pub(crate) fn record(&mut self, outcome: OutcomeRecord) {
        match outcome.error {
            Some(error) => {
                *self.error_counts.entry(error).or_insert(0) += 1;
            }
            None => {
                self.lats.push(util::as_millis_f64(outcome.duration));
                self.avg_total += outcome.duration.as_secs_f64();
                *self
                    .status_code_counts
                    .entry(outcome.status_code)
                    .or_insert(0) += 1;
                if outcome.content_length > 0 {
                    self.size_total += outcome.content_length;
                }
            }
        }
    }

    /// Derive statistics once every outcome has been recorded.
    pub(crate) fn summarize(&mut self) {
        let successes = self.lats.len();
        if successes == 0 {
            info!(
                "no successful requests out of {}, nothing to summarize",
                self.failure_count()
            );
            return;
        }

        self.rps = util::per_second(successes, self.total);
        self.average = NullableFloat(self.avg_total / successes as f64 * 1000.0);

        // Percentiles and the histogram require sorted latencies.
        self.lats.sort_by(|a, b| a.total_cmp(b));
        self.fastest = self.lats[0];
        self.slowest = self.lats[successes - 1];

        self.status_codes = self
            .status_code_counts
            .iter()
            .sorted()
            .map(|(code, count)| StatusCodeMetric {
                code: *code,
                count: *count,
            })
            .collect();
        self.percentiles = metrics::calculate_percentiles(&self.lats);
        self.histogram = metrics::calculate_histogram(&self.lats);
        debug!(
            "summarized {} successful requests: {} status codes, {} percentiles",
            successes,
            self.status_codes.len(),
            self.percentiles.len()
        );
    }

    /// Tabulate the error distribution into [`Report::errors`], sorted by error.
    ///
    /// Errors aren't tabulated when the report is built: call this if error details
    /// are wanted.
    pub fn error_distribution(&mut self) -> &[ErrorMetric] {
        self.errors = tabulate_errors(&self.error_counts);
        &self.errors
    }

    /// How many requests succeeded.
    pub fn success_count(&self) -> usize {
        self.lats.len()
    }

    /// How many requests failed.
    pub fn failure_count(&self) -> usize {
        self.error_counts.values().sum()
    }

    /// The count of the largest histogram bucket.
    pub fn histogram_max(&self) -> usize {
        self.histogram.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Serialize the report as a compact JSON document.
    pub fn to_json(&self) -> Result<String, BoomerError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize the report as an indented JSON document.
    pub fn to_json_pretty(&self) -> Result<String, BoomerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report in its configured [`ReportFormat`].
    pub fn render(&self) -> Result<String, BoomerError> {
        match self.output {
            ReportFormat::Summary => Ok(self.to_string()),
            ReportFormat::Json => self.to_json(),
            ReportFormat::Pretty => self.to_json_pretty(),
        }
    }

    pub(crate) fn fmt_summary(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Summary:")?;
        writeln!(
            fmt,
            "  Total:          {:.4} secs",
            self.total_duration as f64 / 1000.0
        )?;
        writeln!(fmt, "  Slowest:        {:.4} ms", self.slowest)?;
        writeln!(fmt, "  Fastest:        {:.4} ms", self.fastest)?;
        writeln!(fmt, "  Average:        {:.4} ms", self.average)?;
        writeln!(fmt, "  Requests/sec:   {:.4}", self.rps)?;
        writeln!(
            fmt,
            "  Total data:     {} bytes",
            util::format_number(self.size_total)
        )?;
        if self.success_count() > 0 {
            writeln!(
                fmt,
                "  Size/request:   {} bytes",
                util::format_number(self.size_total / self.success_count() as i64)
            )?;
        }
        let failures = self.failure_count();
        if failures > 0 {
            writeln!(fmt, "  Failed:         {}", util::format_number(failures))?;
        }
        Ok(())
    }

    pub(crate) fn fmt_status_codes(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status_codes.is_empty() {
            return Ok(());
        }
        writeln!(fmt, "\nStatus code distribution:")?;
        for status_code in &self.status_codes {
            let reason = http::StatusCode::from_u16(status_code.code)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("Unknown");
            writeln!(
                fmt,
                "  [{}] {} responses ({})",
                status_code.code,
                util::format_number(status_code.count),
                reason
            )?;
        }
        Ok(())
    }

    pub(crate) fn fmt_percentiles(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.percentiles.is_empty() {
            return Ok(());
        }
        writeln!(fmt, "\nLatency distribution:")?;
        for percentile in &self.percentiles {
            writeln!(
                fmt,
                "  {}% in {:.4} ms",
                percentile.percent, percentile.latency
            )?;
        }
        Ok(())
    }

    pub(crate) fn fmt_histogram(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.histogram.is_empty() {
            return Ok(());
        }
        let max = self.histogram_max();
        writeln!(fmt, "\nResponse time histogram:")?;
        for bucket in &self.histogram {
            let bar_length = if max > 0 {
                bucket.count * BAR_LENGTH / max
            } else {
                0
            };
            writeln!(
                fmt,
                "  {:.3} {:<6}|{}",
                bucket.bucket,
                format!("[{}]", bucket.count),
                BAR_CHAR.repeat(bar_length)
            )?;
        }
        Ok(())
    }

    pub(crate) fn fmt_errors(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return Ok(());
        }
        writeln!(fmt, "\nError distribution:")?;
        for error in &self.errors {
            writeln!(
                fmt,
                "  [{}]\t{}",
                util::format_number(error.count),
                util::truncate_string(&error.error, ERROR_LENGTH)
            )?;
        }
        Ok(())
    }
}

/// Implement format trait to allow displaying reports.
fn tabulate_errors(error_counts: &BTreeMap<String, usize>) -> Vec<ErrorMetric> {
    error_counts
        .iter()
        .map(|(error, count)| ErrorMetric {
            error: error.to_string(),
            count: *count,
        })
        .collect()
}

impl fmt::Display for Report {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_summary(fmt)?;
        self.fmt_status_codes(fmt)?;
        self.fmt_percentiles(fmt)?;
        self.fmt_histogram(fmt)?;
        self.fmt_errors(fmt)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn success(milliseconds: u64, status_code: u16) -> OutcomeRecord {
        OutcomeRecord::success(Duration::from_millis(milliseconds), status_code, 100)
    }

    fn build_report(outcomes: Vec<OutcomeRecord>, total: Duration) -> Report {
        let mut report = Report::new(ReportFormat::Summary, total);
        for outcome in outcomes {
            report.record(outcome);
        }
        report.summarize();
        report
    }

    #[test]
    fn record_classifies_outcomes() {
        let mut report = Report::new(ReportFormat::Summary, Duration::from_secs(1));
        report.record(OutcomeRecord::success(Duration::from_millis(8), 200, 512));
        assert_eq!(report.lats, vec![8.0]);
        assert_eq!(report.status_code_counts[&200], 1);
        assert_eq!(report.size_total, 512);
        assert!(report.error_counts.is_empty());

        report.record(OutcomeRecord::failure("connection refused"));
        // Failures don't touch success statistics.
        assert_eq!(report.lats.len(), 1);
        assert_eq!(report.status_code_counts.len(), 1);
        assert_eq!(report.size_total, 512);
        assert_eq!(report.error_counts["connection refused"], 1);

        // Zero and unknown content lengths aren't added.
        report.record(OutcomeRecord::success(Duration::from_millis(4), 204, 0));
        report.record(OutcomeRecord::success(Duration::from_millis(4), 200, -1));
        assert_eq!(report.size_total, 512);
        assert_eq!(report.success_count(), 3);
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn summarize_statistics() {
        let report = build_report(
            vec![success(30, 200), success(10, 200), success(20, 200), success(40, 200)],
            Duration::from_secs(2),
        );
        assert_eq!(report.lats, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(report.fastest, 10.0);
        assert_eq!(report.slowest, 40.0);
        assert_eq!(report.rps.get(), Some(2.0));
        assert!((*report.average - 25.0).abs() < 1e-9);
        assert!((report.avg_total - 0.1).abs() < 1e-9);
        assert_eq!(report.size_total, 400);
        assert_eq!(report.total_duration, 2_000);
        assert_eq!(report.histogram.len(), 11);
        assert_eq!(report.histogram.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn status_code_distribution() {
        let report = build_report(
            vec![
                success(1, 200),
                success(1, 200),
                success(1, 404),
                success(1, 200),
                success(1, 500),
            ],
            Duration::from_secs(1),
        );
        let counts: HashMap<u16, usize> = report
            .status_codes
            .iter()
            .map(|s| (s.code, s.count))
            .collect();
        let mut expected = HashMap::new();
        expected.insert(200, 3);
        expected.insert(404, 1);
        expected.insert(500, 1);
        assert_eq!(counts, expected);
    }

    #[test]
    fn error_distribution_on_demand() {
        let mut report = build_report(
            vec![
                OutcomeRecord::failure("timeout"),
                success(5, 200),
                OutcomeRecord::failure("timeout"),
                OutcomeRecord::failure("connection refused"),
            ],
            Duration::from_secs(1),
        );
        // Not tabulated until asked for.
        assert!(report.errors.is_empty());

        let errors = report.error_distribution().to_vec();
        assert_eq!(
            errors,
            vec![
                ErrorMetric {
                    error: "connection refused".to_string(),
                    count: 1
                },
                ErrorMetric {
                    error: "timeout".to_string(),
                    count: 2
                },
            ]
        );
        // Tabulating again gives the same distribution.
        assert_eq!(report.error_distribution(), errors.as_slice());
    }

    #[test]
    fn no_successful_requests() {
        let mut report = build_report(
            vec![OutcomeRecord::failure("timeout")],
            Duration::from_secs(5),
        );
        assert!(report.lats.is_empty());
        assert!(report.rps.is_none());
        assert!(report.average.is_none());
        assert_eq!(report.fastest, 0.0);
        assert_eq!(report.slowest, 0.0);
        assert_eq!(report.size_total, 0);
        assert!(report.status_codes.is_empty());
        assert!(report.percentiles.is_empty());
        assert!(report.histogram.is_empty());
        assert_eq!(report.error_distribution().len(), 1);
    }

    #[test]
    fn zero_length_load_test() {
        let report = build_report(vec![success(5, 200)], Duration::from_secs(0));
        assert!(report.rps.is_none());
        assert!((*report.average - 5.0).abs() < 1e-9);
    }

    #[test]
    fn json() {
        let mut report = build_report(
            vec![success(10, 200), OutcomeRecord::failure("timeout")],
            Duration::from_secs(1),
        );
        report.error_distribution();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["fastest"], 10.0);
        assert_eq!(value["rps"], 1.0);
        assert_eq!(value["total_duration"], 1000);
        assert_eq!(value["size_total"], 100);
        assert_eq!(value["status_codes"][0]["code"], 200);
        assert_eq!(value["errors"][0]["error"], "timeout");
        assert_eq!(value["histogram"].as_array().unwrap().len(), 11);
        // Internal counters aren't part of the document.
        assert!(value.get("status_code_counts").is_none());
        assert!(value.get("output").is_none());
    }

    #[test]
    fn json_without_data() {
        let report = build_report(vec![], Duration::from_secs(1));
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["rps"].is_null());
        assert!(value["average"].is_null());

        let report: Report = serde_json::from_str(&json).unwrap();
        assert!(report.rps.is_none());
        assert!(report.average.is_none());
        assert!(report.lats.is_empty());
    }

    #[test]
    fn json_field_names() {
        let report = build_report(
            vec![success(10, 200), success(20, 200), success(30, 200)],
            Duration::from_secs(1),
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("percentiles").is_none());
        let percentiales = value["percentiales"].as_array().unwrap();
        assert_eq!(percentiales.len(), report.percentiles.len());
        assert_eq!(percentiales[0]["percent"], report.percentiles[0].percent);
        assert_eq!(
            percentiales[0]["count"].as_f64(),
            Some(report.percentiles[0].latency)
        );
        assert!(percentiales[0].get("latency").is_none());
    }

    #[test]
    fn loaded_report_keeps_counters() {
        let report = build_report(
            vec![
                success(10, 200),
                success(20, 404),
                OutcomeRecord::failure("timeout"),
                OutcomeRecord::failure("timeout"),
            ],
            Duration::from_secs(2),
        );
        // Errors weren't tabulated in memory, the document carries them anyway.
        assert!(report.errors.is_empty());

        let mut loaded: Report = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(loaded.failure_count(), 2);
        assert_eq!(loaded.status_code_counts[&404], 1);
        assert_eq!(loaded.total_duration, 2_000);
        assert_eq!(
            loaded.error_distribution(),
            &[ErrorMetric {
                error: "timeout".to_string(),
                count: 2
            }]
        );
    }

    #[test]
    fn saturating_total_duration() {
        let report = Report::new(ReportFormat::Summary, Duration::MAX);
        assert_eq!(report.total_duration, u64::MAX);
    }

    #[test]
    fn render_by_format() {
        let mut report = build_report(vec![success(10, 200)], Duration::from_secs(1));
        assert!(report.render().unwrap().starts_with("Summary:"));
        report.output = ReportFormat::Json;
        assert!(report.render().unwrap().starts_with('{'));
        assert!(!report.render().unwrap().contains('\n'));
        report.output = ReportFormat::Pretty;
        assert!(report.render().unwrap().contains('\n'));
    }

    #[test]
    fn display() {
        let mut report = build_report(
            vec![
                success(10, 200),
                success(20, 200),
                success(30, 404),
                OutcomeRecord::failure("timeout"),
            ],
            Duration::from_secs(1),
        );
        report.error_distribution();
        let output = report.to_string();
        assert!(output.contains("Summary:"));
        assert!(output.contains("  Slowest:        30.0000 ms"));
        assert!(output.contains("  Fastest:        10.0000 ms"));
        assert!(output.contains("  Requests/sec:   3.0000"));
        assert!(output.contains("  Total data:     300 bytes"));
        assert!(output.contains("  Failed:         1"));
        assert!(output.contains("  [200] 2 responses (OK)"));
        assert!(output.contains("  [404] 1 responses (Not Found)"));
        assert!(output.contains("Latency distribution:"));
        assert!(output.contains("Response time histogram:"));
        assert!(output.contains(&BAR_CHAR.repeat(BAR_LENGTH)));
        assert!(output.contains("Error distribution:"));
        assert!(output.contains("  [1]\ttimeout"));
    }

    #[test]
    fn display_without_data() {
        let report = build_report(vec![], Duration::from_secs(1));
        let output = report.to_string();
        assert!(output.contains("  Average:        - ms"));
        assert!(output.contains("  Requests/sec:   -"));
        assert!(!output.contains("Latency distribution:"));
        assert!(!output.contains("Response time histogram:"));
    }
}
