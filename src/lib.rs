//! # Boomer
//!
//! Boomer reduces the outcomes of a load test into a single summary report.
//!
//! A load generator runs any number of concurrent workers, each of which sends
//! one [`OutcomeRecord`](./metrics/struct.OutcomeRecord.html) per completed
//! request into a [`flume`](https://docs.rs/flume/) channel. When the test is
//! over, the [`ReportAggregator`](./metrics/struct.ReportAggregator.html) drains
//! that channel and derives a [`Report`](./report/struct.Report.html):
//!  - fastest, slowest and average latency, and requests per second;
//!  - the latency of the 10th, 25th, 50th, 75th, 90th, 95th and 99th percentiles;
//!  - an 11-boundary latency histogram;
//!  - the distribution of HTTP status codes, and (on demand) of errors.
//!
//! Boomer does not send requests, schedule workers or print anything: it is the
//! pure reduction step between the two.
//!
//! ## Aggregating a load test
//!
//! ```rust
//! use boomer::prelude::*;
//! use std::time::Duration;
//!
//! let (tx, rx) = flume::unbounded();
//!
//! // Workers send one record per completed request.
//! tx.send(OutcomeRecord::success(Duration::from_millis(12), 200, 512)).unwrap();
//! tx.send(OutcomeRecord::success(Duration::from_millis(30), 200, 512)).unwrap();
//! tx.send(OutcomeRecord::failure("connection refused")).unwrap();
//!
//! // Dropping every sender tells the aggregator that production is complete.
//! drop(tx);
//!
//! let mut report = ReportAggregator::new(rx, ReportFormat::Summary, Duration::from_secs(1))
//!     .finalize();
//! assert_eq!(report.lats.len(), 2);
//! assert_eq!(*report.rps, 2.0);
//! assert_eq!(report.size_total, 1024);
//!
//! // The error distribution is only tabulated when asked for.
//! assert!(report.errors.is_empty());
//! report.error_distribution();
//! assert_eq!(report.errors[0].count, 1);
//! ```
//!
//! ## Output
//!
//! A [`Report`](./report/struct.Report.html) is a plain value with public fields.
//! It serializes with [`serde`](https://docs.rs/serde/), and implements
//! [`std::fmt::Display`] to render a human readable summary:
//!
//! ```text
//! Summary:
//!   Total:          1.0000 secs
//!   Slowest:        30.0000 ms
//!   Fastest:        12.0000 ms
//!   Average:        21.0000 ms
//!   Requests/sec:   2.0000
//!   Total data:     1,024 bytes
//! ```
//!
//! Undefined statistics (a run without a single successful request has no
//! average and no rate) are `NaN`, which serializes as `null`.
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! <http://www.apache.org/licenses/LICENSE-2.0>
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

#[macro_use]
extern crate log;

pub mod config;
pub mod metrics;
pub mod prelude;
pub mod report;
pub mod util;

use std::{fmt, io};

/// An enumeration of all errors Boomer can return.
///
/// Aggregating a report never fails. Errors only come from the surfaces around it:
/// parsing configuration, serializing a report, and opening a log file.
#[derive(Debug)]
pub enum BoomerError {
    /// Wraps a [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html).
    Io(io::Error),
    /// Wraps a [`serde_json::Error`](https://docs.rs/serde_json/*/serde_json/struct.Error.html).
    Serde(serde_json::Error),
    /// Invalid option or value specified.
    InvalidOption {
        /// The invalid option that caused this error.
        option: String,
        /// The invalid value that caused this error.
        value: String,
        /// An optional explanation of the error.
        detail: String,
    },
}
/// Implement a helper to provide a text description of all possible types of errors.
impl BoomerError {
    fn describe(&self) -> &str {
        match *self {
            BoomerError::Io(_) => "io::Error",
            BoomerError::Serde(_) => "serde_json::Error",
            BoomerError::InvalidOption { .. } => "invalid option or value specified",
        }
    }
}

/// Implement format trait to allow displaying errors.
impl fmt::Display for BoomerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BoomerError::Io(ref source) => {
                write!(f, "BoomerError: {} ({})", self.describe(), source)
            }
            BoomerError::Serde(ref source) => {
                write!(f, "BoomerError: {} ({})", self.describe(), source)
            }
            BoomerError::InvalidOption {
                ref option,
                ref value,
                ref detail,
            } => write!(
                f,
                "BoomerError: {}: {} = '{}' ({})",
                self.describe(),
                option,
                value,
                detail
            ),
        }
    }
}

// Define the lower level source of this error, if any.
impl std::error::Error for BoomerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            BoomerError::Io(ref source) => Some(source),
            BoomerError::Serde(ref source) => Some(source),
            _ => None,
        }
    }
}

/// Auto-convert IO errors.
impl From<io::Error> for BoomerError {
    fn from(err: io::Error) -> BoomerError {
        BoomerError::Io(err)
    }
}

/// Auto-convert serde_json errors.
impl From<serde_json::Error> for BoomerError {
    fn from(err: serde_json::Error) -> BoomerError {
        BoomerError::Serde(err)
    }
}
