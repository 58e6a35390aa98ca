pub use crate::config::{ReportConfiguration, ReportFormat};
pub use crate::metrics::{NullableFloat, OutcomeRecord, ReportAggregator};
pub use crate::report::{Bucket, ErrorMetric, Percentile, Report, StatusCodeMetric};
pub use crate::BoomerError;
