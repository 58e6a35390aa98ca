//! Utility functions used by Boomer, and available when post-processing reports.

use num_format::{Locale, ToFormattedString};
use std::time::Duration;

use crate::metrics::NullableFloat;

/// Convert a [`Duration`] into fractional milliseconds.
///
/// # Example
/// ```rust
/// use boomer::util;
/// use std::time::Duration;
///
/// assert_eq!(util::as_millis_f64(Duration::from_micros(1_500)), 1.5);
/// assert_eq!(util::as_millis_f64(Duration::from_secs(2)), 2_000.0);
/// ```
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs() as f64 * 1000.0 + duration.subsec_nanos() as f64 / 1_000_000.0
}

/// Calculate how many events happened per second over `duration`.
///
/// A rate over a zero-length duration is undefined, and is returned as
/// [`NullableFloat::NONE`].
///
/// # Example
/// ```rust
/// use boomer::util;
/// use std::time::Duration;
///
/// assert_eq!(util::per_second(10, Duration::from_secs(4)).get(), Some(2.5));
/// assert!(util::per_second(10, Duration::from_secs(0)).is_none());
/// ```
pub fn per_second(count: usize, duration: Duration) -> NullableFloat {
    let seconds = duration.as_secs_f64();
    if seconds == 0.0 {
        NullableFloat::NONE
    } else {
        NullableFloat(count as f64 / seconds)
    }
}

/// Format large number in locale appropriate style.
///
/// # Example
/// ```rust
/// use boomer::util;
///
/// assert_eq!(util::format_number(1234567_i64), "1,234,567");
/// ```
pub fn format_number<N: ToFormattedString>(number: N) -> String {
    number.to_formatted_string(&Locale::en)
}

/// Truncate strings when they're too long to display.
///
/// If a string is longer than the specified max length, this function removes extra
/// the characters and replaces the last two with a double-period ellipsis.
///
/// # Example
/// ```rust
/// use boomer::util;
///
/// // All but 7 characters are truncated, with ".." appended.
/// assert_eq!(util::truncate_string("this is a long string", 9), "this is..");
///
/// // All characters are returned as the string is less than 15 characters long.
/// assert_eq!(util::truncate_string("shorter string", 15), "shorter string");
/// ```
pub fn truncate_string(str_to_truncate: &str, max_length: usize) -> String {
    if str_to_truncate.chars().count() > max_length {
        match str_to_truncate.char_indices().nth(max_length.saturating_sub(2)) {
            None => str_to_truncate.to_string(),
            Some((idx, _)) => format!("{}..", &str_to_truncate[..idx]),
        }
    } else {
        str_to_truncate.to_string()
    }
}
