use serde::Deserializer;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// An `f64` that is `NaN` when there is no data to derive it from.
///
/// Serializes `NaN` as `null` (the [`serde_json`] default for non-finite floats),
/// and deserializes `null` back into `NaN`.
///
/// Also see: <https://github.com/serde-rs/json/issues/202>
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, serde::Serialize)]
pub struct NullableFloat(pub f64);

impl NullableFloat {
    /// The "no data" value.
    pub const NONE: NullableFloat = NullableFloat(f64::NAN);

    /// Returns `true` if there was no data to derive this value from.
    pub fn is_none(&self) -> bool {
        self.0.is_nan()
    }

    /// Returns the value, or `None` if there was no data.
    pub fn get(&self) -> Option<f64> {
        if self.is_none() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl Deref for NullableFloat {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<f64> for NullableFloat {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl<'de> serde::Deserialize<'de> for NullableFloat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(Self(value.unwrap_or(f64::NAN)))
    }
}

/// Displays `-` when there is no data, otherwise the value with the requested precision.
impl Display for NullableFloat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            f.write_str("-")
        } else {
            self.0.fmt(f)
        }
    }
}
