use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde_json::Value;

use super::GatewayError;

/// Offset of the central bank services local time (Moscow), in seconds east of UTC.
pub const DEFAULT_SERVICE_OFFSET_SECONDS: i32 = 3 * 3600;

const DATE_FORMATS: [&str; 4] = ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y", "%Y%m%d"];
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// A date as supplied by a caller: a Unix timestamp or a human-entered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// Seconds since the Unix epoch.
    Timestamp(i64),
    /// A date text such as `01.09.2014` or `2014-09-01`.
    Text(String),
}

impl DateInput {
    /// The current instant.
    pub fn now() -> Self {
        Self::Timestamp(Utc::now().timestamp())
    }
}

impl From<i64> for DateInput {
    fn from(value: i64) -> Self {
        Self::Timestamp(value)
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Timestamp(value.timestamp())
    }
}

impl From<DateInput> for Value {
    fn from(value: DateInput) -> Self {
        match value {
            DateInput::Timestamp(timestamp) => Self::from(timestamp),
            DateInput::Text(text) => Self::String(text),
        }
    }
}

/// Normalizes `dateTime` arguments to the `YYYY-MM-DDT00:00:00` form the services expect.
///
/// Only the calendar date is kept. Timestamps are read in the service local time,
/// a fixed offset from UTC ([`DEFAULT_SERVICE_OFFSET_SECONDS`] unless configured
/// with [`GatewayBuilder::with_service_offset`](super::GatewayBuilder::with_service_offset)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCoercion {
    offset: FixedOffset,
}

impl Default for DateCoercion {
    fn default() -> Self {
        let offset =
            FixedOffset::east_opt(DEFAULT_SERVICE_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl DateCoercion {
    /// Creates a coercion reading timestamps at `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// The service local time offset.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Coerces a JSON argument: numbers are Unix timestamps, strings are date texts.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DateParse`] if the value cannot be read as a date.
    pub fn coerce(&self, value: &Value) -> Result<String, GatewayError> {
        let date = match value {
            Value::Number(number) => {
                let timestamp = number.as_i64().ok_or_else(|| GatewayError::DateParse {
                    value: number.to_string(),
                    reason: "timestamp must be an integer".to_string(),
                })?;
                self.date_of_timestamp(timestamp)?
            }
            Value::String(text) => self.parse_text(text)?,
            other => {
                return Err(GatewayError::DateParse {
                    value: other.to_string(),
                    reason: "expected a timestamp or a date text".to_string(),
                });
            }
        };

        Ok(format!("{}T00:00:00", date.format("%Y-%m-%d")))
    }

    fn date_of_timestamp(&self, timestamp: i64) -> Result<NaiveDate, GatewayError> {
        DateTime::from_timestamp(timestamp, 0)
            .map(|instant| instant.with_timezone(&self.offset).date_naive())
            .ok_or_else(|| GatewayError::DateParse {
                value: timestamp.to_string(),
                reason: "timestamp out of range".to_string(),
            })
    }

    fn parse_text(&self, text: &str) -> Result<NaiveDate, GatewayError> {
        let text = text.trim();

        // `YYYYMMDD` wins over a timestamp of the same digits
        if let Some(date) = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        {
            return Ok(date);
        }

        if let Ok(timestamp) = text.parse::<i64>() {
            return self.date_of_timestamp(timestamp);
        }

        if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
            return Ok(instant.with_timezone(&self.offset).date_naive());
        }

        DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|date_time| date_time.date())
            .ok_or_else(|| GatewayError::DateParse {
                value: text.to_string(),
                reason: "unrecognized date format".to_string(),
            })
    }
}

/// Coerces a date argument with the default service offset.
///
/// # Errors
///
/// Returns [`GatewayError::DateParse`] if the value cannot be read as a date.
///
/// # Example
///
/// ```rust
/// use cbr_gateway_core::coerce_date;
/// use serde_json::json;
///
/// # fn example() -> Result<(), cbr_gateway_core::GatewayError> {
/// assert_eq!(coerce_date(&json!(1_409_518_800))?, "2014-09-01T00:00:00");
/// assert_eq!(coerce_date(&json!("01.09.2014"))?, "2014-09-01T00:00:00");
/// # Ok(())
/// # }
/// ```
pub fn coerce_date(value: &Value) -> Result<String, GatewayError> {
    DateCoercion::default().coerce(value)
}
