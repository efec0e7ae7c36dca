//! Temperature payload parsing and the over-temperature rule.
//!
//! Devices post payloads of the form
//! `<device_id>:<epoch>:'Temperature':<value>`. The epoch field is read as
//! seconds since the Unix epoch.
//!
//! ```
//! use chrono::FixedOffset;
//! use tempwatch_core::temperature::{evaluate, parse_payload, TimeDisplay};
//!
//! let reading = parse_payload("1234:1721964434:'Temperature':95.0").unwrap();
//! let display = TimeDisplay::Fixed(FixedOffset::west_opt(4 * 3600).unwrap());
//! let response = evaluate(&reading, &display).unwrap();
//!
//! assert!(response.overtemp);
//! assert_eq!(response.formatted_time.as_deref(), Some("2024/07/25 23:27:14"));
//! ```

use chrono::{DateTime, FixedOffset, Local};

use crate::error::PayloadError;
use crate::models::{TempPostResponse, TemperatureReading};

/// Readings at or above this value are reported as over-temperature.
pub const OVERTEMP_THRESHOLD: f64 = 90.0;

/// The label that must appear as the third payload field, quotes included.
pub const TEMPERATURE_LABEL: &str = "'Temperature'";

/// Layout of `formatted_time`.
pub const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Time zone used when rendering `formatted_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeDisplay {
    /// The host's local time zone.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl TimeDisplay {
    /// Parses an offset of the form `+HH:MM`, `-HH:MM` or `Z`.
    ///
    /// ```
    /// use tempwatch_core::TimeDisplay;
    ///
    /// assert!(TimeDisplay::from_offset("-04:00").is_some());
    /// assert!(TimeDisplay::from_offset("Z").is_some());
    /// assert!(TimeDisplay::from_offset("4 hours").is_none());
    /// ```
    pub fn from_offset(offset: &str) -> Option<Self> {
        let offset = offset.trim();
        if offset.eq_ignore_ascii_case("z") || offset.eq_ignore_ascii_case("utc") {
            return FixedOffset::east_opt(0).map(Self::Fixed);
        }

        let (sign, rest) = match offset.as_bytes().first()? {
            b'+' => (1, &offset[1..]),
            b'-' => (-1, &offset[1..]),
            _ => return None,
        };
        let (hours, minutes) = rest.split_once(':')?;
        if hours.len() != 2 || minutes.len() != 2 {
            return None;
        }
        let hours: i32 = hours.parse().ok()?;
        let minutes: i32 = minutes.parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).map(Self::Fixed)
    }

    /// Renders a Unix timestamp (seconds) with [`TIME_FORMAT`].
    pub fn format_epoch(&self, epoch: i64) -> Result<String, PayloadError> {
        let utc = DateTime::from_timestamp(epoch, 0).ok_or(PayloadError::Timestamp(epoch))?;
        let formatted = match self {
            Self::Local => utc.with_timezone(&Local).format(TIME_FORMAT).to_string(),
            Self::Fixed(offset) => utc.with_timezone(offset).format(TIME_FORMAT).to_string(),
        };
        Ok(formatted)
    }
}

/// Parses a raw `data` payload into a reading.
pub fn parse_payload(data: &str) -> Result<TemperatureReading, PayloadError> {
    let fields: Vec<&str> = data.split(':').collect();
    let [device_id, epoch, label, temperature] = fields.as_slice() else {
        return Err(PayloadError::FieldCount);
    };

    let device_id = device_id
        .parse::<i32>()
        .map_err(|_| PayloadError::DeviceId((*device_id).to_string()))?;
    let epoch = epoch
        .parse::<i64>()
        .map_err(|_| PayloadError::Epoch((*epoch).to_string()))?;
    if *label != TEMPERATURE_LABEL {
        return Err(PayloadError::Label((*label).to_string()));
    }
    let temperature =
        parse_float(temperature).ok_or_else(|| PayloadError::Temperature((*temperature).to_string()))?;

    Ok(TemperatureReading {
        device_id,
        epoch,
        temperature,
    })
}

/// Parses a float, rejecting finite spellings that overflow to infinity.
///
/// `1e400` is out of range and fails; `inf` and `-Infinity` are accepted.
fn parse_float(token: &str) -> Option<f64> {
    let value = token.parse::<f64>().ok()?;
    if value.is_infinite() {
        let unsigned = token.trim_start_matches(['+', '-']);
        let spelled = unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity");
        if !spelled {
            return None;
        }
    }
    Some(value)
}

/// Applies the threshold rule to a reading.
pub fn evaluate(
    reading: &TemperatureReading,
    display: &TimeDisplay,
) -> Result<TempPostResponse, PayloadError> {
    if reading.temperature >= OVERTEMP_THRESHOLD {
        Ok(TempPostResponse {
            overtemp: true,
            device_id: Some(reading.device_id),
            formatted_time: Some(display.format_epoch(reading.epoch)?),
        })
    } else {
        Ok(TempPostResponse {
            overtemp: false,
            device_id: None,
            formatted_time: None,
        })
    }
}
