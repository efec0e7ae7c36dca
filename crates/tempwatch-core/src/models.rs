//! JSON bodies exchanged over the HTTP surface.

use serde::{Deserialize, Serialize};

/// Response body of `GET /errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetErrorsResponse {
    /// Stored error messages, oldest first.
    pub errors: Vec<String>,
}

/// Body of every 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Request body of `POST /temp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempPostBody {
    /// Payload of the form `<device_id>:<epoch>:'Temperature':<value>`.
    pub data: String,
}

/// A parsed temperature payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    /// Reporting device.
    pub device_id: i32,
    /// Reading time, seconds since the Unix epoch.
    pub epoch: i64,
    /// Measured temperature.
    pub temperature: f64,
}

/// Response body of `POST /temp`.
///
/// `device_id` and `formatted_time` are only present for over-temperature
/// readings; they are omitted from the JSON otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempPostResponse {
    /// Whether the reading crossed the threshold.
    pub overtemp: bool,
    /// Device that reported the reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<i32>,
    /// Reading time as `YYYY/MM/DD HH:MM:SS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_time: Option<String>,
}
