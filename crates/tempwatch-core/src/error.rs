//! Payload error types.

use thiserror::Error;

/// Reasons a temperature payload string could not be parsed.
///
/// The display text is what gets recorded in the error store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The payload did not have exactly four `:`-separated fields.
    #[error("invalid number of arguments in request body")]
    FieldCount,

    /// The device id is not a 32-bit integer.
    #[error("could not parse device_id={0} to an int32")]
    DeviceId(String),

    /// The epoch is not a 64-bit integer.
    #[error("could not parse epochMS={0} to an int64")]
    Epoch(String),

    /// The third field is not the `'Temperature'` label.
    #[error("temperature key is mislabelled: {0}")]
    Label(String),

    /// The temperature is not a floating point number.
    #[error("could not parse temperature={0} to a float64")]
    Temperature(String),

    /// The epoch is outside the range a timestamp can represent.
    #[error("could not convert epoch={0} to a timestamp")]
    Timestamp(i64),
}
