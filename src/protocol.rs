//! Wire-facing types of the control protocol.
//!
//! Requests arrive as a command name plus a JSON params object; responses
//! carry either a result value or a `{code, message}` error body. Framing of
//! the channel itself is the transport's concern.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::engine::StatsSnapshot;
use crate::error::{codes, message_for, ControlError};
use crate::registry::AccessMode;

/// Parameters of the `create` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateParams {
    pub base_device_name: String,
    pub name: String,
    /// Assigned when absent.
    #[serde(default)]
    pub identifier: Option<Uuid>,
}

/// Parameters of the `delete` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteParams {
    pub name: String,
}

/// Parameters of the `set-mode` command.
///
/// The mode arrives as a plain string; the executor maps it to
/// [`AccessMode`] so an unrecognized value is rejected as an invalid
/// argument, not a decode failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetModeParams {
    pub name: String,
    pub mode: String,
}

/// Parameters of the `get-statistics` command.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetStatisticsParams {
    pub name: String,
}

/// Decode a command's params object into its typed form.
///
/// Never mutates caller-visible state; anything allocated on the way is
/// dropped before the error returns.
pub fn decode_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, ControlError> {
    serde_json::from_value(params).map_err(|e| {
        debug!("request decode failed: {}", e);
        ControlError::MalformedRequest
    })
}

/// Statistics response body: the engine's counters tagged with the
/// device's identity and current mode.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsReport {
    pub name: String,
    pub base_device_name: String,
    pub identifier: Uuid,
    pub mode: AccessMode,
    #[serde(flatten)]
    pub statistics: StatsSnapshot,
}

/// One element of the `list-devices` response.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub base_device_name: String,
    pub identifier: Uuid,
    pub mode: AccessMode,
}

/// Error body of a failed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
}

/// Outward response of a dispatched command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    /// Success response carrying `value`.
    pub fn success(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(result) => Self {
                result: Some(result),
                error: None,
            },
            Err(e) => {
                debug!("response serialization failed: {}", e);
                Self::error(codes::INTERNAL_ERROR, message_for(codes::INTERNAL_ERROR))
            }
        }
    }

    /// Error response with an explicit code and message.
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }

    /// Error response for a control-plane failure, message taken from the
    /// fixed code table (or verbatim for engine failures).
    pub fn from_error(err: &ControlError) -> Self {
        Self::error(err.code(), err.response_message())
    }
}
