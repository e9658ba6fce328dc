use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DATA TYPES
// ============================================================================

/// How a consumer should interpret a payload's `content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Plain text (notes, transcripts, chat replies)
    Text,
    /// Audio, usually carried as a `data:` URL
    Audio,
    /// Serialized JSON document
    Json,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Audio => "audio",
            DataType::Json => "json",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(DataType::Text),
            "audio" => Ok(DataType::Audio),
            "json" => Ok(DataType::Json),
            other => Err(SignalError::UnknownDataType(other.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("unknown data type '{0}' (expected text, audio or json)")]
    UnknownDataType(String),

    #[error("failed to encode json payload: {0}")]
    Encode(String),
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// Microseconds since the Unix epoch, assigned by the flow store at publish time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn as_millis(&self) -> u64 {
        self.0 / 1_000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a producer hands to `publish`: a payload that has not been stamped yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub content: String,
    pub data_type: DataType,
}

impl Output {
    pub fn new(content: impl Into<String>, data_type: DataType) -> Self {
        Self {
            content: content.into(),
            data_type,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, DataType::Text)
    }

    /// Audio travels as a `data:` URL so text-only transports can carry it.
    pub fn audio(data_url: impl Into<String>) -> Self {
        Self::new(data_url, DataType::Audio)
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, SignalError> {
        let content =
            serde_json::to_string(value).map_err(|e| SignalError::Encode(e.to_string()))?;
        Ok(Self::new(content, DataType::Json))
    }

    /// Attach the store-assigned timestamp.
    pub fn stamp(self, timestamp: Timestamp) -> FlowPayload {
        FlowPayload {
            content: self.content,
            data_type: self.data_type,
            timestamp,
        }
    }
}

/// One unit of data a tile has produced, as held by the flow store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowPayload {
    pub content: String,
    pub data_type: DataType,
    pub timestamp: Timestamp,
}

impl FlowPayload {
    /// Drop the timestamp, leaving what the producer originally published.
    pub fn output(&self) -> Output {
        Output {
            content: self.content.clone(),
            data_type: self.data_type,
        }
    }

    /// Parse a `json` payload's content. Returns `None` for other kinds or bad JSON.
    pub fn as_json(&self) -> Option<serde_json::Value> {
        if self.data_type != DataType::Json {
            return None;
        }
        serde_json::from_str(&self.content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_parsing() {
        assert_eq!("text".parse::<DataType>(), Ok(DataType::Text));
        assert_eq!(" Audio ".parse::<DataType>(), Ok(DataType::Audio));
        assert_eq!("JSON".parse::<DataType>(), Ok(DataType::Json));
        assert!(matches!(
            "video".parse::<DataType>(),
            Err(SignalError::UnknownDataType(_))
        ));
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = Output::text("hello").stamp(Timestamp(42));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"content": "hello", "dataType": "text", "timestamp": 42})
        );
    }

    #[test]
    fn test_json_output() {
        let out = Output::json(&serde_json::json!({"temp": 21})).unwrap();
        assert_eq!(out.data_type, DataType::Json);
        let payload = out.stamp(Timestamp(1));
        assert_eq!(payload.as_json(), Some(serde_json::json!({"temp": 21})));
        assert_eq!(Output::text("{}").stamp(Timestamp(1)).as_json(), None);
    }

    #[test]
    fn test_output_strips_timestamp() {
        let payload = Output::audio("data:audio/wav;base64,AAAA").stamp(Timestamp(7));
        assert_eq!(payload.output(), Output::audio("data:audio/wav;base64,AAAA"));
        assert_eq!(payload.timestamp.as_millis(), 0);
    }
}
