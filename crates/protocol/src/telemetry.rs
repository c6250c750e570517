use serde_json::{Map, Value};

/// Why an inbound frame could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is JSON but not an object")]
    NotAnObject,
}

/// A decoded inbound frame.
///
/// The controller pushes `{"temp": 25.3, "humi": 61.0}`; either field may be
/// missing. Fields are read independently and a non-numeric value counts as
/// absent. Every other key is kept in `extra` and otherwise ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    pub temp: Option<f64>,
    pub humi: Option<f64>,
    pub extra: Map<String, Value>,
}

impl TelemetryFrame {
    /// Decodes a raw text frame.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let Value::Object(mut fields) = serde_json::from_str::<Value>(text)? else {
            return Err(FrameError::NotAnObject);
        };

        let temp = fields.remove("temp").and_then(|v| v.as_f64());
        let humi = fields.remove("humi").and_then(|v| v.as_f64());

        Ok(Self {
            temp,
            humi,
            extra: fields,
        })
    }

    /// Whether the frame carried at least one sensor reading.
    pub fn has_readings(&self) -> bool {
        self.temp.is_some() || self.humi.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_fields() {
        let frame = TelemetryFrame::decode(r#"{"temp": 26.5, "humi": 58}"#).unwrap();
        assert_eq!(frame.temp, Some(26.5));
        assert_eq!(frame.humi, Some(58.0));
        assert!(frame.extra.is_empty());
    }

    #[test]
    fn fields_are_independent() {
        let frame = TelemetryFrame::decode(r#"{"humi": 40.2}"#).unwrap();
        assert_eq!(frame.temp, None);
        assert_eq!(frame.humi, Some(40.2));
        assert!(frame.has_readings());
    }

    #[test]
    fn non_numeric_reading_is_absent() {
        let frame = TelemetryFrame::decode(r#"{"temp": "hot", "humi": null}"#).unwrap();
        assert!(!frame.has_readings());
    }

    #[test]
    fn unknown_fields_are_kept_aside() {
        let frame = TelemetryFrame::decode(r#"{"temp": 20, "rssi": -61}"#).unwrap();
        assert_eq!(frame.temp, Some(20.0));
        assert_eq!(frame.extra.get("rssi"), Some(&serde_json::json!(-61)));
    }

    #[test]
    fn rejects_plain_text_and_arrays() {
        assert!(matches!(
            TelemetryFrame::decode("hello"),
            Err(FrameError::Json(_))
        ));
        assert!(matches!(
            TelemetryFrame::decode("[1, 2]"),
            Err(FrameError::NotAnObject)
        ));
    }
}
