use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::SECRET_SENTINEL;

/// Broker configuration as reported by `GET /api/coreiot/config`.
///
/// The device never returns the stored secret, only whether one exists.
///
/// Each field decodes on its own: a null or oddly typed value leaves that
/// field unset instead of failing the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, deserialize_with = "lenient_port", skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub password_set: bool,
}

fn lenient_text<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts `1883` and `"1883"`.
fn lenient_port<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Number(n)) => n.as_u64().and_then(|p| u32::try_from(p).ok()),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Accepts booleans, `0`/`1` and `"true"`/`"false"`; anything else is false.
fn lenient_flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(text)) => matches!(text.trim(), "true" | "1"),
        _ => false,
    })
}

/// What to do with the broker secret stored on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerSecret {
    /// Keep the stored secret; sent as [`SECRET_SENTINEL`].
    Keep,
    /// Replace the stored secret with this value.
    Replace(String),
}

impl BrokerSecret {
    /// A blank input means "keep".
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            Self::Keep
        } else {
            Self::Replace(trimmed.to_string())
        }
    }

    /// The value placed in the request's `password` field.
    pub fn wire_value(&self) -> &str {
        match self {
            Self::Keep => SECRET_SENTINEL,
            Self::Replace(secret) => secret,
        }
    }
}

/// Body of `POST /api/coreiot/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWriteRequest {
    pub ssid: String,
    /// Broker secret or [`SECRET_SENTINEL`].
    pub password: String,
    pub server: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
}

/// Reply to a configuration write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Connectivity report from `GET /api/coreiot/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub mqtt_connected: bool,
    #[serde(default)]
    pub wifi_connected: bool,
    #[serde(default)]
    pub wifi_ssid: String,
    #[serde(default)]
    pub wifi_ip: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub port: u32,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_secret_is_sentinel() {
        assert_eq!(BrokerSecret::from_input("   ").wire_value(), "***");
        assert_eq!(BrokerSecret::from_input("abc").wire_value(), "abc");
    }

    #[test]
    fn remote_config_tolerates_missing_fields() {
        let cfg: RemoteConfig = serde_json::from_str(r#"{"server":"iot.example.com"}"#).unwrap();
        assert_eq!(cfg.server.as_deref(), Some("iot.example.com"));
        assert_eq!(cfg.port, None);
        assert!(!cfg.password_set);
    }

    #[test]
    fn remote_config_decodes_fields_independently() {
        let cfg: RemoteConfig = serde_json::from_str(
            r#"{"server":"iot.example.com","port":"1883","client_id":null,
                "username":"panel","password_set":null}"#,
        )
        .unwrap();
        assert_eq!(cfg.server.as_deref(), Some("iot.example.com"));
        assert_eq!(cfg.port, Some(1883));
        assert_eq!(cfg.client_id, None);
        assert_eq!(cfg.username.as_deref(), Some("panel"));
        assert!(!cfg.password_set);

        let cfg: RemoteConfig =
            serde_json::from_str(r#"{"port":"auto","password_set":1,"server":42}"#).unwrap();
        assert_eq!(cfg.port, None);
        assert!(cfg.password_set);
        assert_eq!(cfg.server.as_deref(), Some("42"));
    }

    #[test]
    fn write_request_has_single_password_key() {
        let req = ConfigWriteRequest {
            ssid: "home".into(),
            password: BrokerSecret::Keep.wire_value().into(),
            server: "iot.example.com".into(),
            port: 8883,
            client_id: "dev1".into(),
            username: "user".into(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["password"], "***");
        assert_eq!(json["port"], 8883);
        assert_eq!(json.as_object().unwrap().len(), 6);
    }

    #[test]
    fn save_response_without_message() {
        let resp: SaveResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(resp.success);
        assert!(resp.message.is_none());
    }

    #[test]
    fn device_status_parses_firmware_reply() {
        let status: DeviceStatus = serde_json::from_str(
            r#"{"mqtt_connected":false,"wifi_connected":true,"wifi_ssid":"home",
                "wifi_ip":"192.168.1.20","server":"app.coreiot.io","port":1883,
                "client_id":"esp","username":"u"}"#,
        )
        .unwrap();
        assert!(status.wifi_connected);
        assert!(!status.mqtt_connected);
        assert_eq!(status.port, 1883);
    }
}
