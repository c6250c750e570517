//! User-facing texts in the panel's two languages.

use serde::{Deserialize, Serialize};

/// Display language for alerts and placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

/// Something the panel tells the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    InvalidPort,
    MissingRequired,
    Saved,
    SaveRejected(&'a str),
    DeviceUnreachable,
    SecretStored,
    RelayFieldsMissing,
    UnknownRelay(usize),
}

impl Locale {
    pub fn text(self, notice: Notice<'_>) -> String {
        match (self, notice) {
            (Locale::En, Notice::InvalidPort) => "Invalid port (1-65535)".into(),
            (Locale::Vi, Notice::InvalidPort) => "Port không hợp lệ! (1-65535)".into(),

            (Locale::En, Notice::MissingRequired) => {
                "Please fill in Server, Client ID and Username".into()
            }
            (Locale::Vi, Notice::MissingRequired) => {
                "Vui lòng điền đầy đủ: Server, Client ID, Username!".into()
            }

            (Locale::En, Notice::Saved) => "Saved, broker is connecting...".into(),
            (Locale::Vi, Notice::Saved) => "Đã lưu! MQTT đang kết nối...".into(),

            (Locale::En, Notice::SaveRejected(msg)) => format!("Error: {msg}"),
            (Locale::Vi, Notice::SaveRejected(msg)) => format!("Lỗi: {msg}"),

            (Locale::En, Notice::DeviceUnreachable) => "Cannot reach the device".into(),
            (Locale::Vi, Notice::DeviceUnreachable) => "Không thể kết nối ESP32!".into(),

            (Locale::En, Notice::SecretStored) => {
                "Secret already stored (leave blank to keep)".into()
            }
            (Locale::Vi, Notice::SecretStored) => {
                "Password đã lưu (để trống = giữ nguyên)".into()
            }

            (Locale::En, Notice::RelayFieldsMissing) => "Fill in all fields".into(),
            (Locale::Vi, Notice::RelayFieldsMissing) => "Vui lòng điền đầy đủ!".into(),

            (Locale::En, Notice::UnknownRelay(n)) => format!("No relay #{n}"),
            (Locale::Vi, Notice::UnknownRelay(n)) => format!("Không có relay #{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_locale_is_english() {
        assert_eq!(Locale::default(), Locale::En);
    }

    #[test]
    fn server_message_is_embedded() {
        assert_eq!(
            Locale::En.text(Notice::SaveRejected("missing fields")),
            "Error: missing fields"
        );
        assert_eq!(
            Locale::Vi.text(Notice::SaveRejected("Lỗi ghi file")),
            "Lỗi: Lỗi ghi file"
        );
    }

    #[test]
    fn locale_serializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            locale: Locale,
        }
        let w: Wrapper = serde_json::from_str(r#"{"locale":"vi"}"#).unwrap();
        assert_eq!(w.locale, Locale::Vi);
    }
}
