//! User-facing fallback texts for store failures.
//!
//! SYSTEM CONTEXT
//! ==============
//! Stores surface a server `detail` verbatim when one is sent. These texts
//! cover every other failure, in the locale chosen by configuration.

#[cfg(test)]
#[path = "i18n_test.rs"]
mod i18n_test;

use crate::error::ConfigError;

/// Display language for fallback messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl Locale {
    /// Parse a locale tag such as `en`, `vi`, or `vi-VN`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLocale`] for any other language.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let lang = raw.trim().split(['-', '_']).next().unwrap_or_default();
        match lang.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "vi" => Ok(Self::Vi),
            _ => Err(ConfigError::InvalidLocale(raw.to_owned())),
        }
    }

    /// Resolve the fallback text for `key`.
    #[must_use]
    pub fn text(self, key: Text) -> &'static str {
        match (self, key) {
            (Self::En, Text::RegisterFailed) => "Registration failed",
            (Self::En, Text::LoginFailed) => "Login failed",
            (Self::En, Text::LoadMessagesFailed) => "Could not load messages",
            (Self::En, Text::SendMessageFailed) => "Could not send message",
            (Self::En, Text::RoomActionFailed) => "Room request failed",
            (Self::En, Text::MarkReadFailed) => "Could not mark message as read",
            (Self::Vi, Text::RegisterFailed) => "Đăng ký thất bại",
            (Self::Vi, Text::LoginFailed) => "Đăng nhập thất bại",
            (Self::Vi, Text::LoadMessagesFailed) => "Không thể tải tin nhắn",
            (Self::Vi, Text::SendMessageFailed) => "Không thể gửi tin nhắn",
            (Self::Vi, Text::RoomActionFailed) => "Yêu cầu phòng thất bại",
            (Self::Vi, Text::MarkReadFailed) => "Không thể đánh dấu đã đọc",
        }
    }
}

/// Catalog keys for fallback texts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Text {
    RegisterFailed,
    LoginFailed,
    LoadMessagesFailed,
    SendMessageFailed,
    RoomActionFailed,
    MarkReadFailed,
}
