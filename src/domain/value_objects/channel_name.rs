use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_LONGITUD_CANAL: usize = 25;

/// Canal de Twitch.
///
/// Guarda el login normalizado (minusculas), que es lo que entienden la API
/// y streamlink, y el nombre tal como lo escribio el usuario, que se usa en
/// los nombres de archivo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelName {
    login: String,
    display: String,
}

impl ChannelName {
    /// # Errors
    /// - `DomainError::InvalidChannelName` si el login no cumple el formato de Twitch
    ///   (ASCII alfanumerico o `_`, hasta 25 caracteres).
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let display = name.into().trim().to_string();

        if display.is_empty() {
            return Err(DomainError::InvalidChannelName(
                "Channel name cannot be empty".to_string(),
            ));
        }

        if display.len() > MAX_LONGITUD_CANAL {
            return Err(DomainError::InvalidChannelName(format!(
                "Channel name longer than {} characters",
                MAX_LONGITUD_CANAL
            )));
        }

        if let Some(c) = display
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(DomainError::InvalidChannelName(format!(
                "Channel name contains invalid character '{}'",
                c
            )));
        }

        Ok(Self {
            login: display.to_ascii_lowercase(),
            display,
        })
    }

    /// Login normalizado.
    pub fn as_str(&self) -> &str {
        &self.login
    }

    /// Nombre tal como fue configurado.
    pub fn display_name(&self) -> &str {
        &self.display
    }

    /// Destino que entiende streamlink (`twitch.tv/<login>`).
    pub fn stream_target(&self) -> String {
        format!("twitch.tv/{}", self.login)
    }
}

impl TryFrom<&str> for ChannelName {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_is_lowercase_but_display_keeps_case() {
        let canal = ChannelName::new("  SomeStreamer ").unwrap();
        assert_eq!(canal.as_str(), "somestreamer");
        assert_eq!(canal.display_name(), "SomeStreamer");
        assert_eq!(canal.to_string(), "somestreamer");
        assert_eq!(canal.stream_target(), "twitch.tv/somestreamer");
    }

    #[test]
    fn short_logins_are_accepted() {
        // Twitch exige 4 caracteres para cuentas nuevas, pero existen logins
        // historicos mas cortos que siguen transmitiendo.
        assert!(ChannelName::new("foo").is_ok());
        assert!(ChannelName::new("a").is_ok());
    }

    #[test]
    fn length_limit_is_twitch_maximum() {
        assert!(ChannelName::new("a".repeat(25)).is_ok());
        assert!(matches!(
            ChannelName::new("a".repeat(26)),
            Err(DomainError::InvalidChannelName(_))
        ));
    }

    #[test]
    fn only_alphanumeric_and_underscore() {
        assert!(ChannelName::new("speed_runs_2024").is_ok());
        // `-` y `.` son validos en otras plataformas pero no en logins de Twitch;
        // `/` o espacios delatan que se paso una URL en lugar del login.
        for nombre in ["speed-runs", "speed.runs", "twitch.tv/foo", "foo bar", "canal\u{e9}"] {
            assert!(ChannelName::new(nombre).is_err(), "{} deberia fallar", nombre);
        }
    }

    #[test]
    fn error_names_offending_character() {
        let error = ChannelName::new("foo-bar").unwrap_err();
        assert!(error.to_string().contains("'-'"));
    }

    #[test]
    fn blank_input_fails() {
        assert!(matches!(
            ChannelName::new("   "),
            Err(DomainError::InvalidChannelName(_))
        ));
    }
}
