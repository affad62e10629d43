use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Perfil que streamlink siempre puede resolver.
pub const FALLBACK_QUALITY: &str = "best";

/// Preferencia por defecto del grabador.
pub const DEFAULT_QUALITY: &str = "480p,720p,720p60,360p,best";

/// Lista ordenada de perfiles de calidad aceptables.
///
/// Siempre termina en [`FALLBACK_QUALITY`], de modo que streamlink tenga
/// una seleccion usable aunque no exista ninguno de los perfiles preferidos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPreference(Vec<String>);

impl QualityPreference {
    /// Parsea una lista separada por comas (`"480p,720p60,best"`).
    /// # Errors
    /// - `DomainError::InvalidQuality` si algun perfil tiene caracteres invalidos.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DomainError> {
        let mut perfiles = Vec::new();

        for perfil in raw.as_ref().split(',') {
            let perfil = perfil.trim().to_lowercase();
            if perfil.is_empty() {
                continue;
            }
            if !perfil
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
            {
                return Err(DomainError::InvalidQuality(format!(
                    "Invalid quality profile '{}'",
                    perfil
                )));
            }
            perfiles.push(perfil);
        }

        if perfiles.last().map(String::as_str) != Some(FALLBACK_QUALITY) {
            perfiles.push(FALLBACK_QUALITY.to_string());
        }

        Ok(Self(perfiles))
    }

    /// Argumento de calidad tal como lo recibe streamlink.
    pub fn as_arg(&self) -> String {
        self.0.join(",")
    }
}

impl Default for QualityPreference {
    fn default() -> Self {
        Self(
            DEFAULT_QUALITY
                .split(',')
                .map(str::to_string)
                .collect(),
        )
    }
}

impl TryFrom<&str> for QualityPreference {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for QualityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}
