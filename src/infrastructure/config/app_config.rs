use crate::infrastructure::InfrastructureError;
use directories::UserDirs;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";
const MAX_PROBE_TIMEOUT_SECS: u64 = 5;

/// Configuracion completa del grabador. Inmutable una vez cargada.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub extension: String,
    pub poll_interval_secs: u64,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub twitch: TwitchSettings,
    pub streamlink: StreamlinkSettings,
    pub network: NetworkSettings,
}

/// Credenciales y endpoints de la API de Twitch.
#[derive(Clone)]
pub struct TwitchSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub api_url: String,
}

/// Flags fijos con los que se invoca streamlink.
#[derive(Debug, Clone)]
pub struct StreamlinkSettings {
    pub path: PathBuf,
    pub retry_max: u32,
    pub retry_streams: u32,
    pub stream_timeout: u32,
    pub stop_timeout_secs: u64,
}

/// Endpoints usados para verificar conectividad.
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub probe_endpoints: Vec<String>,
    pub probe_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            extension: "mp4".to_string(),
            poll_interval_secs: 30,
            log_file: Some(PathBuf::from("twrec.log")),
            log_level: "info".to_string(),
            twitch: TwitchSettings::default(),
            streamlink: StreamlinkSettings::default(),
            network: NetworkSettings::default(),
        }
    }
}

impl Default for TwitchSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            auth_url: "https://id.twitch.tv".to_string(),
            api_url: "https://api.twitch.tv".to_string(),
        }
    }
}

impl Default for StreamlinkSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("streamlink"),
            retry_max: 5,
            retry_streams: 30,
            stream_timeout: 60,
            stop_timeout_secs: 10,
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            probe_endpoints: vec![
                "https://1.1.1.1".to_string(),
                "https://8.8.8.8".to_string(),
                "https://www.google.com".to_string(),
            ],
            probe_timeout_secs: 5,
        }
    }
}

impl fmt::Debug for TwitchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitchSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("auth_url", &self.auth_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Carga la configuracion desde `ruta` o desde `config/default.toml`.
    /// # Notas
    /// - Si no se indica ruta y el archivo por defecto no existe, usa valores por defecto.
    /// - `TWITCH_CLIENT_ID` y `TWITCH_CLIENT_SECRET` tienen prioridad sobre el archivo.
    /// # Errors
    /// - `InfrastructureError::Config` si el archivo indicado no existe o es invalido.
    pub fn load(ruta: Option<&Path>) -> Result<Self, InfrastructureError> {
        let mut config = match ruta {
            Some(ruta) => {
                let contenido = fs::read_to_string(ruta).map_err(|e| {
                    InfrastructureError::Config(format!(
                        "Cannot read {}: {}",
                        ruta.display(),
                        e
                    ))
                })?;
                Self::from_toml_str(&contenido)?
            }
            None => match fs::read_to_string(DEFAULT_CONFIG_PATH) {
                Ok(contenido) => Self::from_toml_str(&contenido)?,
                Err(_) => Self::default(),
            },
        };

        config.aplicar_entorno(|clave| std::env::var(clave).ok());
        Ok(config)
    }

    /// Parsea un documento TOML sobre los valores por defecto.
    /// # Errors
    /// - `InfrastructureError::Config` si el TOML es invalido.
    pub fn from_toml_str(contenido: &str) -> Result<Self, InfrastructureError> {
        let file_config: FileConfig = toml::from_str(contenido)
            .map_err(|e| InfrastructureError::Config(format!("Invalid config file: {}", e)))?;

        let mut config = Self::default();

        if let Some(general) = file_config.general {
            if let Some(output_dir) = general.output_dir {
                config.output_dir = expandir_tilde(&output_dir);
            }
            if let Some(extension) = general.extension {
                config.extension = extension.trim_start_matches('.').to_string();
            }
            if let Some(intervalo) = general.poll_interval_secs {
                config.poll_interval_secs = intervalo;
            }
            if let Some(log_file) = general.log_file {
                config.log_file = if log_file.trim().is_empty() {
                    None
                } else {
                    Some(expandir_tilde(&log_file))
                };
            }
            if let Some(log_level) = general.log_level {
                config.log_level = log_level;
            }
        }

        if let Some(twitch) = file_config.twitch {
            config.twitch.client_id = twitch.client_id.or(config.twitch.client_id);
            config.twitch.client_secret = twitch.client_secret.or(config.twitch.client_secret);
            if let Some(auth_url) = twitch.auth_url {
                config.twitch.auth_url = auth_url;
            }
            if let Some(api_url) = twitch.api_url {
                config.twitch.api_url = api_url;
            }
        }

        if let Some(streamlink) = file_config.streamlink {
            if let Some(path) = streamlink.path {
                config.streamlink.path = expandir_tilde(&path);
            }
            if let Some(retry_max) = streamlink.retry_max {
                config.streamlink.retry_max = retry_max;
            }
            if let Some(retry_streams) = streamlink.retry_streams {
                config.streamlink.retry_streams = retry_streams;
            }
            if let Some(stream_timeout) = streamlink.stream_timeout {
                config.streamlink.stream_timeout = stream_timeout;
            }
            if let Some(stop_timeout) = streamlink.stop_timeout_secs {
                config.streamlink.stop_timeout_secs = stop_timeout;
            }
        }

        if let Some(network) = file_config.network {
            if let Some(endpoints) = network.probe_endpoints {
                if endpoints.is_empty() {
                    return Err(InfrastructureError::Config(
                        "network.probe_endpoints cannot be empty".to_string(),
                    ));
                }
                config.network.probe_endpoints = endpoints;
            }
            if let Some(timeout) = network.probe_timeout_secs {
                config.network.probe_timeout_secs = timeout;
            }
        }

        if !(1..=MAX_PROBE_TIMEOUT_SECS).contains(&config.network.probe_timeout_secs) {
            return Err(InfrastructureError::Config(format!(
                "network.probe_timeout_secs must be between 1 and {}",
                MAX_PROBE_TIMEOUT_SECS
            )));
        }

        if config.poll_interval_secs == 0 {
            return Err(InfrastructureError::Config(
                "general.poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(config)
    }

    /// Sobrescribe las credenciales con variables de entorno.
    pub fn aplicar_entorno<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(ENV_CLIENT_ID).filter(|v| !v.trim().is_empty()) {
            self.twitch.client_id = Some(client_id);
        }
        if let Some(secret) = lookup(ENV_CLIENT_SECRET).filter(|v| !v.trim().is_empty()) {
            self.twitch.client_secret = Some(secret);
        }
    }

    /// Devuelve `(client_id, client_secret)`.
    /// # Errors
    /// - `InfrastructureError::Config` si falta alguno de los dos.
    pub fn credentials(&self) -> Result<(String, String), InfrastructureError> {
        match (&self.twitch.client_id, &self.twitch.client_secret) {
            (Some(id), Some(secret)) => Ok((id.clone(), secret.clone())),
            _ => Err(InfrastructureError::Config(format!(
                "Twitch credentials missing: set [twitch] client_id/client_secret or {} and {}",
                ENV_CLIENT_ID, ENV_CLIENT_SECRET
            ))),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.network.probe_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.streamlink.stop_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    general: Option<GeneralConfig>,
    twitch: Option<TwitchConfig>,
    streamlink: Option<StreamlinkConfig>,
    network: Option<NetworkConfig>,
}

#[derive(Debug, Deserialize)]
struct GeneralConfig {
    output_dir: Option<String>,
    extension: Option<String>,
    poll_interval_secs: Option<u64>,
    log_file: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwitchConfig {
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_url: Option<String>,
    api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamlinkConfig {
    path: Option<String>,
    retry_max: Option<u32>,
    retry_streams: Option<u32>,
    stream_timeout: Option<u32>,
    stop_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct NetworkConfig {
    probe_endpoints: Option<Vec<String>>,
    probe_timeout_secs: Option<u64>,
}

/// Expande `~/` al directorio personal del usuario.
pub fn expandir_tilde(ruta: &str) -> PathBuf {
    let ruta_normalizada = ruta.trim();
    if let Some(resto) = ruta_normalizada.strip_prefix("~/") {
        if let Some(home) = obtener_home_dir() {
            return home.join(resto);
        }
    }
    if let Some(resto) = ruta_normalizada.strip_prefix("~\\") {
        if let Some(home) = obtener_home_dir() {
            return home.join(resto);
        }
    }

    PathBuf::from(ruta_normalizada)
}

fn obtener_home_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}
