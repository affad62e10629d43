use crate::domain::repositories::StreamRepository;
use crate::domain::value_objects::ChannelName;
use crate::infrastructure::InfrastructureError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv";
const DEFAULT_API_URL: &str = "https://api.twitch.tv";
const HTTP_TIMEOUT_SECS: u64 = 10;
const HTTP_RETRY_MAX: usize = 3;
const HTTP_RETRY_BASE_MS: u64 = 200;
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    data: Vec<StreamRecord>,
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    user_login: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Token de aplicacion obtenido con client credentials.
#[derive(Clone)]
struct Session {
    access_token: String,
    expires_at: Option<Instant>,
}

impl Session {
    fn from_token(token: TokenResponse, ahora: Instant) -> Self {
        let expires_at = token
            .expires_in
            .map(|segundos| ahora + Duration::from_secs(segundos).saturating_sub(TOKEN_EXPIRY_MARGIN));
        Self {
            access_token: token.access_token,
            expires_at,
        }
    }

    fn is_valid(&self, ahora: Instant) -> bool {
        self.expires_at.map_or(true, |limite| ahora < limite)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Cliente de la API Helix de Twitch.
///
/// La sesion se crea en la primera consulta y se reemplaza cuando expira o
/// la API la rechaza.
pub struct TwitchClient {
    client: Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    api_url: String,
    session: Mutex<Option<Session>>,
}

impl TwitchClient {
    /// Crea un cliente sin autenticar.
    /// # Errors
    /// - `InfrastructureError::ExternalService` si falla la configuracion HTTP.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, InfrastructureError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                InfrastructureError::ExternalService(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            session: Mutex::new(None),
        })
    }

    /// Configura las URLs base de autenticacion y de la API.
    pub fn with_endpoints(mut self, auth_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into().trim_end_matches('/').to_string();
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Consulta el estado del canal propagando errores.
    /// # Errors
    /// - `InfrastructureError::Authentication` si no se pudo obtener o usar la sesion.
    /// - `InfrastructureError::ExternalService` ante fallos HTTP o de formato.
    pub async fn consultar_stream(&self, channel: &ChannelName) -> Result<bool, InfrastructureError> {
        let session = self.sesion_vigente().await?;
        let url = format!("{}/helix/streams", self.api_url);

        let mut intento = 0;
        let mut espera_ms = HTTP_RETRY_BASE_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("user_login", channel.as_str())])
                .header("Client-Id", &self.client_id)
                .bearer_auth(&session.access_token)
                .send()
                .await
                .map_err(|e| {
                    InfrastructureError::ExternalService(format!("HTTP request failed: {}", e))
                })?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                self.invalidar_sesion().await;
                return Err(InfrastructureError::Authentication(
                    "Access token rejected by Twitch API".to_string(),
                ));
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if intento < HTTP_RETRY_MAX {
                    intento += 1;
                    sleep(Duration::from_millis(espera_ms)).await;
                    espera_ms = espera_ms.saturating_mul(2);
                    continue;
                }
                return Err(InfrastructureError::ExternalService(format!(
                    "HTTP request failed with status: {}",
                    status
                )));
            }

            if !status.is_success() {
                return Err(InfrastructureError::ExternalService(format!(
                    "HTTP request failed with status: {}",
                    status
                )));
            }

            let streams: StreamsResponse = response.json().await.map_err(|e| {
                InfrastructureError::ExternalService(format!("Failed to parse response: {}", e))
            })?;

            return Ok(hay_stream_en_vivo(&streams, channel));
        }
    }

    async fn sesion_vigente(&self) -> Result<Session, InfrastructureError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if session.is_valid(Instant::now()) {
                return Ok(session.clone());
            }
            tracing::debug!("Twitch access token expired, re-authenticating");
        }

        let session = self.autenticar().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn invalidar_sesion(&self) {
        *self.session.lock().await = None;
    }

    async fn autenticar(&self) -> Result<Session, InfrastructureError> {
        let url = format!("{}/oauth2/token", self.auth_url);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| InfrastructureError::Authentication(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InfrastructureError::Authentication(format!(
                "Token request failed with status: {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            InfrastructureError::Authentication(format!("Failed to parse token response: {}", e))
        })?;

        tracing::info!("Successfully authenticated with Twitch API");
        Ok(Session::from_token(token, Instant::now()))
    }
}

#[async_trait]
impl StreamRepository for TwitchClient {
    async fn is_live(&self, channel: &ChannelName) -> bool {
        match self.consultar_stream(channel).await {
            Ok(en_vivo) => en_vivo,
            Err(err @ InfrastructureError::Authentication(_)) => {
                tracing::error!(channel = %channel, error = %err, "Failed to authenticate with Twitch API");
                false
            }
            Err(err) => {
                tracing::error!(channel = %channel, error = %err, "Error checking stream status");
                false
            }
        }
    }
}

fn hay_stream_en_vivo(streams: &StreamsResponse, channel: &ChannelName) -> bool {
    streams.data.iter().any(|stream| {
        stream.user_login.eq_ignore_ascii_case(channel.as_str()) && stream.kind == "live"
    })
}
