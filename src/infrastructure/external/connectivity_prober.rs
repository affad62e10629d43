use crate::domain::repositories::ConnectivityProbe;
use crate::infrastructure::InfrastructureError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Verifica conectividad con GETs cortos a varios proveedores independientes.
pub struct HttpConnectivityProber {
    client: Client,
    endpoints: Vec<String>,
}

impl HttpConnectivityProber {
    /// # Errors
    /// - `InfrastructureError::ExternalService` si falla la configuracion HTTP.
    /// - `InfrastructureError::Config` si no hay endpoints.
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self, InfrastructureError> {
        if endpoints.is_empty() {
            return Err(InfrastructureError::Config(
                "At least one probe endpoint is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                InfrastructureError::ExternalService(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProber {
    async fn is_reachable(&self) -> bool {
        for endpoint in &self.endpoints {
            match self.client.get(endpoint).send().await {
                // Cualquier respuesta HTTP cuenta; solo importa la conexion.
                Ok(response) => {
                    tracing::trace!(endpoint = %endpoint, status = %response.status(), "Probe succeeded");
                    return true;
                }
                Err(err) => {
                    tracing::debug!(endpoint = %endpoint, error = %err, "Probe failed");
                }
            }
        }
        false
    }
}
