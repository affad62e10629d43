use async_trait::async_trait;

/// Contrato para saber si hay salida a la red.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// `true` si al menos un endpoint respondio. Nunca falla.
    async fn is_reachable(&self) -> bool;
}
