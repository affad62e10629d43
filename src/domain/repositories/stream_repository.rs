use crate::domain::value_objects::ChannelName;
use async_trait::async_trait;

/// Contrato para consultar si un canal esta transmitiendo.
#[async_trait]
pub trait StreamRepository: Send + Sync {
    /// Indica si el canal tiene un stream en vivo.
    /// # Arguments
    /// - `channel`: canal validado.
    /// # Returns
    /// - `true` solo si la plataforma reporta un stream en vivo para ese canal.
    ///   Cualquier fallo (sesion, red, respuesta invalida) se reporta como `false`.
    async fn is_live(&self, channel: &ChannelName) -> bool;
}
