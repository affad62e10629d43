use crate::domain::value_objects::{ChannelName, QualityPreference};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Parametros de una grabacion a iniciar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub channel: ChannelName,
    pub quality: QualityPreference,
    pub output_path: PathBuf,
}

/// Grabacion en curso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingAttempt {
    pub channel: ChannelName,
    pub quality: QualityPreference,
    pub output_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub pid: Option<u32>,
}

impl RecordingAttempt {
    pub fn new(request: CaptureRequest, pid: Option<u32>) -> Self {
        Self {
            channel: request.channel,
            quality: request.quality,
            output_path: request.output_path,
            started_at: Local::now(),
            pid,
        }
    }
}

/// Estado del proceso de captura.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    /// No hay proceso asociado.
    Idle,
    Running,
    /// El proceso termino por su cuenta; `None` si lo cerro una senal.
    Exited(Option<i32>),
}

/// Contrato del gestor de procesos de captura.
///
/// Mantiene como maximo un proceso vivo a la vez.
#[async_trait]
pub trait CaptureBackend: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lanza la captura.
    /// # Errors
    /// - `Self::Error` si ya hay un proceso vivo o el sistema no puede lanzarlo.
    fn start(&mut self, request: CaptureRequest) -> Result<RecordingAttempt, Self::Error>;

    /// Consulta no bloqueante del proceso actual.
    fn poll(&mut self) -> CaptureStatus;

    /// Detiene el proceso actual si existe. Idempotente.
    async fn stop(&mut self);
}
