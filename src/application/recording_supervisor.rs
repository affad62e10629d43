use crate::domain::repositories::{
    CaptureBackend, CaptureRequest, CaptureStatus, ConnectivityProbe, RecordingAttempt,
    StreamRepository,
};
use crate::domain::value_objects::{ChannelName, QualityPreference};
use crate::infrastructure::FilenameAllocator;
use anyhow::Context;
use chrono::Local;
use std::time::Duration;
use tokio::sync::watch;

/// Estado del bucle de grabacion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    WaitingForNetwork,
    WaitingForLive,
    Recording,
}

/// Resultado de evaluar una iteracion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accion {
    Continuar,
    Detener,
}

/// Parametros fijos del supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub channel: ChannelName,
    pub quality: QualityPreference,
    pub poll_interval: Duration,
}

/// Bucle que decide cuando grabar el canal.
///
/// Combina conectividad, estado del stream y estado del proceso de captura.
/// Corre hasta que el receptor de cancelacion pasa a `true`; en ese momento
/// detiene cualquier grabacion activa y retorna.
pub struct RecordingSupervisor<N, S, C> {
    config: SupervisorConfig,
    probe: N,
    streams: S,
    capture: C,
    allocator: FilenameAllocator,
    state: SupervisorState,
    attempt: Option<RecordingAttempt>,
}

impl<N, S, C> RecordingSupervisor<N, S, C>
where
    N: ConnectivityProbe,
    S: StreamRepository,
    C: CaptureBackend,
{
    pub fn new(
        config: SupervisorConfig,
        probe: N,
        streams: S,
        capture: C,
        allocator: FilenameAllocator,
    ) -> Self {
        Self {
            config,
            probe,
            streams,
            capture,
            allocator,
            state: SupervisorState::Idle,
            attempt: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn active_attempt(&self) -> Option<&RecordingAttempt> {
        self.attempt.as_ref()
    }

    /// Ejecuta una iteracion del bucle y devuelve el nuevo estado.
    /// # Errors
    /// - Fallos al preparar el directorio de salida o al lanzar la captura.
    pub async fn tick(&mut self) -> anyhow::Result<SupervisorState> {
        let accion = self.evaluar().await?;
        self.aplicar(accion).await;
        Ok(self.state)
    }

    /// Parte cancelable de una iteracion: consultas y arranque.
    /// Nunca detiene la captura; eso queda para `aplicar`.
    async fn evaluar(&mut self) -> anyhow::Result<Accion> {
        if self.state == SupervisorState::Recording {
            return Ok(self.vigilar_grabacion().await);
        }

        if !self.probe.is_reachable().await {
            tracing::warn!("No internet connection");
            self.state = SupervisorState::WaitingForNetwork;
            return Ok(Accion::Continuar);
        }

        if !self.streams.is_live(&self.config.channel).await {
            tracing::info!(channel = %self.config.channel, "Channel is not live");
            self.state = SupervisorState::WaitingForLive;
            return Ok(Accion::Continuar);
        }

        let output_path = self
            .allocator
            .allocate(&self.config.channel)
            .await
            .context("preparing output file")?;

        let request = CaptureRequest {
            channel: self.config.channel.clone(),
            quality: self.config.quality.clone(),
            output_path,
        };
        let attempt = self
            .capture
            .start(request)
            .context("starting capture process")?;

        tracing::info!(
            channel = %attempt.channel,
            quality = %attempt.quality,
            pid = ?attempt.pid,
            "Started recording to {}",
            attempt.output_path.display()
        );
        self.attempt = Some(attempt);
        self.state = SupervisorState::Recording;
        Ok(Accion::Continuar)
    }

    async fn vigilar_grabacion(&mut self) -> Accion {
        match self.capture.poll() {
            CaptureStatus::Running => {
                if self.streams.is_live(&self.config.channel).await {
                    tracing::debug!(channel = %self.config.channel, "Still recording");
                    Accion::Continuar
                } else {
                    tracing::info!(channel = %self.config.channel, "Stream ended");
                    Accion::Detener
                }
            }
            CaptureStatus::Exited(code) => {
                tracing::warn!(exit_code = ?code, "Capture process exited on its own");
                Accion::Detener
            }
            CaptureStatus::Idle => {
                tracing::warn!("Capture process missing while recording");
                Accion::Detener
            }
        }
    }

    async fn aplicar(&mut self, accion: Accion) {
        if accion == Accion::Detener {
            self.detener().await;
        }
    }

    /// Detiene la captura (si existe) y vuelve a `Idle`. Seguro sin grabacion activa.
    async fn detener(&mut self) {
        self.capture.stop().await;
        if let Some(attempt) = self.attempt.take() {
            let duracion = Local::now().signed_duration_since(attempt.started_at);
            tracing::info!(
                path = %attempt.output_path.display(),
                duration_secs = duracion.num_seconds(),
                "Recording attempt finished"
            );
        }
        self.state = SupervisorState::Idle;
    }

    /// Corre el bucle hasta que `cancel_rx` indique apagado.
    pub async fn run(mut self, mut cancel_rx: watch::Receiver<bool>) {
        tracing::info!(
            channel = %self.config.channel,
            quality = %self.config.quality,
            output_dir = %self.allocator.output_dir().display(),
            "Recorder started"
        );

        loop {
            if *cancel_rx.borrow() {
                break;
            }

            // Solo las consultas compiten con la cancelacion: una parada en
            // curso siempre agota su espera de terminacion.
            let resultado = tokio::select! {
                resultado = self.evaluar() => Some(resultado),
                _ = esperar_cancelacion(&mut cancel_rx) => None,
            };
            let Some(resultado) = resultado else {
                break;
            };

            let espera = match resultado {
                Ok(accion) => {
                    self.aplicar(accion).await;
                    if self.state == SupervisorState::Idle {
                        Duration::ZERO
                    } else {
                        self.config.poll_interval
                    }
                }
                Err(err) => {
                    tracing::error!(error = %format!("{:#}", err), "Unexpected error in recording loop");
                    self.detener().await;
                    self.config.poll_interval
                }
            };

            if !espera.is_zero() && !dormir(espera, &mut cancel_rx).await {
                break;
            }
        }

        tracing::info!("Recording interrupted, shutting down");
        self.detener().await;
    }
}

/// Espera `duracion`; devuelve `false` si llego la cancelacion antes.
async fn dormir(duracion: Duration, cancel_rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duracion) => true,
        _ = esperar_cancelacion(cancel_rx) => false,
    }
}

/// Resuelve cuando el canal de cancelacion pasa a `true`.
/// Si el emisor desaparece sin cancelar, no resuelve nunca.
async fn esperar_cancelacion(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow_and_update() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dormir_returns_false_on_cancel() {
        let (tx, mut rx) = watch::channel(false);
        let espera = tokio::spawn(async move { dormir(Duration::from_secs(3600), &mut rx).await });
        tx.send(true).unwrap();
        let completo = tokio::time::timeout(Duration::from_secs(5), espera)
            .await
            .expect("la espera debe interrumpirse")
            .unwrap();
        assert!(!completo);
    }

    #[tokio::test]
    async fn dormir_completes_without_cancel() {
        let (_tx, mut rx) = watch::channel(false);
        assert!(dormir(Duration::from_millis(5), &mut rx).await);
    }

    #[tokio::test]
    async fn dropped_sender_never_cancels() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        assert!(dormir(Duration::from_millis(5), &mut rx).await);
    }
}
