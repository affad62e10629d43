use crate::domain::repositories::{
    CaptureBackend, CaptureRequest, CaptureStatus, RecordingAttempt,
};
use crate::infrastructure::config::StreamlinkSettings;
use crate::infrastructure::InfrastructureError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

/// Proceso de streamlink en curso.
struct CaptureHandle {
    child: Child,
    attempt: RecordingAttempt,
    exit_code: Option<Option<i32>>,
}

/// Gestor del proceso de streamlink. Mantiene como maximo un proceso vivo.
pub struct StreamlinkProcessManager {
    settings: StreamlinkSettings,
    stop_timeout: Duration,
    current: Option<CaptureHandle>,
}

impl StreamlinkProcessManager {
    pub fn new(settings: StreamlinkSettings) -> Self {
        let stop_timeout = Duration::from_secs(settings.stop_timeout_secs);
        Self {
            settings,
            stop_timeout,
            current: None,
        }
    }

    /// Cambia la espera entre SIGTERM y el kill forzado.
    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn current_attempt(&self) -> Option<&RecordingAttempt> {
        self.current.as_ref().map(|handle| &handle.attempt)
    }
}

#[async_trait]
impl CaptureBackend for StreamlinkProcessManager {
    type Error = InfrastructureError;

    fn start(&mut self, request: CaptureRequest) -> Result<RecordingAttempt, InfrastructureError> {
        match self.poll() {
            CaptureStatus::Running => {
                let pid = self.current_attempt().and_then(|attempt| attempt.pid);
                return Err(InfrastructureError::CaptureAlreadyActive(pid));
            }
            CaptureStatus::Exited(_) => {
                // Ya termino y fue recogido por try_wait; solo se descarta.
                self.current = None;
            }
            CaptureStatus::Idle => {}
        }

        let mut command = Command::new(&self.settings.path);
        command.kill_on_drop(true);
        let mut child = command
            .args(construir_argumentos(&self.settings, &request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                InfrastructureError::CaptureSpawn(format!(
                    "{}: {}",
                    self.settings.path.display(),
                    e
                ))
            })?;

        let pid = child.id();
        let etiqueta = request.channel.to_string();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(drenar_salida(stdout, etiqueta.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drenar_salida(stderr, etiqueta, "stderr"));
        }

        let attempt = RecordingAttempt::new(request, pid);
        tracing::debug!(pid = ?pid, path = %attempt.output_path.display(), "Streamlink process started");

        self.current = Some(CaptureHandle {
            child,
            attempt: attempt.clone(),
            exit_code: None,
        });
        Ok(attempt)
    }

    fn poll(&mut self) -> CaptureStatus {
        let Some(handle) = self.current.as_mut() else {
            return CaptureStatus::Idle;
        };

        if let Some(code) = handle.exit_code {
            return CaptureStatus::Exited(code);
        }

        match handle.child.try_wait() {
            Ok(Some(status)) => {
                handle.exit_code = Some(status.code());
                CaptureStatus::Exited(status.code())
            }
            Ok(None) => CaptureStatus::Running,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to query streamlink process; treating it as exited");
                handle.exit_code = Some(None);
                CaptureStatus::Exited(None)
            }
        }
    }

    async fn stop(&mut self) {
        let Some(mut handle) = self.current.take() else {
            return;
        };

        if handle.exit_code.is_none() {
            match handle.child.id() {
                Some(pid) => {
                    if let Err(err) = enviar_terminacion(&mut handle.child, pid) {
                        tracing::warn!(pid, error = %err, "Failed to send termination signal");
                    }
                }
                None => tracing::debug!("Streamlink process already reaped"),
            }

            match tokio::time::timeout(self.stop_timeout, handle.child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!(status = %status, "Streamlink process exited");
                }
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "Failed to wait for streamlink process");
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = self.stop_timeout.as_secs_f64(),
                        "Streamlink did not exit after termination signal, killing it"
                    );
                    if let Err(err) = handle.child.kill().await {
                        tracing::warn!(error = %err, "Failed to kill streamlink process");
                    }
                }
            }
        }

        tracing::info!(path = %handle.attempt.output_path.display(), "Recording stopped");
    }
}

/// Argumentos fijos de streamlink para una grabacion.
pub fn construir_argumentos(settings: &StreamlinkSettings, request: &CaptureRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "--twitch-disable-hosting",
        "--twitch-disable-ads",
        "--retry-max",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(settings.retry_max.to_string().into());
    args.push("--retry-streams".into());
    args.push(settings.retry_streams.to_string().into());
    args.push("--stream-timeout".into());
    args.push(settings.stream_timeout.to_string().into());
    args.push("--twitch-low-latency".into());
    args.push(request.channel.stream_target().into());
    args.push(request.quality.as_arg().into());
    args.push("-o".into());
    args.push(request.output_path.clone().into_os_string());
    args
}

#[cfg(unix)]
fn enviar_terminacion(_child: &mut Child, pid: u32) -> std::io::Result<()> {
    let pid_t: libc::pid_t = pid.try_into().map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "PID out of range")
    })?;

    let result = unsafe { libc::kill(pid_t, libc::SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn enviar_terminacion(child: &mut Child, _pid: u32) -> std::io::Result<()> {
    child.start_kill()
}

async fn drenar_salida<R>(salida: R, canal: String, flujo: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lineas = BufReader::new(salida).lines();
    loop {
        match lineas.next_line().await {
            Ok(Some(linea)) => {
                let linea = linea.trim();
                if !linea.is_empty() {
                    tracing::debug!(channel = %canal, stream = flujo, "streamlink: {}", linea);
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(channel = %canal, stream = flujo, error = %err, "Stopped reading streamlink output");
                break;
            }
        }
    }
}
