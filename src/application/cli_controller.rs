use crate::application::recording_supervisor::{RecordingSupervisor, SupervisorConfig};
use crate::domain::repositories::StreamRepository;
use crate::domain::value_objects::{ChannelName, QualityPreference};
use crate::infrastructure::config::expandir_tilde;
use crate::infrastructure::{
    AppConfig, FilenameAllocator, HttpConnectivityProber, StreamlinkProcessManager, TwitchClient,
};
use crate::presentation::{Cli, Commands, ConsoleOutput};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Carga la configuracion y aplica los overrides de la linea de comandos.
pub fn preparar_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let ruta_config = resolver_ruta_opcional(cli.config.as_deref());
    let mut config = AppConfig::load(ruta_config.as_deref())?;

    let output = match &cli.command {
        Some(Commands::Record { output, .. }) => output.as_deref().or(cli.output.as_deref()),
        _ => cli.output.as_deref(),
    };
    if let Some(output) = resolver_ruta_opcional(output) {
        config.output_dir = output;
    }
    if let Some(streamlink) = resolver_ruta_opcional(cli.streamlink_path.as_deref()) {
        config.streamlink.path = streamlink;
    }
    if let Some(log_file) = cli.log_file.as_deref() {
        config.log_file = if log_file.trim().is_empty() {
            None
        } else {
            Some(expandir_tilde(log_file))
        };
    }

    Ok(config)
}

/// Orquesta la ejecucion de la CLI.
pub async fn ejecutar_cli(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let salida = ConsoleOutput::new();
    let Cli {
        canal: canal_principal,
        verificar,
        quality: calidad_principal,
        command,
        ..
    } = cli;

    let (canal, calidad, solo_verificar) = match command {
        Some(Commands::Record { canal, quality, .. }) => (canal, quality, false),
        Some(Commands::Check { canal }) => (canal, calidad_principal, true),
        None => match canal_principal {
            Some(canal) => (canal, calidad_principal, verificar),
            None => {
                salida.mostrar_error_sin_canal();
                std::process::exit(1);
            }
        },
    };

    let canal = ChannelName::try_from(canal)?;
    let (client_id, client_secret) = config.credentials()?;
    let twitch = TwitchClient::new(client_id, client_secret)?
        .with_endpoints(&config.twitch.auth_url, &config.twitch.api_url);

    if solo_verificar {
        return verificar_canal(&twitch, &salida, &canal).await;
    }

    let calidad = QualityPreference::new(&calidad)?;
    grabar_canal(twitch, config, canal, calidad, &salida).await
}

async fn grabar_canal(
    twitch: TwitchClient,
    config: AppConfig,
    canal: ChannelName,
    calidad: QualityPreference,
    salida: &ConsoleOutput,
) -> anyhow::Result<()> {
    validar_streamlink(&config.streamlink.path).await;

    let probe = HttpConnectivityProber::new(
        config.network.probe_endpoints.clone(),
        config.probe_timeout(),
    )?;
    let capture = StreamlinkProcessManager::new(config.streamlink.clone())
        .with_stop_timeout(config.stop_timeout());
    let allocator = FilenameAllocator::new(&config.output_dir, config.extension.clone());

    salida.mostrar_inicio(canal.as_str(), &calidad.as_arg(), &config.output_dir);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        esperar_senal_apagado().await;
        let _ = cancel_tx.send(true);
    });

    let supervisor = RecordingSupervisor::new(
        SupervisorConfig {
            channel: canal,
            quality: calidad,
            poll_interval: config.poll_interval(),
        },
        probe,
        twitch,
        capture,
        allocator,
    );
    supervisor.run(cancel_rx).await;

    salida.mostrar_apagado();
    Ok(())
}

async fn verificar_canal(
    streams: &impl StreamRepository,
    salida: &ConsoleOutput,
    canal: &ChannelName,
) -> anyhow::Result<()> {
    salida.mostrar_inicio_verificacion(canal.as_str());
    let en_vivo = streams.is_live(canal).await;
    salida.mostrar_estado_canal(canal.as_str(), en_vivo);
    Ok(())
}

/// Espera SIGINT (Ctrl+C) o, en unix, SIGTERM.
async fn esperar_senal_apagado() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
                tracing::info!("Shutdown signal received");
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Cannot listen for SIGTERM; only Ctrl+C will stop the recorder");
            }
        }
    }

    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    } else {
        std::future::pending::<()>().await;
    }
}

/// Comprueba que streamlink responde. Solo advierte: el bucle reintenta
/// el arranque en cada iteracion.
async fn validar_streamlink(bin: &Path) {
    let salida = tokio::process::Command::new(bin)
        .arg("--version")
        .output()
        .await;

    match salida {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            tracing::debug!(version = %version.trim(), "Found streamlink");
        }
        Ok(output) => {
            tracing::warn!(status = %output.status, "streamlink --version returned an error");
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %bin.display(), "streamlink not found. Use --streamlink-path");
        }
        Err(err) => {
            tracing::warn!(path = %bin.display(), error = %err, "Cannot run streamlink");
        }
    }
}

fn resolver_ruta_opcional(ruta: Option<&str>) -> Option<PathBuf> {
    ruta.map(expandir_tilde)
}
