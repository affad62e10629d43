#![cfg(unix)]

use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use twrec::application::{RecordingSupervisor, SupervisorConfig};
use twrec::domain::repositories::{ConnectivityProbe, StreamRepository};
use twrec::domain::value_objects::{ChannelName, QualityPreference};
use twrec::infrastructure::config::StreamlinkSettings;
use twrec::infrastructure::{FilenameAllocator, StreamlinkProcessManager};

struct SiempreConectado;

#[async_trait]
impl ConnectivityProbe for SiempreConectado {
    async fn is_reachable(&self) -> bool {
        true
    }
}

/// En vivo solo en la primera consulta.
struct StreamQueTermina(Arc<AtomicUsize>);

#[async_trait]
impl StreamRepository for StreamQueTermina {
    async fn is_live(&self, _channel: &ChannelName) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst) == 0
    }
}

// Un solo test: el script se escribe antes de lanzar cualquier proceso.
#[tokio::test]
async fn shutdown_during_stop_keeps_graceful_termination() {
    let tmp = tempfile::tempdir().unwrap();
    let marca = tmp.path().join("cerrado_limpio");
    let script = tmp.path().join("lento_al_cerrar.sh");
    std::fs::write(
        &script,
        format!(
            "#!/bin/sh\ntrap 'sleep 1; touch \"{}\"; exit 0' TERM\nwhile :; do sleep 0.1; done\n",
            marca.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let capture = StreamlinkProcessManager::new(StreamlinkSettings {
        path: script.clone(),
        ..StreamlinkSettings::default()
    });
    let consultas = Arc::new(AtomicUsize::new(0));
    let supervisor = RecordingSupervisor::new(
        SupervisorConfig {
            channel: ChannelName::new("foo").unwrap(),
            quality: QualityPreference::default(),
            poll_interval: Duration::from_millis(400),
        },
        SiempreConectado,
        StreamQueTermina(Arc::clone(&consultas)),
        capture,
        FilenameAllocator::new(tmp.path().join("recordings"), "mp4"),
    );
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let inicio = Instant::now();
    let tarea = tokio::spawn(supervisor.run(cancel_rx));

    // A los 400ms el stream termina y se envia SIGTERM; el script tarda ~1s en salir.
    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(consultas.load(Ordering::SeqCst) >= 2, "la parada ya debe estar en curso");
    cancel_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(15), tarea)
        .await
        .expect("run debe terminar")
        .unwrap();

    assert!(
        marca.exists(),
        "el proceso debe cerrar por su cuenta tras SIGTERM"
    );
    assert!(inicio.elapsed() >= Duration::from_millis(1000));
}
