use crate::domain::value_objects::ChannelName;
use crate::infrastructure::InfrastructureError;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Fuente de hora local.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reloj de pared del sistema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Reloj congelado en un instante.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Asigna la ruta de salida de cada grabacion:
/// `{output_dir}/{canal}_{YYYYMMDD_HHMMSS}.{ext}`, con el canal escrito tal
/// como se configuro.
///
/// La resolucion es de un segundo; dos asignaciones del mismo canal dentro
/// del mismo segundo producen la misma ruta.
#[derive(Clone)]
pub struct FilenameAllocator {
    output_dir: PathBuf,
    extension: String,
    clock: Arc<dyn Clock>,
}

impl FilenameAllocator {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Reemplaza el reloj (util para pruebas).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Devuelve la ruta para una grabacion que empieza ahora.
    /// # Errors
    /// - `InfrastructureError::Io` si no se puede crear el directorio de salida.
    pub async fn allocate(&self, channel: &ChannelName) -> Result<PathBuf, InfrastructureError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let nombre = nombre_archivo(channel, self.clock.now(), &self.extension);
        Ok(self.output_dir.join(nombre))
    }
}

fn nombre_archivo(channel: &ChannelName, instante: NaiveDateTime, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        channel.display_name(),
        instante.format(TIMESTAMP_FORMAT),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instante(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn formats_channel_and_timestamp() {
        let canal = ChannelName::new("foo").unwrap();
        assert_eq!(
            nombre_archivo(&canal, instante(12, 0, 0), "mp4"),
            "foo_20240101_120000.mp4"
        );
    }

    #[test]
    fn keeps_channel_spelling_as_configured() {
        let canal = ChannelName::new("SomeStreamer").unwrap();
        assert_eq!(
            nombre_archivo(&canal, instante(21, 5, 9), "mp4"),
            "SomeStreamer_20240101_210509.mp4"
        );
    }

    #[test]
    fn distinct_seconds_or_channels_do_not_collide() {
        let foo = ChannelName::new("foo").unwrap();
        let bar = ChannelName::new("bar").unwrap();
        let a = nombre_archivo(&foo, instante(12, 0, 0), "mp4");
        let b = nombre_archivo(&foo, instante(12, 0, 1), "mp4");
        let c = nombre_archivo(&bar, instante(12, 0, 0), "mp4");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn same_channel_same_second_collides() {
        let foo = ChannelName::new("foo").unwrap();
        assert_eq!(
            nombre_archivo(&foo, instante(8, 30, 5), "mp4"),
            nombre_archivo(&foo, instante(8, 30, 5), "mp4")
        );
    }

    #[tokio::test]
    async fn allocate_creates_output_dir_idempotently() {
        let tmp = tempfile::tempdir().unwrap();
        let destino = tmp.path().join("recordings");
        let allocator = FilenameAllocator::new(&destino, "mp4")
            .with_clock(Arc::new(FixedClock(instante(12, 0, 0))));
        let canal = ChannelName::new("foo").unwrap();

        let ruta = allocator.allocate(&canal).await.unwrap();
        assert_eq!(ruta, destino.join("foo_20240101_120000.mp4"));
        assert!(destino.is_dir());

        let otra = allocator.allocate(&canal).await.unwrap();
        assert_eq!(otra, ruta);
    }
}
