use crate::domain::value_objects::DEFAULT_QUALITY;
use clap::{Parser, Subcommand};

/// Parametros de linea de comandos.
#[derive(Parser)]
#[command(name = "twrec")]
#[command(author, version, about = "Grabador desatendido de un canal de Twitch")]
pub struct Cli {
    /// Canal a vigilar (modo principal).
    #[arg(value_name = "CHANNEL", index = 1, env = "TWREC_CHANNEL")]
    pub canal: Option<String>,

    /// Solo verificar si el canal esta en vivo.
    #[arg(short = 'c', long = "check", global = true)]
    pub verificar: bool,

    /// Directorio de salida de las grabaciones.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Preferencia de calidad, en orden (siempre termina en `best`).
    #[arg(short, long, default_value = DEFAULT_QUALITY, env = "TWREC_QUALITY")]
    pub quality: String,

    /// Ruta a streamlink.
    #[arg(long, global = true)]
    pub streamlink_path: Option<String>,

    /// Archivo de configuracion (por defecto `config/default.toml`).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Archivo de log; vacio para desactivarlo.
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcomandos disponibles.
#[derive(Subcommand)]
pub enum Commands {
    /// Vigila un canal y lo graba cada vez que este en vivo.
    Record {
        /// Canal de Twitch.
        #[arg(value_name = "CHANNEL")]
        canal: String,
        /// Directorio de salida.
        #[arg(short, long)]
        output: Option<String>,
        /// Preferencia de calidad.
        #[arg(short, long, default_value = DEFAULT_QUALITY)]
        quality: String,
    },

    /// Verifica si un canal esta en vivo.
    Check {
        /// Canal de Twitch.
        #[arg(value_name = "CHANNEL")]
        canal: String,
    },
}
