use std::path::Path;

/// Mensajes para el usuario en stdout. El diagnostico va por `tracing`.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }

    pub fn mostrar_error_sin_canal(&self) {
        println!("Error: Debes especificar un canal o comando");
        println!("Uso: twrec <canal> [-q <calidades>] [-o <directorio>]");
        println!("     twrec check <canal>");
    }

    pub fn mostrar_inicio(&self, canal: &str, calidad: &str, directorio: &Path) {
        println!("=== twrec - Twitch Recorder ===\n");
        println!("Canal: {}", canal);
        println!("Calidad: {}", calidad);
        println!("Directorio: {}", directorio.display());
        println!("Presiona Ctrl+C para detener\n");
    }

    pub fn mostrar_apagado(&self) {
        println!("\n[OK] Grabador detenido");
    }

    pub fn mostrar_inicio_verificacion(&self, canal: &str) {
        println!("Verificando estado de: {}", canal);
    }

    pub fn mostrar_estado_canal(&self, canal: &str, en_vivo: bool) {
        if en_vivo {
            println!("[OK] {} esta ONLINE", canal);
        } else {
            println!("[OFFLINE] {} esta OFFLINE", canal);
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new()
    }
}
