mod cli_controller;
pub mod recording_supervisor;

pub use cli_controller::{ejecutar_cli, preparar_config};
pub use recording_supervisor::{RecordingSupervisor, SupervisorConfig, SupervisorState};
