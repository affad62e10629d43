pub mod config;
pub mod errors;
pub mod external;
pub mod storage;
pub mod telemetry;

pub use config::AppConfig;
pub use errors::InfrastructureError;
pub use external::{HttpConnectivityProber, StreamlinkProcessManager, TwitchClient};
pub use storage::FilenameAllocator;
pub use telemetry::init_tracing;
