mod connectivity_prober;
mod streamlink_process;
mod twitch_client;

pub use connectivity_prober::HttpConnectivityProber;
pub use streamlink_process::{construir_argumentos, StreamlinkProcessManager};
pub use twitch_client::TwitchClient;
