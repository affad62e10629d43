mod channel_name;
mod quality_preference;

pub use channel_name::ChannelName;
pub use quality_preference::{QualityPreference, DEFAULT_QUALITY, FALLBACK_QUALITY};
