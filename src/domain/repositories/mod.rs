mod capture_backend;
mod connectivity_probe;
mod stream_repository;

pub use capture_backend::{CaptureBackend, CaptureRequest, CaptureStatus, RecordingAttempt};
pub use connectivity_probe::ConnectivityProbe;
pub use stream_repository::StreamRepository;
