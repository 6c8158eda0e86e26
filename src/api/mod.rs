pub mod session;

pub use session::{CaptureSession, SessionStats};
