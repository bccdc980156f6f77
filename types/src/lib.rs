pub mod session;
pub mod audio;
pub mod events;
mod content;

pub use content::{Blob, Content, Part, Role};
pub use events::{ClientMessage, ServerMessage};
pub use session::{build_setup_message, ApiSurface, ResponseModality, Sensitivity, SessionConfig, VadConfig};
