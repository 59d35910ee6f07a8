pub mod api;
pub mod job;
pub mod transcription;

pub use api::*;
pub use job::*;
pub use transcription::*;
