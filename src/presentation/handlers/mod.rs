mod chat;
mod error;
mod health;
mod similarity;
mod transcribe;

pub use chat::chat_handler;
pub use error::ErrorResponse;
pub use health::health_handler;
pub use similarity::similarity_handler;
pub use transcribe::transcribe_handler;
