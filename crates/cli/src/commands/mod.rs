//! Command handlers for the EasyDocs CLI.

pub mod ask;
pub mod chat;
pub mod index;
pub mod simplify;
pub mod upload;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use simplify::SimplifyCommand;
pub use upload::UploadCommand;
