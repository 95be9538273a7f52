mod action;
mod author;
mod backend;
mod backend_version;
mod error;
mod event;
mod lifecycle;
mod loading;
mod message;
mod protocol;
mod textarea;

pub use action::*;
pub use author::*;
pub use backend::*;
pub use backend_version::*;
pub use error::*;
pub use event::*;
pub use lifecycle::*;
pub use loading::*;
pub use message::*;
pub use protocol::*;
pub use textarea::*;
