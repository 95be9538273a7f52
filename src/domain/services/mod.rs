pub mod actions;
mod app_state;
mod assistant_client;
mod conversation_state;
pub mod events;
mod scroll;

pub use app_state::*;
pub use assistant_client::*;
pub use conversation_state::*;
pub use scroll::*;
