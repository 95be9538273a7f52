use serde_derive::Deserialize;
use serde_derive::Serialize;

pub const USER_SENDER: &str = "You";
pub const ASSISTANT_SENDER: &str = "Timothy";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    Assistant,
}

impl Author {
    /// Sender identifier used both in chat bubbles and on the wire.
    pub fn sender(&self) -> &'static str {
        match self {
            Author::User => return USER_SENDER,
            Author::Assistant => return ASSISTANT_SENDER,
        }
    }
}

impl ToString for Author {
    fn to_string(&self) -> String {
        return self.sender().to_string();
    }
}
