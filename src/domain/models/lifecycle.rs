/// Status of the chat-turn request. There is no retained error state, a
/// failed turn returns straight to `Idle`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Waiting,
}

impl RequestLifecycle {
    pub fn is_waiting(&self) -> bool {
        return *self == RequestLifecycle::Waiting;
    }
}
