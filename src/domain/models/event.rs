use tui_textarea::Input;

use super::AssistantReply;
use super::BackendVersion;
use super::ClientError;

pub enum Event {
    BackendReady(Result<BackendVersion, ClientError>),
    BackendDataRefreshed(Result<BackendVersion, ClientError>),
    BackendTurnResponse(Result<AssistantReply, ClientError>),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLR(),
    KeyboardCTRLT(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}
