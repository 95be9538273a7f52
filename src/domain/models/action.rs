use super::TurnRequest;

pub enum Action {
    BackendProbeReadiness(),
    BackendRefreshData(),
    BackendSendTurn(TurnRequest),
}
