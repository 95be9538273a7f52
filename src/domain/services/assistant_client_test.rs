use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;

use super::AssistantClient;
use crate::domain::models::AssistantBackend;
use crate::domain::models::AssistantReply;
use crate::domain::models::Author;
use crate::domain::models::BackendVersion;
use crate::domain::models::ClientError;
use crate::domain::models::Origin;
use crate::domain::models::ProtocolGeneration;
use crate::domain::models::RequestLifecycle;
use crate::domain::models::TurnRequest;
use crate::domain::models::VersionPart;
use crate::domain::services::ConversationState;

#[derive(Default, Clone)]
struct Calls {
    ready: Arc<AtomicUsize>,
    ready_at: Arc<Mutex<Vec<Instant>>>,
    sent: Arc<Mutex<Vec<TurnRequest>>>,
}

/// Backend that becomes ready on a given attempt and answers turns with a
/// fixed reply.
struct ScriptedBackend {
    ready_on_attempt: Option<usize>,
    reply: Option<String>,
    version: Option<BackendVersion>,
    calls: Calls,
}

impl ScriptedBackend {
    fn boxed(self) -> Box<ScriptedBackend> {
        return Box::new(self);
    }
}

fn version() -> BackendVersion {
    return BackendVersion::new(vec![VersionPart::Number(1), VersionPart::Number(4)]);
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    fn protocol(&self) -> ProtocolGeneration {
        return ProtocolGeneration::V2;
    }

    async fn is_ready(&self) -> Result<BackendVersion> {
        let attempt = self.calls.ready.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.ready_at.lock().unwrap().push(Instant::now());

        if self.ready_on_attempt == Some(attempt) {
            return Ok(version());
        }

        bail!("Backend is still starting");
    }

    async fn update_data(&self) -> Result<BackendVersion> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }

        bail!("Update failed");
    }

    async fn send_message(&self, request: &TurnRequest) -> Result<AssistantReply> {
        self.calls.sent.lock().unwrap().push(request.clone());
        if let Some(text) = &self.reply {
            return Ok(AssistantReply {
                text: text.to_string(),
                origin: Some(Origin::from_preference(request.use_external)),
            });
        }

        bail!("Timothy returned status 500 for /send/message");
    }
}

fn client(ready_on_attempt: Option<usize>, reply: Option<&str>) -> (AssistantClient, Calls) {
    let calls = Calls::default();
    let backend = ScriptedBackend {
        ready_on_attempt,
        reply: reply.map(|e| return e.to_string()),
        version: None,
        calls: calls.clone(),
    };

    return (AssistantClient::new(backend.boxed()), calls);
}

mod probe_readiness {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn it_returns_on_first_success() -> Result<()> {
        let (client, calls) = client(Some(1), None);
        let start = Instant::now();

        assert_eq!(client.probe_readiness().await?, version());
        assert_eq!(calls.ready.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(1000));

        return Ok(());
    }

    #[tokio::test(start_paused = true)]
    async fn it_succeeds_on_the_last_attempt() -> Result<()> {
        let (client, calls) = client(Some(10), None);

        assert_eq!(client.probe_readiness().await?, version());
        assert_eq!(calls.ready.load(Ordering::SeqCst), 10);

        let times = calls.ready_at.lock().unwrap().clone();
        assert_eq!(times.len(), 10);
        for pair in times.windows(2) {
            let spacing = pair[1] - pair[0];
            assert!(spacing >= Duration::from_millis(1000));
            assert!(spacing < Duration::from_millis(1010));
        }

        return Ok(());
    }

    #[tokio::test(start_paused = true)]
    async fn it_gives_up_after_all_attempts() {
        let (client, calls) = client(None, None);
        let start = Instant::now();

        let res = client.probe_readiness().await;

        assert_eq!(res, Err(ClientError::BackendUnavailable { attempts: 10 }));
        assert_eq!(calls.ready.load(Ordering::SeqCst), 10);
        assert!(start.elapsed() >= Duration::from_millis(9000));
        assert!(start.elapsed() < Duration::from_millis(9100));
    }

    #[tokio::test(start_paused = true)]
    async fn it_honors_configured_attempts() {
        let (client, calls) = client(None, None);
        let client = client.with_readiness(3, Duration::from_millis(50));

        let res = client.probe_readiness().await;

        assert_eq!(res, Err(ClientError::BackendUnavailable { attempts: 3 }));
        assert_eq!(calls.ready.load(Ordering::SeqCst), 3);
    }
}

mod run_turn {
    use super::*;

    #[tokio::test]
    async fn it_skips_blank_input() -> Result<()> {
        let (client, calls) = client(Some(1), Some("unused"));
        let mut state = ConversationState::new(false);

        assert!(!client.run_turn(&mut state, "   ", 4).await?);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.lifecycle(), RequestLifecycle::Idle);
        assert!(calls.sent.lock().unwrap().is_empty());

        return Ok(());
    }

    #[tokio::test]
    async fn it_appends_both_sides_of_a_turn() -> Result<()> {
        let (client, calls) = client(Some(1), Some("Blue is available in S only."));
        let mut state = ConversationState::new(false);
        state.append_message(Author::User, "red?", None);
        state.append_message(Author::Assistant, "We have red in M and L.", None);

        assert!(client.run_turn(&mut state, "What about blue?", 2).await?);

        let sent = calls.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context.len(), 2);
        assert_eq!(sent[0].text, "What about blue?");
        assert!(!sent[0].use_external);

        let last = state.messages().last().unwrap();
        assert_eq!(last.text, "Blue is available in S only.");
        assert_eq!(last.origin, Some(Origin::Internal));
        assert_eq!(state.messages().len(), 5);
        assert_eq!(state.lifecycle(), RequestLifecycle::Idle);

        return Ok(());
    }

    #[tokio::test]
    async fn it_returns_to_idle_on_failure() {
        let (client, _calls) = client(Some(1), None);
        let mut state = ConversationState::new(true);

        let res = client.run_turn(&mut state, "Any jackets?", 4).await;

        assert!(matches!(res, Err(ClientError::TurnFailed(_))));
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].author, Author::User);
        assert_eq!(state.lifecycle(), RequestLifecycle::Idle);
    }
}

mod refresh_data {
    use super::*;

    #[tokio::test]
    async fn it_returns_the_new_version() -> Result<()> {
        let backend = ScriptedBackend {
            ready_on_attempt: None,
            reply: None,
            version: Some(version()),
            calls: Calls::default(),
        };
        let client = AssistantClient::new(backend.boxed());

        assert_eq!(client.refresh_data().await?, version());

        return Ok(());
    }

    #[tokio::test]
    async fn it_maps_failures() {
        let (client, _calls) = client(None, None);
        let res = client.refresh_data().await;

        assert_eq!(
            res,
            Err(ClientError::RefreshFailed("Update failed".to_string()))
        );
    }
}
