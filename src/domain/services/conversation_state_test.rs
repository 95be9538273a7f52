use super::ConversationState;
use super::GREETING;
use crate::domain::models::AssistantReply;
use crate::domain::models::Author;
use crate::domain::models::BackendVersion;
use crate::domain::models::ClientError;
use crate::domain::models::Origin;
use crate::domain::models::RequestLifecycle;
use crate::domain::models::VersionPart;
use crate::domain::models::WireMessage;

fn wire(sender: &str, text: &str) -> WireMessage {
    return WireMessage {
        sender: sender.to_string(),
        text: text.to_string(),
    };
}

#[test]
fn it_starts_with_a_greeting() {
    let state = ConversationState::new(false);

    assert_eq!(state.messages().len(), 1);
    assert_eq!(state.messages()[0].author, Author::Assistant);
    assert_eq!(state.messages()[0].text, GREETING);
    assert_eq!(state.lifecycle(), RequestLifecycle::Idle);
    assert!(state.backend_version().is_none());
    assert!(!state.use_external_llm());
}

#[test]
fn it_ignores_blank_input() {
    let mut state = ConversationState::new(false);

    for input in ["", "   ", "\n\t  \n"] {
        assert!(state.prepare_turn(input, 4).is_none());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.lifecycle(), RequestLifecycle::Idle);
    }
}

#[test]
fn it_prepares_turns() {
    let mut state = ConversationState::new(true);
    let request = state.prepare_turn("  Any jackets?  ", 4).unwrap();

    assert_eq!(request.text, "Any jackets?");
    assert_eq!(request.context, vec![wire("Timothy", GREETING)]);
    assert!(request.use_external);
    assert_eq!(state.lifecycle(), RequestLifecycle::Waiting);
    assert_eq!(state.messages().len(), 2);
    assert_eq!(state.messages()[1].author, Author::User);
    assert_eq!(state.messages()[1].text, "Any jackets?");
}

#[test]
fn it_never_includes_the_new_message_in_context() {
    let mut state = ConversationState::new(false);
    state.append_message(Author::User, "red?", None);
    state.append_message(Author::Assistant, "We have red in M and L.", None);

    let request = state.prepare_turn("What about blue?", 2).unwrap();

    assert_eq!(
        request.context,
        vec![
            wire("You", "red?"),
            wire("Timothy", "We have red in M and L."),
        ]
    );
}

#[test]
fn it_bounds_recent_context() {
    let mut state = ConversationState::new(false);
    assert_eq!(state.recent_context(4).len(), 1);
    assert_eq!(state.recent_context(0).len(), 0);

    for idx in 0..5 {
        state.append_message(Author::User, &format!("question {idx}"), None);
    }

    let context = state.recent_context(2);
    assert_eq!(
        context,
        vec![wire("You", "question 3"), wire("You", "question 4")]
    );
    assert_eq!(state.messages().len(), 6);
}

#[test]
fn it_strips_origin_from_context() {
    let mut state = ConversationState::new(false);
    state.append_message(Author::Assistant, "Navy or black?", Some(Origin::External));

    assert_eq!(
        state.recent_context(1),
        vec![wire("Timothy", "Navy or black?")]
    );
}

#[test]
fn it_appends_replies_on_success() {
    let mut state = ConversationState::new(false);
    state.append_message(Author::User, "red?", None);
    state.append_message(Author::Assistant, "We have red in M and L.", None);
    state.prepare_turn("What about blue?", 2).unwrap();

    state.finish_turn(Ok(AssistantReply {
        text: "Blue is available in S only.".to_string(),
        origin: Some(Origin::Internal),
    }));

    let last = state.messages().last().unwrap();
    assert_eq!(last.author, Author::Assistant);
    assert_eq!(last.text, "Blue is available in S only.");
    assert_eq!(last.origin, Some(Origin::Internal));
    assert_eq!(state.lifecycle(), RequestLifecycle::Idle);
}

#[test]
fn it_leaves_the_log_untouched_on_failure() {
    let mut state = ConversationState::new(false);
    state.prepare_turn("Any jackets?", 4).unwrap();
    let before = state.messages().to_vec();

    state.finish_turn(Err(ClientError::TurnFailed("status 500".to_string())));

    assert_eq!(state.messages(), before.as_slice());
    assert_eq!(state.lifecycle(), RequestLifecycle::Idle);
}

#[test]
fn it_alternates_across_turns() {
    let mut state = ConversationState::new(false);
    let turns = 5;

    for idx in 0..turns {
        state.prepare_turn(&format!("question {idx}"), 4).unwrap();
        state.finish_turn(Ok(AssistantReply {
            text: format!("answer {idx}"),
            origin: None,
        }));
    }

    assert_eq!(state.messages().len(), 1 + 2 * turns);
    for (idx, message) in state.messages().iter().enumerate().skip(1) {
        if idx % 2 == 1 {
            assert_eq!(message.author, Author::User);
            assert_eq!(message.text, format!("question {}", idx / 2));
        } else {
            assert_eq!(message.author, Author::Assistant);
            assert_eq!(message.text, format!("answer {}", idx / 2 - 1));
        }
    }
}

#[test]
fn it_sets_fields() {
    let mut state = ConversationState::new(false);
    state.set_backend_version(BackendVersion::new(vec![VersionPart::Number(7)]));
    state.set_external_llm_preference(true);
    state.set_lifecycle(RequestLifecycle::Waiting);

    assert_eq!(state.backend_version().unwrap().to_string(), "7");
    assert!(state.use_external_llm());
    assert_eq!(state.lifecycle(), RequestLifecycle::Waiting);

    assert!(!state.toggle_external_llm());
    assert!(!state.use_external_llm());
}

#[test]
fn it_sends_earlier_turns_back_verbatim() {
    let mut state = ConversationState::new(false);
    let first = state.prepare_turn("size\tcolor", 4).unwrap();
    assert_eq!(first.text, "size\tcolor");
    state.finish_turn(Ok(AssistantReply {
        text: "M\tred".to_string(),
        origin: None,
    }));

    let second = state.prepare_turn("again", 4).unwrap();
    assert_eq!(
        second.context[1..].to_vec(),
        vec![wire("You", "size\tcolor"), wire("Timothy", "M\tred")]
    );
}
