//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::schedule::Question;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn local_context() -> SessionContext {
    SessionContext::new(
        LoginPolicy::LocalValidation,
        FeedbackPolicy::default(),
        CodeGrammar::default(),
    )
}

fn reply_texts(effects: &[Effect]) -> Vec<&str> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Reply(reply) => Some(reply.text.as_str()),
            _ => None,
        })
        .collect()
}

fn is_valid_state(state: &SessionState) -> bool {
    match &state.flow {
        // Nobody is logged in while a login is running
        Flow::Login { .. } | Flow::Authenticating { .. } => state.identity.is_none(),
        Flow::Idle | Flow::Feedback { .. } | Flow::SubmittingFeedback => true,
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_code() -> impl Strategy<Value = ParticipantCode> {
    "[A-Za-z][0-9]{3}".prop_map(|raw| ParticipantCode::normalized(&raw))
}

fn arb_identity() -> impl Strategy<Value = Option<Identity>> {
    proptest::option::of((arb_code(), "[a-z0-9]{8}").prop_map(|(code, token)| Identity {
        code,
        credential: Credential::new(token),
    }))
}

fn arb_login_state() -> impl Strategy<Value = SessionState> {
    (0u32..10, 0u32..10).prop_map(|(retries, non_text)| {
        SessionState::new(Flow::Login { retries, non_text }, None)
    })
}

fn arb_feedback_state() -> impl Strategy<Value = SessionState> {
    (0u32..10, arb_identity())
        .prop_map(|(non_text, identity)| SessionState::new(Flow::Feedback { non_text }, identity))
}

fn arb_active_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        arb_login_state(),
        (arb_code(), 0u32..10, 0u32..10).prop_map(|(code, retries, non_text)| {
            SessionState::new(
                Flow::Authenticating {
                    code,
                    retries,
                    non_text,
                },
                None,
            )
        }),
        arb_feedback_state(),
        arb_identity().prop_map(|identity| SessionState::new(Flow::SubmittingFeedback, identity)),
    ]
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        arb_identity().prop_map(|identity| SessionState::new(Flow::Idle, identity)),
        arb_active_state(),
    ]
}

fn arb_exchange_result() -> impl Strategy<Value = CredentialExchangeResult> {
    prop_oneof![
        "[a-z0-9]{8}".prop_map(|token| CredentialExchangeResult::Authenticated {
            credential: Credential::new(token)
        }),
        (0u32..10).prop_map(|attempts_so_far| CredentialExchangeResult::Rejected { attempts_so_far }),
        Just(CredentialExchangeResult::AccountLocked),
        Just(CredentialExchangeResult::ServiceUnavailable),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        Just(Event::BeginFeedback),
        Just(Event::Cancel),
        Just(Event::NonText),
        "[a-zA-Z0-9 ]{0,30}".prop_map(Event::Text),
        proptest::sample::select(Question::ALL.to_vec())
            .prop_map(|q| Event::Text(q.label().to_string())),
        arb_exchange_result().prop_map(Event::CodeExchanged),
        any::<bool>().prop_map(|ok| Event::FeedbackSubmitted { ok }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid state after any sequence of transitions
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..25)) {
        let context = local_context();
        let mut state = SessionState::default();

        for event in events {
            if let Ok(result) = transition(&state, &context, event) {
                state = result.new_state;
                prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
            }
        }
    }

    // Invariant 2: Cancel from any active flow reaches Idle
    #[test]
    fn prop_cancel_reaches_idle(state in arb_active_state()) {
        let result = transition(&state, &local_context(), Event::Cancel);
        prop_assert!(result.is_ok(), "Cancel failed: {:?}", result);
        let result = result.unwrap();

        prop_assert_eq!(&result.new_state.flow, &Flow::Idle);
        let expected = match state.flow.active() {
            ActiveFlow::Login => CANCELLED_LOGIN,
            ActiveFlow::Feedback => CANCELLED_FEEDBACK,
            ActiveFlow::None => unreachable!(),
        };
        prop_assert_eq!(reply_texts(&result.effects), vec![expected]);
    }

    // Invariant 3: Under local validation the reminder accompanies a
    // rejected code exactly when three or more attempts have failed
    #[test]
    fn prop_reminder_iff_three_retries(retries in 0u32..10, raw in "[G-Zg-z][0-9]{3}") {
        let state = SessionState::new(Flow::Login { retries, non_text: 0 }, None);
        let result = transition(&state, &local_context(), Event::Text(raw)).unwrap();

        let texts = reply_texts(&result.effects);
        prop_assert_eq!(texts.contains(&CANCEL_REMINDER), retries + 1 >= 3);
        prop_assert_eq!(texts.last().copied(), Some(INVALID_CODE));
    }

    // Invariant 4: Feedback length classification
    #[test]
    fn prop_feedback_length_classification(len in 0usize..700) {
        let state = SessionState::new(Flow::feedback(), None);
        let text = "a".repeat(len);
        let result = transition(&state, &local_context(), Event::Text(text)).unwrap();

        let accepted = result.new_state.flow == Flow::SubmittingFeedback;
        prop_assert_eq!(accepted, len > 5 && len <= 500, "len {}", len);
        if !accepted {
            prop_assert_eq!(&result.new_state, &state);
        }
    }

    // Invariant 5: Non-text input never ends a flow
    #[test]
    fn prop_non_text_never_terminal(
        state in prop_oneof![arb_login_state(), arb_feedback_state()]
    ) {
        let result = transition(&state, &local_context(), Event::NonText).unwrap();
        prop_assert_eq!(result.new_state.flow.active(), state.flow.active());
        prop_assert!(!result.effects.is_empty());
    }

    // Invariant 6: Entering a flow resets its counters
    #[test]
    fn prop_entering_flow_resets_counters(state in arb_state()) {
        let context = local_context();

        let login = transition(&state, &context, Event::Start).unwrap();
        prop_assert_eq!(login.new_state, SessionState::new(Flow::login(), None));

        let feedback = transition(&state, &context, Event::BeginFeedback).unwrap();
        prop_assert_eq!(&feedback.new_state.flow, &Flow::feedback());
        prop_assert_eq!(&feedback.new_state.identity, &state.identity);
    }

    // Invariant 7: Input is refused while a collaborator call is in flight
    #[test]
    fn prop_in_flight_rejects_input(
        state in arb_active_state().prop_filter("in flight", |s| s.flow.is_in_flight()),
        text in "[a-zA-Z ]{0,20}"
    ) {
        let context = local_context();
        prop_assert_eq!(
            transition(&state, &context, Event::Text(text)).unwrap_err(),
            TransitionError::Busy
        );
        prop_assert_eq!(
            transition(&state, &context, Event::NonText).unwrap_err(),
            TransitionError::Busy
        );
    }

    // Invariant 8: Questions are only answered for logged-in users
    #[test]
    fn prop_answers_require_identity(identity in arb_identity(), question in proptest::sample::select(Question::ALL.to_vec())) {
        let state = SessionState::new(Flow::Idle, identity.clone());
        let result = transition(&state, &local_context(), Event::Text(question.label().to_string())).unwrap();

        let answered = result.effects.iter().any(|e| matches!(e, Effect::Answer { .. }));
        prop_assert_eq!(answered, identity.is_some());
        prop_assert_eq!(result.new_state, state);
    }
}
