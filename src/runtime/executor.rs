//! Session runtime executor
//!
//! Drives the pure state machine for one input: transition, execute the
//! returned effects, feed any resulting events back in, and collect replies.

use super::traits::{Authenticator, Backend, FeedbackSink, UserIdentity};
use crate::schedule::ScheduleResponder;
use crate::state_machine::{
    transition, CredentialExchangeResult, Effect, Event, Reply, SessionContext, SessionState,
    TransitionError,
};
use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;

/// Executes session transitions against a backend
pub struct SessionRuntime<B: Backend> {
    context: Arc<SessionContext>,
    backend: B,
    responder: Arc<ScheduleResponder>,
}

impl<B: Backend> SessionRuntime<B> {
    pub fn new(context: Arc<SessionContext>, backend: B, responder: Arc<ScheduleResponder>) -> Self {
        Self {
            context,
            backend,
            responder,
        }
    }

    pub fn responder(&self) -> &ScheduleResponder {
        &self.responder
    }

    /// Run one user event to completion.
    ///
    /// Transitions apply to a working copy that is written back to `state`
    /// once the chain finishes, so a caller that drops this future while a
    /// collaborator call is pending leaves `state` as it was. When a chained
    /// event fails to transition, the replies produced so far are dropped
    /// along with the error; the state keeps whatever the last successful
    /// transition left.
    pub async fn process(
        &self,
        state: &mut SessionState,
        user: &UserIdentity,
        event: Event,
        now: DateTime<Tz>,
    ) -> Result<Vec<Reply>, TransitionError> {
        let mut working = state.clone();
        let result = self.run_chain(&mut working, user, event, now).await;
        *state = working;
        result
    }

    async fn run_chain(
        &self,
        state: &mut SessionState,
        user: &UserIdentity,
        event: Event,
        now: DateTime<Tz>,
    ) -> Result<Vec<Reply>, TransitionError> {
        let mut replies = Vec::new();

        // Process events in a loop to handle chained effects - no recursion
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = transition(state, &self.context, current_event)?;

            if result.new_state.flow != state.flow {
                tracing::debug!(
                    user_id = user.id,
                    from = ?state.flow.active(),
                    to = ?result.new_state.flow.active(),
                    "Session flow changed"
                );
            }
            *state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) =
                    self.execute_effect(effect, user, now, &mut replies).await
                {
                    events_to_process.push(generated_event);
                }
            }
        }

        Ok(replies)
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(
        &self,
        effect: Effect,
        user: &UserIdentity,
        now: DateTime<Tz>,
        replies: &mut Vec<Reply>,
    ) -> Option<Event> {
        match effect {
            Effect::Reply(reply) => {
                replies.push(reply);
                None
            }

            Effect::ExchangeCode { code } => {
                tracing::info!(user_id = user.id, code = %code, "Login attempt");
                let result = self.backend.exchange(&code, user).await;
                match &result {
                    CredentialExchangeResult::Authenticated { .. } => {
                        tracing::info!(user_id = user.id, code = %code, "Successfully logged in");
                    }
                    other => {
                        tracing::info!(user_id = user.id, code = %code, outcome = ?other, "Login failed");
                    }
                }
                Some(Event::CodeExchanged(result))
            }

            Effect::SubmitFeedback { code, text } => {
                let outcome = self.backend.submit(code.as_ref(), user, &text).await;
                match &outcome {
                    Ok(()) => tracing::info!(user_id = user.id, "Feedback submitted"),
                    Err(e) => tracing::warn!(user_id = user.id, error = %e, "Failed to submit feedback"),
                }
                Some(Event::FeedbackSubmitted { ok: outcome.is_ok() })
            }

            Effect::Answer { question, identity } => {
                tracing::info!(
                    user_id = user.id,
                    code = %identity.code,
                    question = question.label(),
                    "Question asked"
                );
                let text = self
                    .responder
                    .answer(&self.backend, question, &identity, now)
                    .await;
                replies.push(if question.is_markdown() {
                    Reply::markdown(text)
                } else {
                    Reply::text(text)
                });
                None
            }
        }
    }
}
