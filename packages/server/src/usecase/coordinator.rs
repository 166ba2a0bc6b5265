//! Session coordinator: the facade binding registry, poll engine,
//! chat log and history together.
//!
//! Every inbound client event enters through [`SessionCoordinator::dispatch`].
//! A handler resolves the caller's identity, validates role and poll
//! state, mutates the session under one mutex, and emits the acks and
//! broadcasts for that event. Failures become a failure ack to the
//! caller only; a validation failure never broadcasts.
//!
//! The poll-expiry timer is an owned task handle stored next to the
//! session state: any `end` path and any superseding `start` cancels
//! it, and when it fires it re-enters through the same mutex and the
//! same idempotent end path as a participation-driven termination.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use pollroom_shared::protocol::{
    AckMessage, ChatHistoryMessage, ChatMessageDto, ChatNewMessage, ClientEvent, MessageType,
    PastPollsMessage, PollEndedMessage, PollSnapshotDto, PollStartedMessage, RoleDto,
    StudentRegisteredMessage, TeacherRegisteredMessage, VoteUpdateMessage,
};
use pollroom_shared::time::Clock;

use crate::domain::{
    ChatEntry, ChatLog, ConnectionId, EndReason, MessagePusher, ParticipantRegistry, PollEngine,
    PollHistory, PusherChannel, Role,
};
use crate::infrastructure::dto::conversion::students_message;

use super::error::{AuthorizationError, SessionError, StateConflictError, ValidationError};

/// How many history entries are replayed to a newly registered client.
const PAST_POLLS_ON_REGISTER: usize = 20;

/// All mutable session state, guarded by one mutex so `start`,
/// `record_vote` and `end` are mutually exclusive with each other and
/// with the expiry timer.
#[derive(Default, Serialize)]
pub struct SessionState {
    registry: ParticipantRegistry,
    engine: PollEngine,
    chat: ChatLog,
    history: PollHistory,
    /// Cancellable handle of the pending poll-expiry timer.
    #[serde(skip)]
    timer: Option<JoinHandle<()>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Facade receiving inbound client events and deciding the outbound
/// deliveries. Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionCoordinator {
    state: Arc<Mutex<SessionState>>,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    /// Create a coordinator over a fresh, empty session.
    pub fn new(pusher: Arc<dyn MessagePusher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            pusher,
            clock,
        }
    }

    /// Register the outbound channel of a newly accepted connection.
    pub async fn connection_opened(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.pusher.register_client(connection_id, sender).await;
    }

    /// Best-effort cleanup when a connection goes away: registry and
    /// participation-tracking removal, roster update. Votes already
    /// recorded for the connection are not rolled back, and no poll
    /// completion re-check happens here.
    pub async fn connection_closed(&self, connection_id: ConnectionId) {
        self.pusher.unregister_client(&connection_id).await;

        let mut state = self.state.lock().await;
        let removed = state.registry.unregister(&connection_id);
        state.engine.forget_participant(&connection_id);
        let roster = matches!(&removed, Some(p) if p.role == Role::Student)
            .then(|| students_message(&state.registry.students()));
        drop(state);

        if let Some(roster) = roster {
            self.broadcast_msg(&roster).await;
        }
        tracing::info!("Connection '{}' closed and cleaned up", connection_id);
    }

    /// Route one inbound event to its handler and turn any failure
    /// into an ack to the caller.
    pub async fn dispatch(&self, connection_id: ConnectionId, event: ClientEvent) {
        let event_name = event.name();
        let result = match event {
            ClientEvent::Register { role, name } => {
                self.register(connection_id, role, name).await
            }
            ClientEvent::CreatePoll {
                question,
                options,
                duration_sec,
            } => {
                self.create_poll(connection_id, question, options, duration_sec)
                    .await
            }
            ClientEvent::SubmitAnswer { option_index } => {
                self.submit_answer(connection_id, option_index).await
            }
            ClientEvent::ChatMessage { text } => self.chat_message(connection_id, text).await,
            ClientEvent::RequestChatHistory => self.send_chat_history(connection_id).await,
            ClientEvent::ListStudents => self.list_students(connection_id).await,
            ClientEvent::RemoveStudent { student_id } => {
                self.remove_student(connection_id, student_id).await
            }
        };

        if let Err(err) = result {
            tracing::debug!(
                "Event '{}' from '{}' rejected: {}",
                event_name,
                connection_id,
                err
            );
            self.ack_err(connection_id, event_name, &err).await;
        }
    }

    /// Serialized view of the session, for the debug endpoint.
    pub async fn debug_snapshot(&self) -> serde_json::Value {
        let state = self.state.lock().await;
        serde_json::to_value(&*state)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
    }

    // ----- handlers -------------------------------------------------

    async fn register(
        &self,
        connection_id: ConnectionId,
        role: Option<RoleDto>,
        name: Option<String>,
    ) -> Result<(), SessionError> {
        let role = role.map(Role::from).unwrap_or(Role::Student);

        let mut state = self.state.lock().await;
        let was_registered = state.registry.get(&connection_id).is_some();
        let participant = state.registry.register(connection_id, role, name.as_deref());
        let assigned_role = participant.role;
        let display_name = participant.display_name.clone();

        // Replay of the current poll state for late joiners.
        let poll_replay = if state.engine.is_active() {
            state
                .engine
                .current()
                .and_then(|p| encode(&PollStartedMessage::from(p)))
        } else {
            state
                .history
                .latest()
                .and_then(|s| encode(&PollEndedMessage::from(s)))
        };
        let past_polls = PastPollsMessage {
            r#type: MessageType::PastPolls,
            polls: state
                .history
                .recent(PAST_POLLS_ON_REGISTER)
                .map(PollSnapshotDto::from)
                .collect(),
        };
        let chat_history = ChatHistoryMessage {
            r#type: MessageType::ChatHistory,
            messages: state.chat.iter().map(ChatMessageDto::from).collect(),
        };
        let roster = (!was_registered && assigned_role == Role::Student)
            .then(|| students_message(&state.registry.students()));
        drop(state);

        match assigned_role {
            Role::Teacher => {
                self.send_msg(
                    &connection_id,
                    &TeacherRegisteredMessage {
                        r#type: MessageType::TeacherRegistered,
                        ok: true,
                    },
                )
                .await;
            }
            Role::Student => {
                self.send_msg(
                    &connection_id,
                    &StudentRegisteredMessage {
                        r#type: MessageType::StudentRegistered,
                        ok: true,
                        name: display_name.clone(),
                    },
                )
                .await;
            }
        }
        if let Some(json) = poll_replay {
            self.send_raw(&connection_id, json).await;
        }
        self.send_msg(&connection_id, &past_polls).await;
        self.send_msg(&connection_id, &chat_history).await;
        if let Some(roster) = roster {
            self.broadcast_msg(&roster).await;
        }

        tracing::info!(
            "Connection '{}' registered as {:?} '{}'",
            connection_id,
            assigned_role,
            display_name
        );
        Ok(())
    }

    async fn create_poll(
        &self,
        connection_id: ConnectionId,
        question: Option<String>,
        options: Option<Vec<String>>,
        duration_sec: Option<i64>,
    ) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if !state.registry.is_teacher(&connection_id) {
            return Err(AuthorizationError::CreatePollRequiresTeacher.into());
        }
        let student_count = state.registry.student_count();
        if !state.engine.can_start(student_count) {
            return Err(StateConflictError::PollInProgress.into());
        }

        let now = self.clock.now_millis();
        let question = question.unwrap_or_default();
        let raw_options = options.unwrap_or_default();
        let (started, poll_id, ends_at) = {
            let poll = state.engine.start(&question, &raw_options, duration_sec, now)?;
            (
                PollStartedMessage::from(&*poll),
                poll.id.clone(),
                poll.ends_at,
            )
        };

        // A previously scheduled timer must never outlive its poll.
        if let Some(handle) = state.timer.take() {
            handle.abort();
        }
        state.timer = Some(self.spawn_expiry_timer(poll_id.clone(), ends_at));
        drop(state);

        tracing::info!(
            "Poll '{}' started ({} options, ends at {})",
            poll_id,
            started.options.len(),
            ends_at
        );
        self.broadcast_msg(&started).await;
        self.ack_ok(connection_id, "createPoll").await;
        Ok(())
    }

    async fn submit_answer(
        &self,
        connection_id: ConnectionId,
        option_index: i64,
    ) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if !state.registry.is_student(&connection_id) {
            return Err(AuthorizationError::NotRegisteredStudent.into());
        }
        let student_count = state.registry.student_count();
        let outcome = state
            .engine
            .record_vote(connection_id, option_index, student_count)?;

        // Both payloads are built under the lock so clients never see
        // a partially updated tally.
        let update = state.engine.current().map(VoteUpdateMessage::from);
        let ended = if outcome.all_answered {
            self.finish_poll_locked(&mut state, EndReason::AllAnswered, true)
        } else {
            None
        };
        drop(state);

        if let Some(update) = update {
            self.broadcast_msg(&update).await;
        }
        if let Some(ended) = ended {
            self.broadcast_msg(&ended).await;
        }
        self.ack_ok(connection_id, "submitAnswer").await;
        Ok(())
    }

    async fn chat_message(
        &self,
        connection_id: ConnectionId,
        text: Option<String>,
    ) -> Result<(), SessionError> {
        let text = text.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let mut state = self.state.lock().await;
        // An unregistered connection may still chat; it shows up as
        // an anonymous student.
        let (name, role) = state
            .registry
            .get(&connection_id)
            .map(|p| (p.display_name.clone(), p.role))
            .unwrap_or_else(|| ("Anon".to_string(), Role::Student));
        let entry = ChatEntry {
            id: format!("msg_{}", Uuid::new_v4().simple()),
            name,
            role,
            text: text.to_string(),
            ts: self.clock.now_millis(),
        };
        let outbound = ChatNewMessage::from(&entry);
        state.chat.append(entry);
        drop(state);

        self.broadcast_msg(&outbound).await;
        self.ack_ok(connection_id, "chatMessage").await;
        Ok(())
    }

    async fn send_chat_history(&self, connection_id: ConnectionId) -> Result<(), SessionError> {
        let state = self.state.lock().await;
        let history = ChatHistoryMessage {
            r#type: MessageType::ChatHistory,
            messages: state.chat.iter().map(ChatMessageDto::from).collect(),
        };
        drop(state);

        self.send_msg(&connection_id, &history).await;
        Ok(())
    }

    async fn list_students(&self, connection_id: ConnectionId) -> Result<(), SessionError> {
        let state = self.state.lock().await;
        if !state.registry.is_teacher(&connection_id) {
            return Err(AuthorizationError::RosterRequiresTeacher.into());
        }
        let roster = students_message(&state.registry.students());
        drop(state);

        self.send_msg(&connection_id, &roster).await;
        Ok(())
    }

    async fn remove_student(
        &self,
        connection_id: ConnectionId,
        student_id: String,
    ) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;
        if !state.registry.is_teacher(&connection_id) {
            return Err(AuthorizationError::RemoveRequiresTeacher.into());
        }

        // Unknown or already-gone targets are fine; removal is
        // best-effort and idempotent. Only students can be removed.
        let target = ConnectionId::parse(&student_id).filter(|t| state.registry.is_student(t));
        let roster = if let Some(target) = target {
            state.registry.unregister(&target);
            state.engine.forget_participant(&target);
            Some(students_message(&state.registry.students()))
        } else {
            None
        };
        drop(state);

        if let Some(target) = target {
            // Closing the push channel tears down the student's
            // socket task, which completes the disconnect cleanup.
            self.pusher.unregister_client(&target).await;
            tracing::info!("Student '{}' removed by teacher", target);
        }
        if let Some(roster) = roster {
            self.broadcast_msg(&roster).await;
        }
        self.ack_ok(connection_id, "removeStudent").await;
        Ok(())
    }

    // ----- poll termination -----------------------------------------

    /// Single exit point for poll termination. Returns `None` when the
    /// poll already ended, so racing triggers produce one snapshot.
    ///
    /// `abort_timer` は呼び出し元がタイマー自身のときだけ false にする
    /// （自分自身のハンドルを abort しないため）。
    fn finish_poll_locked(
        &self,
        state: &mut SessionState,
        reason: EndReason,
        abort_timer: bool,
    ) -> Option<PollEndedMessage> {
        let snapshot = state.engine.end(reason, self.clock.now_millis())?;
        match state.timer.take() {
            Some(handle) if abort_timer => handle.abort(),
            _ => {}
        }
        tracing::info!(
            "Poll '{}' ended ({:?}) with {} responses",
            snapshot.id,
            reason,
            snapshot.total_responses
        );
        let outbound = PollEndedMessage::from(&snapshot);
        state.history.append(snapshot);
        Some(outbound)
    }

    fn spawn_expiry_timer(&self, poll_id: String, ends_at: i64) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            let delay_ms = (ends_at - coordinator.clock.now_millis()).max(0) as u64;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            coordinator.poll_expired(&poll_id).await;
        })
    }

    async fn poll_expired(&self, poll_id: &str) {
        let mut state = self.state.lock().await;
        let still_current = state
            .engine
            .current()
            .is_some_and(|p| p.active && p.id == poll_id);
        if !still_current {
            // Raced by an all-answered end or a superseding poll.
            tracing::debug!("Expiry timer for poll '{}' is stale, ignoring", poll_id);
            return;
        }
        let ended = self.finish_poll_locked(&mut state, EndReason::Timeout, false);
        drop(state);

        if let Some(ended) = ended {
            self.broadcast_msg(&ended).await;
        }
    }

    // ----- delivery helpers -----------------------------------------

    async fn ack_ok(&self, connection_id: ConnectionId, event: &str) {
        self.send_msg(
            &connection_id,
            &AckMessage {
                r#type: MessageType::Ack,
                event: event.to_string(),
                ok: true,
                error: None,
            },
        )
        .await;
    }

    async fn ack_err(&self, connection_id: ConnectionId, event: &str, err: &SessionError) {
        self.send_msg(
            &connection_id,
            &AckMessage {
                r#type: MessageType::Ack,
                event: event.to_string(),
                ok: false,
                error: Some(err.to_string()),
            },
        )
        .await;
    }

    async fn send_msg<T: Serialize>(&self, connection_id: &ConnectionId, msg: &T) {
        if let Some(json) = encode(msg) {
            self.send_raw(connection_id, json).await;
        }
    }

    async fn send_raw(&self, connection_id: &ConnectionId, json: String) {
        if let Err(e) = self.pusher.push_to(connection_id, &json).await {
            tracing::debug!("Failed to push to client '{}': {}", connection_id, e);
        }
    }

    async fn broadcast_msg<T: Serialize>(&self, msg: &T) {
        if let Some(json) = encode(msg)
            && let Err(e) = self.pusher.broadcast_all(&json).await
        {
            tracing::warn!("Broadcast failed: {}", e);
        }
    }
}

fn encode<T: Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize outbound message: {}", e);
            None
        }
    }
}
