//! Wire protocol DTOs exchanged between clients and the server.
//!
//! Every frame is a single JSON object with a `type` field. Inbound
//! frames (client → server) are modeled as one tagged enum so the
//! server can dispatch exhaustively; outbound frames (server →
//! client) are individual structs carrying an explicit
//! [`MessageType`] discriminant.
//!
//! Field names follow the original browser-facing payloads
//! (`endsAt`, `optionIndex`, `durationSec`, `ts`, ...), so a client
//! written against the reference UI keeps working unchanged.

use serde::{Deserialize, Serialize};

/// Participant role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleDto {
    Teacher,
    Student,
}

/// Why a poll terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReasonDto {
    Timeout,
    AllAnswered,
}

/// Inbound events accepted by the session coordinator.
///
/// Missing payload fields deserialize as `None` so that malformed
/// requests surface as validation acks instead of parse errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    Register {
        role: Option<RoleDto>,
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    CreatePoll {
        question: Option<String>,
        options: Option<Vec<String>>,
        duration_sec: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    SubmitAnswer { option_index: i64 },
    ChatMessage { text: Option<String> },
    RequestChatHistory,
    ListStudents,
    #[serde(rename_all = "camelCase")]
    RemoveStudent { student_id: String },
}

impl ClientEvent {
    /// Wire name of the event, used in acknowledgment envelopes.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Register { .. } => "register",
            ClientEvent::CreatePoll { .. } => "createPoll",
            ClientEvent::SubmitAnswer { .. } => "submitAnswer",
            ClientEvent::ChatMessage { .. } => "chatMessage",
            ClientEvent::RequestChatHistory => "requestChatHistory",
            ClientEvent::ListStudents => "listStudents",
            ClientEvent::RemoveStudent { .. } => "removeStudent",
        }
    }
}

/// Outbound message type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Ack,
    TeacherRegistered,
    StudentRegistered,
    PollStarted,
    VoteUpdate,
    PollEnded,
    PastPolls,
    ChatHistory,
    ChatNew,
    Students,
}

/// One answer option with its running tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDto {
    pub text: String,
    pub count: u64,
}

/// Acknowledgment envelope for a fallible inbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckMessage {
    pub r#type: MessageType,
    /// Wire name of the acknowledged event (e.g. "createPoll").
    pub event: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Sent to a teacher connection after a successful `register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherRegisteredMessage {
    pub r#type: MessageType,
    pub ok: bool,
}

/// Sent to a student connection after a successful `register`,
/// carrying the display name actually assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRegisteredMessage {
    pub r#type: MessageType,
    pub ok: bool,
    pub name: String,
}

/// Broadcast when a poll starts, and replayed to late joiners while
/// the poll is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStartedMessage {
    pub r#type: MessageType,
    pub question: String,
    pub options: Vec<OptionDto>,
    pub ends_at: i64,
    pub active: bool,
}

/// Broadcast after every accepted vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteUpdateMessage {
    pub r#type: MessageType,
    pub options: Vec<OptionDto>,
    pub total: u64,
    pub ends_at: i64,
    pub active: bool,
}

/// Immutable copy of a completed poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshotDto {
    pub id: String,
    pub question: String,
    pub options: Vec<OptionDto>,
    pub started_at: i64,
    pub ends_at: i64,
    pub total_responses: u64,
    pub ended_at: i64,
    pub reason: EndReasonDto,
}

/// Broadcast on any poll termination (timeout or full participation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollEndedMessage {
    pub r#type: MessageType,
    #[serde(flatten)]
    pub snapshot: PollSnapshotDto,
    pub active: bool,
}

/// Recent completed polls, newest first. Pushed on registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastPollsMessage {
    pub r#type: MessageType,
    pub polls: Vec<PollSnapshotDto>,
}

/// One chat transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: String,
    pub name: String,
    pub role: RoleDto,
    pub text: String,
    pub ts: i64,
}

/// Broadcast for every accepted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatNewMessage {
    pub r#type: MessageType,
    #[serde(flatten)]
    pub message: ChatMessageDto,
}

/// Full chat transcript, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryMessage {
    pub r#type: MessageType,
    pub messages: Vec<ChatMessageDto>,
}

/// One entry of the student roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDto {
    pub id: String,
    pub name: String,
}

/// Current student roster, pushed after every registry change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentsMessage {
    pub r#type: MessageType,
    pub students: Vec<StudentDto>,
}
