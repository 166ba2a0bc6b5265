//! Conversion logic between domain entities and wire DTOs.

use pollroom_shared::protocol::{
    ChatMessageDto, ChatNewMessage, EndReasonDto, MessageType, OptionDto, PollEndedMessage,
    PollSnapshotDto, PollStartedMessage, RoleDto, StudentDto, StudentsMessage, VoteUpdateMessage,
};

use crate::domain::{ChatEntry, ConnectionId, EndReason, Poll, PollOption, PollSnapshot, Role};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        match role {
            Role::Teacher => RoleDto::Teacher,
            Role::Student => RoleDto::Student,
        }
    }
}

impl From<RoleDto> for Role {
    fn from(dto: RoleDto) -> Self {
        match dto {
            RoleDto::Teacher => Role::Teacher,
            RoleDto::Student => Role::Student,
        }
    }
}

impl From<EndReason> for EndReasonDto {
    fn from(reason: EndReason) -> Self {
        match reason {
            EndReason::Timeout => EndReasonDto::Timeout,
            EndReason::AllAnswered => EndReasonDto::AllAnswered,
        }
    }
}

impl From<&PollOption> for OptionDto {
    fn from(option: &PollOption) -> Self {
        Self {
            text: option.text.clone(),
            count: option.count,
        }
    }
}

impl From<&Poll> for PollStartedMessage {
    fn from(poll: &Poll) -> Self {
        Self {
            r#type: MessageType::PollStarted,
            question: poll.question.clone(),
            options: poll.options.iter().map(OptionDto::from).collect(),
            ends_at: poll.ends_at,
            active: poll.active,
        }
    }
}

impl From<&Poll> for VoteUpdateMessage {
    fn from(poll: &Poll) -> Self {
        Self {
            r#type: MessageType::VoteUpdate,
            options: poll.options.iter().map(OptionDto::from).collect(),
            total: poll.total_responses(),
            ends_at: poll.ends_at,
            active: poll.active,
        }
    }
}

impl From<&PollSnapshot> for PollSnapshotDto {
    fn from(snapshot: &PollSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            question: snapshot.question.clone(),
            options: snapshot.options.iter().map(OptionDto::from).collect(),
            started_at: snapshot.started_at,
            ends_at: snapshot.ends_at,
            total_responses: snapshot.total_responses,
            ended_at: snapshot.ended_at,
            reason: snapshot.reason.into(),
        }
    }
}

impl From<&PollSnapshot> for PollEndedMessage {
    fn from(snapshot: &PollSnapshot) -> Self {
        Self {
            r#type: MessageType::PollEnded,
            snapshot: snapshot.into(),
            active: false,
        }
    }
}

impl From<&ChatEntry> for ChatMessageDto {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            role: entry.role.into(),
            text: entry.text.clone(),
            ts: entry.ts,
        }
    }
}

impl From<&ChatEntry> for ChatNewMessage {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            r#type: MessageType::ChatNew,
            message: entry.into(),
        }
    }
}

/// Build a roster push from registry entries.
pub fn students_message(students: &[(ConnectionId, String)]) -> StudentsMessage {
    StudentsMessage {
        r#type: MessageType::Students,
        students: students
            .iter()
            .map(|(id, name)| StudentDto {
                id: id.to_string(),
                name: name.clone(),
            })
            .collect(),
    }
}
