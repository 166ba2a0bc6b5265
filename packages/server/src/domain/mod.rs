//! Domain layer: entities, value objects and the interfaces the
//! other layers implement or consume.

pub mod chat;
pub mod history;
pub mod participant;
pub mod poll;
pub mod pusher;
pub mod value_object;

pub use chat::{CHAT_LOG_CAPACITY, ChatEntry, ChatLog};
pub use history::{HISTORY_CAPACITY, PollHistory};
pub use participant::{Participant, ParticipantRegistry, TEACHER_DISPLAY_NAME};
pub use poll::{
    DEFAULT_DURATION_SEC, EndReason, MAX_DURATION_SEC, MAX_OPTIONS, MIN_DURATION_SEC, Poll,
    PollEngine, PollOption, PollSnapshot, StartPollError, VoteError, VoteOutcome,
};
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use value_object::{ConnectionId, Role};

#[cfg(test)]
pub use pusher::MockMessagePusher;
