//! Poll lifecycle engine: the state machine owning the current poll,
//! its vote tally, and the rule for when a new poll may begin.
//!
//! The engine is pure and synchronous. The caller supplies the
//! current time and owns the expiry timer; both termination triggers
//! (timeout and full participation) converge on the idempotent
//! [`PollEngine::end`], so at most one snapshot exists per poll.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use super::value_object::ConnectionId;

/// Maximum number of answer options per poll.
pub const MAX_OPTIONS: usize = 8;
/// Poll duration bounds in seconds.
pub const MIN_DURATION_SEC: i64 = 5;
pub const MAX_DURATION_SEC: i64 = 600;
/// Duration used when the teacher does not specify one.
pub const DEFAULT_DURATION_SEC: i64 = 60;

/// One answer option with its running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOption {
    pub text: String,
    pub count: u64,
}

/// The current poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub started_at: i64,
    pub ends_at: i64,
    pub active: bool,
}

impl Poll {
    pub fn total_responses(&self) -> u64 {
        self.options.iter().map(|o| o.count).sum()
    }
}

/// Why a poll terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Timeout,
    AllAnswered,
}

/// Immutable copy of a poll at the moment it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollSnapshot {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub started_at: i64,
    pub ends_at: i64,
    pub total_responses: u64,
    pub ended_at: i64,
    pub reason: EndReason,
}

/// Malformed input to [`PollEngine::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartPollError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("at least one non-empty option is required")]
    NoOptions,
}

/// Rejected vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("no active poll")]
    NotActive,
    #[error("connection has already voted in this poll")]
    AlreadyVoted,
    #[error("option index out of range")]
    InvalidOption,
}

/// Result of an accepted vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    /// True when this vote completed participation for every
    /// connected student, which triggers automatic termination.
    pub all_answered: bool,
}

/// State machine owning the current poll and its vote state.
#[derive(Debug, Default, Serialize)]
pub struct PollEngine {
    current: Option<Poll>,
    /// connection id → chosen option index; one vote per poll.
    votes: HashMap<ConnectionId, usize>,
    /// Students counted towards the "all answered" rule. Unlike
    /// `votes`, entries are dropped when a student disconnects.
    answered: HashSet<ConnectionId>,
}

impl PollEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Poll> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(|p| p.active)
    }

    pub fn answered_count(&self) -> usize {
        self.answered.len()
    }

    /// Gate preventing a teacher from interrupting an in-progress
    /// poll that still has unanswered students.
    ///
    /// With zero connected students an active poll can never satisfy
    /// the participation branch; timeout remains its only terminator.
    pub fn can_start(&self, student_count: usize) -> bool {
        match &self.current {
            None => true,
            Some(poll) if !poll.active => true,
            Some(_) => student_count > 0 && self.answered.len() >= student_count,
        }
    }

    /// Start a new poll, clearing all vote state.
    ///
    /// Options are trimmed, empty entries dropped, and the remainder
    /// truncated to [`MAX_OPTIONS`]. The duration is clamped to
    /// [[`MIN_DURATION_SEC`], [`MAX_DURATION_SEC`]] and defaults to
    /// [`DEFAULT_DURATION_SEC`].
    pub fn start(
        &mut self,
        question: &str,
        raw_options: &[String],
        duration_sec: Option<i64>,
        now_ms: i64,
    ) -> Result<&Poll, StartPollError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(StartPollError::EmptyQuestion);
        }

        let options: Vec<PollOption> = raw_options
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .take(MAX_OPTIONS)
            .map(|text| PollOption {
                text: text.to_string(),
                count: 0,
            })
            .collect();
        if options.is_empty() {
            return Err(StartPollError::NoOptions);
        }

        self.votes.clear();
        self.answered.clear();

        let duration = duration_sec
            .unwrap_or(DEFAULT_DURATION_SEC)
            .clamp(MIN_DURATION_SEC, MAX_DURATION_SEC);
        let poll = Poll {
            id: format!("poll_{now_ms}"),
            question: question.to_string(),
            options,
            started_at: now_ms,
            ends_at: now_ms + duration * 1000,
            active: true,
        };
        Ok(self.current.insert(poll))
    }

    /// Record one vote for the current poll.
    ///
    /// A connection that already voted is rejected regardless of the
    /// chosen option, before the index is even looked at.
    pub fn record_vote(
        &mut self,
        voter: ConnectionId,
        option_index: i64,
        student_count: usize,
    ) -> Result<VoteOutcome, VoteError> {
        let poll = self
            .current
            .as_mut()
            .filter(|p| p.active)
            .ok_or(VoteError::NotActive)?;

        if self.votes.contains_key(&voter) {
            return Err(VoteError::AlreadyVoted);
        }
        let index = usize::try_from(option_index)
            .ok()
            .filter(|i| *i < poll.options.len())
            .ok_or(VoteError::InvalidOption)?;

        self.votes.insert(voter, index);
        self.answered.insert(voter);
        poll.options[index].count += 1;

        Ok(VoteOutcome {
            all_answered: student_count > 0 && self.answered.len() >= student_count,
        })
    }

    /// Terminate the current poll. Idempotent: returns `None` when no
    /// poll is active, so racing triggers produce exactly one
    /// snapshot.
    pub fn end(&mut self, reason: EndReason, now_ms: i64) -> Option<PollSnapshot> {
        let poll = self.current.as_mut().filter(|p| p.active)?;
        poll.active = false;

        Some(PollSnapshot {
            id: poll.id.clone(),
            question: poll.question.clone(),
            options: poll.options.clone(),
            started_at: poll.started_at,
            ends_at: poll.ends_at,
            total_responses: poll.options.iter().map(|o| o.count).sum(),
            ended_at: now_ms,
            reason,
        })
    }

    /// Drop a disconnected or removed student from participation
    /// tracking. Already-recorded votes are never rolled back.
    pub fn forget_participant(&mut self, connection_id: &ConnectionId) {
        self.answered.remove(connection_id);
    }
}
