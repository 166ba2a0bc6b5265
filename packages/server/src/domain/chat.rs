//! Fixed-capacity chat log, independent of poll state.

use std::collections::VecDeque;

use serde::Serialize;

use super::value_object::Role;

/// Number of chat messages retained; oldest evicted first.
pub const CHAT_LOG_CAPACITY: usize = 100;

/// One chat transcript entry. Immutable after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub text: String,
    pub ts: i64,
}

/// Ring buffer of recent chat messages, globally shared across all
/// participants. Read chronologically, as a transcript.
#[derive(Debug, Default, Serialize)]
pub struct ChatLog {
    entries: VecDeque<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ChatEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > CHAT_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// All retained messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(i: usize) -> ChatEntry {
        ChatEntry {
            id: format!("msg_{i}"),
            name: "Alice".to_string(),
            role: Role::Student,
            text: format!("message {i}"),
            ts: 1000 + i as i64,
        }
    }

    #[test]
    fn test_append_keeps_chronological_order() {
        // テスト項目: メッセージが追記順（時系列）で保持される
        // given (前提条件):
        let mut log = ChatLog::new();

        // when (操作):
        for i in 0..3 {
            log.append(entry(i));
        }

        // then (期待する結果):
        let ids: Vec<&str> = log.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["msg_0", "msg_1", "msg_2"]);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        // テスト項目: 容量超過時に最も古いメッセージから削除される（FIFO）
        // given (前提条件):
        let mut log = ChatLog::new();

        // when (操作):
        for i in 0..CHAT_LOG_CAPACITY + 5 {
            log.append(entry(i));
        }

        // then (期待する結果):
        assert_eq!(log.len(), CHAT_LOG_CAPACITY);
        assert_eq!(log.iter().next().unwrap().id, "msg_5");
    }
}
