//! Chat history.

use std::collections::VecDeque;

use arena_shared::ecs::PlayerId;

/// One relayed chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub from: PlayerId,
    pub text: String,
}

/// Fixed-capacity chat history; the oldest line falls off when full.
#[derive(Debug)]
pub struct ChatLog {
    lines: VecDeque<ChatLine>,
    max: usize,
}

impl ChatLog {
    pub fn new(max: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max),
            max,
        }
    }

    pub fn push(&mut self, from: PlayerId, text: String) {
        self.lines.push_back(ChatLine { from, text });
        while self.lines.len() > self.max {
            self.lines.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatLine> {
        self.lines.iter()
    }

    pub fn last(&self) -> Option<&ChatLine> {
        self.lines.back()
    }
}
