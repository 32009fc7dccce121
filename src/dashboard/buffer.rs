use std::collections::VecDeque;

use crate::models::Message;

/// Ordered message list capped at a fixed size; the oldest entry goes first.
#[derive(Debug, Clone)]
pub struct MessageBuffer {
    items: VecDeque<Message>,
    max: usize,
}

impl MessageBuffer {
    /// A zero `max` is raised to one.
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            items: VecDeque::with_capacity(max),
            max,
        }
    }

    /// Append `message`, returning the entry evicted to make room, if any
    pub fn push(&mut self, message: Message) -> Option<Message> {
        self.items.push_back(message);
        if self.items.len() > self.max {
            self.items.pop_front()
        } else {
            None
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Message> {
        self.items.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::kind;

    fn msg(id: i64) -> Message {
        Message::new(id, kind::DATA, format!("m{}", id))
    }

    #[test]
    fn test_buffer_never_exceeds_max() {
        let mut buffer = MessageBuffer::new(3);
        for id in 1..=10 {
            buffer.push(msg(id));
            assert!(buffer.len() <= 3);
        }
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_buffer_evicts_oldest_first() {
        let mut buffer = MessageBuffer::new(2);
        assert!(buffer.push(msg(1)).is_none());
        assert!(buffer.push(msg(2)).is_none());

        let evicted = buffer.push(msg(3)).unwrap();
        assert_eq!(evicted.id, 1);

        let ids: Vec<i64> = buffer.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(buffer.latest().unwrap().id, 3);
    }

    #[test]
    fn test_buffer_zero_max_holds_one() {
        let mut buffer = MessageBuffer::new(0);
        buffer.push(msg(1));
        buffer.push(msg(2));
        assert_eq!(buffer.max(), 1);
        assert_eq!(buffer.latest().unwrap().id, 2);
    }
}
