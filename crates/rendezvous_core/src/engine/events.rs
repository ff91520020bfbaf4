//! Scheduler event stream
//!
//! Hosts drain these once per frame to drive visuals or diagnostics.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Events kept before the oldest are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SchedulerEvent {
    Started,
    Stopped,
    Reset,
    FreezeStarted {
        at_ms: u64,
    },
    FreezeEnded {
        at_ms: u64,
        elapsed_ms: u64,
    },
    DirectionChanged {
        at_ms: u64,
        primary_azimuth: f64,
        secondary_azimuth: f64,
        /// Whether the change followed a pause
        frozen_before: bool,
    },
    QuantizationChanged {
        quantization: u32,
    },
    Halted {
        reason: String,
    },
}

/// Bounded FIFO of scheduler events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<SchedulerEvent>,
    dropped: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SchedulerEvent) {
        if self.events.len() >= EVENT_QUEUE_CAPACITY {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SchedulerEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events lost to overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let mut queue = EventQueue::new();
        for q in 0..(EVENT_QUEUE_CAPACITY as u32 + 3) {
            queue.push(SchedulerEvent::QuantizationChanged { quantization: q });
        }
        assert_eq!(queue.len(), EVENT_QUEUE_CAPACITY);
        assert_eq!(queue.dropped(), 3);

        let drained = queue.drain();
        assert_eq!(drained[0], SchedulerEvent::QuantizationChanged { quantization: 3 });
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&SchedulerEvent::FreezeStarted { at_ms: 16 }).unwrap();
        assert_eq!(json, r#"{"type":"FreezeStarted","at_ms":16}"#);
    }
}
