use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use algorithm::{Route, RouteStep};
use warehouse::flags::FlagKind;

/// One computed pick route awaiting delivery to a client.
#[derive(Clone, Debug)]
pub struct RouteMessage {
    /// Compressed waypoints, wire shape `[x, y, kind]`.
    pub waypoints: Vec<RouteStep>,

    pub created_at: DateTime<Utc>,

    pub trigger: FlagKind,
}

impl RouteMessage {
    pub fn new(trigger: FlagKind, route: &Route) -> Self {
        Self {
            waypoints: route.waypoints.clone(),
            created_at: Utc::now(),
            trigger,
        }
    }
}

/// FIFO of computed routes. Written only by the dispatcher; read and
/// cleared only by the ingress paths answering clients.
#[derive(Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<VecDeque<RouteMessage>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: RouteMessage) {
        self.inner.lock().push_back(message);
    }

    pub fn pop(&self) -> Option<RouteMessage> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algorithm::StepKind;

    fn message(x: i64) -> RouteMessage {
        RouteMessage {
            waypoints: vec![RouteStep {
                x,
                y: 0,
                kind: StepKind::Passage,
            }],
            created_at: Utc::now(),
            trigger: FlagKind::Deadline,
        }
    }

    #[test]
    fn drains_in_fifo_order() {
        let outbox = Outbox::new();
        outbox.push(message(1));
        outbox.push(message(2));

        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.pop().unwrap().waypoints[0].x, 1);
        assert_eq!(outbox.pop().unwrap().waypoints[0].x, 2);
        assert!(outbox.pop().is_none());
    }
}
