//! Notification sinks for ledger outcomes.

use std::cell::RefCell;

use crate::ledger::Outcome;

/// Surfaces transient feedback for outcomes. Implementations must not feed
/// anything back into the ledger.
pub trait Notifier {
    fn notify(&self, outcome: &Outcome);

    fn notify_all(&self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            self.notify(outcome);
        }
    }
}

/// Logs each outcome through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, outcome: &Outcome) {
        match outcome {
            Outcome::LevelUp { new_level } => {
                tracing::info!(new_level, "{}", outcome.message())
            }
            _ => tracing::info!("{}", outcome.message()),
        }
    }
}

/// Collects toast messages until the front end drains them.
#[derive(Debug, Default)]
pub struct ToastQueue {
    messages: RefCell<Vec<String>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent message, if any.
    pub fn latest(&self) -> Option<String> {
        self.messages.borrow().last().cloned()
    }

    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, outcome: &Outcome) {
        self.messages.borrow_mut().push(outcome.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_queue_collects_in_order() {
        let queue = ToastQueue::new();
        queue.notify_all(&[
            Outcome::XpGained {
                amount: 10,
                reason: "Stretch".into(),
            },
            Outcome::CreditDeposited { minutes: 10 },
        ]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.latest().as_deref(), Some("Deposited 10m Leisure Credit"));
        assert_eq!(
            queue.drain(),
            vec!["+10 XP: Stretch".to_string(), "Deposited 10m Leisure Credit".to_string()]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn notifiers_work_as_trait_objects() {
        let queue = ToastQueue::new();
        let sinks: [&dyn Notifier; 2] = [&TracingNotifier, &queue];
        let outcomes = [Outcome::LevelUp { new_level: 6 }];
        for sink in sinks {
            sink.notify_all(&outcomes);
        }
        assert_eq!(
            queue.drain(),
            vec!["Level up! You reached level 6".to_string()]
        );
    }
}
