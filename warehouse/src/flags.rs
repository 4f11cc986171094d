use parking_lot::Mutex;

use crate::selection::SelectionRequest;

/// One latched trigger signal: clear, or raised with a captured sub-demand.
///
/// Writers may only set the flag while it is clear; the dispatcher reads and
/// clears atomically. Latch-on-first-writer keeps at most one batch of each
/// kind in flight.
#[derive(Debug, Default)]
pub struct Flag {
    slot: Mutex<Option<SelectionRequest>>,
}

impl Flag {
    /// Raises the flag with `demand` if it is currently clear. Returns
    /// whether the latch won.
    pub fn try_latch(&self, demand: SelectionRequest) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(demand);
        true
    }

    /// Atomically takes the captured demand, clearing the flag.
    pub fn take(&self) -> Option<SelectionRequest> {
        self.slot.lock().take()
    }

    pub fn is_raised(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Which watcher raised a flag. Order of the variants is the dispatch
/// priority: deadline wins over full-stack wins over singleton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagKind {
    Deadline,
    FullStack,
    Singleton,
}

/// The three trigger slots, polled by the dispatcher in priority order.
#[derive(Debug, Default)]
pub struct FlagSet {
    pub deadline: Flag,
    pub full_stack: Flag,
    pub singleton: Flag,
}

impl FlagSet {
    /// Takes the highest-priority raised flag, if any.
    pub fn take_highest(&self) -> Option<(FlagKind, SelectionRequest)> {
        if let Some(demand) = self.deadline.take() {
            return Some((FlagKind::Deadline, demand));
        }
        if let Some(demand) = self.full_stack.take() {
            return Some((FlagKind::FullStack, demand));
        }
        if let Some(demand) = self.singleton.take() {
            return Some((FlagKind::Singleton, demand));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_only_when_clear() {
        let flag = Flag::default();
        assert!(flag.try_latch(SelectionRequest::single(1, 1)));
        assert!(!flag.try_latch(SelectionRequest::single(2, 2)));

        let captured = flag.take().unwrap();
        assert_eq!(captured.get(1), 1, "first writer's demand survives");
        assert!(flag.take().is_none());
    }

    #[test]
    fn relatch_after_take() {
        let flag = Flag::default();
        assert!(flag.try_latch(SelectionRequest::single(1, 1)));
        flag.take();
        assert!(flag.try_latch(SelectionRequest::single(1, 2)));
    }

    #[test]
    fn priority_deadline_over_stack_over_singleton() {
        let flags = FlagSet::default();
        flags.singleton.try_latch(SelectionRequest::single(3, 1));
        flags.full_stack.try_latch(SelectionRequest::single(2, 1));
        flags.deadline.try_latch(SelectionRequest::single(1, 1));

        let (kind, _) = flags.take_highest().unwrap();
        assert_eq!(kind, FlagKind::Deadline);
        let (kind, _) = flags.take_highest().unwrap();
        assert_eq!(kind, FlagKind::FullStack);
        let (kind, _) = flags.take_highest().unwrap();
        assert_eq!(kind, FlagKind::Singleton);
        assert!(flags.take_highest().is_none());
    }
}
