use alloc::collections::{BTreeMap, BTreeSet, BinaryHeap};
use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::*;

/// Heap entry, ordered by class first and discovery order second.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    class: PriorityClass,
    discovery: u64,
    generation: u32,
    position: Position,
}

#[derive(Copy, Clone, Debug)]
struct Slot {
    discovery: u64,
    generation: u32,
}

/// Min-heap of revealed tiles awaiting analysis.
///
/// A position keeps the discovery order of its first push. Pushing it again supersedes every
/// older entry through a per-position generation counter; superseded entries are dropped when
/// they reach the top of the heap. Popped classes are hints only, the board may have moved on.
#[derive(Clone, Debug, Default)]
pub struct WorkQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    slots: BTreeMap<Position, Slot>,
    resolved: BTreeSet<Position>,
    next_discovery: u64,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Enqueues `position`, superseding any older entry for it. Resolved tiles are ignored.
    pub fn push(&mut self, position: Position, class: PriorityClass) -> bool {
        if self.resolved.contains(&position) {
            return false;
        }

        let slot = self.bump(position);
        self.heap.push(Reverse(Entry {
            class,
            discovery: slot.discovery,
            generation: slot.generation,
            position,
        }));
        true
    }

    /// Best live entry: lowest class, then earliest discovered.
    pub fn pop_best(&mut self) -> Option<(Position, PriorityClass)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            let live = self
                .slots
                .get(&entry.position)
                .is_some_and(|slot| slot.generation == entry.generation);
            if live {
                // consumed, a later push starts a new generation
                self.bump(entry.position);
                return Some((entry.position, entry.class));
            }
        }
        None
    }

    /// Drops `position` from consideration for the rest of the cycle.
    pub fn mark_resolved(&mut self, position: Position) {
        if self.resolved.insert(position) {
            self.bump(position);
        }
    }

    /// Re-derives the class of `position` from the board and pushes it.
    ///
    /// Returns `None` when there is nothing to queue (hidden, flagged, or resolved tile).
    pub fn requeue(
        &mut self,
        board: &impl BoardView,
        position: Position,
    ) -> Option<core::result::Result<PriorityClass, InconsistentConstraint>> {
        if self.resolved.contains(&position) {
            return None;
        }

        let Some(constraint) = extract(board, position) else {
            if board.state_of(position).count().is_some() {
                self.mark_resolved(position);
            }
            return None;
        };

        let classified = classify(&constraint);
        match classified {
            Ok(class) => {
                self.push(position, class);
            }
            Err(_) => {
                // waits until a neighbor changes
                self.bump(position);
            }
        }
        Some(classified)
    }

    /// Requeues every revealed neighbor of `position`, returning the ones found inconsistent.
    pub fn requeue_neighbors_of(
        &mut self,
        board: &impl BoardView,
        position: Position,
    ) -> Vec<InconsistentConstraint> {
        board
            .neighbors_of(position)
            .iter()
            .filter(|&&neighbor| board.state_of(neighbor).is_numbered())
            .filter_map(|&neighbor| self.requeue(board, neighbor))
            .filter_map(|classified| classified.err())
            .collect()
    }

    fn bump(&mut self, position: Position) -> Slot {
        let next_discovery = self.next_discovery;
        let slot = self.slots.entry(position).or_insert_with(|| Slot {
            discovery: next_discovery,
            generation: 0,
        });
        if slot.discovery == next_discovery {
            self.next_discovery += 1;
        }
        slot.generation = slot.generation.wrapping_add(1);
        *slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use PriorityClass::*;

    #[test]
    fn pops_by_class_then_discovery_order() {
        let mut queue = WorkQueue::new();
        queue.push((0, 0), Underdetermined);
        queue.push((0, 1), Satisfied);
        queue.push((0, 2), Satisfiable);
        queue.push((0, 3), Satisfied);

        let popped: Vec<_> = core::iter::from_fn(|| queue.pop_best()).collect();

        assert_eq!(
            popped,
            vec![
                ((0, 1), Satisfied),
                ((0, 3), Satisfied),
                ((0, 2), Satisfiable),
                ((0, 0), Underdetermined),
            ]
        );
    }

    #[test]
    fn repush_supersedes_stale_entry() {
        let mut queue = WorkQueue::new();
        queue.push((0, 0), Underdetermined);
        queue.push((0, 0), Satisfied);

        assert_eq!(queue.pop_best(), Some(((0, 0), Satisfied)));
        assert_eq!(queue.pop_best(), None);
    }

    #[test]
    fn repush_keeps_discovery_order() {
        let mut queue = WorkQueue::new();
        queue.push((1, 1), Satisfiable);
        queue.push((2, 2), Satisfiable);
        queue.push((1, 1), Satisfiable);

        assert_eq!(queue.pop_best(), Some(((1, 1), Satisfiable)));
        assert_eq!(queue.pop_best(), Some(((2, 2), Satisfiable)));
    }

    #[test]
    fn resolved_tiles_are_never_queued_again() {
        let mut queue = WorkQueue::new();
        queue.push((0, 0), Satisfied);
        queue.mark_resolved((0, 0));

        assert_eq!(queue.pop_best(), None);
        assert!(!queue.push((0, 0), Satisfied));
    }

    #[test]
    fn requeue_neighbors_classifies_from_board() {
        let layout = MineLayout::from_mine_coords((1, 4), &[(0, 0), (0, 2)]).unwrap();
        let mut board = Board::with_layout(layout);
        board.reveal((0, 1)).unwrap();

        let inconsistent = queue_neighbors(&board, (0, 0));

        assert!(inconsistent.0.is_empty());
        assert_eq!(inconsistent.1, Some(((0, 1), Satisfiable)));
    }

    #[test]
    fn requeue_reports_inconsistent_neighbors() {
        let layout = MineLayout::from_mine_coords((2, 3), &[(0, 0)]).unwrap();
        let mut board = Board::with_layout(layout);
        board.reveal((1, 1)).unwrap();
        board.flag((0, 0)).unwrap();
        board.flag((0, 2)).unwrap();

        let (inconsistent, popped) = queue_neighbors(&board, (0, 0));

        assert_eq!(inconsistent.len(), 1);
        assert_eq!(inconsistent[0].clue, (1, 1));
        assert_eq!(popped, None);
    }

    fn queue_neighbors(
        board: &Board,
        position: Position,
    ) -> (Vec<InconsistentConstraint>, Option<(Position, PriorityClass)>) {
        let mut queue = WorkQueue::new();
        let inconsistent = queue.requeue_neighbors_of(board, position);
        (inconsistent, queue.pop_best())
    }
}
