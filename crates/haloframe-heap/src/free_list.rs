//! Lock-free free list of frame indices.
//!
//! A Treiber stack over dense indices. The head packs a 32-bit ABA tag and a
//! 32-bit index into one `AtomicU64`; every successful push or pop bumps the
//! tag so a stale head read always fails its compare-exchange.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Sentinel index meaning "end of list".
const EMPTY: u32 = u32::MAX;

fn pack(tag: u32, index: u32) -> u64 {
    ((tag as u64) << 32) | index as u64
}

fn unpack(word: u64) -> (u32, u32) {
    ((word >> 32) as u32, word as u32)
}

pub(crate) struct FreeList {
    head: AtomicU64,
    next: Box<[AtomicU32]>,
}

// Compile-time assertion: FreeList must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FreeList>();
};

impl FreeList {
    /// A list holding every index in `0..len`, lowest index on top.
    pub fn full(len: u32) -> Self {
        debug_assert!(len < EMPTY);
        let next = (0..len)
            .map(|i| AtomicU32::new(if i + 1 < len { i + 1 } else { EMPTY }))
            .collect();
        let head = if len == 0 { EMPTY } else { 0 };
        Self {
            head: AtomicU64::new(pack(0, head)),
            next,
        }
    }

    pub fn pop(&self) -> Option<u32> {
        let mut current = self.head.load(Ordering::Acquire);
        loop {
            let (tag, index) = unpack(current);
            if index == EMPTY {
                return None;
            }
            let next = self.next[index as usize].load(Ordering::Acquire);
            let replacement = pack(tag.wrapping_add(1), next);
            match self.head.compare_exchange_weak(
                current,
                replacement,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(index),
                Err(observed) => current = observed,
            }
        }
    }

    pub fn push(&self, index: u32) {
        let mut current = self.head.load(Ordering::Acquire);
        loop {
            let (tag, top) = unpack(current);
            self.next[index as usize].store(top, Ordering::Release);
            let replacement = pack(tag.wrapping_add(1), index);
            match self.head.compare_exchange_weak(
                current,
                replacement,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn pops_in_index_order_then_empties() {
        let list = FreeList::full(3);
        assert_eq!(list.pop(), Some(0));
        assert_eq!(list.pop(), Some(1));
        assert_eq!(list.pop(), Some(2));
        assert_eq!(list.pop(), None);
    }

    #[test]
    fn push_is_lifo() {
        let list = FreeList::full(2);
        let a = list.pop().unwrap();
        let b = list.pop().unwrap();
        list.push(a);
        list.push(b);
        assert_eq!(list.pop(), Some(b));
        assert_eq!(list.pop(), Some(a));
    }

    #[test]
    fn empty_list_pops_none() {
        assert_eq!(FreeList::full(0).pop(), None);
    }

    #[test]
    fn concurrent_churn_never_duplicates() {
        let list = Arc::new(FreeList::full(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let list = Arc::clone(&list);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let mut held = Vec::new();
                        for _ in 0..4 {
                            if let Some(i) = list.pop() {
                                held.push(i);
                            }
                        }
                        for i in held {
                            list.push(i);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut seen = HashSet::new();
        while let Some(i) = list.pop() {
            assert!(seen.insert(i), "index {i} handed out twice");
        }
        assert_eq!(seen.len(), 64);
    }
}
