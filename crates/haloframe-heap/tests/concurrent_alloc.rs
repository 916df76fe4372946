//! Integration test: concurrent allocate/free against one heap.
//!
//! Many threads allocate frames, tag them with their thread id, verify
//! nobody else wrote to them, and free them again. Any frame handed to
//! two owners at once shows up as a foreign tag.

use std::collections::HashSet;
use std::sync::Arc;

use haloframe_core::Particle;
use haloframe_heap::{FrameHeap, HeapConfig, HeapError};
use proptest::prelude::*;

#[test]
fn no_frame_has_two_owners() {
    let heap = FrameHeap::new(&HeapConfig::new(128), 4).unwrap().into_shared();
    let threads: Vec<_> = (0..8u64)
        .map(|tid| {
            let heap = Arc::clone(&heap);
            std::thread::spawn(move || {
                for round in 0..500u64 {
                    let mut mine = Vec::new();
                    for _ in 0..8 {
                        match heap.allocate() {
                            Ok(id) => {
                                heap.lock(id).put(0, Particle::new(tid, [0.0; 3]));
                                mine.push(id);
                            }
                            Err(HeapError::Exhausted { .. }) => break,
                            Err(e) => panic!("unexpected heap error: {e}"),
                        }
                    }
                    for id in mine {
                        let mut frame = heap.lock(id);
                        assert_eq!(frame.get(0).id, tid, "round {round}: frame {id} shared");
                        frame.clear();
                        drop(frame);
                        heap.free(id);
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }
    let stats = heap.stats();
    assert_eq!(stats.in_use, 0);
    assert_eq!(stats.allocations, stats.frees);
    assert!(stats.peak <= 128);
}

#[test]
fn every_frame_is_reachable_after_churn() {
    let heap = FrameHeap::new(&HeapConfig::new(16), 2).unwrap();
    let first: Vec<_> = (0..16).map(|_| heap.allocate().unwrap()).collect();
    for id in first.iter().rev() {
        heap.free(*id);
    }
    let again: HashSet<_> = (0..16).map(|_| heap.allocate().unwrap()).collect();
    assert_eq!(again.len(), 16);
    assert!(heap.allocate().is_err());
}

proptest! {
    #[test]
    fn in_use_matches_outstanding(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
        let heap = FrameHeap::new(&HeapConfig::new(32), 1).unwrap();
        let mut held = Vec::new();
        for alloc in ops {
            if alloc {
                if let Ok(id) = heap.allocate() {
                    held.push(id);
                }
            } else if let Some(id) = held.pop() {
                heap.free(id);
            }
            prop_assert_eq!(heap.in_use() as usize, held.len());
        }
    }
}
