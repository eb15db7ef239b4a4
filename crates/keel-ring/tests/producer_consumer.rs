//! Integration test: producers and consumers sharing one queue.
//!
//! Each producer tags its frames with its id and a sequence number. The
//! queue serialises every operation, so each consumer must see any one
//! producer's frames in increasing sequence order, and the union of all
//! consumers' frames must be exactly what was produced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use keel_ring::{FrameQueue, QueueError};

const PRODUCERS: u8 = 4;
const CONSUMERS: usize = 3;
const PER_PRODUCER: u32 = 2_000;

fn encode(producer: u8, seq: u32) -> Vec<u8> {
    let mut frame = vec![producer];
    frame.extend_from_slice(&seq.to_le_bytes());
    // Vary the length so frames wrap at different offsets.
    frame.resize(5 + (seq as usize % 11), 0xCD);
    frame
}

fn decode(frame: &[u8]) -> (u8, u32) {
    (frame[0], u32::from_le_bytes([frame[1], frame[2], frame[3], frame[4]]))
}

#[test]
fn every_frame_delivered_once_in_producer_order() {
    let queue = Arc::new(FrameQueue::with_capacity(256).unwrap());

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    let frame = encode(p, seq);
                    loop {
                        match queue.enqueue(&frame) {
                            Ok(()) => break,
                            Err(QueueError::InsufficientSpace { .. }) => thread::yield_now(),
                            Err(e) => panic!("enqueue failed: {e}"),
                        }
                    }
                }
            })
        })
        .collect();

    let total = usize::from(PRODUCERS) * PER_PRODUCER as usize;
    let taken = Arc::new(AtomicUsize::new(0));
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let taken = Arc::clone(&taken);
            thread::spawn(move || {
                let mut seen: Vec<(u8, u32)> = Vec::new();
                let mut buf = [0u8; 32];
                while taken.load(Ordering::SeqCst) < total {
                    match queue.dequeue(&mut buf) {
                        Ok(n) => {
                            seen.push(decode(&buf[..n]));
                            taken.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(QueueError::Empty) => thread::yield_now(),
                        Err(e) => panic!("dequeue failed: {e}"),
                    }
                }
                seen
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    let mut all = Vec::new();
    for c in consumers {
        let seen = c.join().unwrap();
        for producer in 0..PRODUCERS {
            let seqs: Vec<u32> = seen
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|&(_, s)| s)
                .collect();
            assert!(
                seqs.windows(2).all(|w| w[0] < w[1]),
                "producer {producer} frames reordered"
            );
        }
        all.extend(seen);
    }

    all.sort_unstable();
    let expected: Vec<(u8, u32)> = (0..PRODUCERS)
        .flat_map(|p| (0..PER_PRODUCER).map(move |s| (p, s)))
        .collect();
    assert_eq!(all, expected);
    assert!(queue.is_empty());
    assert_eq!(queue.free_bytes(), 256);
}
