//! Integration test for ordered pair locking under contention.

use palisade_core::contention;
use palisade_core::{lock_many, lock_pair, update_pair, EntityError, Lockable};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn account(balance: i64) -> Arc<Lockable<i64>> {
    let mut entity = Lockable::named("Account");
    entity.initialize_with(balance).unwrap();
    entity.enable_thread_safety().unwrap();
    Arc::new(entity)
}

#[test]
fn test_no_deadlock_under_opposite_roles() {
    let a = account(0);
    let b = account(0);
    let iterations = 2_000;

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let (a, b) = (Arc::clone(&a), Arc::clone(&b));
            thread::spawn(move || {
                for i in 0..iterations {
                    // Half the threads name the pair backwards
                    let pair = if (t + i) % 2 == 0 {
                        lock_pair(&*a, &*b).unwrap()
                    } else {
                        lock_pair(&*b, &*a).unwrap()
                    };
                    assert!(pair.first_held() && pair.second_held());
                    drop(pair);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_transfers_preserve_total() {
    let accounts: Vec<_> = (0..4).map(|_| account(1_000)).collect();
    let transfers = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = 500;
    let num_threads = 8;

    let start = Instant::now();
    let before = contention::stats();

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let accounts = accounts.clone();
            let transfers = Arc::clone(&transfers);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let from = &accounts[(t + i) % accounts.len()];
                    let to = &accounts[(t * 3 + i * 7 + 1) % accounts.len()];
                    let moved = update_pair(&**from, &**to, "transfer", |src, dst| {
                        *src -= 1;
                        *dst += 1;
                        Ok::<(), EntityError>(())
                    });
                    match moved {
                        Ok(()) => {
                            transfers.fetch_add(1, Ordering::Relaxed);
                        }
                        // Same account on both sides
                        Err(error) => assert_eq!(error, EntityError::InvalidArgument),
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let total: i64 = accounts.iter().map(|a| a.snapshot("balance").unwrap()).sum();
    assert_eq!(total, 4_000);

    let delta = contention::stats().since(&before);
    assert!(delta.acquisitions >= transfers.load(Ordering::Relaxed) as u64);

    println!("\n=== Pair Transfer Contention ===");
    println!("Transfers: {}", transfers.load(Ordering::Relaxed));
    println!("Retries: {}", delta.retries);
    println!("Elapsed: {:?}", start.elapsed());
}

#[test]
fn test_three_way_rotation_terminates() {
    let accounts: Vec<_> = (0..3).map(|_| account(10)).collect();

    let handles: Vec<_> = (0..3)
        .map(|t| {
            let accounts = accounts.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let x = &*accounts[t];
                    let y = &*accounts[(t + 1) % 3];
                    let z = &*accounts[(t + 2) % 3];
                    let many = lock_many(&[x, y, z]).unwrap();
                    assert_eq!(many.len(), 3);
                    drop(many);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
