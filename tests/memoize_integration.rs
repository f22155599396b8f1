//! Integration tests for memoized functions shared across threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use backstop::memo::{memoize2, singleton};
use backstop::{memoize, Failure, Outcome};

#[test]
fn counting_supplier_runs_once() {
    let counter = AtomicUsize::new(0);
    let supplier = memoize(|key: &&str| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("value for {}", key))
    });

    let first = supplier.call("key").unwrap();
    let second = supplier.call("key").unwrap();

    assert_eq!(first, second);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_callers_compute_each_key_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let memo = Arc::new(memoize({
        let counter = counter.clone();
        move |n: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            Ok(n * 2)
        }
    }));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let memo = memo.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                memo.call(i % 2).unwrap()
            })
        })
        .collect();

    let mut results: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_unstable();

    assert_eq!(results, vec![0, 0, 0, 0, 2, 2, 2, 2]);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(memo.len(), 2);
}

#[test]
fn computations_never_overlap() {
    let running = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicUsize::new(0));
    let memo = Arc::new(memoize({
        let running = running.clone();
        let overlapped = overlapped.clone();
        move |n: &usize| {
            if running.fetch_add(1, Ordering::SeqCst) > 0 {
                overlapped.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(2));
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(*n)
        }
    }));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let memo = memo.clone();
            thread::spawn(move || memo.call(i).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(overlapped.load(Ordering::SeqCst), 0);
    assert_eq!(memo.len(), 6);
}

#[test]
fn failed_computation_is_retried_by_the_next_caller() {
    let attempts = AtomicUsize::new(0);
    let lookup = memoize(|host: &String| {
        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(Failure::msg(format!("{} unreachable", host)))
        } else {
            Ok(host.len())
        }
    });

    let first = Outcome::apply(|| lookup.call("db.local".to_string()));
    assert_eq!(first.cause().unwrap().to_string(), "db.local unreachable");

    let second = Outcome::apply(|| lookup.call("db.local".to_string()));
    assert_eq!(second.get().unwrap(), 8);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn panicking_computation_does_not_poison_the_cache() {
    let memo = Arc::new(memoize(|n: &i32| {
        if *n == 0 {
            panic!("zero is not allowed");
        }
        Ok(100 / n)
    }));

    let worker = {
        let memo = memo.clone();
        thread::spawn(move || memo.call(0))
    };
    assert!(worker.join().unwrap().is_err());
    assert_eq!(memo.call(4).unwrap(), 25);
}

#[test]
fn memoize2_and_singleton_share_the_contract() {
    let calls = AtomicUsize::new(0);
    let area = memoize2(|w: &u32, h: &u32| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(w * h)
    });
    assert_eq!(area.call((3, 4)).unwrap(), 12);
    assert_eq!(area.call((3, 4)).unwrap(), 12);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let loads = AtomicUsize::new(0);
    let settings = singleton(|| {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["verbose".to_string()])
    });
    assert_eq!(settings.get().unwrap(), vec!["verbose"]);
    assert_eq!(settings.get().unwrap(), vec!["verbose"]);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}
