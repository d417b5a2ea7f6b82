use super::*;
use std::sync::atomic::AtomicUsize;

fn counter_store() -> Store<i32> {
    Store::new("counter", 0)
}

#[test]
fn get_reflects_set_immediately() {
    let store = counter_store();
    store.set(7);
    assert_eq!(store.get(), 7);
    assert_eq!(store.read(|v| *v * 2), 14);
}

#[test]
fn update_returns_closure_output() {
    let store = counter_store();
    let out = store.update(|v| {
        *v += 5;
        "done"
    });
    assert_eq!(out, "done");
    assert_eq!(store.get(), 5);
}

#[test]
fn listeners_see_committed_value() {
    let store = counter_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = store.subscribe(move |v| sink.lock().unwrap().push(*v));

    store.set(1);
    store.update(|v| *v += 2);

    assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
}

#[test]
fn listener_can_read_store_without_deadlock() {
    let store = counter_store();
    let reader = store.clone();
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);
    let _sub = store.subscribe(move |v| {
        assert_eq!(reader.get(), *v);
        sink.fetch_add(1, Ordering::SeqCst);
    });

    store.set(3);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_subscription_unsubscribes() {
    let store = counter_store();
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    let sub = store.subscribe(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(store.listener_count(), 1);

    store.set(1);
    drop(sub);
    store.set(2);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn explicit_unsubscribe_only_removes_own_listener() {
    let store = counter_store();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    let (sa, sb) = (Arc::clone(&a), Arc::clone(&b));
    let sub_a = store.subscribe(move |_| {
        sa.fetch_add(1, Ordering::SeqCst);
    });
    let _sub_b = store.subscribe(move |_| {
        sb.fetch_add(1, Ordering::SeqCst);
    });

    sub_a.unsubscribe();
    store.set(9);

    assert_eq!(a.load(Ordering::SeqCst), 0);
    assert_eq!(b.load(Ordering::SeqCst), 1);
}

#[test]
fn subscription_outliving_store_is_harmless() {
    let store = counter_store();
    let sub = store.subscribe(|_| {});
    drop(store);
    drop(sub);
}

#[test]
fn clones_share_state() {
    let store = counter_store();
    let other = store.clone();
    other.set(42);
    assert_eq!(store.get(), 42);
    assert_eq!(store.name(), "counter");
}

#[test]
fn concurrent_updates_do_not_lose_writes() {
    let store = counter_store();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let s = store.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    s.update(|v| *v += 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(store.get(), 800);
}
