//! Request Queue Tests.

use memsched_core::controller::queue::RequestQueue;
use memsched_core::controller::request::Request;
use pretty_assertions::assert_eq;

fn ids(queue: &RequestQueue) -> Vec<u64> {
    queue.requests().map(|r| r.id).collect()
}

#[test]
fn one_rejection_past_capacity() {
    let mut queue = RequestQueue::new(4);
    let rejected: Vec<_> = (0..5)
        .filter_map(|id| queue.try_enqueue(Request::read(id, id * 64, 64)).err())
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0], Request::read(4, 4 * 64, 64));
    assert_eq!(ids(&queue), vec![0, 1, 2, 3]);
    assert!(queue.is_full());
}

#[test]
fn huge_capacity_allocates_lazily() {
    let mut queue = RequestQueue::new(usize::MAX);
    assert_eq!(queue.capacity(), usize::MAX);
    for id in 0..2_000 {
        queue.try_enqueue(Request::read(id, id * 64, 8)).unwrap();
    }
    assert_eq!(queue.len(), 2_000);
    assert!(!queue.is_full());
}

#[test]
fn admission_reopens_after_removal() {
    let mut queue = RequestQueue::new(1);
    queue.try_enqueue(Request::read(0, 0, 8)).unwrap();
    assert!(queue.try_enqueue(Request::read(1, 0, 8)).is_err());
    let entry = queue.remove(0).unwrap();
    assert_eq!(entry.request.id, 0);
    assert!(queue.try_enqueue(Request::read(1, 0, 8)).is_ok());
}

#[test]
fn requeue_front_ignores_capacity() {
    let mut queue = RequestQueue::new(2);
    queue.try_enqueue(Request::read(0, 0, 8)).unwrap();
    queue.try_enqueue(Request::read(1, 64, 8)).unwrap();

    let retry = Request::write(9, 0x80, vec![1, 2]);
    queue.requeue_front(retry.clone());
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.front().unwrap().request, retry);
    assert_eq!(ids(&queue), vec![9, 0, 1]);
}

#[test]
fn charge_bypassed_counts_only_older_entries() {
    let mut queue = RequestQueue::new(8);
    for id in 0..4 {
        queue.try_enqueue(Request::read(id, id * 64, 8)).unwrap();
    }
    // Schedule entry 2: entries 0 and 1 were bypassed.
    let _ = queue.remove(2);
    queue.charge_bypassed(2);

    let counts: Vec<_> = queue.iter().map(|e| e.starvation).collect();
    assert_eq!(counts, vec![1, 1, 0]);
    assert_eq!(ids(&queue), vec![0, 1, 3]);
}

#[test]
fn removing_oldest_charges_nobody() {
    let mut queue = RequestQueue::new(8);
    for id in 0..3 {
        queue.try_enqueue(Request::read(id, 0, 8)).unwrap();
    }
    let _ = queue.remove(0);
    queue.charge_bypassed(0);
    assert!(queue.iter().all(|e| e.starvation == 0));
}

#[test]
fn remove_out_of_range_is_none() {
    let mut queue = RequestQueue::new(2);
    assert!(queue.remove(0).is_none());
    assert!(queue.get(3).is_none());
    assert!(queue.is_empty());
    assert_eq!(queue.capacity(), 2);
}
