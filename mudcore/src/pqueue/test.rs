use super::*;

#[test]
fn dequeue_yields_nondecreasing_keys() {
    let mut h: PriorityQueue<u32> = PriorityQueue::with_capacity(16);
    for (i, key) in [42, 2, 123, 88, 3, 1, 0].into_iter().enumerate() {
        assert!(h.enqueue(PrioElement::new(key, i as u32)));
        assert!(h.check_invariants());
    }

    let mut out = Vec::new();
    while let Some(elm) = h.dequeue() {
        out.push(elm.d);
    }
    assert_eq!(out, vec![0, 1, 2, 3, 42, 88, 123]);
}

#[test]
fn enqueue_fails_past_capacity() {
    let mut h: PriorityQueue<u32> = PriorityQueue::with_capacity(2);
    assert!(h.enqueue(PrioElement::new(1, 0)));
    assert!(h.enqueue(PrioElement::new(2, 1)));
    assert!(!h.enqueue(PrioElement::new(3, 2)));
    assert!(h.is_full());
}

#[test]
fn cancel_then_find_returns_none() {
    let mut h: PriorityQueue<&'static str> = PriorityQueue::with_capacity(8);
    for (key, payload) in [(5, "a"), (1, "b"), (9, "c"), (3, "d")] {
        h.enqueue(PrioElement::new(key, payload));
    }
    let idx = h.find(&"b").expect("b must be present");
    h.cancel(idx);
    assert!(h.find(&"b").is_none());
    assert!(h.check_invariants());

    let mut out = Vec::new();
    while let Some(elm) = h.dequeue() {
        out.push(elm.d);
    }
    assert_eq!(out, vec![3, 5, 9]);
}

#[test]
fn cancel_preserves_invariant_for_every_index() {
    let mut h: PriorityQueue<u32> = PriorityQueue::with_capacity(32);
    for key in [10, 4, 15, 20, 1, 8, 30, 2, 6, 25] {
        h.enqueue(PrioElement::new(key, key));
    }
    while !h.is_empty() {
        h.cancel(h.len() / 2);
        assert!(h.check_invariants());
    }
}
