use super::*;

#[test]
fn pool_bridges_predecessor_and_successor_into_one() {
    // Three disjoint extents with exactly-sized gaps between them; pooling
    // a range that exactly fills one gap must coalesce predecessor, new
    // range, and successor into a single extent.
    let mut fl = Freelist::new();
    fl.pool(0, 5); // [0, 5)
    fl.pool(10, 5); // [10, 15)
    fl.pool(20, 5); // [20, 25)
    fl.pool(5, 5); // fills the [5, 10) gap -> bridges the first two

    assert_eq!(fl.extents(), &[Extent::new(0, 15), Extent::new(20, 5)]);

    assert_eq!(fl.alloc(5), Some(0));
    assert_eq!(fl.alloc(5), Some(5));
    assert_eq!(fl.alloc(5), Some(10));
    assert_eq!(fl.alloc(5), Some(20));
    assert_eq!(fl.alloc(5), None);
}

#[test]
fn grow_next_extends_successor_downward() {
    let mut fl = Freelist::new();
    fl.pool(10, 5); // [10, 15)
    fl.pool(5, 5); // touches successor's offset (10) -> grow-next
    assert_eq!(fl.extents(), &[Extent::new(5, 10)]);
}

#[test]
fn alloc_trims_extent_in_place() {
    let mut fl = Freelist::with_seed(0, 10);
    assert_eq!(fl.alloc(4), Some(0));
    assert_eq!(fl.extents(), &[Extent::new(4, 6)]);
}

#[test]
fn alloc_on_previously_empty_list_round_trips() {
    let mut fl = Freelist::new();
    fl.pool(100, 20);
    assert_eq!(fl.alloc(20), Some(100));
    assert!(fl.extents().is_empty());
}

#[test]
fn thwack_splits_extent_in_two() {
    let mut fl = Freelist::with_seed(0, 20);
    assert!(fl.thwack(8, 4));
    assert_eq!(fl.extents(), &[Extent::new(0, 8), Extent::new(12, 8)]);
    assert!(fl.check_invariants());
}

#[test]
fn thwack_exact_match_removes_extent() {
    let mut fl = Freelist::with_seed(5, 5);
    assert!(fl.thwack(5, 5));
    assert!(fl.extents().is_empty());
}

#[test]
fn thwack_head_and_tail_trim() {
    let mut fl = Freelist::with_seed(0, 10);
    assert!(fl.thwack(0, 3));
    assert_eq!(fl.extents(), &[Extent::new(3, 7)]);

    let mut fl2 = Freelist::with_seed(0, 10);
    assert!(fl2.thwack(7, 3));
    assert_eq!(fl2.extents(), &[Extent::new(0, 7)]);
}

#[test]
fn thwack_of_absent_region_fails() {
    let mut fl = Freelist::with_seed(0, 10);
    assert!(!fl.thwack(20, 5));
    assert!(!fl.thwack(5, 20));
}

#[test]
#[should_panic]
fn pool_overlap_is_a_contract_violation() {
    let mut fl = Freelist::with_seed(0, 10);
    fl.pool(5, 10);
}

#[test]
fn invariants_hold_after_randomized_sequence() {
    let mut fl = Freelist::with_seed(0, 1000);
    let mut allocated = Vec::new();
    for count in [3, 7, 1, 40, 5, 2] {
        if let Some(ofs) = fl.alloc(count) {
            allocated.push((ofs, count));
        }
        assert!(fl.check_invariants());
    }
    for (ofs, count) in allocated {
        fl.pool(ofs, count);
        assert!(fl.check_invariants());
    }
}
