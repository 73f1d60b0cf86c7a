mod common;

use batch_deque::BatchDeque;
use common::{counted, live, values, Counted};

fn get_range<const S: usize>(count: i32) -> BatchDeque<i32, S> {
    (1..=count).collect()
}

fn save_pointers<const S: usize>(dq: &BatchDeque<i32, S>) -> Vec<*const i32> {
    dq.iter().map(|item| item as *const i32).collect()
}

/// Every saved pointer still points at the value it was saved with.
fn check_pointers(pointers: &[*const i32]) {
    for (i, ptr) in pointers.iter().enumerate() {
        assert_eq!(unsafe { **ptr }, i as i32 + 1);
    }
}

fn check_inserted<const S: usize>(dq: &BatchDeque<i32, S>, at: usize, count: i32) {
    for i in 0..count {
        assert_eq!(dq[at + i as usize], i + 1);
    }
}

#[test]
fn test_empty_into_empty() {
    let mut dq: BatchDeque<i32, 8> = BatchDeque::new();

    assert_eq!(dq.stable_insert(0, std::iter::empty()), 0);
    assert!(dq.is_empty());
    assert_eq!(dq.capacity(), 0);
    assert!(dq.invariants_ok());
}

#[test]
fn test_range_into_empty() {
    let mut dq: BatchDeque<i32, 8> = BatchDeque::new();

    let at = dq.stable_insert(0, 1..=12);

    assert_eq!(at, 0);
    assert_eq!(dq, get_range::<8>(12));
    assert!(dq.invariants_ok());
}

#[test]
fn test_range_to_begin() {
    let mut dq = get_range::<8>(4);
    let pointers = save_pointers(&dq);

    let at = dq.stable_insert(0, 1..=12);

    check_pointers(&pointers);
    check_inserted(&dq, at, 12);
    assert_eq!(at, 0);
    assert_eq!(dq.len(), 16);
    assert!(dq.invariants_ok());
}

#[test]
fn test_range_to_end() {
    let mut dq = get_range::<8>(4);
    let pointers = save_pointers(&dq);

    let at = dq.stable_insert(4, 1..=12);

    check_pointers(&pointers);
    check_inserted(&dq, at, 12);
    assert_eq!(at, 4);
    assert_eq!(dq.len(), 16);
    assert!(dq.invariants_ok());
}

#[test]
fn test_hint_in_first_segment_inserts_at_front() {
    let mut dq = get_range::<8>(11);
    let pointers = save_pointers(&dq);

    let at = dq.stable_insert(6, [100, 101, 102, 103]);

    check_pointers(&pointers);
    assert_eq!(at, 0);
    assert_eq!(dq, [100, 101, 102, 103, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    assert!(dq.invariants_ok());
}

#[test]
fn test_range_to_mid_segment() {
    let mut dq = get_range::<4>(14);
    let pointers = save_pointers(&dq);

    let at = dq.stable_insert(6, 1..=4);

    check_pointers(&pointers);
    check_inserted(&dq, at, 4);
    assert_eq!(at, 4);
    assert_eq!(dq.len(), 18);
    assert_eq!(
        dq,
        [1, 2, 3, 4, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]
    );
    assert!(dq.invariants_ok());
}

#[test]
fn test_range_to_segment_boundary_pads_with_defaults() {
    let mut dq = get_range::<8>(11);
    let pointers = save_pointers(&dq);

    let at = dq.stable_insert(8, 1..=6);

    check_pointers(&pointers);
    check_inserted(&dq, at, 6);
    assert_eq!(at, 8);
    assert_eq!(dq.len(), 19);
    assert_eq!(
        dq,
        [1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 3, 4, 5, 6, 0, 0, 9, 10, 11]
    );
    assert!(dq.invariants_ok());
}

#[test]
fn test_range_to_first_segment_allocates_in_front() {
    let mut dq = get_range::<8>(14);
    let pointers = save_pointers(&dq);

    let at = dq.stable_insert(6, 1..=8);

    check_pointers(&pointers);
    check_inserted(&dq, at, 8);
    assert_eq!(dq.len(), 22);
    assert!(dq.invariants_ok());
}

#[test]
fn test_result_accounts_for_front_offset() {
    let mut dq: BatchDeque<i32, 4> = (0..8).collect();
    dq.push_front(-1);
    let pointers: Vec<*const i32> = dq.iter().map(|item| item as *const i32).collect();

    let at = dq.stable_insert(6, [50, 51, 52, 53, 54]);

    assert_eq!(at, 5);
    assert_eq!(
        dq,
        [-1, 0, 1, 2, 3, 50, 51, 52, 53, 54, 0, 0, 0, 4, 5, 6, 7]
    );
    for (value, ptr) in (-1..8).zip(&pointers) {
        assert_eq!(unsafe { **ptr }, value);
    }
    assert_eq!(&dq[13] as *const i32, pointers[5]);
    assert!(dq.invariants_ok());
}

#[test]
fn test_empty_input_in_the_middle_changes_nothing() {
    let mut dq = get_range::<4>(10);
    let capacity = dq.capacity();

    assert_eq!(dq.stable_insert(6, std::iter::empty()), 6);
    assert_eq!(dq.stable_insert(1, Vec::new()), 1);

    assert_eq!(dq, get_range::<4>(10));
    assert_eq!(dq.capacity(), capacity);
}

#[test]
fn test_repeated_inserts_keep_every_original_element() {
    let mut dq = get_range::<4>(40);
    let pointers = save_pointers(&dq);

    for round in 0..10 {
        let hint = (round * 7) % dq.len();
        let at = dq.stable_insert(hint, 1..=3);
        check_inserted(&dq, at, 3);
        assert!(dq.invariants_ok());
    }

    check_pointers(&pointers);
}

#[test]
fn test_counted_elements_are_dropped_once() {
    let before = live();
    {
        let mut dq: BatchDeque<Counted, 4> = counted(0..10).into_iter().collect();
        let at = dq.stable_insert(5, counted(100..103));
        assert_eq!(at, 4);
        assert_eq!(values(&dq), [0, 1, 2, 3, 100, 101, 102, 0, 4, 5, 6, 7, 8, 9]);
        assert_eq!(live() - before, 14);
    }
    assert_eq!(live(), before);
}
