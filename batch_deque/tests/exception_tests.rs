mod common;

use batch_deque::BatchDeque;
use common::{counted, expect_panic, fail_after, live, values, Counted};

type Deque = BatchDeque<Counted, 4>;

fn filled(count: i32) -> Deque {
    counted(0..count).into_iter().collect()
}

/// Runs `op` on a fresh deque once per construction that could fail,
/// making each one panic in turn, and checks that nothing changed.
fn assert_strong(count: i32, constructions: usize, op: impl Fn(&mut Deque)) {
    for k in 0..constructions {
        let mut dq = filled(count);
        let before = live();
        let capacity = dq.capacity();
        let pointers: Vec<*const Counted> = dq.iter().map(|item| item as *const Counted).collect();

        fail_after(k);
        expect_panic(|| op(&mut dq));

        assert_eq!(values(&dq), (0..count).collect::<Vec<_>>(), "k = {k}");
        assert_eq!(live(), before, "k = {k}");
        assert!(dq.capacity() >= capacity);
        for (item, ptr) in dq.iter().zip(&pointers) {
            assert_eq!(item as *const Counted, *ptr);
        }
        assert!(dq.invariants_ok());
    }
}

/// Yields `Counted` values and panics after `limit` of them.
struct Failing {
    next: i32,
    limit: i32,
}

impl Iterator for Failing {
    type Item = Counted;

    fn next(&mut self) -> Option<Counted> {
        if self.next == self.limit {
            panic!("iterator failed");
        }
        self.next += 1;
        Some(Counted::new(100 + self.next))
    }
}

#[test]
fn test_emplace_at_both_ends_panicking() {
    let mut dq = filled(4);
    let before = live();

    expect_panic(|| {
        dq.emplace_back(|| panic!("construction failed"));
    });
    expect_panic(|| {
        dq.emplace_front(|| panic!("construction failed"));
    });
    expect_panic(|| {
        dq.emplace(2, || panic!("construction failed"));
    });

    assert_eq!(values(&dq), [0, 1, 2, 3]);
    assert_eq!(live(), before);
    assert_eq!(dq.capacity(), 4);
    assert!(dq.invariants_ok());

    dq.push_back(Counted::new(4));
    dq.push_front(Counted::new(-1));
    assert_eq!(values(&dq), [-1, 0, 1, 2, 3, 4]);
}

#[test]
fn test_insert_slice_near_front_panicking() {
    let items = counted(10..15);
    assert_strong(9, items.len(), |dq| dq.insert_slice(2, &items));
}

#[test]
fn test_insert_slice_near_back_panicking() {
    let items = counted(10..15);
    assert_strong(9, items.len(), |dq| dq.insert_slice(7, &items));
}

#[test]
fn test_insert_n_panicking() {
    let value = Counted::new(7);
    assert_strong(9, 6, |dq| dq.insert_n(1, 6, &value));
    assert_strong(9, 6, |dq| dq.insert_n(8, 6, &value));
}

#[test]
fn test_insert_iter_panicking() {
    for limit in 0..6 {
        let mut dq = filled(9);
        let before = live();

        expect_panic(|| dq.insert_iter(3, Failing { next: 0, limit }));

        assert_eq!(values(&dq), (0..9).collect::<Vec<_>>());
        assert_eq!(live(), before);
        assert!(dq.invariants_ok());
    }
}

#[test]
fn test_resize_panicking() {
    assert_strong(5, 7, |dq| dq.resize_back(12, Counted::new(9)));
    assert_strong(5, 7, |dq| dq.resize_front(12, Counted::new(9)));
    assert_strong(5, 3, |dq| dq.resize_front_with(8, Counted::default));
}

#[test]
fn test_stable_insert_panicking_iterator() {
    for hint in [0, 2, 6, 9] {
        for limit in 0..6 {
            let mut dq = filled(9);
            let before = live();
            let pointers: Vec<*const Counted> =
                dq.iter().map(|item| item as *const Counted).collect();

            expect_panic(|| dq.stable_insert(hint, Failing { next: 0, limit }));

            assert_eq!(values(&dq), (0..9).collect::<Vec<_>>(), "hint = {hint}");
            assert_eq!(live(), before);
            for (item, ptr) in dq.iter().zip(&pointers) {
                assert_eq!(item as *const Counted, *ptr);
            }
            assert!(dq.invariants_ok());
        }
    }
}

#[test]
fn test_stable_insert_panicking_padding() {
    // Three inserted items leave one padding slot in a segment of four.
    let mut dq = filled(9);
    let before = live();
    let items = counted(100..103);

    fail_after(0);
    expect_panic(|| dq.stable_insert(5, items));

    assert_eq!(values(&dq), (0..9).collect::<Vec<_>>());
    assert_eq!(live(), before);
    assert!(dq.invariants_ok());
}

#[test]
fn test_clone_panicking() {
    let dq = filled(10);
    for k in 0..10 {
        let before = live();
        fail_after(k);
        expect_panic(|| dq.clone());
        assert_eq!(live(), before);
    }
    assert_eq!(values(&dq), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_from_elem_panicking() {
    let value = Counted::new(1);
    let before = live();

    fail_after(5);
    expect_panic(|| Deque::from_elem(value.clone(), 10));

    assert_eq!(live(), before);
}
