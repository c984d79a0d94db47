// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Ordered dictionary behavior through the public API.

use proptest::prelude::*;
use quadtess::dict::OrderedDict;

#[test]
fn insert_then_delete_keeps_the_rest_sorted() {
    let mut dict = OrderedDict::new();
    for k in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
        let (_, existed) = dict.insert(k);
        assert!(!existed);
    }
    for k in [5, 1, 9] {
        assert_eq!(dict.delete(&k), Some(k));
    }
    assert_eq!(dict.nodes_count(), 6);
    for k in [2, 3, 4, 6, 7, 8] {
        let node = dict.find(&k).expect("remaining key must be findable");
        assert_eq!(*dict.key(node), k);
    }
    for k in [5, 1, 9] {
        assert!(dict.find(&k).is_none());
    }
    let keys: Vec<i32> = dict.iter().copied().collect();
    assert_eq!(keys, vec![2, 3, 4, 6, 7, 8]);
}

#[test]
fn duplicate_insert_returns_existing_node() {
    let mut dict = OrderedDict::new();
    let (first, existed) = dict.insert(10);
    assert!(!existed);
    let (again, existed) = dict.insert(10);
    assert!(existed);
    assert_eq!(first, again);
    assert_eq!(dict.nodes_count(), 1);
}

#[test]
fn deleting_an_absent_key_is_a_no_op() {
    let mut dict = OrderedDict::new();
    dict.insert(1);
    assert_eq!(dict.delete(&2), None);
    assert_eq!(dict.nodes_count(), 1);
}

#[test]
fn find_next_and_prev_take_absent_queries() {
    let mut dict = OrderedDict::new();
    for k in [10, 20, 30] {
        dict.insert(k);
    }
    let key = |n| dict.key(n);
    assert_eq!(dict.find_next(&15).map(key), Some(&20));
    assert_eq!(dict.find_next(&20).map(key), Some(&30));
    assert_eq!(dict.find_next(&30), None);
    assert_eq!(dict.find_prev(&25).map(key), Some(&20));
    assert_eq!(dict.find_prev(&10), None);
}

#[test]
fn next_and_prev_wrap_around() {
    let mut dict = OrderedDict::new();
    for k in [2, 1, 3] {
        dict.insert(k);
    }
    assert_eq!(dict.next(None), dict.min());
    assert_eq!(dict.prev(None), dict.max());
    assert_eq!(dict.next(dict.max()), None);
    assert_eq!(dict.prev(dict.min()), None);
    assert_eq!(dict.min().map(|n| *dict.key(n)), Some(1));
    assert_eq!(dict.max().map(|n| *dict.key(n)), Some(3));
}

#[test]
fn custom_comparator_orders_descending() {
    let mut dict = OrderedDict::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    for k in [1, 5, 3] {
        dict.insert(k);
    }
    let keys: Vec<i32> = dict.iter().copied().collect();
    assert_eq!(keys, vec![5, 3, 1]);
    assert_eq!(
        dict.find_next(&4).map(|n| *dict.key(n)),
        Some(3),
        "next in comparator order"
    );
}

proptest! {
    #[test]
    fn behaves_like_a_sorted_set(
        inserts in prop::collection::vec(-200i32..200, 0..150),
        deletes in prop::collection::vec(-200i32..200, 0..150),
    ) {
        let mut dict = OrderedDict::new();
        let mut model = std::collections::BTreeSet::new();
        for k in inserts {
            let (_, existed) = dict.insert(k);
            prop_assert_eq!(existed, !model.insert(k));
        }
        for k in deletes {
            prop_assert_eq!(dict.delete(&k).is_some(), model.remove(&k));
        }
        prop_assert_eq!(dict.nodes_count(), model.len());
        let keys: Vec<i32> = dict.iter().copied().collect();
        let expected: Vec<i32> = model.iter().copied().collect();
        prop_assert_eq!(keys, expected);

        // Reverse walk through prev agrees too.
        let mut back = Vec::new();
        let mut cursor = dict.max();
        while let Some(node) = cursor {
            back.push(*dict.key(node));
            cursor = dict.prev(Some(node));
        }
        back.reverse();
        prop_assert_eq!(back, model.iter().copied().collect::<Vec<_>>());
    }
}
