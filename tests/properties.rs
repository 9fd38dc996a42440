use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rust_collection_processing::inspect::Callback;
use rust_collection_processing::processing::{
    chunk, compact, difference, intersection, order_by, shuffle, union, uniq, SortOptions,
};
use rust_collection_processing::types::DataType;
use rust_collection_processing::value::{Sequence, Value};

fn ints(value: &Value) -> Vec<i64> {
    value
        .as_sequence()
        .expect("sequence")
        .items()
        .iter()
        .map(|v| v.as_i64().expect("int"))
        .collect()
}

fn identity() -> Callback<'static> {
    Callback::transform(DataType::Int64, DataType::Int64, |v| v.clone())
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-c]{0,2}".prop_map(Value::from),
        prop_oneof![Just(0.0), Just(-0.0), Just(1.5)].prop_map(Value::from),
    ]
}

proptest! {
    #[test]
    fn chunks_concatenate_back_to_input(items in prop::collection::vec(any::<i64>(), 0..40), size in 1i64..8) {
        let data = Value::from(items.clone());
        let out = chunk(&data, size).unwrap();
        let chunks = out.as_sequence().unwrap();

        let mut rebuilt = Vec::new();
        for c in chunks.items() {
            let c = ints(c);
            prop_assert!(!c.is_empty() && c.len() <= size as usize);
            rebuilt.extend(c);
        }
        prop_assert_eq!(rebuilt, items);
        prop_assert!(chunk(&data, 0).unwrap().as_sequence().unwrap().is_empty());
    }

    #[test]
    fn compact_leaves_no_falsy_values(items in prop::collection::vec(scalar(), 0..30)) {
        let data = Value::Seq(Sequence::infer(items.clone()));
        let out = compact(&data).unwrap();
        let out = out.as_sequence().unwrap();
        prop_assert!(out.len() <= items.len());
        prop_assert!(out.items().iter().all(|v| !v.is_falsy()));
    }

    #[test]
    fn difference_and_intersection_cover_the_input(
        a in prop::collection::vec(0i64..12, 0..30),
        b in prop::collection::vec(0i64..12, 0..30),
    ) {
        let (a_val, b_val) = (Value::from(a.clone()), Value::from(b.clone()));
        let diff = difference(&a_val, std::slice::from_ref(&b_val)).unwrap();
        let inter = intersection(&a_val, std::slice::from_ref(&b_val)).unwrap();

        let b_set: HashSet<i64> = b.iter().copied().collect();
        prop_assert!(ints(&diff).iter().all(|v| !b_set.contains(v)));
        prop_assert!(ints(&inter).iter().all(|v| b_set.contains(v)));

        let joined = union(&diff, &[inter]).unwrap();
        let joined = ints(&joined);
        prop_assert_eq!(
            joined.iter().copied().collect::<HashSet<_>>().len(),
            joined.len()
        );
        let expected: BTreeSet<i64> = ints(&uniq(&a_val).unwrap()).into_iter().collect();
        prop_assert_eq!(joined.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn ordering_is_idempotent_and_reversible(items in prop::collection::hash_set(any::<i64>(), 0..50)) {
        let data = Value::from(items.into_iter().collect::<Vec<_>>());
        let asc = order_by(&data, &mut identity(), SortOptions::default()).unwrap();
        let again = order_by(&asc, &mut identity(), SortOptions::default()).unwrap();
        prop_assert_eq!(&asc, &again);

        let desc = order_by(&data, &mut identity(), SortOptions { ascending: false, concurrent: true }).unwrap();
        let mut reversed = ints(&asc);
        reversed.reverse();
        prop_assert_eq!(ints(&desc), reversed);
    }

    #[test]
    fn shuffle_is_a_permutation(items in prop::collection::vec(any::<i64>(), 0..60), seed in any::<u64>()) {
        let mut data = Value::from(items.clone());
        shuffle(&mut data, &mut StdRng::seed_from_u64(seed)).unwrap();
        let mut got = ints(&data);
        let mut expected = items;
        got.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }
}
