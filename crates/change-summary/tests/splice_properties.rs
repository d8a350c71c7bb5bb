use change_summary::{apply_splices, calc_splices, calculate_splices, Splice};
use change_summary_model::Value;
use proptest::prelude::*;

fn values(items: &[u8]) -> Vec<Value> {
    items.iter().map(|&n| Value::from(i64::from(n))).collect()
}

fn lcs(a: &[u8], b: &[u8]) -> usize {
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            table[i][j] = if a[i - 1] == b[j - 1] {
                table[i - 1][j - 1] + 1
            } else {
                table[i - 1][j].max(table[i][j - 1])
            };
        }
    }
    table[a.len()][b.len()]
}

fn cost(splices: &[Splice]) -> usize {
    splices.iter().map(|s| s.removed.len() + s.added_count).sum()
}

fn small_vec() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..5, 0..12)
}

proptest! {
    #[test]
    fn splices_transform_old_into_current(old in small_vec(), current in small_vec()) {
        let old_values = values(&old);
        let current_values = values(&current);
        let splices = calculate_splices(&current_values, &old_values);

        let mut replay = old_values.clone();
        apply_splices(&mut replay, &current_values, &splices);
        prop_assert_eq!(replay, current_values);
    }

    #[test]
    fn splices_are_minimal(old in small_vec(), current in small_vec()) {
        let splices = calculate_splices(&values(&current), &values(&old));
        prop_assert_eq!(cost(&splices), old.len() + current.len() - 2 * lcs(&old, &current));
    }

    #[test]
    fn splices_are_ordered_and_disjoint(old in small_vec(), current in small_vec()) {
        let splices = calculate_splices(&values(&current), &values(&old));
        for splice in &splices {
            prop_assert!(!splice.removed.is_empty() || splice.added_count > 0);
        }
        for pair in splices.windows(2) {
            prop_assert!(pair[0].index + pair[0].added_count < pair[1].index + 1);
        }
    }

    #[test]
    fn equal_sequences_produce_no_splices(items in small_vec()) {
        prop_assert!(calculate_splices(&values(&items), &values(&items)).is_empty());
    }
}

#[test]
fn edit_distances_match_known_cases() {
    let cases: [(&[u8], &[u8], usize); 4] = [
        (&[], &[1, 2, 3], 3),
        (&[1, 2, 3, 4, 5], &[0, 2, 9, 9, 4, 5, 8, 8], 7),
        (&[1, 2, 3], &[3, 2, 1], 4),
        (&[4, 4, 4, 4, 1, 2, 3], &[1, 2, 3, 5, 5, 5, 5], 8),
    ];
    for (old, current, distance) in cases {
        let splices = calculate_splices(&values(current), &values(old));
        assert_eq!(cost(&splices), distance, "{old:?} -> {current:?}");
    }
}

#[test]
fn sub_range_diff_offsets_indices() {
    let current = values(&[9, 1, 2, 7, 9]);
    let old = values(&[8, 1, 2, 3, 8]);
    let splices = calc_splices(&current, 1..4, &old, 1..4);
    assert_eq!(splices, vec![Splice::new(3, values(&[3]), 1)]);
}
