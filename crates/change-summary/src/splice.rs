//! Minimal array splices.
//!
//! A splice list describes how a previous array became the current one: at
//! `index` (in current coordinates) the `removed` items were replaced by
//! `added_count` items of the current array. Lists are kept in ascending
//! index order.

use std::ops::Range;

use change_summary_model::{index_key, ChangeRecord, Value};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Splice {
    pub index: usize,
    pub removed: Vec<Value>,
    pub added_count: usize,
}

impl Splice {
    pub fn new(index: usize, removed: Vec<Value>, added_count: usize) -> Self {
        Self {
            index,
            removed,
            added_count,
        }
    }

    /// Change in array length this splice causes.
    pub fn delta(&self) -> isize {
        self.added_count as isize - self.removed.len() as isize
    }

    /// Range of the added items in current coordinates.
    pub fn added_range(&self) -> Range<usize> {
        self.index..self.index + self.added_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditOp {
    Leave,
    Update,
    Add,
    Delete,
}

/// Edit distances between `old[old_range]` (rows) and `current[current_range]`
/// (columns), where a substitution costs a deletion plus an addition.
pub(crate) fn calc_edit_distances(
    current: &[Value],
    current_range: Range<usize>,
    old: &[Value],
    old_range: Range<usize>,
) -> Vec<Vec<usize>> {
    let rows = old_range.len() + 1;
    let columns = current_range.len() + 1;
    let mut distances = vec![vec![0usize; columns]; rows];
    for (i, row) in distances.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in distances[0].iter_mut().enumerate() {
        *cell = j;
    }
    for i in 1..rows {
        for j in 1..columns {
            if old[old_range.start + i - 1] == current[current_range.start + j - 1] {
                distances[i][j] = distances[i - 1][j - 1];
            } else {
                let north = distances[i - 1][j] + 1;
                let west = distances[i][j - 1] + 1;
                distances[i][j] = north.min(west);
            }
        }
    }
    distances
}

/// Walks the distance matrix from the final cell back to the origin.
pub(crate) fn edit_ops(distances: &[Vec<usize>]) -> Vec<EditOp> {
    let mut i = distances.len() - 1;
    let mut j = distances[0].len() - 1;
    let mut current = distances[i][j];
    let mut edits = Vec::with_capacity(i + j);
    while i > 0 || j > 0 {
        if i == 0 {
            edits.push(EditOp::Add);
            j -= 1;
            continue;
        }
        if j == 0 {
            edits.push(EditOp::Delete);
            i -= 1;
            continue;
        }
        let north_west = distances[i - 1][j - 1];
        let west = distances[i - 1][j];
        let north = distances[i][j - 1];

        let min = if west < north {
            west.min(north_west)
        } else {
            north.min(north_west)
        };

        if min == north_west {
            if north_west == current {
                edits.push(EditOp::Leave);
            } else {
                edits.push(EditOp::Update);
                current = north_west;
            }
            i -= 1;
            j -= 1;
        } else if min == west {
            edits.push(EditOp::Delete);
            i -= 1;
            current = west;
        } else {
            edits.push(EditOp::Add);
            j -= 1;
            current = north;
        }
    }
    edits.reverse();
    edits
}

fn shared_prefix(a: &[Value], b: &[Value], search_length: usize) -> usize {
    (0..search_length).find(|&i| a[i] != b[i]).unwrap_or(search_length)
}

fn shared_suffix(a: &[Value], b: &[Value], search_length: usize) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take(search_length)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Splices turning `old[old_range]` into `current[current_range]`.
///
/// Shared prefixes are stripped only when both ranges start at 0 and shared
/// suffixes only when both ranges end at their sequence's end. Items compare
/// with strict equality.
///
/// # Example
///
/// ```
/// use change_summary::{calc_splices, Splice};
/// use change_summary_model::Value;
///
/// let old: Vec<Value> = [1, 2, 3].map(Value::from).to_vec();
/// let current: Vec<Value> = [1, 9, 9, 3].map(Value::from).to_vec();
/// assert_eq!(
///     calc_splices(&current, 0..4, &old, 0..3),
///     vec![Splice::new(1, vec![Value::from(2)], 2)]
/// );
/// ```
pub fn calc_splices(
    current: &[Value],
    current_range: Range<usize>,
    old: &[Value],
    old_range: Range<usize>,
) -> Vec<Splice> {
    let Range {
        start: mut current_start,
        end: mut current_end,
    } = current_range;
    let Range {
        start: mut old_start,
        end: mut old_end,
    } = old_range;

    let min_length = (current_end - current_start).min(old_end - old_start);
    let mut prefix_count = 0;
    let mut suffix_count = 0;
    if current_start == 0 && old_start == 0 {
        prefix_count = shared_prefix(current, old, min_length);
    }
    if current_end == current.len() && old_end == old.len() {
        suffix_count = shared_suffix(current, old, min_length - prefix_count);
    }

    current_start += prefix_count;
    old_start += prefix_count;
    current_end -= suffix_count;
    old_end -= suffix_count;

    if current_start == current_end && old_start == old_end {
        return Vec::new();
    }
    if current_start == current_end {
        return vec![Splice::new(
            current_start,
            old[old_start..old_end].to_vec(),
            0,
        )];
    }
    if old_start == old_end {
        return vec![Splice::new(current_start, Vec::new(), current_end - current_start)];
    }

    let ops = edit_ops(&calc_edit_distances(
        current,
        current_start..current_end,
        old,
        old_start..old_end,
    ));

    let mut splices = Vec::new();
    let mut splice: Option<Splice> = None;
    let mut index = current_start;
    let mut old_index = old_start;
    for op in ops {
        match op {
            EditOp::Leave => {
                if let Some(done) = splice.take() {
                    splices.push(done);
                }
                index += 1;
                old_index += 1;
            }
            EditOp::Update => {
                let open = splice.get_or_insert_with(|| Splice::new(index, Vec::new(), 0));
                open.added_count += 1;
                open.removed.push(old[old_index].clone());
                index += 1;
                old_index += 1;
            }
            EditOp::Add => {
                let open = splice.get_or_insert_with(|| Splice::new(index, Vec::new(), 0));
                open.added_count += 1;
                index += 1;
            }
            EditOp::Delete => {
                let open = splice.get_or_insert_with(|| Splice::new(index, Vec::new(), 0));
                open.removed.push(old[old_index].clone());
                old_index += 1;
            }
        }
    }
    if let Some(done) = splice {
        splices.push(done);
    }
    splices
}

/// Splices turning `previous` into `current`, over both full arrays.
pub fn calculate_splices(current: &[Value], previous: &[Value]) -> Vec<Splice> {
    calc_splices(current, 0..current.len(), previous, 0..previous.len())
}

/// Overlap of two half-open spans: `None` when disjoint, `Some(0)` when
/// adjacent, otherwise the number of shared positions.
fn intersect(start1: usize, end1: usize, start2: usize, end2: usize) -> Option<usize> {
    if end1 < start2 || end2 < start1 {
        return None;
    }
    if end1 == start2 || end2 == start1 {
        return Some(0);
    }
    if start1 < start2 {
        if end1 < end2 {
            Some(end1 - start2)
        } else {
            Some(end2 - start2)
        }
    } else if end2 < end1 {
        Some(end2 - start1)
    } else {
        Some(end1 - start1)
    }
}

fn shift(index: usize, offset: isize) -> usize {
    index.checked_add_signed(offset).unwrap_or(0)
}

/// Merges one splice (expressed against the array state after every splice
/// already in `splices`) into the ascending list.
///
/// Overlapping or adjacent splices are combined; a combination that adds and
/// removes nothing is dropped. Splices after an inserted one are shifted by
/// its length delta.
pub fn merge_splice(splices: &mut Vec<Splice>, index: usize, removed: Vec<Value>, added_count: usize) {
    let mut pending = Some(Splice::new(index, removed, added_count));
    let mut insertion_offset: isize = 0;
    let mut i = 0;

    while i < splices.len() {
        splices[i].index = shift(splices[i].index, insertion_offset);

        let Some(splice) = pending.as_mut() else {
            i += 1;
            continue;
        };

        let current = &splices[i];
        let intersect_count = intersect(
            splice.index,
            splice.index + splice.removed.len(),
            current.index,
            current.index + current.added_count,
        );

        if let Some(intersect_count) = intersect_count {
            let current = splices.remove(i);
            insertion_offset -= current.delta();

            splice.added_count += current.added_count - intersect_count;
            let delete_count = splice.removed.len() + current.removed.len() - intersect_count;

            if splice.added_count == 0 && delete_count == 0 {
                pending = None;
                continue;
            }

            let mut removed = current.removed;
            if splice.index < current.index {
                let cut = (current.index - splice.index).min(splice.removed.len());
                let mut prepend = splice.removed[..cut].to_vec();
                prepend.append(&mut removed);
                removed = prepend;
            }
            let current_end = current.index + current.added_count;
            if splice.index + splice.removed.len() > current_end {
                let from = current_end.saturating_sub(splice.index);
                removed.extend_from_slice(&splice.removed[from..]);
            }
            splice.removed = removed;
            if current.index < splice.index {
                splice.index = current.index;
            }
        } else if splice.index < current.index {
            let offset = splice.delta();
            if let Some(splice) = pending.take() {
                splices.insert(i, splice);
            }
            i += 1;
            splices[i].index = shift(splices[i].index, offset);
            insertion_offset += offset;
            i += 1;
        } else {
            i += 1;
        }
    }

    if let Some(splice) = pending {
        splices.push(splice);
    }
}

/// Folds a mutation log into an ascending splice list.
///
/// Index-named `New`/`Updated`/`Deleted` records count as one-item
/// replacements; other property records are ignored.
pub fn create_initial_splices(records: &[ChangeRecord]) -> Vec<Splice> {
    let mut splices = Vec::new();
    for record in records {
        match record {
            ChangeRecord::Splice {
                index,
                removed,
                added_count,
            } => merge_splice(&mut splices, *index, removed.clone(), *added_count),
            ChangeRecord::New { name }
            | ChangeRecord::Updated { name, .. }
            | ChangeRecord::Deleted { name, .. } => {
                let Some(index) = index_key(name) else {
                    continue;
                };
                let old_value = record.old_value().cloned().unwrap_or_default();
                merge_splice(&mut splices, index, vec![old_value], 1);
            }
        }
    }
    splices
}

/// Turns a mutation log of `array` into minimal splices.
///
/// Merged splices are refined against the current contents; one-item
/// replacements survive only if the item actually differs.
pub fn project_array_splices(array: &[Value], records: &[ChangeRecord]) -> Vec<Splice> {
    let mut splices = Vec::new();
    for splice in create_initial_splices(records) {
        if splice.added_count == 1 && splice.removed.len() == 1 {
            let now = array.get(splice.index).cloned().unwrap_or_default();
            if splice.removed[0] != now {
                splices.push(splice);
            }
            continue;
        }
        let end = (splice.index + splice.added_count).min(array.len());
        let start = splice.index.min(end);
        splices.extend(calc_splices(
            array,
            start..end,
            &splice.removed,
            0..splice.removed.len(),
        ));
    }
    splices
}

/// Replays `splices` on `previous`, taking added items from `current`.
///
/// Ranges past the end of either array are clamped; missing items are
/// `undefined`.
pub fn apply_splices(previous: &mut Vec<Value>, current: &[Value], splices: &[Splice]) {
    for splice in splices {
        let start = splice.index.min(previous.len());
        let end = (splice.index + splice.removed.len()).min(previous.len());
        let added = splice
            .added_range()
            .map(|i| current.get(i).cloned().unwrap_or_default());
        previous.splice(start..end, added);
    }
}
