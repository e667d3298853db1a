//! Top-k eigenpair selection.
//!
//! A fixed-size min-heap keeps the k largest eigenvalues in one pass over
//! the spectrum, independent of how the backend orders it. Ties resolve to
//! the lower column index, so a selection is deterministic and never picks
//! the same column twice.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ndarray::{Array2, ArrayView1, ArrayView2};

#[derive(Debug, Clone, Copy)]
struct Candidate {
    value: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // larger eigenvalue wins; on a tie the lower index wins
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indices of the k largest eigenvalues, best first.
///
/// Asking for more components than the spectrum holds returns everything.
pub fn top_indices(values: ArrayView1<'_, f64>, k: usize) -> Vec<usize> {
    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
    for (index, &value) in values.iter().enumerate() {
        heap.push(Reverse(Candidate { value, index }));
        if heap.len() > k {
            heap.pop();
        }
    }

    let mut picked: Vec<Candidate> = heap.into_iter().map(|Reverse(c)| c).collect();
    picked.sort_by(|a, b| b.cmp(a));
    picked.into_iter().map(|c| c.index).collect()
}

/// Percentage of total variance carried by the selected eigenvalues.
///
/// A zero spectrum has no variance to attribute, so it reports 0 rather
/// than dividing by zero.
pub fn percent_variance(values: ArrayView1<'_, f64>, selected: &[usize]) -> f64 {
    let total: f64 = values.sum();
    if total == 0.0 {
        return 0.0;
    }
    let picked: f64 = selected.iter().map(|&i| values[i]).sum();
    100.0 * picked / total
}

/// Stack the selected eigenvectors as basis rows.
///
/// `vectors` holds eigenvectors as columns; the result holds one per row,
/// in selection order, ready to ship as the projection basis.
pub fn basis(vectors: ArrayView2<'_, f64>, selected: &[usize]) -> Array2<f64> {
    let mut rows = Array2::zeros((selected.len(), vectors.nrows()));
    for (r, &i) in selected.iter().enumerate() {
        rows.row_mut(r).assign(&vectors.column(i));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_two_of_four() {
        let values = array![5.0, 3.0, 9.0, 1.0];
        assert_eq!(top_indices(values.view(), 2), vec![2, 0]);
    }

    #[test]
    fn test_percent_of_top_two() {
        let values = array![5.0, 3.0, 9.0, 1.0];
        let selected = top_indices(values.view(), 2);
        let percent = percent_variance(values.view(), &selected);
        // 100 * 14 / 18
        assert!((percent - 77.777_777_777_777_78).abs() < 1.0e-9);
    }

    #[test]
    fn test_top_one() {
        let values = array![5.0, 3.0, 9.0, 1.0];
        assert_eq!(top_indices(values.view(), 1), vec![2]);
    }

    #[test]
    fn test_k_larger_than_spectrum() {
        let values = array![5.0, 3.0, 9.0, 1.0];
        assert_eq!(top_indices(values.view(), 10), vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_ties_resolve_to_lower_index() {
        let values = array![7.0, 7.0, 1.0];
        assert_eq!(top_indices(values.view(), 1), vec![0]);
        assert_eq!(top_indices(values.view(), 2), vec![0, 1]);
    }

    #[test]
    fn test_empty_spectrum() {
        let values = array![];
        assert_eq!(top_indices(values.view(), 2), Vec::<usize>::new());
        assert_eq!(percent_variance(values.view(), &[]), 0.0);
    }

    #[test]
    fn test_zero_spectrum_has_no_variance() {
        let values = array![0.0, 0.0];
        let selected = top_indices(values.view(), 2);
        assert_eq!(percent_variance(values.view(), &selected), 0.0);
    }

    #[test]
    fn test_basis_rows_are_selected_columns() {
        // columns: e0 = [1,0], e1 = [0,1]
        let vectors = array![[1.0, 0.0], [0.0, 1.0]];
        let b = basis(vectors.view(), &[1, 0]);
        assert_eq!(b, array![[0.0, 1.0], [1.0, 0.0]]);
    }
}
