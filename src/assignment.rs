//! Greedy detection-to-track assignment.

use nalgebra::DMatrix;

/// Greedily assign each row to its cheapest still-unassigned column.
///
/// Rows are visited in index order; for each row the unused column with the
/// lowest cost is taken, ties broken by the first-encountered column. This is
/// a heuristic, not a globally optimal bipartite matching: an early row can
/// take a column a later row would have matched better.
///
/// Returns `(row, col)` pairs in row order. Rows and columns absent from the
/// result had no available candidate.
pub fn greedy_assignment(costs: &DMatrix<f64>) -> Vec<(usize, usize)> {
    let n_rows = costs.nrows();
    let n_cols = costs.ncols();

    let mut assigned = Vec::new();
    let mut used_cols = vec![false; n_cols];

    for row in 0..n_rows {
        let mut min_cost = f64::INFINITY;
        let mut min_col = None;

        for col in 0..n_cols {
            if !used_cols[col] && costs[(row, col)] < min_cost {
                min_cost = costs[(row, col)];
                min_col = Some(col);
            }
        }

        if let Some(col) = min_col {
            used_cols[col] = true;
            assigned.push((row, col));
        }
    }

    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_minimum() {
        let costs = DMatrix::from_row_slice(3, 3, &[
            0.1, 0.9, 0.8,
            0.9, 0.2, 0.7,
            0.8, 0.7, 0.3,
        ]);
        assert_eq!(greedy_assignment(&costs), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_row_order_not_globally_optimal() {
        // Row 0 takes column 0 (its minimum), forcing row 1 onto the
        // expensive column even though swapping would be cheaper overall.
        let costs = DMatrix::from_row_slice(2, 2, &[
            1.0, 2.0,
            1.1, 100.0,
        ]);
        assert_eq!(greedy_assignment(&costs), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_ties_break_to_first_column() {
        let costs = DMatrix::from_row_slice(1, 3, &[5.0, 5.0, 5.0]);
        assert_eq!(greedy_assignment(&costs), vec![(0, 0)]);
    }

    #[test]
    fn test_more_rows_than_cols() {
        let costs = DMatrix::from_row_slice(3, 1, &[
            0.5,
            0.2,
            0.1,
        ]);
        // Only one column exists; row 0 claims it first
        assert_eq!(greedy_assignment(&costs), vec![(0, 0)]);
    }

    #[test]
    fn test_more_cols_than_rows() {
        let costs = DMatrix::from_row_slice(1, 3, &[0.9, 0.1, 0.5]);
        assert_eq!(greedy_assignment(&costs), vec![(0, 1)]);
    }

    #[test]
    fn test_empty_matrix() {
        let costs = DMatrix::zeros(0, 0);
        assert!(greedy_assignment(&costs).is_empty());
    }
}
