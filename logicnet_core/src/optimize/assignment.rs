//! Solves (rectangular) minimum cost assignment problems with the Kuhn-Munkres solver of
//! the pathfinding crate
use nalgebra::DMatrix;
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

/// Find a minimum cost assignment of rows to columns
///
/// Every row is assigned a distinct column when there are at most as many rows as columns,
/// otherwise every column is assigned a distinct row.
///
/// # Parameters
/// - `costs`: Matrix where `costs[(row, col)]` is the cost of assigning `row` to `col`
///
/// # Returns
/// Vec of (row, column) pairs, sorted by row
///
/// # Note:
/// The solver is deterministic, so for a given matrix the returned assignment is always
/// the same, including when several assignments share the minimum cost.
pub fn minimum_cost_assignment(costs: &DMatrix<i64>) -> Vec<(usize, usize)> {
    if costs.nrows() == 0 || costs.ncols() == 0 {
        return Vec::new();
    }
    // The solver needs at least as many columns as rows
    let transposed = costs.nrows() > costs.ncols();
    let weights = if transposed {
        to_weights(&costs.transpose())
    } else {
        to_weights(costs)
    };
    let (_, columns) = kuhn_munkres_min(&weights);
    let mut pairs: Vec<(usize, usize)> = columns
        .into_iter()
        .enumerate()
        .map(|(row, col)| if transposed { (col, row) } else { (row, col) })
        .collect();
    pairs.sort_unstable();
    pairs
}

/// Total cost of an assignment
pub fn assignment_cost(costs: &DMatrix<i64>, assignment: &[(usize, usize)]) -> i64 {
    assignment.iter().map(|&(row, col)| costs[(row, col)]).sum()
}

fn to_weights(costs: &DMatrix<i64>) -> Matrix<i64> {
    let mut weights = Matrix::new(costs.nrows(), costs.ncols(), 0i64);
    for row in 0..costs.nrows() {
        for col in 0..costs.ncols() {
            weights[(row, col)] = costs[(row, col)];
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square() {
        let costs = DMatrix::from_row_slice(3, 3, &[4, 1, 3, 2, 0, 5, 3, 2, 2]);
        let assignment = minimum_cost_assignment(&costs);
        assert_eq!(assignment, vec![(0, 1), (1, 0), (2, 2)]);
        assert_eq!(assignment_cost(&costs, &assignment), 5);
    }

    #[test]
    fn identity_is_free() {
        let costs = DMatrix::from_fn(4, 4, |i, j| if i == j { 0 } else { 3 });
        let assignment = minimum_cost_assignment(&costs);
        assert_eq!(assignment, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn wide() {
        let costs = DMatrix::from_row_slice(2, 3, &[1, 2, 3, 2, 4, 6]);
        let assignment = minimum_cost_assignment(&costs);
        assert_eq!(assignment, vec![(0, 1), (1, 0)]);
        assert_eq!(assignment_cost(&costs, &assignment), 4);
    }

    #[test]
    fn tall() {
        let costs = DMatrix::from_row_slice(3, 2, &[1, 2, 2, 4, 3, 6]);
        let assignment = minimum_cost_assignment(&costs);
        assert_eq!(assignment, vec![(0, 1), (1, 0)]);
        assert_eq!(assignment_cost(&costs, &assignment), 4);
    }

    #[test]
    fn empty() {
        let costs: DMatrix<i64> = DMatrix::zeros(0, 3);
        assert!(minimum_cost_assignment(&costs).is_empty());
    }

    #[test]
    fn ties_are_resolved_the_same_way() {
        let costs = DMatrix::from_element(3, 3, 1i64);
        let first = minimum_cost_assignment(&costs);
        assert_eq!(first.len(), 3);
        assert_eq!(assignment_cost(&costs, &first), 3);
        assert_eq!(first, minimum_cost_assignment(&costs));
    }
}
