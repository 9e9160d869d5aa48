//! Hungarian Algorithm for Optimal Assignment
//!
//! Implementation of the Hungarian (Kuhn-Munkres) algorithm for solving
//! the linear assignment problem in O(n³) time.

use crate::{Error, Result};

/// Result of an assignment problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Assignment mapping: row i is assigned to column mapping[i]
    /// None means the row is unassigned
    pub mapping: Vec<Option<usize>>,
    /// Total cost of the assignment
    pub cost: f64,
}

impl Assignment {
    /// Creates a new assignment with the given mapping and cost.
    pub fn new(mapping: Vec<Option<usize>>, cost: f64) -> Self {
        Self { mapping, cost }
    }

    /// Returns the number of assigned pairs.
    pub fn num_assigned(&self) -> usize {
        self.mapping.iter().filter(|x| x.is_some()).count()
    }

    /// Returns an iterator over (row, col) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mapping
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|c| (row, c)))
    }
}

/// Cost matrix for assignment problems.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    /// Row-major cost data
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl CostMatrix {
    /// Creates a cost matrix from row-major data.
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::AssignmentFailed);
        }
        Ok(Self { data, rows, cols })
    }

    /// Builds a `rows x cols` matrix by evaluating `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { data, rows, cols }
    }

    /// Creates a zero-filled cost matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Gets the cost at (row, col).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Sets the cost at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// True when every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|c| c.is_finite())
    }
}

/// Solves the linear assignment problem using the Hungarian algorithm.
///
/// Finds an assignment of `min(rows, cols)` pairs that minimizes total cost.
/// Rectangular problems are padded to square with zero-cost dummy rows,
/// which leaves the optimum over real pairs unchanged.
///
/// Rows are inserted in index order and each column scan keeps the first
/// minimum, so ties favour lower indices and the result is a pure function of
/// the matrix.
///
/// # Errors
/// [`Error::AssignmentFailed`] if any cost is NaN or infinite.
pub fn hungarian(cost: &CostMatrix) -> Result<Assignment> {
    let n_rows = cost.rows();
    let n_cols = cost.cols();

    if n_rows == 0 || n_cols == 0 {
        return Ok(Assignment::new(vec![None; n_rows], 0.0));
    }
    if !cost.is_finite() {
        return Err(Error::AssignmentFailed);
    }

    // Keep dummy padding on the rows, which are inserted last, so real rows
    // get first pick of tied columns.
    if n_rows > n_cols {
        let transposed = CostMatrix::from_fn(n_cols, n_rows, |i, j| cost.get(j, i));
        let solved = hungarian(&transposed)?;
        let mut mapping = vec![None; n_rows];
        for (col, row) in solved.pairs() {
            mapping[row] = Some(col);
        }
        return Ok(Assignment::new(mapping, solved.cost));
    }

    let n = n_cols;

    let mut matrix = vec![0.0_f64; n * n];
    for i in 0..n_rows {
        for j in 0..n_cols {
            matrix[i * n + j] = cost.get(i, j);
        }
    }

    // Dual variables
    let mut u = vec![0.0_f64; n];
    let mut v = vec![0.0_f64; n];

    let mut col_assignment: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        // Minimum reduced cost to reach each column, and the previous column
        // on the augmenting path
        let mut min_to = vec![f64::INFINITY; n];
        let mut way = vec![None::<usize>; n];
        let mut used = vec![false; n];

        let mut cur_row = i;
        let mut cur_col: Option<usize> = None;

        // Dijkstra-like search for an augmenting path from row i
        loop {
            let mut min_val = f64::INFINITY;
            let mut min_col = 0;

            for j in 0..n {
                if used[j] {
                    continue;
                }

                let reduced_cost = matrix[cur_row * n + j] - u[cur_row] - v[j];
                if reduced_cost < min_to[j] {
                    min_to[j] = reduced_cost;
                    way[j] = cur_col;
                }
                if min_to[j] < min_val {
                    min_val = min_to[j];
                    min_col = j;
                }
            }

            for j in 0..n {
                if used[j] {
                    if let Some(r) = col_assignment[j] {
                        u[r] += min_val;
                    }
                    v[j] -= min_val;
                } else {
                    min_to[j] -= min_val;
                }
            }
            u[i] += min_val;

            used[min_col] = true;
            cur_col = Some(min_col);

            match col_assignment[min_col] {
                Some(next_row) => cur_row = next_row,
                None => break,
            }
        }

        // Flip the augmenting path
        while let Some(col) = cur_col {
            let prev_col = way[col];
            col_assignment[col] = match prev_col {
                Some(pc) => col_assignment[pc],
                None => Some(i),
            };
            cur_col = prev_col;
        }
    }

    let mut mapping = vec![None; n_rows];
    for (j, row) in col_assignment.iter().enumerate().take(n_cols) {
        if let Some(i) = *row {
            if i < n_rows {
                mapping[i] = Some(j);
            }
        }
    }

    let total_cost = mapping
        .iter()
        .enumerate()
        .filter_map(|(i, j)| j.map(|j| cost.get(i, j)))
        .sum();

    Ok(Assignment::new(mapping, total_cost))
}

/// Solves the assignment problem with a gating threshold.
///
/// Pairs whose cost exceeds `gate_threshold` are replaced by a gate cost
/// larger than any feasible total of admissible pairs, so the solver first
/// maximizes the number of admissible pairs and then minimizes their total
/// cost. Any gated pair still chosen (because nothing better existed for
/// that row) is reverted to unassigned.
pub fn hungarian_gated(cost: &CostMatrix, gate_threshold: f64) -> Result<Assignment> {
    if !cost.is_finite() || gate_threshold.is_nan() {
        return Err(Error::AssignmentFailed);
    }

    let admissible_max = (0..cost.rows())
        .flat_map(|i| (0..cost.cols()).map(move |j| (i, j)))
        .map(|(i, j)| cost.get(i, j))
        .filter(|c| *c <= gate_threshold)
        .fold(0.0_f64, |acc, c| acc.max(c.abs()));
    let pairs = cost.rows().min(cost.cols()) as f64;
    let gate_cost = (admissible_max + 1.0) * (pairs + 1.0);

    let mut gated = CostMatrix::zeros(cost.rows(), cost.cols());
    for i in 0..cost.rows() {
        for j in 0..cost.cols() {
            let c = cost.get(i, j);
            gated.set(i, j, if c <= gate_threshold { c } else { gate_cost });
        }
    }

    let mut result = hungarian(&gated)?;

    for (i, slot) in result.mapping.iter_mut().enumerate() {
        if let Some(j) = *slot {
            if cost.get(i, j) > gate_threshold {
                *slot = None;
            }
        }
    }

    result.cost = result.pairs().map(|(i, j)| cost.get(i, j)).sum();

    Ok(result)
}
