//! Exact route solver: shortest Hamiltonian cycle via Held–Karp.
//!
//! State space is (visited subset, last stop) over a dense matrix whose
//! index 0 is the depot. O(n² · 2ⁿ) time and O(n · 2ⁿ) space, so callers
//! must keep matrices small; see [`MAX_EXACT_NODES`].

use tracing::debug;

use crate::error::PlanError;

/// Largest matrix (depot included) the solver accepts.
pub const MAX_EXACT_NODES: usize = 18;

const NO_PARENT: u8 = u8::MAX;

/// An optimal closed tour.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    /// Matrix indices in visiting order, starting and ending at 0.
    pub order: Vec<usize>,
    pub cost: f64,
}

/// Compute the minimum-cost cycle that starts at index 0, visits every other
/// index exactly once and returns to 0.
pub fn solve_tour(matrix: &[Vec<f64>]) -> Result<Tour, PlanError> {
    let n = matrix.len();
    if n == 0 {
        return Err(PlanError::invalid("distance matrix must contain at least one point"));
    }
    if n > MAX_EXACT_NODES {
        return Err(PlanError::invalid(format!(
            "{} points exceed the exact solver limit of {}",
            n, MAX_EXACT_NODES
        )));
    }
    validate_matrix(matrix)?;

    if n == 1 {
        return Ok(Tour {
            order: vec![0, 0],
            cost: 0.0,
        });
    }

    let full = (1usize << n) - 1;
    debug!(points = n, states = (full + 1) * n, "solving exact tour");

    // cost[mask * n + last]: cheapest path from 0 covering `mask`, ending at `last`.
    let mut cost = vec![f64::INFINITY; (full + 1) * n];
    let mut parent = vec![NO_PARENT; (full + 1) * n];
    // Start at the depot: mask {0}, last 0.
    cost[n] = 0.0;

    // Only masks containing the depot are reachable.
    for mask in (1..=full).step_by(2) {
        for last in 0..n {
            if mask & (1 << last) == 0 {
                continue;
            }
            let here = cost[mask * n + last];
            if here.is_infinite() {
                continue;
            }
            for next in 1..n {
                if mask & (1 << next) != 0 {
                    continue;
                }
                let step = here + matrix[last][next];
                let slot = (mask | (1 << next)) * n + next;
                if step < cost[slot] {
                    cost[slot] = step;
                    parent[slot] = last as u8;
                }
            }
        }
    }

    let mut best = f64::INFINITY;
    let mut best_last = None;
    for last in 1..n {
        let total = cost[full * n + last] + matrix[last][0];
        if total < best {
            best = total;
            best_last = Some(last);
        }
    }

    let Some(mut last) = best_last else {
        return Err(PlanError::NoFeasibleRoute(
            "no finite-cost cycle through all points".to_string(),
        ));
    };

    let mut order = Vec::with_capacity(n + 1);
    order.push(0);
    let mut mask = full;
    while last != 0 {
        order.push(last);
        let prev = parent[mask * n + last];
        if prev == NO_PARENT {
            return Err(PlanError::Unexpected("broken predecessor chain".to_string()));
        }
        mask &= !(1 << last);
        last = prev as usize;
    }
    order.push(0);
    // Backtracking yields the tour back to front.
    order.reverse();

    Ok(Tour { order, cost: best })
}

fn validate_matrix(matrix: &[Vec<f64>]) -> Result<(), PlanError> {
    let n = matrix.len();
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(PlanError::invalid(format!(
                "distance matrix row {} has {} entries, expected {}",
                i,
                row.len(),
                n
            )));
        }
        if row.iter().any(|value| value.is_nan() || *value < 0.0) {
            return Err(PlanError::invalid(format!(
                "distance matrix row {} has a negative or NaN entry",
                i
            )));
        }
    }
    Ok(())
}
