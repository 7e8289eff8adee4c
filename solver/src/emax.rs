//! Per-state EMAX: probability weighting of next-period values and Monte Carlo
//! integration of the wage shock.

use crate::budget::FlowUtility;
use crate::child_index::ChildIndexGrid;
use crate::constants::*;
use crate::types::{EMAX_COLUMN, EMAX_COLUMNS};

/// Expected next-period EMAX of one choice.
///
/// `grid[c][p]` holds the EMAX of the successor with child outcome `c`
/// (1 = arrival) and next partner status `p`. Child arrival and partner
/// transition are independent given the state, so the weight of each cell is
/// the product of the marginal probabilities.
#[inline(always)]
pub fn weight_emax(
    grid: &[[f64; NUM_PARTNER_STATES]; NUM_CHILD_OUTCOMES],
    prob_child: f64,
    prob_partner: &[f64; NUM_PARTNER_STATES],
) -> f64 {
    let child = [1.0 - prob_child, prob_child];
    let mut total = 0.0;
    for c in 0..NUM_CHILD_OUTCOMES {
        for p in 0..NUM_PARTNER_STATES {
            total += child[c] * prob_partner[p] * grid[c][p];
        }
    }
    total
}

/// Weighted continuation value of every choice.
///
/// `later_emax` is the row-major EMAX buffer of all states with id
/// `>= later_offset`; every target in `grid` must lie in that range.
#[inline(always)]
pub fn continuation_values(
    grid: &ChildIndexGrid,
    later_emax: &[f64],
    later_offset: usize,
    prob_child: f64,
    prob_partner: &[f64; NUM_PARTNER_STATES],
) -> [f64; NUM_CHOICES] {
    let mut out = [0.0; NUM_CHOICES];
    for choice in 0..NUM_CHOICES {
        let mut values = [[0.0; NUM_PARTNER_STATES]; NUM_CHILD_OUTCOMES];
        for c in 0..NUM_CHILD_OUTCOMES {
            for p in 0..NUM_PARTNER_STATES {
                let target = grid[choice][c][p];
                debug_assert!(
                    target >= 0 && target as usize >= later_offset,
                    "child index {} does not lie in a later period (offset {})",
                    target,
                    later_offset
                );
                let local = target as usize - later_offset;
                values[c][p] = later_emax[local * EMAX_COLUMNS + EMAX_COLUMN];
            }
        }
        out[choice] = weight_emax(&values, prob_child, prob_partner);
    }
    out
}

/// Fill one EMAX row: continuation values in the choice columns and the Monte
/// Carlo average of the per-draw maximum choice value in the last column.
pub fn construct_emax(
    delta: f64,
    flow: &FlowUtility<'_>,
    draws: &[f64],
    continuation: &[f64; NUM_CHOICES],
    row: &mut [f64],
) {
    debug_assert_eq!(row.len(), EMAX_COLUMNS);

    let value_non_employment = flow.non_employment() + delta * continuation[CHOICE_NON_EMPLOYMENT];
    let mut sum = 0.0;
    for &draw in draws {
        let mut best = value_non_employment;
        for choice in [CHOICE_PART_TIME, CHOICE_FULL_TIME] {
            let value = flow.employment(choice, draw) + delta * continuation[choice];
            if value > best {
                best = value;
            }
        }
        sum += best;
    }

    row[..NUM_CHOICES].copy_from_slice(continuation);
    row[EMAX_COLUMN] = sum / draws.len() as f64;
}
