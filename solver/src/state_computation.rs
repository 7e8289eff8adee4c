//! Backward induction: compute the EMAX table for all states.
//!
//! Periods are processed in decreasing order, from the terminal period down to
//! period 0. The EMAX of a period-`t` state reads only the EMAX of its
//! period-`t + 1` successors, which are already computed.
//!
//! Each period is parallelized with rayon. Because ids are assigned
//! period-major, the EMAX buffer is split at the end of the current period:
//! the head holds the rows being written (one row per task), the tail the
//! already-solved later periods, read-only. The split makes the dependency
//! order a borrow-checker guarantee and needs no unsafe writes.

use std::time::Instant;

use rayon::prelude::*;

use crate::budget::{non_employment_consumption_resources, FlowUtility, TaxSystem};
use crate::constants::*;
use crate::draws::DrawPanel;
use crate::emax::{construct_emax, continuation_values};
use crate::exogenous::ExogenousProcesses;
use crate::types::{EmaxTable, ModelContext, EMAX_COLUMNS};
use crate::utility::{UtilityComponents, UtilityEngine};

/// Everything the solver reads. All of it is immutable during the solve.
pub struct SolveInputs<'a> {
    pub ctx: &'a ModelContext,
    pub utility: &'a UtilityComponents,
    pub draws: &'a DrawPanel,
    pub exogenous: &'a ExogenousProcesses,
    /// Household resources in non-employment, one value per state.
    pub non_employment_resources: &'a [f64],
    pub tax: &'a (dyn TaxSystem + Sync),
}

impl SolveInputs<'_> {
    /// Panic on any shape mismatch between the state space and the
    /// collaborator-supplied arrays.
    fn assert_shapes(&self) {
        let spec = &self.ctx.spec;
        let num_states = self.ctx.num_states();
        assert_eq!(self.ctx.covariates.len(), num_states, "covariates / states mismatch");
        assert_eq!(self.ctx.child_indexes.len(), num_states, "child indexes / states mismatch");
        assert_eq!(
            self.utility.log_wage_systematic.len(),
            num_states,
            "log wages / states mismatch"
        );
        assert_eq!(
            self.utility.non_consumption_utilities.len(),
            num_states,
            "non-consumption utilities / states mismatch"
        );
        assert_eq!(
            self.non_employment_resources.len(),
            num_states,
            "non-employment resources / states mismatch"
        );
        assert_eq!(self.draws.num_periods(), spec.num_periods, "draw panel periods mismatch");
        assert_eq!(self.draws.num_draws(), spec.num_draws_emax, "draw panel size mismatch");
        assert_eq!(self.ctx.space.num_periods(), spec.num_periods, "period ranges mismatch");
    }
}

/// Solve one state into its EMAX row.
///
/// `later_emax` is the EMAX buffer of all states with id `>= later_offset`.
fn solve_state(
    inputs: &SolveInputs<'_>,
    state_id: usize,
    is_terminal: bool,
    draws: &[f64],
    later_emax: &[f64],
    later_offset: usize,
    row: &mut [f64],
) {
    let ctx = inputs.ctx;
    let spec = &ctx.spec;
    let state = &ctx.space.states[state_id];
    let covariates = ctx.covariates.get(state_id);

    // No successors in the last period: continuation values are exactly zero.
    let continuation = if is_terminal {
        [0.0; NUM_CHOICES]
    } else {
        continuation_values(
            ctx.child_indexes.grid(state_id),
            later_emax,
            later_offset,
            inputs.exogenous.prob_child(state.period, state.educ_level),
            inputs.exogenous.prob_partner(state.period, state.educ_level, state.partner),
        )
    };

    let flow = FlowUtility {
        tax: inputs.tax,
        mu: spec.mu,
        log_wage_systematic: inputs.utility.log_wage_systematic[state_id],
        non_consumption_utilities: inputs.utility.non_consumption_utilities[state_id],
        covariates,
        child_care_costs: spec.child_care_costs[covariates.child_care_index()],
        non_employment_resources: inputs.non_employment_resources[state_id],
    };

    construct_emax(spec.delta, &flow, draws, &continuation, row);
}

/// Compute the EMAX table by backward induction over periods.
pub fn backward_induction(inputs: &SolveInputs<'_>) -> EmaxTable {
    inputs.assert_shapes();

    let ctx = inputs.ctx;
    let num_periods = ctx.spec.num_periods;
    let mut emax = EmaxTable::zeros(ctx.num_states());

    println!("=== Starting Backward Induction ===");
    println!(
        "Total states: {} over {} periods, {} draws per state",
        ctx.num_states(),
        num_periods,
        inputs.draws.num_draws()
    );

    let total_start = Instant::now();

    for period in (0..num_periods).rev() {
        let period_start = Instant::now();
        let range = ctx.space.period_range(period);
        let (first, end) = (range.start, range.end);
        let is_terminal = period == num_periods - 1;
        let draws = inputs.draws.period(period);

        // head: rows of periods <= t, tail: rows of periods > t (already solved).
        let (head, tail) = emax.as_mut_slice().split_at_mut(end * EMAX_COLUMNS);
        let current = &mut head[first * EMAX_COLUMNS..];
        let later: &[f64] = tail;

        current
            .par_chunks_mut(EMAX_COLUMNS)
            .enumerate()
            .for_each(|(offset, row)| {
                solve_state(inputs, first + offset, is_terminal, draws, later, end, row);
            });

        let dur = period_start.elapsed().as_secs_f64();
        println!(
            "Period {:3} completed: {:7} states in {:.3} s ({:.0} states/sec)",
            period,
            end - first,
            dur,
            (end - first) as f64 / dur.max(1e-9)
        );
    }

    let total_time = total_start.elapsed().as_secs_f64();
    println!("\n=== Backward Induction Complete ===");
    println!(
        "Total computation time: {:.2} seconds ({:.0} states/second)",
        total_time,
        ctx.num_states() as f64 / total_time.max(1e-9)
    );

    emax
}

/// Non-employment resources and EMAX table of a solved model.
pub struct Solution {
    pub non_employment_resources: Vec<f64>,
    pub emax: EmaxTable,
}

/// Full solve: utility components from `engine`, non-employment resources from
/// `tax` plus the flat benefit in `ctx.spec`, then backward induction.
pub fn solve<U: UtilityEngine + ?Sized>(
    ctx: &ModelContext,
    engine: &U,
    tax: &(dyn TaxSystem + Sync),
    exogenous: &ExogenousProcesses,
    draws: &DrawPanel,
) -> Solution {
    let utility = engine.components(&ctx.space, &ctx.covariates);
    let non_employment_resources =
        non_employment_consumption_resources(tax, &ctx.covariates, ctx.spec.non_employment_benefit);

    let emax = backward_induction(&SolveInputs {
        ctx,
        utility: &utility,
        draws,
        exogenous,
        non_employment_resources: &non_employment_resources,
        tax,
    });

    Solution {
        non_employment_resources,
        emax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Untaxed;
    use crate::emax::weight_emax;
    use crate::exogenous::tests::constant_tables;
    use crate::model_spec::tests::small_spec;
    use crate::state_space::create_state_space_objects;
    use crate::types::EMAX_COLUMN;
    use crate::utility::tests::reference_utility;

    fn solve_small(p_child: f64) -> (ModelContext, ExogenousProcesses, Solution) {
        let spec = small_spec();
        let exogenous = ExogenousProcesses::new(&spec, &constant_tables(&spec, p_child)).unwrap();
        let draws = DrawPanel::generate(
            spec.seed_emax,
            spec.num_periods,
            spec.num_draws_emax,
            spec.shock_sd,
        )
        .unwrap();
        let utility = reference_utility(&spec);
        let ctx = create_state_space_objects(spec).unwrap();
        let solution = solve(&ctx, &utility, &Untaxed, &exogenous, &draws);
        (ctx, exogenous, solution)
    }

    #[test]
    fn test_terminal_continuation_is_zero() {
        let (ctx, _, solution) = solve_small(0.2);
        let last = ctx.spec.num_periods - 1;
        for id in ctx.space.period_range(last) {
            assert_eq!(solution.emax.continuation_values(id), [0.0; NUM_CHOICES]);
            assert!(solution.emax.emax(id).is_finite());
        }
    }

    #[test]
    fn test_continuation_matches_weighted_successors() {
        let (ctx, exogenous, solution) = solve_small(0.2);
        let last = ctx.spec.num_periods - 1;
        for (id, state) in ctx.space.states.iter().enumerate() {
            if state.period == last {
                continue;
            }
            let grid = ctx.child_indexes.grid(id);
            for choice in 0..NUM_CHOICES {
                let mut values = [[0.0; NUM_PARTNER_STATES]; NUM_CHILD_OUTCOMES];
                for c in 0..NUM_CHILD_OUTCOMES {
                    for p in 0..NUM_PARTNER_STATES {
                        values[c][p] = solution.emax.emax(grid[choice][c][p] as usize);
                    }
                }
                let expected = weight_emax(
                    &values,
                    exogenous.prob_child(state.period, state.educ_level),
                    exogenous.prob_partner(state.period, state.educ_level, state.partner),
                );
                assert!((solution.emax.continuation(id, choice) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_emax_is_at_least_best_average_choice_value() {
        // E[max] >= max E: the EMAX dominates every single choice's average value.
        let (ctx, _, solution) = solve_small(0.2);
        let draws = DrawPanel::generate(
            ctx.spec.seed_emax,
            ctx.spec.num_periods,
            ctx.spec.num_draws_emax,
            ctx.spec.shock_sd,
        )
        .unwrap();
        let utility = reference_utility(&ctx.spec).components(&ctx.space, &ctx.covariates);

        for (id, state) in ctx.space.states.iter().enumerate().step_by(37) {
            let cov = ctx.covariates.get(id);
            let flow = FlowUtility {
                tax: &Untaxed,
                mu: ctx.spec.mu,
                log_wage_systematic: utility.log_wage_systematic[id],
                non_consumption_utilities: utility.non_consumption_utilities[id],
                covariates: cov,
                child_care_costs: ctx.spec.child_care_costs[cov.child_care_index()],
                non_employment_resources: solution.non_employment_resources[id],
            };
            let row = solution.emax.row(id);
            let period_draws = draws.period(state.period);
            for choice in 0..NUM_CHOICES {
                let mean: f64 = period_draws
                    .iter()
                    .map(|&d| flow.evaluate(d)[choice] + ctx.spec.delta * row[choice])
                    .sum::<f64>()
                    / period_draws.len() as f64;
                assert!(row[EMAX_COLUMN] >= mean - 1e-12);
            }
        }
    }

    #[test]
    #[should_panic(expected = "non-employment resources / states mismatch")]
    fn test_shape_mismatch_panics() {
        let spec = small_spec();
        let exogenous = ExogenousProcesses::new(&spec, &constant_tables(&spec, 0.2)).unwrap();
        let draws = DrawPanel::generate(1, spec.num_periods, spec.num_draws_emax, 0.1).unwrap();
        let utility = reference_utility(&spec);
        let ctx = create_state_space_objects(spec).unwrap();
        let components = utility.components(&ctx.space, &ctx.covariates);
        let resources = vec![1.0; ctx.num_states() - 1];
        backward_induction(&SolveInputs {
            ctx: &ctx,
            utility: &components,
            draws: &draws,
            exogenous: &exogenous,
            non_employment_resources: &resources,
            tax: &Untaxed,
        });
    }
}
