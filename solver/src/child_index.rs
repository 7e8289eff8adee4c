//! Transition targets: for every state and current choice, the linear ids of
//! the next-period states reached under each child-arrival × partner outcome.
//!
//! Grid layout per state: `grid[choice][child_arrives][partner_next]`. The
//! terminal period has no successors; its grids stay filled with
//! [`MISSING_INT`] and the solver never reads them.

use crate::constants::*;
use crate::model_spec::ModelSpec;
use crate::types::{State, StateSpace};

pub type ChildIndexGrid = [[[i32; NUM_PARTNER_STATES]; NUM_CHILD_OUTCOMES]; NUM_CHOICES];

const MISSING_GRID: ChildIndexGrid =
    [[[MISSING_INT; NUM_PARTNER_STATES]; NUM_CHILD_OUTCOMES]; NUM_CHOICES];

#[derive(Clone, Debug, PartialEq)]
pub struct ChildStateIndexes {
    pub grids: Vec<ChildIndexGrid>,
}

impl ChildStateIndexes {
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    #[inline(always)]
    pub fn grid(&self, state_id: usize) -> &ChildIndexGrid {
        &self.grids[state_id]
    }
}

/// Deterministic aging of the youngest child over one period.
#[inline(always)]
pub fn child_age_update(spec: &ModelSpec, child_age: i32) -> i32 {
    if child_age == NO_CHILD || child_age + 1 > spec.child_age_max {
        NO_CHILD
    } else {
        child_age + 1
    }
}

/// Child age in the next period under each child-arrival outcome.
///
/// A newborn can only appear up to `last_child_bearing_period`; afterwards the
/// arrival branch coincides with the no-arrival branch (its probability is
/// masked to zero in [`crate::exogenous::ExogenousProcesses`]).
pub fn next_child_ages(spec: &ModelSpec, state: &State) -> [i32; NUM_CHILD_OUTCOMES] {
    let aged = child_age_update(spec, state.child_age);
    let newborn = if state.period + 1 <= spec.last_child_bearing_period {
        0
    } else {
        aged
    };
    [aged, newborn]
}

/// Next-period state reached from `state` under `choice`, before the child
/// and partner outcomes are applied.
pub fn successor(state: &State, choice: usize) -> State {
    State {
        period: state.period + 1,
        choice_lagged: choice,
        exp_p: state.exp_p + usize::from(choice == CHOICE_PART_TIME),
        exp_f: state.exp_f + usize::from(choice == CHOICE_FULL_TIME),
        ..*state
    }
}

pub fn create_child_indexes(space: &StateSpace, spec: &ModelSpec) -> ChildStateIndexes {
    let last_period = spec.num_periods - 1;

    let grids = space
        .states
        .iter()
        .map(|state| {
            let mut grid = MISSING_GRID;
            if state.period == last_period {
                return grid;
            }
            let child_ages = next_child_ages(spec, state);

            for choice in 0..NUM_CHOICES {
                let base = successor(state, choice);
                for (child, &child_age) in child_ages.iter().enumerate() {
                    for partner in 0..NUM_PARTNER_STATES {
                        let target = State {
                            child_age,
                            partner,
                            ..base
                        };
                        let id = space.indexer.get_raw(&target);
                        assert!(
                            id != MISSING_INT,
                            "state {:?} reaches inadmissible state {:?}",
                            state,
                            target
                        );
                        grid[choice][child][partner] = id;
                    }
                }
            }
            grid
        })
        .collect();

    ChildStateIndexes { grids }
}
