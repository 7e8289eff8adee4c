//! State space construction: enumerate all admissible states and build the
//! dense indexer.
//!
//! The orchestrator [`create_state_space_objects`] runs every step that depends
//! on the model specification alone, in dependency order:
//!
//! 1. **Validation**: [`ModelSpec::validate`] fails fast on malformed dimensions
//! 2. **Enumeration**: [`create_state_space`] walks
//!    `period → educ_level → type → child_age → partner`, then
//!    `exp_p → exp_f → choice_lagged`
//! 3. **Covariates**: [`crate::covariates::construct_covariates`]
//! 4. **Child indexes**: [`crate::child_index::create_child_indexes`]
//!
//! Enumeration is period-major, so ids are assigned in ascending period order
//! and each period occupies one contiguous id range.

use std::time::Instant;

use crate::child_index::create_child_indexes;
use crate::constants::*;
use crate::covariates::construct_covariates;
use crate::error::ConfigResult;
use crate::model_spec::ModelSpec;
use crate::types::{Indexer, ModelContext, State, StateSpace};

/// Whether a youngest child aged `child_age` can be present in `period` for an
/// individual of education level `level`.
///
/// A child is either already present at model entry (at most
/// `child_age_init_max` years old then), or born inside the model no later than
/// `last_child_bearing_period`. Children older than `child_age_max` leave the
/// state, so "no child" is always admissible.
pub fn child_age_admissible(spec: &ModelSpec, level: usize, period: usize, child_age: i32) -> bool {
    if child_age == NO_CHILD {
        return true;
    }
    if child_age < 0 || child_age > spec.child_age_max {
        return false;
    }
    let entry = spec.entry_period(level) as i64;
    let birth = period as i64 - child_age as i64;

    let present_at_entry = spec.child_age_init_max >= 0
        && birth >= entry - spec.child_age_init_max as i64
        && birth <= entry;
    let born_in_model = birth > entry && birth <= spec.last_child_bearing_period as i64;

    present_at_entry || born_in_model
}

/// Feasibility of a lagged choice given accumulated experience after `elapsed`
/// periods of labor market participation.
pub fn lagged_choice_feasible(
    choice_lagged: usize,
    exp_p: usize,
    exp_f: usize,
    elapsed: usize,
) -> bool {
    // Only ever worked full-time: the lagged choice must be full-time.
    if choice_lagged != CHOICE_FULL_TIME && exp_f == elapsed {
        return false;
    }
    // Only ever worked part-time: the lagged choice must be part-time.
    if choice_lagged != CHOICE_PART_TIME && exp_p == elapsed {
        return false;
    }
    if choice_lagged == CHOICE_FULL_TIME && exp_f == 0 {
        return false;
    }
    if choice_lagged == CHOICE_PART_TIME && exp_p == 0 {
        return false;
    }
    // Employed in every period so far: cannot come out of non-employment.
    if choice_lagged == CHOICE_NON_EMPLOYMENT && exp_p + exp_f == elapsed {
        return false;
    }
    true
}

/// Enumerate all admissible states of `spec` and index them.
pub fn create_state_space(spec: &ModelSpec) -> ConfigResult<StateSpace> {
    spec.validate()?;

    let mut indexer = Indexer::new(spec);
    let mut states: Vec<State> = Vec::new();
    let mut period_ranges = Vec::with_capacity(spec.num_periods);

    let mut push = |state: State, states: &mut Vec<State>| {
        if indexer.insert(&state, states.len()) {
            states.push(state);
        }
    };

    for period in 0..spec.num_periods {
        let period_start = states.len();

        for educ_level in 0..spec.num_educ_levels() {
            let entry = spec.entry_period(educ_level);
            // Still in school.
            if entry > period {
                continue;
            }
            let elapsed = period - entry;

            for disutil_type in 0..spec.num_types {
                for child_age in NO_CHILD..=spec.child_age_max {
                    if !child_age_admissible(spec, educ_level, period, child_age) {
                        continue;
                    }

                    for partner in 0..NUM_PARTNER_STATES {
                        // Just finished schooling: single entry state, no experience.
                        if period == entry {
                            let state =
                                State::entry(period, educ_level, disutil_type, child_age, partner);
                            push(state, &mut states);
                            continue;
                        }

                        for exp_p in 0..=elapsed {
                            for exp_f in 0..=(elapsed - exp_p) {
                                for choice_lagged in 0..NUM_CHOICES {
                                    if !lagged_choice_feasible(
                                        choice_lagged,
                                        exp_p,
                                        exp_f,
                                        elapsed,
                                    ) {
                                        continue;
                                    }
                                    let state = State {
                                        period,
                                        educ_level,
                                        choice_lagged,
                                        exp_p,
                                        exp_f,
                                        disutil_type,
                                        child_age,
                                        partner,
                                    };
                                    push(state, &mut states);
                                }
                            }
                        }
                    }
                }
            }
        }

        period_ranges.push(period_start..states.len());
    }

    Ok(StateSpace {
        states,
        indexer,
        period_ranges,
    })
}

/// Build every object that depends only on the model specification.
pub fn create_state_space_objects(spec: ModelSpec) -> ConfigResult<ModelContext> {
    let start = Instant::now();

    let space = create_state_space(&spec)?;
    let covariates = construct_covariates(&space.states, &spec);
    let child_indexes = create_child_indexes(&space, &spec);

    println!(
        "State space: {} states over {} periods built in {:.2} ms",
        space.len(),
        space.num_periods(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(ModelContext {
        spec,
        space,
        covariates,
        child_indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::model_spec::tests::small_spec;
    use std::collections::HashSet;

    fn childless_spec(num_periods: usize, educ_years: Vec<usize>) -> ModelSpec {
        ModelSpec {
            num_periods,
            educ_years,
            num_types: 1,
            child_age_max: 0,
            child_age_init_max: NO_CHILD,
            last_child_bearing_period: 0,
            ..small_spec()
        }
    }

    #[test]
    fn test_childless_state_count() {
        // 1110 labor market histories per partner status.
        let space = create_state_space(&childless_spec(10, vec![0, 1, 2])).unwrap();
        assert_eq!(space.len(), 2220);
        assert_eq!(space.indexer.occupied(), 2220);
    }

    #[test]
    fn test_small_spec_state_count() {
        let space = create_state_space(&small_spec()).unwrap();
        assert_eq!(space.len(), 1812);
    }

    #[test]
    fn test_ids_match_indexer() {
        let space = create_state_space(&small_spec()).unwrap();
        for (id, state) in space.states.iter().enumerate() {
            assert_eq!(space.lookup(state), Some(id), "state {:?}", state);
        }
    }

    #[test]
    fn test_no_duplicate_states() {
        let space = create_state_space(&small_spec()).unwrap();
        let unique: HashSet<State> = space.states.iter().copied().collect();
        assert_eq!(unique.len(), space.len());
    }

    #[test]
    fn test_period_ranges_are_contiguous() {
        let space = create_state_space(&small_spec()).unwrap();
        let mut expected_start = 0;
        for period in 0..space.num_periods() {
            let range = space.period_range(period);
            assert_eq!(range.start, expected_start);
            for state in space.period_states(period) {
                assert_eq!(state.period, period);
            }
            expected_start = range.end;
        }
        assert_eq!(expected_start, space.len());
    }

    #[test]
    fn test_no_newborn_after_last_child_bearing_period() {
        let spec = small_spec();
        let space = create_state_space(&spec).unwrap();
        let newborns = space
            .states
            .iter()
            .filter(|s| s.period > spec.last_child_bearing_period && s.child_age == 0)
            .filter(|s| s.period != spec.entry_period(s.educ_level))
            .count();
        assert_eq!(newborns, 0);
    }

    #[test]
    fn test_lagged_choice_rules() {
        // Worked full-time in every one of 3 periods.
        assert!(lagged_choice_feasible(CHOICE_FULL_TIME, 0, 3, 3));
        assert!(!lagged_choice_feasible(CHOICE_PART_TIME, 0, 3, 3));
        assert!(!lagged_choice_feasible(CHOICE_NON_EMPLOYMENT, 0, 3, 3));
        // Never worked.
        assert!(lagged_choice_feasible(CHOICE_NON_EMPLOYMENT, 0, 0, 3));
        assert!(!lagged_choice_feasible(CHOICE_FULL_TIME, 0, 0, 3));
        // Mixed history with a gap.
        assert!(lagged_choice_feasible(CHOICE_NON_EMPLOYMENT, 1, 1, 3));
        assert!(lagged_choice_feasible(CHOICE_PART_TIME, 1, 1, 3));
        assert!(lagged_choice_feasible(CHOICE_FULL_TIME, 1, 1, 3));
    }

    #[test]
    fn test_child_age_admissibility() {
        let spec = small_spec();
        // Level 1 enters at period 1 with children up to age 1.
        assert!(child_age_admissible(&spec, 1, 1, 1));
        assert!(!child_age_admissible(&spec, 1, 1, 2));
        // Born in period 3 (the last child-bearing period) is fine, in 4 it is not.
        assert!(child_age_admissible(&spec, 1, 3, 0));
        assert!(!child_age_admissible(&spec, 1, 4, 0));
        assert!(!child_age_admissible(&spec, 0, 2, 4));
    }

    #[test]
    fn test_invalid_spec_fails_before_enumeration() {
        let spec = ModelSpec {
            num_types: 0,
            ..small_spec()
        };
        assert_eq!(create_state_space(&spec).unwrap_err(), ConfigError::NoTypes);
    }
}
