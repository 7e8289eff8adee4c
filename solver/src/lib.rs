//! # Lifecycle: dynamic life-cycle labor supply solver
//!
//! Solves a finite-horizon discrete-choice model of female labor supply
//! (non-employment, part-time, full-time) by **backward induction** over the
//! full enumerated state space. The result is an EMAX table: per state the
//! expected maximum value function and the probability-weighted continuation
//! value of each choice.
//!
//! ## Pipeline
//!
//! | Step | Rust module | Description |
//! |------|-------------|-------------|
//! | 0 | [`config`], [`model_spec`] | Load and validate the JSON model configuration |
//! | 1 | [`state_space`] | Enumerate states period-major, fill the [`types::Indexer`] |
//! | 2 | [`covariates`] | Child bins, partner earnings, equivalence scale, child benefits |
//! | 3 | [`child_index`] | Successor ids per (choice, child arrival, partner status) |
//! | 4 | [`utility`], [`budget`] | Per-state wage and non-pecuniary components, flow utilities |
//! | 5 | [`state_computation`] | Backward induction from the last period down to period 0 |
//! | 6 | [`storage`] | Binary EMAX file |
//!
//! Each state is solved by [`emax::construct_emax`], which averages the
//! per-draw maximum choice value over the period's row of the [`draws::DrawPanel`].
//!
//! ## State representation
//!
//! A state is `(period, educ_level, choice_lagged, exp_p, exp_f, disutil_type,
//! child_age, partner)`. `child_age` is the age of the youngest child, -1 when
//! no child lives in the household; `partner` is 0 or 1.
//!
//! Ids are assigned in enumeration order, which is period-major: the states of
//! one period form a contiguous id range, and successors of a period-`t` state
//! always lie in the range of period `t + 1`.

#![allow(clippy::needless_range_loop)]

pub mod budget;
pub mod child_index;
pub mod config;
pub mod constants;
pub mod covariates;
pub mod draws;
pub mod emax;
pub mod env_config;
pub mod error;
pub mod exogenous;
pub mod model_spec;
pub mod state_computation;
pub mod state_space;
pub mod storage;
pub mod types;
pub mod utility;
