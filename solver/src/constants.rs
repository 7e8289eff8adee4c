//! Model constants shared by every pipeline step.
//!
//! Choices are indexed `0 = non-employment`, `1 = part-time`, `2 = full-time`
//! throughout: as the lagged choice in a [`crate::types::State`], as the column
//! of the utility matrices, and as the continuation column of the EMAX table.

/// Number of labor supply alternatives (N, P, F).
pub const NUM_CHOICES: usize = 3;

pub const CHOICE_NON_EMPLOYMENT: usize = 0;
pub const CHOICE_PART_TIME: usize = 1;
pub const CHOICE_FULL_TIME: usize = 2;

/// Weekly hours worked under each choice.
pub const HOURS: [f64; NUM_CHOICES] = [0.0, 18.0, 38.0];

/// Number of partner states: absent (0) or present (1).
pub const NUM_PARTNER_STATES: usize = 2;

/// Child-arrival outcomes: no new child (0) or a newborn (1).
pub const NUM_CHILD_OUTCOMES: usize = 2;

/// Sentinel for indexer cells (and child indexes) that hold no state.
pub const MISSING_INT: i32 = -99;

/// Child age stored for "no child in the household".
pub const NO_CHILD: i32 = -1;

/// Number of child-age bins in the covariates (none, 0-2, 3-5, 6-10, 11+).
pub const NUM_CHILD_BINS: usize = 5;

/// Child bins that carry child care costs (none, 0-2, 3-5).
pub const NUM_CHILD_CARE_BINS: usize = 3;

/// Lower bound on consumption resources before applying CRRA utility.
pub const CONSUMPTION_FLOOR: f64 = 1e-14;

/// EMAX file magic: "EMAX" in little-endian hex.
pub const EMAX_FILE_MAGIC: u32 = 0x58414D45;

/// EMAX file format version.
pub const EMAX_FILE_VERSION: u32 = 1;

/// Human-readable choice names.
pub const CHOICE_NAMES: [&str; NUM_CHOICES] = ["Non-employment", "Part-time", "Full-time"];
