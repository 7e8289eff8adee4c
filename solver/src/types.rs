//! Core data structures: states, the dense indexer, the state space, the EMAX
//! table, and the [`ModelContext`] bundling everything that depends only on the
//! model specification.
//!
//! The context is built once by [`crate::state_space::create_state_space_objects`]
//! and shared immutably (across rayon workers) during backward induction.

use std::ops::Range;

use crate::child_index::ChildStateIndexes;
use crate::constants::*;
use crate::covariates::Covariates;
use crate::model_spec::ModelSpec;

/// One admissible state space point.
///
/// `child_age` is the age of the youngest child, [`NO_CHILD`] (-1) when no
/// child lives in the household. `partner` is 0 (absent) or 1 (present).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct State {
    pub period: usize,
    pub educ_level: usize,
    pub choice_lagged: usize,
    pub exp_p: usize,
    pub exp_f: usize,
    pub disutil_type: usize,
    pub child_age: i32,
    pub partner: usize,
}

impl State {
    /// Entry state for an individual who just finished schooling.
    pub fn entry(
        period: usize,
        educ_level: usize,
        disutil_type: usize,
        child_age: i32,
        partner: usize,
    ) -> Self {
        Self {
            period,
            educ_level,
            choice_lagged: CHOICE_NON_EMPLOYMENT,
            exp_p: 0,
            exp_f: 0,
            disutil_type,
            child_age,
            partner,
        }
    }

    #[inline(always)]
    pub fn has_child(&self) -> bool {
        self.child_age != NO_CHILD
    }
}

const INDEXER_RANK: usize = 8;

/// Dense multi-dimensional lookup from state components to linear state id.
///
/// Shape: `(num_periods, num_educ_levels, NUM_CHOICES, num_periods (exp_p),
/// num_periods (exp_f), num_types, child_age_max + 2, NUM_PARTNER_STATES)`.
/// The child age is stored at offset +1 so that -1 maps to slot 0. Cells that
/// hold no admissible state contain [`MISSING_INT`].
#[derive(Clone, Debug)]
pub struct Indexer {
    shape: [usize; INDEXER_RANK],
    strides: [usize; INDEXER_RANK],
    cells: Vec<i32>,
}

impl Indexer {
    pub fn new(spec: &ModelSpec) -> Self {
        let shape = [
            spec.num_periods,
            spec.num_educ_levels(),
            NUM_CHOICES,
            spec.num_periods,
            spec.num_periods,
            spec.num_types,
            spec.child_age_dim(),
            NUM_PARTNER_STATES,
        ];
        let mut strides = [1usize; INDEXER_RANK];
        for d in (0..INDEXER_RANK - 1).rev() {
            strides[d] = strides[d + 1] * shape[d + 1];
        }
        let len = strides[0] * shape[0];
        Self {
            shape,
            strides,
            cells: vec![MISSING_INT; len],
        }
    }

    pub fn shape(&self) -> [usize; INDEXER_RANK] {
        self.shape
    }

    /// Flat cell offset of `state`, `None` when a component is out of bounds.
    #[inline(always)]
    fn offset(&self, state: &State) -> Option<usize> {
        let child_slot = state.child_age + 1;
        if child_slot < 0 {
            return None;
        }
        let coords = [
            state.period,
            state.educ_level,
            state.choice_lagged,
            state.exp_p,
            state.exp_f,
            state.disutil_type,
            child_slot as usize,
            state.partner,
        ];
        let mut offset = 0;
        for d in 0..INDEXER_RANK {
            if coords[d] >= self.shape[d] {
                return None;
            }
            offset += coords[d] * self.strides[d];
        }
        Some(offset)
    }

    /// Linear id of `state`, or `None` if the tuple is not admissible.
    #[inline(always)]
    pub fn get(&self, state: &State) -> Option<usize> {
        let offset = self.offset(state)?;
        let id = self.cells[offset];
        if id == MISSING_INT {
            None
        } else {
            Some(id as usize)
        }
    }

    /// Raw cell content, [`MISSING_INT`] for inadmissible or out-of-range tuples.
    #[inline(always)]
    pub fn get_raw(&self, state: &State) -> i32 {
        match self.offset(state) {
            Some(offset) => self.cells[offset],
            None => MISSING_INT,
        }
    }

    /// Record `id` for `state`. Returns false if the cell is already taken.
    pub(crate) fn insert(&mut self, state: &State, id: usize) -> bool {
        let offset = self
            .offset(state)
            .unwrap_or_else(|| panic!("state {:?} lies outside the indexer shape", state));
        if self.cells[offset] != MISSING_INT {
            return false;
        }
        self.cells[offset] = id as i32;
        true
    }

    /// Number of cells that hold a state id.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|&&c| c != MISSING_INT).count()
    }
}

/// Ordered table of admissible states plus its indexer.
///
/// States are enumerated period-major, so the states of each period form one
/// contiguous id range.
#[derive(Clone, Debug)]
pub struct StateSpace {
    pub states: Vec<State>,
    pub indexer: Indexer,
    pub period_ranges: Vec<Range<usize>>,
}

impl StateSpace {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn num_periods(&self) -> usize {
        self.period_ranges.len()
    }

    pub fn period_range(&self, period: usize) -> Range<usize> {
        self.period_ranges[period].clone()
    }

    pub fn period_states(&self, period: usize) -> &[State] {
        &self.states[self.period_range(period)]
    }

    pub fn lookup(&self, state: &State) -> Option<usize> {
        self.indexer.get(state)
    }
}

/// Columns per EMAX row: one continuation value per choice, then the EMAX.
pub const EMAX_COLUMNS: usize = NUM_CHOICES + 1;

/// Column holding the expected maximum value function.
pub const EMAX_COLUMN: usize = NUM_CHOICES;

/// Backing buffer of an [`EmaxTable`].
///
/// - `Owned`: Vec-backed, written by the solver
/// - `Mmap`: memory-mapped EMAX file, read-only; the payload starts at
///   `data_start` and is little-endian f64
enum EmaxValues {
    Owned(Vec<f64>),
    Mmap { mmap: memmap2::Mmap, data_start: usize },
}

/// Dense `num_states × (NUM_CHOICES + 1)` table of solution values.
///
/// Columns `0..NUM_CHOICES` hold the probability-weighted continuation value of
/// each choice (undiscounted), column [`EMAX_COLUMN`] the EMAX of the state.
pub struct EmaxTable {
    num_states: usize,
    values: EmaxValues,
}

impl EmaxTable {
    pub fn zeros(num_states: usize) -> Self {
        Self {
            num_states,
            values: EmaxValues::Owned(vec![0.0; num_states * EMAX_COLUMNS]),
        }
    }

    /// Wrap a row-major buffer. Returns `None` if its length does not match.
    pub fn from_values(num_states: usize, values: Vec<f64>) -> Option<Self> {
        if values.len() != num_states * EMAX_COLUMNS {
            return None;
        }
        Some(Self {
            num_states,
            values: EmaxValues::Owned(values),
        })
    }

    /// Wrap a mapped EMAX file whose header has been validated.
    ///
    /// Returns `None` unless the payload holds exactly `num_states` rows, is
    /// aligned for f64, and the target is little-endian.
    pub(crate) fn from_mmap(
        num_states: usize,
        mmap: memmap2::Mmap,
        data_start: usize,
    ) -> Option<Self> {
        let payload = num_states
            .checked_mul(EMAX_COLUMNS * std::mem::size_of::<f64>())?
            .checked_add(data_start)?;
        if !cfg!(target_endian = "little")
            || mmap.len() != payload
            || (mmap.as_ptr() as usize + data_start) % std::mem::align_of::<f64>() != 0
        {
            return None;
        }
        Some(Self {
            num_states,
            values: EmaxValues::Mmap { mmap, data_start },
        })
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// True when the table reads straight from a mapped file.
    pub fn is_mapped(&self) -> bool {
        matches!(self.values, EmaxValues::Mmap { .. })
    }

    #[inline(always)]
    pub fn row(&self, state_id: usize) -> &[f64] {
        &self.as_slice()[state_id * EMAX_COLUMNS..(state_id + 1) * EMAX_COLUMNS]
    }

    #[inline(always)]
    pub fn emax(&self, state_id: usize) -> f64 {
        self.as_slice()[state_id * EMAX_COLUMNS + EMAX_COLUMN]
    }

    #[inline(always)]
    pub fn continuation(&self, state_id: usize, choice: usize) -> f64 {
        debug_assert!(choice < NUM_CHOICES, "choice {} out of range", choice);
        self.as_slice()[state_id * EMAX_COLUMNS + choice]
    }

    /// Continuation values of all choices at `state_id`, as consumed by a
    /// forward simulator.
    pub fn continuation_values(&self, state_id: usize) -> [f64; NUM_CHOICES] {
        let mut out = [0.0; NUM_CHOICES];
        out.copy_from_slice(&self.row(state_id)[..NUM_CHOICES]);
        out
    }

    pub fn as_slice(&self) -> &[f64] {
        match &self.values {
            EmaxValues::Owned(v) => v.as_slice(),
            EmaxValues::Mmap { mmap, data_start } => {
                // Length, alignment and endianness are checked in `from_mmap`.
                let data_ptr = unsafe { mmap.as_ptr().add(*data_start) as *const f64 };
                unsafe { std::slice::from_raw_parts(data_ptr, self.num_states * EMAX_COLUMNS) }
            }
        }
    }

    /// Mutable access. A mapped table is copied into memory first.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        if let EmaxValues::Mmap { .. } = self.values {
            self.values = EmaxValues::Owned(self.as_slice().to_vec());
        }
        match &mut self.values {
            EmaxValues::Owned(v) => v.as_mut_slice(),
            EmaxValues::Mmap { .. } => unreachable!("mapped table converted above"),
        }
    }
}

impl Clone for EmaxTable {
    fn clone(&self) -> Self {
        Self {
            num_states: self.num_states,
            values: EmaxValues::Owned(self.as_slice().to_vec()),
        }
    }
}

impl PartialEq for EmaxTable {
    fn eq(&self, other: &Self) -> bool {
        self.num_states == other.num_states && self.as_slice() == other.as_slice()
    }
}

impl std::fmt::Debug for EmaxTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmaxTable")
            .field("num_states", &self.num_states)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Everything derived from the model specification alone.
pub struct ModelContext {
    pub spec: ModelSpec,
    pub space: StateSpace,
    pub covariates: Covariates,
    pub child_indexes: ChildStateIndexes,
}

impl ModelContext {
    pub fn num_states(&self) -> usize {
        self.space.len()
    }
}
