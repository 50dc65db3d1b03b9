//! Data values attached to Read/Write events.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Where Read/Write values come from when converting a raw trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValuePolicy {
    /// Values are drawn from a [`ValueSource`]; the raw data field is ignored.
    #[default]
    Synthesized,
    /// The raw data field of each line is carried through as the value.
    Recorded,
}

/// A source of synthesized variable values.
pub trait ValueSource {
    /// Value a variable holds when it is first accessed.
    fn initial(&mut self) -> i64;

    /// Value stored by a write.
    fn next_write(&mut self) -> i64;
}

/// Uniformly random values in `0..=100`.
#[derive(Debug)]
pub struct RandomValues {
    rng: StdRng,
}

const MAX_RANDOM_VALUE: i64 = 100;

impl RandomValues {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ValueSource for RandomValues {
    fn initial(&mut self) -> i64 {
        self.rng.gen_range(0..=MAX_RANDOM_VALUE)
    }

    fn next_write(&mut self) -> i64 {
        self.rng.gen_range(0..=MAX_RANDOM_VALUE)
    }
}

/// Tracks the current value of each variable while synthesizing.
///
/// The first access to a variable draws an initial value. Writes draw a
/// fresh value and store it; reads observe the stored value.
pub(crate) struct SynthesizedValues<S> {
    source: S,
    current: HashMap<u32, i64>,
}

impl<S: ValueSource> SynthesizedValues<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: HashMap::new(),
        }
    }

    pub fn read(&mut self, var_id: u32) -> i64 {
        let source = &mut self.source;
        *self.current.entry(var_id).or_insert_with(|| source.initial())
    }

    pub fn write(&mut self, var_id: u32) -> i64 {
        if !self.current.contains_key(&var_id) {
            let initial = self.source.initial();
            self.current.insert(var_id, initial);
        }
        let value = self.source.next_write();
        self.current.insert(var_id, value);
        value
    }
}
