use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use std::cell::RefCell;

use crate::array::Array;
use crate::object::Object;
use crate::value::Value;

/// Largest integer (and upper bound for floats) produced by
/// [`Fuzzer::random_value`].
pub const VALUE_MAX: i64 = 16;

/// A fuzzer for generating random values and array mutations.
///
/// Uses the xoshiro256** PRNG for reproducible sequences when seeded.
///
/// # Examples
///
/// ```
/// use change_summary_model::{Array, Fuzzer};
///
/// let fuzzer = Fuzzer::new(Some([7u8; 32]));
/// let arr = Array::from_vec(fuzzer.random_values(8));
///
/// for _ in 0..16 {
///     fuzzer.array_mutation(arr.len()).apply(&arr);
/// }
///
/// let n = fuzzer.random_int(1, 10);
/// assert!(n >= 1 && n <= 10);
/// ```
pub struct Fuzzer {
    /// The seed used to initialize the PRNG.
    pub seed: [u8; 32],
    rng: RefCell<Xoshiro256StarStar>,
}

impl Fuzzer {
    /// Create a new fuzzer with an optional seed.
    ///
    /// If no seed is provided, a random seed will be generated using `OsRng`.
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });

        Self {
            seed,
            rng: RefCell::new(Xoshiro256StarStar::from_seed(seed)),
        }
    }

    /// Generate a random integer in the range [min, max] (inclusive).
    pub fn random_int(&self, min: i64, max: i64) -> i64 {
        self.rng.borrow_mut().gen_range(min..=max)
    }

    /// Generate a random f64 in the range [0, 1).
    pub fn random(&self) -> f64 {
        self.rng.borrow_mut().gen::<f64>()
    }

    /// Pick a random element from a non-empty slice.
    pub fn pick<'a, T>(&self, elements: &'a [T]) -> &'a T {
        let idx = self.rng.borrow_mut().gen_range(0..elements.len());
        &elements[idx]
    }

    /// A random element value: a fresh object, `undefined`, `null`, an
    /// integer, a float or a one-character printable ASCII string.
    pub fn random_value(&self) -> Value {
        match self.random_int(0, 5) {
            0 => Value::Object(Object::new()),
            1 => Value::Undefined,
            2 => Value::Null,
            3 => Value::from(self.random_int(0, VALUE_MAX)),
            4 => Value::from(self.random() * VALUE_MAX as f64),
            _ => {
                let code = self.random_int(32, 126) as u8;
                Value::from((code as char).to_string())
            }
        }
    }

    /// Between zero and `max_len` random values.
    pub fn random_values(&self, max_len: usize) -> Vec<Value> {
        let count = self.random_int(0, max_len as i64);
        (0..count).map(|_| self.random_value()).collect()
    }

    /// A random mutation for an array of length `len`.
    ///
    /// Splices make up half of the mix; the rest is spread evenly over
    /// index updates, deletions, push, pop, shift and unshift.
    pub fn array_mutation(&self, len: usize) -> ArrayMutation {
        const MAX_ADDED: usize = 8;
        let len_i = len as i64;
        match self.random_int(0, 11) {
            1 => ArrayMutation::Update {
                index: self.random_int(0, len_i) as usize,
                value: self.random_value(),
            },
            3 if len > 0 => ArrayMutation::Delete {
                index: self.random_int(0, len_i - 1) as usize,
            },
            5 => ArrayMutation::Push {
                values: self.random_values(MAX_ADDED),
            },
            7 => ArrayMutation::Pop,
            9 => ArrayMutation::Shift,
            11 => ArrayMutation::Unshift {
                values: self.random_values(MAX_ADDED),
            },
            _ => ArrayMutation::Splice {
                start: self.random_int(-len_i * 2, len_i * 2) as isize,
                delete_count: self.random_int(0, len_i * 2) as usize,
                values: self.random_values(MAX_ADDED),
            },
        }
    }
}

/// One mutation of an [`Array`], as produced by [`Fuzzer::array_mutation`].
#[derive(Debug, Clone)]
pub enum ArrayMutation {
    Splice {
        start: isize,
        delete_count: usize,
        values: Vec<Value>,
    },
    Update {
        index: usize,
        value: Value,
    },
    Delete {
        index: usize,
    },
    Push {
        values: Vec<Value>,
    },
    Pop,
    Shift,
    Unshift {
        values: Vec<Value>,
    },
    SetLength {
        len: usize,
    },
}

impl ArrayMutation {
    pub fn apply(&self, arr: &Array) {
        match self {
            ArrayMutation::Splice {
                start,
                delete_count,
                values,
            } => {
                arr.splice(*start, *delete_count, values.clone());
            }
            ArrayMutation::Update { index, value } => arr.set(*index, value.clone()),
            ArrayMutation::Delete { index } => {
                arr.delete(*index);
            }
            ArrayMutation::Push { values } => {
                arr.splice(arr.len() as isize, 0, values.clone());
            }
            ArrayMutation::Pop => {
                arr.pop();
            }
            ArrayMutation::Shift => {
                arr.shift();
            }
            ArrayMutation::Unshift { values } => {
                arr.unshift(values.clone());
            }
            ArrayMutation::SetLength { len } => arr.set_len(*len),
        }
    }
}
