//! Running median over a sliding window of an integer stream.
//!
//! The window's values are kept twice: in arrival order (so the oldest can
//! be evicted in O(1)) and in a sorted multiset (O(log W) insert/remove).
//! A cursor into the multiset always denotes the lower median, the entry at
//! sorted index `(n - 1) / 2`. Every insertion and eviction shifts the
//! cursor by at most one step, so the median is read in O(1).

use std::{collections::VecDeque, fmt::Debug};

use num::{rational::Ratio, PrimInt};
use tracing::trace;

use crate::{
    error::MedianError,
    sorted::{Key, Position, SortedMultiset},
};

/// Integer types a `WindowedMedian` can hold. Values are widened to `i128`
/// for even-window means, so the sum of any two must fit there; the trait
/// is sealed to integers of at most 64 bits.
///
/// ```compile_fail
/// use windowed_median::WindowedMedian;
///
/// let _ = WindowedMedian::<i128>::new(2);
/// ```
pub trait Sample: PrimInt + Into<i128> + Debug + private::Sealed {}

mod private {
    pub trait Sealed {}
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(
            impl private::Sealed for $t {}
            impl Sample for $t {}
        )*
    };
}

impl_sample!(i8, i16, i32, i64, u8, u16, u32, u64);

// Upper bound on storage reserved up front; larger windows grow on demand.
const RESERVE_LIMIT: usize = 1024;

const WINDOW_SIZE: &str = "window size";

#[derive(Clone, Debug)]
pub struct WindowedMedian<T = i64> {
    window_size: usize,
    window: VecDeque<Key<T>>,
    sorted: SortedMultiset<T>,
    cursor: Option<Position<T>>,
    seq: u64,
}

impl<T: Sample> WindowedMedian<T> {
    pub fn new(window_size: usize) -> Result<WindowedMedian<T>, MedianError> {
        if window_size == 0 {
            return Err(MedianError::InvalidArgument {
                name: WINDOW_SIZE,
                value: 0,
            });
        }
        let reserve = window_size.min(RESERVE_LIMIT) + 1;
        Ok(WindowedMedian {
            window_size,
            window: VecDeque::with_capacity(reserve),
            sorted: SortedMultiset::with_capacity(reserve),
            cursor: None,
            seq: 0,
        })
    }

    /// Like `new`, for callers that carry the window size as a signed number.
    pub fn from_signed(window_size: i64) -> Result<WindowedMedian<T>, MedianError> {
        let invalid = MedianError::InvalidArgument {
            name: WINDOW_SIZE,
            value: window_size,
        };
        if window_size <= 0 {
            return Err(invalid);
        }
        let window_size = usize::try_from(window_size).map_err(|_| invalid)?;
        WindowedMedian::new(window_size)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.window_size
    }

    /// Add a value to the stream, evicting the oldest one once the window
    /// is over capacity.
    pub fn insert(&mut self, value: T) {
        let key = Key::new(value, self.seq);
        self.seq += 1;
        self.window.push_back(key);
        let pos = self.sorted.insert(key);
        self.admit(key, pos);

        if self.window.len() > self.window_size {
            if let Some(old) = self.window.pop_front() {
                self.evict(old);
            }
        }
    }

    // Keys compare by value first and the new key carries the largest
    // sequence number, so `key < cur` is `value < cur.value` here.
    fn admit(&mut self, key: Key<T>, pos: Position<T>) {
        let n = self.sorted.len();
        let cursor = match self.cursor {
            Some(cursor) if n > 1 => cursor,
            _ => {
                self.cursor = Some(pos);
                return;
            }
        };
        let cur = self.sorted.key(&cursor);
        if key < cur && n % 2 == 0 {
            self.cursor = self.sorted.predecessor(&cursor);
            trace!(n, value = ?key.value, "insert: cursor to predecessor");
        } else if key >= cur && n % 2 == 1 {
            self.cursor = self.sorted.successor(&cursor);
            trace!(n, value = ?key.value, "insert: cursor to successor");
        }
    }

    // Comparing whole keys makes the rule positional: when `old` has the
    // same value as the cursor, its sequence number says which side of the
    // cursor it sits on, and the cursor is never left on the entry removed.
    fn evict(&mut self, old: Key<T>) {
        let n = self.sorted.len();
        if let Some(cursor) = self.cursor {
            let cur = self.sorted.key(&cursor);
            if old <= cur && n % 2 == 0 {
                self.cursor = self.sorted.successor(&cursor);
                trace!(n, value = ?old.value, "evict: cursor to successor");
            } else if old >= cur && n % 2 == 1 {
                self.cursor = self.sorted.predecessor(&cursor);
                trace!(n, value = ?old.value, "evict: cursor to predecessor");
            }
        }
        self.sorted.remove_key(&old);
    }

    /// The entry at sorted index `(n - 1) / 2`.
    pub fn lower_median(&self) -> Result<T, MedianError> {
        let cursor = self.cursor.ok_or(MedianError::EmptyState)?;
        Ok(self.sorted.value(&cursor))
    }

    fn middle(&self) -> Result<(T, Option<T>), MedianError> {
        let cursor = self.cursor.ok_or(MedianError::EmptyState)?;
        let lo = self.sorted.value(&cursor);
        if self.sorted.len() % 2 == 1 {
            return Ok((lo, None));
        }
        let hi = self
            .sorted
            .successor(&cursor)
            .map(|p| self.sorted.value(&p));
        Ok((lo, hi))
    }

    /// The median of the current window. For an even number of values this
    /// is the mean of the two middle ones.
    pub fn median(&self) -> Result<f64, MedianError> {
        let (lo, hi) = self.middle()?;
        Ok(mean(lo, hi))
    }

    /// The median as an exact rational.
    pub fn median_exact(&self) -> Result<Ratio<i128>, MedianError> {
        let (lo, hi) = self.middle()?;
        Ok(exact_mean(lo, hi))
    }

    /// Reference median computed by sorting a copy of the window.
    pub fn median_naive(&self) -> Result<f64, MedianError> {
        if self.window.is_empty() {
            return Err(MedianError::EmptyState);
        }
        let mut xs: Vec<T> = self.values().collect();
        xs.sort();
        let n = xs.len();
        if n % 2 == 1 {
            Ok(mean(xs[n / 2], None))
        } else {
            Ok(mean(xs[n / 2 - 1], Some(xs[n / 2])))
        }
    }

    /// Window contents, oldest first.
    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.window.iter().map(|k| k.value)
    }

    /// Window contents in ascending order.
    pub fn sorted_values(&self) -> impl Iterator<Item = T> + '_ {
        self.sorted.iter()
    }

    /// Sorted index of the cursor, found by walking the multiset. Meant for
    /// checking the cursor invariant, not for hot paths.
    pub fn cursor_rank(&self) -> Option<usize> {
        self.cursor.and_then(|c| self.sorted.rank(&c))
    }
}

fn mean<T: Sample>(lo: T, hi: Option<T>) -> f64 {
    let a: i128 = lo.into();
    match hi {
        None => a as f64,
        Some(hi) => {
            let b: i128 = hi.into();
            0.5 * (a as f64) + 0.5 * (b as f64)
        }
    }
}

// Both values are at most 64 bits wide, so their sum cannot overflow.
fn exact_mean<T: Sample>(lo: T, hi: Option<T>) -> Ratio<i128> {
    let a: i128 = lo.into();
    match hi {
        None => Ratio::from_integer(a),
        Some(hi) => Ratio::new(a + hi.into(), 2),
    }
}
