//! Generators for primitive values: integers, booleans, strings and picks.

use std::ops::RangeInclusive;
use std::sync::Arc;

use num_traits::PrimInt;
use rand::Rng;
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Alphanumeric;

use crate::config::ConfigError;
use crate::generator::{Arb, Exhaustive, arbitrary, exhaustive};
use crate::sample::{Sample, Shrinker, Value};
use crate::shrinkers::{IntShrinker, StringShrinker};

impl<T> Arb<T>
where
    T: PrimInt + SampleUniform + Value,
{
    /// Uniform integers in `range`, with edge cases `min, -1, 0, 1, max`
    /// where they fall inside the range, shrinking towards zero
    ///
    /// # Panics
    ///
    /// Panics if `range` is empty.
    pub fn ints(range: RangeInclusive<T>) -> Self {
        let (lo, hi) = (*range.start(), *range.end());
        assert!(lo <= hi, "integer range must not be empty");

        let zero = T::zero();
        let candidates = [Some(lo), zero.checked_sub(&T::one()), Some(zero), Some(T::one()), Some(hi)];
        let edgecases: Vec<T> = candidates
            .into_iter()
            .flatten()
            .filter(|v| range.contains(v))
            .collect();

        let shrinker: Arc<dyn Shrinker<T>> = Arc::new(IntShrinker::new(range.clone()));
        arbitrary(edgecases, Some(shrinker), move |rs| rs.gen_range(range.clone()))
    }

    /// Integers over the whole domain of `T`
    pub fn any_int() -> Self {
        Self::ints(T::min_value()..=T::max_value())
    }
}

impl Arb<bool> {
    /// Fair booleans; `true` shrinks to `false`
    pub fn bools() -> Self {
        let shrinker: Arc<dyn Shrinker<bool>> =
            Arc::new(|v: &bool| if *v { vec![false] } else { vec![] });
        arbitrary(vec![true, false], Some(shrinker), |rs| rs.gen_bool(0.5))
    }
}

impl Arb<String> {
    /// Alphanumeric strings with a length drawn uniformly from `len`;
    /// the empty string is an edge case when the range allows it
    ///
    /// # Panics
    ///
    /// Panics if `len` is empty.
    pub fn strings(len: RangeInclusive<usize>) -> Self {
        if len.is_empty() {
            panic!(
                "{}",
                ConfigError::InvalidSizeRange {
                    start: *len.start(),
                    end: *len.end(),
                }
            );
        }

        let edgecases = if len.contains(&0) {
            vec![String::new()]
        } else {
            Vec::new()
        };
        let shrinker: Arc<dyn Shrinker<String>> = Arc::new(StringShrinker::new(len.clone()));
        arbitrary(edgecases, Some(shrinker), move |rs| {
            let n = rs.gen_range(len.clone());
            (0..n).map(|_| rs.sample(Alphanumeric) as char).collect()
        })
    }
}

impl<T: Value> Arb<T> {
    /// Always the same value
    pub fn constant(value: T) -> Self {
        Arb::from_draw(Vec::new(), move |_| Ok(Sample::new(value.clone())))
    }

    /// A uniformly chosen element of `values`, without edge cases or shrinking
    ///
    /// # Panics
    ///
    /// Panics if `values` is empty.
    pub fn element(values: Vec<T>) -> Self {
        assert!(!values.is_empty(), "element generator needs at least one value");
        Exhaustive::from_vec(values).to_arb()
    }
}

impl<T> Exhaustive<T>
where
    T: PrimInt + Value,
{
    /// Every integer in `range`, in ascending order
    ///
    /// # Panics
    ///
    /// Panics if `range` is empty.
    pub fn ints(range: RangeInclusive<T>) -> Self {
        let (lo, hi) = (*range.start(), *range.end());
        let mut values = Vec::new();
        let mut next = Some(lo);
        while let Some(v) = next.filter(|v| *v <= hi) {
            values.push(v);
            next = v.checked_add(&T::one());
        }
        exhaustive(values)
    }
}

impl Exhaustive<bool> {
    pub fn bools() -> Self {
        exhaustive(vec![false, true])
    }
}
