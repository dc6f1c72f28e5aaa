//! Combinators for deriving new generators from existing ones.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use rand::Rng;

use crate::error::PropertyError;
use crate::generator::{Arb, DrawFn, Exhaustive, Gen};
use crate::rng::RandomSource;
use crate::sample::{Sample, Value};

/// Consecutive repeated keys after which `distinct_by` gives up
pub const DISTINCT_MAX_MISSES: usize = 1000;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

impl<T: Value> Arb<T> {
    /// Transform every value, edge cases and shrink trees included
    pub fn map<U, F>(self, f: F) -> Arb<U>
    where
        U: Value,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(T) -> U + Send + Sync> = Arc::new(f);
        let edgecases = self
            .edgecases
            .into_iter()
            .map(|sample| sample.map_shared(Arc::clone(&f)))
            .collect();
        let factory = self.factory;
        Arb::from_factory(
            edgecases,
            Arc::new(move || -> DrawFn<U> {
                let mut inner = factory();
                let f = Arc::clone(&f);
                Box::new(move |rs: &mut RandomSource| {
                    inner(rs).map(|sample| sample.map_shared(Arc::clone(&f)))
                })
            }),
        )
    }

    /// Draw a value, then draw once from the generator it selects
    ///
    /// Edge cases are the edge cases of the generators selected by this
    /// generator's edge cases. Only the selected generator's shrink tree is
    /// kept; the outer value is not shrunk.
    pub fn flat_map<U, G, F>(self, f: F) -> Arb<U>
    where
        U: Value,
        G: Into<Gen<U>>,
        F: Fn(T) -> G + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let edgecases = self
            .edgecases
            .iter()
            .flat_map(|sample| {
                let selected: Gen<U> = f(sample.value().clone()).into();
                match selected {
                    Gen::Arb(inner) => inner.edgecases,
                    Gen::Exhaustive(_) => Vec::new(),
                }
            })
            .collect();
        let factory = self.factory;
        Arb::from_factory(
            edgecases,
            Arc::new(move || -> DrawFn<U> {
                let mut outer = factory();
                let f = Arc::clone(&f);
                Box::new(move |rs: &mut RandomSource| {
                    let selector = outer(rs)?.into_value();
                    let selected: Gen<U> = f(selector).into();
                    let mut inner = selected.into_arb().drawer();
                    inner(rs)
                })
            }),
        )
    }

    /// Keep only values satisfying `predicate`
    ///
    /// Rejected draws are retried without limit, so a predicate that rejects
    /// almost everything makes generation slow. Shrink trees are pruned to
    /// values the predicate accepts.
    pub fn filter<P>(self, predicate: P) -> Arb<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<T> = Arc::new(predicate);
        let edgecases = self
            .edgecases
            .into_iter()
            .filter(|sample| predicate(sample.value()))
            .map(|sample| sample.filter_shared(Arc::clone(&predicate)))
            .collect();
        let factory = self.factory;
        Arb::from_factory(
            edgecases,
            Arc::new(move || -> DrawFn<T> {
                let mut inner = factory();
                let predicate = Arc::clone(&predicate);
                Box::new(move |rs: &mut RandomSource| loop {
                    let sample = inner(rs)?;
                    if predicate(sample.value()) {
                        return Ok(sample.filter_shared(Arc::clone(&predicate)));
                    }
                })
            }),
        )
    }

    /// Keep only values failing `predicate`
    pub fn filter_not<P>(self, predicate: P) -> Arb<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter(move |value| !predicate(value))
    }

    /// Never yield two values with the same key within one sequence
    ///
    /// A draw fails with [`PropertyError::GenerationExhausted`] after
    /// [`DISTINCT_MAX_MISSES`] consecutive repeated keys.
    pub fn distinct_by<K, S>(self, selector: S) -> Arb<T>
    where
        K: Hash + Eq + 'static,
        S: Fn(&T) -> K + Send + Sync + 'static,
    {
        let selector = Arc::new(selector);
        let mut seen_edges = HashSet::new();
        let edgecases = self
            .edgecases
            .into_iter()
            .filter(|sample| seen_edges.insert(selector(sample.value())))
            .collect();
        let factory = self.factory;
        Arb::from_factory(
            edgecases,
            Arc::new(move || -> DrawFn<T> {
                let mut inner = factory();
                let selector = Arc::clone(&selector);
                let mut seen: HashSet<K> = HashSet::new();
                Box::new(move |rs: &mut RandomSource| {
                    let mut misses = 0;
                    loop {
                        let sample = inner(rs)?;
                        if seen.insert(selector(sample.value())) {
                            return Ok(sample);
                        }
                        misses += 1;
                        if misses >= DISTINCT_MAX_MISSES {
                            tracing::debug!(
                                distinct = seen.len(),
                                misses,
                                "distinct generator ran out of fresh keys"
                            );
                            return Err(PropertyError::generation_exhausted(
                                seen.len() + 1,
                                seen.len(),
                                misses,
                            ));
                        }
                    }
                })
            }),
        )
    }

    /// Each draw flips a fair coin and draws from this generator or `other`
    ///
    /// Edge cases interleave both lists, starting with this one, followed by
    /// the rest of the longer list. An Exhaustive contributes no edge cases.
    pub fn merge<G>(self, other: G) -> Arb<T>
    where
        G: Into<Gen<T>>,
    {
        let other: Gen<T> = other.into();
        let other = other.into_arb();

        let mut edgecases = Vec::with_capacity(self.edgecases.len() + other.edgecases.len());
        let mut left = self.edgecases.into_iter();
        let mut right = other.edgecases.into_iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => break,
                (a, b) => edgecases.extend(a.into_iter().chain(b)),
            }
        }

        let first = self.factory;
        let second = other.factory;
        Arb::from_factory(
            edgecases,
            Arc::new(move || -> DrawFn<T> {
                let mut first = first();
                let mut second = second();
                Box::new(move |rs: &mut RandomSource| {
                    if rs.gen_bool(0.5) {
                        first(rs)
                    } else {
                        second(rs)
                    }
                })
            }),
        )
    }

    /// Replace the edge cases, keeping the random draws
    ///
    /// The replacement edge cases have no shrink trees.
    pub fn with_edgecases(self, edgecases: Vec<T>) -> Arb<T> {
        Arb::from_factory(
            edgecases.into_iter().map(Sample::new).collect(),
            self.factory,
        )
    }

    /// Rewrite the edge case list with `f`, keeping the random draws
    ///
    /// Values `f` keeps from the old list keep their shrink trees; values it
    /// introduces do not shrink.
    pub fn modify_edgecases<F>(self, f: F) -> Arb<T>
    where
        F: FnOnce(Vec<T>) -> Vec<T>,
    {
        let originals = self.edgecases;
        let values = originals.iter().map(|sample| sample.value().clone()).collect();
        let edgecases = f(values)
            .into_iter()
            .map(|value| {
                originals
                    .iter()
                    .find(|sample| *sample.value() == value)
                    .cloned()
                    .unwrap_or_else(|| Sample::new(value))
            })
            .collect();
        Arb::from_factory(edgecases, self.factory)
    }
}

impl<T: Value> Exhaustive<T> {
    /// Transform every value, keeping enumeration order
    pub fn map<U, F>(&self, f: F) -> Exhaustive<U>
    where
        U: Value,
        F: Fn(T) -> U,
    {
        Exhaustive::from_vec(self.values.iter().cloned().map(f).collect())
    }

    /// Keep only values satisfying `predicate`; the result may be empty
    pub fn filter<P>(&self, predicate: P) -> Exhaustive<T>
    where
        P: Fn(&T) -> bool,
    {
        Exhaustive::from_vec(
            self.values
                .iter()
                .filter(|value| predicate(value))
                .cloned()
                .collect(),
        )
    }
}

impl<T: Value> Gen<T> {
    pub fn map<U, F>(self, f: F) -> Gen<U>
    where
        U: Value,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        match self {
            Gen::Arb(arb) => Gen::Arb(arb.map(f)),
            Gen::Exhaustive(exhaustive) => Gen::Exhaustive(exhaustive.map(f)),
        }
    }

    pub fn filter<P>(self, predicate: P) -> Gen<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        match self {
            Gen::Arb(arb) => Gen::Arb(arb.filter(predicate)),
            Gen::Exhaustive(exhaustive) => Gen::Exhaustive(exhaustive.filter(predicate)),
        }
    }
}
