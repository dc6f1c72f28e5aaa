//! Core generator types: random `Arb`s and enumerating `Exhaustive`s.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::error::PropertyError;
use crate::rng::RandomSource;
use crate::sample::{Sample, Shrinker, Value};

/// A stateful draw function scoped to one consumption of a sequence
pub(crate) type DrawFn<T> = Box<dyn FnMut(&mut RandomSource) -> Result<Sample<T>, PropertyError>>;

/// Builds a fresh draw function each time a sequence is started
pub(crate) type DrawFactory<T> = Arc<dyn Fn() -> DrawFn<T> + Send + Sync>;

/// A source of test values: either random or exhaustive
#[derive(Clone)]
pub enum Gen<T> {
    Arb(Arb<T>),
    Exhaustive(Exhaustive<T>),
}

impl<T> From<Arb<T>> for Gen<T> {
    fn from(arb: Arb<T>) -> Self {
        Gen::Arb(arb)
    }
}

impl<T> From<Exhaustive<T>> for Gen<T> {
    fn from(exhaustive: Exhaustive<T>) -> Self {
        Gen::Exhaustive(exhaustive)
    }
}

impl<T: Value> fmt::Debug for Gen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gen::Arb(arb) => fmt::Debug::fmt(arb, f),
            Gen::Exhaustive(exhaustive) => fmt::Debug::fmt(exhaustive, f),
        }
    }
}

impl<T: Value> Gen<T> {
    pub fn is_arb(&self) -> bool {
        matches!(self, Gen::Arb(_))
    }

    /// Inputs tried before any random draw: an Arb's edge cases or an
    /// Exhaustive's whole enumeration
    pub(crate) fn edgecase_samples(&self) -> Vec<Sample<T>> {
        match self {
            Gen::Arb(arb) => arb.edgecases.clone(),
            Gen::Exhaustive(exhaustive) => exhaustive
                .values
                .iter()
                .cloned()
                .map(Sample::new)
                .collect(),
        }
    }

    /// An endless per-run stream: random draws for an Arb, a cycle through the
    /// values for an Exhaustive
    pub(crate) fn stream(&self) -> GenStream<T> {
        match self {
            Gen::Arb(arb) => GenStream::Random(arb.drawer()),
            Gen::Exhaustive(exhaustive) => GenStream::Cycle {
                values: Arc::clone(&exhaustive.values),
                next: 0,
            },
        }
    }

    /// Draw through an Arb, choosing uniformly among an Exhaustive's values
    pub(crate) fn into_arb(self) -> Arb<T> {
        match self {
            Gen::Arb(arb) => arb,
            Gen::Exhaustive(exhaustive) => exhaustive.to_arb(),
        }
    }
}

pub(crate) enum GenStream<T> {
    Random(DrawFn<T>),
    Cycle { values: Arc<Vec<T>>, next: usize },
}

impl<T: Value> GenStream<T> {
    pub(crate) fn next_sample(&mut self, rs: &mut RandomSource) -> Result<Sample<T>, PropertyError> {
        match self {
            GenStream::Random(draw) => draw(rs),
            GenStream::Cycle { values, next } => {
                if values.is_empty() {
                    return Err(PropertyError::generation_exhausted(1, 0, 0));
                }
                let value = values[*next % values.len()].clone();
                *next += 1;
                Ok(Sample::new(value))
            }
        }
    }
}

/// A random generator with a fixed list of edge cases
///
/// Edge cases are kept as samples so a failing edge case still shrinks with
/// the generator's shrinker. Cloning an `Arb` is cheap.
#[derive(Clone)]
pub struct Arb<T> {
    pub(crate) edgecases: Vec<Sample<T>>,
    pub(crate) factory: DrawFactory<T>,
}

impl<T: Value> fmt::Debug for Arb<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edgecases: Vec<&T> = self.edgecases.iter().map(|s| s.value()).collect();
        f.debug_struct("Arb").field("edgecases", &edgecases).finish()
    }
}

impl<T: Value> Arb<T> {
    /// Build an Arb from edge-case samples and a draw factory, dropping
    /// repeated edge-case values
    pub(crate) fn from_factory(edgecases: Vec<Sample<T>>, factory: DrawFactory<T>) -> Self {
        let mut unique: Vec<Sample<T>> = Vec::with_capacity(edgecases.len());
        for sample in edgecases {
            if !unique.iter().any(|kept| kept.value() == sample.value()) {
                unique.push(sample);
            }
        }
        Self {
            edgecases: unique,
            factory,
        }
    }

    /// Build an Arb whose draws carry no state between calls
    pub fn from_draw<D>(edgecases: Vec<Sample<T>>, draw: D) -> Self
    where
        D: Fn(&mut RandomSource) -> Result<Sample<T>, PropertyError> + Send + Sync + 'static,
    {
        let draw = Arc::new(draw);
        Self::from_factory(
            edgecases,
            Arc::new(move || -> DrawFn<T> {
                let draw = Arc::clone(&draw);
                Box::new(move |rs: &mut RandomSource| draw(rs))
            }),
        )
    }

    /// Edge-case values, deduplicated, in insertion order
    pub fn edgecases(&self) -> Vec<T> {
        self.edgecases.iter().map(|s| s.value().clone()).collect()
    }

    /// Edge cases with their shrink trees
    pub fn edgecase_samples(&self) -> &[Sample<T>] {
        &self.edgecases
    }

    /// An infinite stream of samples drawn from `rs`
    ///
    /// Every call starts a fresh sequence, so replaying with a source built
    /// from the same seed yields the same samples.
    pub fn samples<'a>(&self, rs: &'a mut RandomSource) -> Samples<'a, T> {
        Samples {
            draw: self.drawer(),
            rs,
        }
    }

    /// The first `n` values of a fresh sequence
    pub fn values(&self, rs: &mut RandomSource, n: usize) -> Result<Vec<T>, PropertyError> {
        self.samples(rs)
            .take(n)
            .map(|sample| sample.map(Sample::into_value))
            .collect()
    }

    /// A single value from a fresh sequence
    pub fn next(&self, rs: &mut RandomSource) -> Result<T, PropertyError> {
        let mut draw = self.drawer();
        draw(rs).map(Sample::into_value)
    }

    pub(crate) fn drawer(&self) -> DrawFn<T> {
        (self.factory)()
    }
}

/// Iterator over the samples of one sequence of an [`Arb`]
pub struct Samples<'a, T> {
    draw: DrawFn<T>,
    rs: &'a mut RandomSource,
}

impl<T> Iterator for Samples<'_, T> {
    type Item = Result<Sample<T>, PropertyError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some((self.draw)(self.rs))
    }
}

/// A finite, ordered enumeration of values
#[derive(Clone)]
pub struct Exhaustive<T> {
    pub(crate) values: Arc<Vec<T>>,
}

impl<T: fmt::Debug> fmt::Debug for Exhaustive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exhaustive")
            .field("values", &self.values)
            .finish()
    }
}

impl<T: Value> Exhaustive<T> {
    pub(crate) fn from_vec(values: Vec<T>) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// All values in enumeration order
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// An Arb choosing uniformly among the values, with no edge cases and no
    /// shrinking
    pub fn to_arb(&self) -> Arb<T> {
        let values = Arc::clone(&self.values);
        Arb::from_draw(Vec::new(), move |rs| {
            if values.is_empty() {
                return Err(PropertyError::generation_exhausted(1, 0, 0));
            }
            let index = rs.gen_range(0..values.len());
            Ok(Sample::new(values[index].clone()))
        })
    }
}

/// Build an Arb from edge cases, an optional shrinker and a sampling function
///
/// Every drawn value and every edge case is shrunk with `shrinker` when one
/// is given.
pub fn arbitrary<T, F>(
    edgecases: Vec<T>,
    shrinker: Option<Arc<dyn Shrinker<T>>>,
    sample_fn: F,
) -> Arb<T>
where
    T: Value,
    F: Fn(&mut RandomSource) -> T + Send + Sync + 'static,
{
    let edge_samples = edgecases
        .into_iter()
        .map(|value| Sample::with_optional_shrinker(value, shrinker.as_ref()))
        .collect();
    Arb::from_draw(edge_samples, move |rs| {
        Ok(Sample::with_optional_shrinker(sample_fn(rs), shrinker.as_ref()))
    })
}

/// Build an Exhaustive over `values`, in order
///
/// # Panics
///
/// Panics if `values` is empty.
pub fn exhaustive<T: Value>(values: Vec<T>) -> Exhaustive<T> {
    assert!(
        !values.is_empty(),
        "exhaustive generator needs at least one value"
    );
    Exhaustive::from_vec(values)
}
