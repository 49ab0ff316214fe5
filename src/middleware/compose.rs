//! Ordered function composition

/// One transform in a [`Pipe`]
pub type Stage<R> = Box<dyn Fn(R) -> R + Send + Sync>;

/// Left-to-right composition of unary transforms.
///
/// `Pipe` of `f1, f2, f3` applied to `x` yields `f3(f2(f1(x)))`.
///
/// When `R` is a handler and the stages are middlewares, `f1` wraps the base handler
/// innermost and the last stage ends up outermost. At request time the **last-listed
/// middleware runs first** and calls inward towards the earlier ones.
pub struct Pipe<R> {
    stages: Vec<Stage<R>>,
}

impl<R> Pipe<R> {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage; it is applied after all stages added so far
    pub fn then<F>(mut self, f: F) -> Self
    where
        F: Fn(R) -> R + Send + Sync + 'static,
    {
        self.stages.push(Box::new(f));
        self
    }

    pub fn apply(&self, value: R) -> R {
        self.stages.iter().fold(value, |acc, stage| stage(acc))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<R> Default for Pipe<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> FromIterator<Stage<R>> for Pipe<R> {
    fn from_iter<I: IntoIterator<Item = Stage<R>>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

/// Compose `stages` in the given order
pub fn pipe<R>(stages: Vec<Stage<R>>) -> Pipe<R> {
    stages.into_iter().collect()
}
