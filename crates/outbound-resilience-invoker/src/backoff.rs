use std::time::Duration;

/// Computes the wait before a retry.
///
/// Implementations must be pure functions of the retry index so that the
/// schedule is reproducible; randomized strategies are the one exception.
pub trait IntervalFunction: Send + Sync {
    /// Delay before the given retry.
    ///
    /// `retry` is 0-indexed: 0 is the wait between attempt 1 and attempt 2.
    fn next_interval(&self, retry: usize) -> Duration;
}

/// `base * multiplier^retry`, optionally capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Exponential backoff doubling from `base`.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    /// Sets the growth factor. Values below 1.0 are raised to 1.0 so the
    /// schedule never shrinks.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = clamp_multiplier(multiplier);
        self
    }

    /// Caps every interval at `max_interval`.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, retry: usize) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let interval = Duration::try_from_secs_f64(self.base.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX);

        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// Growth factors below 1.0, and non-finite ones, become 1.0.
pub(crate) fn clamp_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() {
        multiplier.max(1.0)
    } else {
        1.0
    }
}

/// Full jitter: a uniformly random wait in `[0, inner(retry)]`.
#[derive(Debug, Clone)]
pub struct FullJitter<I> {
    inner: I,
}

impl<I> FullJitter<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I: IntervalFunction> IntervalFunction for FullJitter<I> {
    fn next_interval(&self, retry: usize) -> Duration {
        use rand::Rng;

        let ceiling = self.inner.next_interval(retry);
        if ceiling.is_zero() {
            return ceiling;
        }
        let secs = rand::rng().random_range(0.0..=ceiling.as_secs_f64());
        Duration::from_secs_f64(secs).min(ceiling)
    }
}

/// Interval computed by a closure.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, retry: usize) -> Duration {
        (self.f)(retry)
    }
}
