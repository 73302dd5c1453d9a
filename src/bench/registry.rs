//! Benchmark descriptors and the ordered suite that owns them.

use super::counter::Bencher;
use crate::result::Measurement;

type Workload = Box<dyn FnMut(&mut Bencher<'_>)>;

/// A named workload plus the result of its latest run.
///
/// The workload must drive the [`Bencher`] until it returns `false`, and must
/// not carry state from one attempt into the next.
pub struct Benchmark {
    name: String,
    workload: Workload,
    last: Option<Measurement>,
}

impl Benchmark {
    /// Create a benchmark from a workload closure.
    pub fn new<F>(name: impl Into<String>, workload: F) -> Self
    where
        F: FnMut(&mut Bencher<'_>) + 'static,
    {
        Self {
            name: name.into(),
            workload: Box::new(workload),
            last: None,
        }
    }

    /// Create a benchmark whose workload receives `arg` on every run.
    pub fn with_arg<A, F>(name: impl Into<String>, arg: A, mut workload: F) -> Self
    where
        A: 'static,
        F: FnMut(&mut Bencher<'_>, &A) + 'static,
    {
        Self::new(name, move |b| workload(b, &arg))
    }

    /// The empty loop: measurement machinery and nothing else.
    pub fn empty_loop() -> Self {
        Self::new("empty-loop", |b| while b.next() {})
    }

    /// Benchmark name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Result of the most recent run, if any.
    pub fn last_result(&self) -> Option<&Measurement> {
        self.last.as_ref()
    }

    pub(crate) fn execute(&mut self, bencher: &mut Bencher<'_>) {
        (self.workload)(bencher);
    }

    pub(crate) fn record(&mut self, measurement: Measurement) {
        self.last = Some(measurement);
    }
}

impl std::fmt::Debug for Benchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benchmark")
            .field("name", &self.name)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

/// Index of a registered benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BenchId(usize);

/// Caller-owned, append-only list of benchmarks.
///
/// Benchmarks run in registration order.
#[derive(Debug, Default)]
pub struct Suite {
    benchmarks: Vec<Benchmark>,
}

impl Suite {
    /// Empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a benchmark.
    pub fn register(&mut self, benchmark: Benchmark) -> BenchId {
        self.benchmarks.push(benchmark);
        BenchId(self.benchmarks.len() - 1)
    }

    /// Append a benchmark built from a closure.
    pub fn bench<F>(&mut self, name: impl Into<String>, workload: F) -> BenchId
    where
        F: FnMut(&mut Bencher<'_>) + 'static,
    {
        self.register(Benchmark::new(name, workload))
    }

    /// Look up a benchmark.
    pub fn get(&self, id: BenchId) -> Option<&Benchmark> {
        self.benchmarks.get(id.0)
    }

    /// Number of benchmarks.
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Whether the suite is empty.
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }

    /// Benchmarks in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Benchmark> {
        self.benchmarks.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Benchmark> {
        self.benchmarks.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_order() {
        let mut suite = Suite::new();
        let a = suite.bench("a", |b| while b.next() {});
        let b = suite.register(Benchmark::with_arg("b", 7u32, |bench, arg| {
            bench.iter(|| *arg * 2)
        }));
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.get(a).map(Benchmark::name), Some("a"));
        assert_eq!(suite.get(b).map(Benchmark::name), Some("b"));
        let names: Vec<&str> = suite.iter().map(Benchmark::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_new_benchmark_has_no_result() {
        let bench = Benchmark::empty_loop();
        assert_eq!(bench.name(), "empty-loop");
        assert!(bench.last_result().is_none());
    }
}
