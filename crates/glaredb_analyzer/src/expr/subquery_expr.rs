use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::scalar::ScalarValue;
use crate::errors::Result;
use crate::logical::operator::LogicalOperator;

/// Values produced by evaluating a subquery.
pub type SubqueryResults = Arc<Vec<ScalarValue>>;

/// Result cache shared by every copy of a subquery expression.
///
/// The first reader computes and stores the results while holding the lock,
/// concurrent readers wait on it and then observe the stored results. This
/// guarantees the subquery runs at most once per execution.
#[derive(Debug, Clone, Default)]
pub struct SubqueryCache {
    results: Arc<Mutex<Option<SubqueryResults>>>,
}

impl SubqueryCache {
    pub fn get_or_compute<F>(&self, compute: F) -> Result<SubqueryResults>
    where
        F: FnOnce() -> Result<Vec<ScalarValue>>,
    {
        let mut results = self.results.lock();
        if let Some(results) = results.as_ref() {
            return Ok(results.clone());
        }

        let computed = Arc::new(compute()?);
        *results = Some(computed.clone());

        Ok(computed)
    }

    pub fn is_populated(&self) -> bool {
        self.results.lock().is_some()
    }

    /// Drop cached results, e.g. between executions of a prepared plan.
    pub fn clear(&self) {
        *self.results.lock() = None;
    }
}

/// A subquery used as a scalar expression, e.g. `WHERE x = (SELECT ...)`.
#[derive(Debug, Clone)]
pub struct SubqueryExpr {
    pub query: Box<LogicalOperator>,
    /// Set by analysis once the subquery is known to produce the same results
    /// for every outer row.
    pub cacheable: bool,
    pub cache: SubqueryCache,
}

impl SubqueryExpr {
    pub fn new(query: LogicalOperator) -> Self {
        SubqueryExpr {
            query: Box::new(query),
            cacheable: false,
            cache: SubqueryCache::default(),
        }
    }

    pub fn with_query(mut self, query: LogicalOperator) -> Self {
        self.query = Box::new(query);
        self
    }

    pub fn with_cached_results(mut self) -> Self {
        self.cacheable = true;
        self
    }

    pub fn resolved(&self) -> bool {
        self.query.resolved()
    }

    /// Get the results of this subquery, computing them with `compute`.
    ///
    /// Cacheable subqueries compute once and reuse the results afterwards,
    /// everything else calls `compute` every time.
    pub fn results<F>(&self, compute: F) -> Result<SubqueryResults>
    where
        F: FnOnce() -> Result<Vec<ScalarValue>>,
    {
        if self.cacheable {
            self.cache.get_or_compute(compute)
        } else {
            Ok(Arc::new(compute()?))
        }
    }
}

impl PartialEq for SubqueryExpr {
    fn eq(&self, other: &Self) -> bool {
        // Cache contents are execution state.
        self.cacheable == other.cacheable && self.query == other.query
    }
}

impl fmt::Display for SubqueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cacheable {
            write!(f, "(subquery cacheable)")
        } else {
            write!(f, "(subquery)")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rayon::prelude::*;

    use super::*;
    use crate::logical::builder::PlanBuilder;

    fn subquery() -> SubqueryExpr {
        SubqueryExpr::new(PlanBuilder::unresolved_table("t1").build())
    }

    #[test]
    fn cacheable_computes_once() {
        let sq = subquery().with_cached_results();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let results = sq
                .results(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![ScalarValue::Int64(4)])
                })
                .unwrap();
            assert_eq!(&[ScalarValue::Int64(4)], results.as_slice());
        }

        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn not_cacheable_computes_every_time() {
        let sq = subquery();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            sq.results(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![])
            })
            .unwrap();
        }

        assert_eq!(3, calls.load(Ordering::SeqCst));
        assert!(!sq.cache.is_populated());
    }

    #[test]
    fn concurrent_readers_compute_once() {
        let sq = subquery().with_cached_results();
        let calls = AtomicUsize::new(0);

        (0..64).into_par_iter().for_each(|_| {
            let results = sq
                .results(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![ScalarValue::Boolean(true)])
                })
                .unwrap();
            assert_eq!(1, results.len());
        });

        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn clones_share_cache() {
        let sq = subquery().with_cached_results();
        let cloned = sq.clone();

        sq.results(|| Ok(vec![ScalarValue::Int64(1)])).unwrap();
        assert!(cloned.cache.is_populated());

        cloned.cache.clear();
        assert!(!sq.cache.is_populated());
    }

    #[test]
    fn equality_ignores_cache_contents() {
        let a = subquery().with_cached_results();
        let b = subquery().with_cached_results();
        a.results(|| Ok(vec![ScalarValue::Null])).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, subquery());
    }
}
