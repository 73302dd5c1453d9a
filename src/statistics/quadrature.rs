//! Error propagation in quadrature.
//!
//! Independent error magnitudes combine as `sqrt(a² + b²)`. Treating the
//! instrumentation error of a benchmark and of its empty-loop baseline as
//! independent is a modeling assumption, not something the measurements prove.

/// Combine two independent, non-negative error magnitudes.
#[inline]
pub fn combine(a: f64, b: f64) -> f64 {
    (a * a + b * b).sqrt()
}

/// Combine any number of independent error magnitudes.
pub fn combine_all<I>(errors: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    errors.into_iter().map(|e| e * e).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_identity() {
        for a in [0.0, 0.5, 3.0, 1e9] {
            assert_eq!(combine(a, 0.0), a);
        }
    }

    #[test]
    fn test_combine_commutative() {
        assert_eq!(combine(3.0, 4.0), combine(4.0, 3.0));
        assert_eq!(combine(3.0, 4.0), 5.0);
    }

    #[test]
    fn test_combine_never_exceeds_sum() {
        let (a, b) = (7.0, 24.0);
        assert!(combine(a, b) <= a + b);
        assert_eq!(combine(a, b), 25.0);
    }

    #[test]
    fn test_combine_all() {
        assert_eq!(combine_all([]), 0.0);
        assert_eq!(combine_all([2.0, 3.0, 6.0]), 7.0);
    }
}
