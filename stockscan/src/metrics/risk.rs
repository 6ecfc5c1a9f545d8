//! Return-based risk metrics.

use statrs::statistics::Statistics;

use super::{annualise, Metric};
use crate::data::ReturnSeries;

/// Sortino ratio of per-period returns against a minimum acceptable return.
///
/// Downside deviation is the root mean square of the returns that fall below
/// `minimum_acceptable`. With no such returns, or a zero deviation, the ratio
/// is undefined rather than infinite.
pub fn sortino_ratio(returns: &[f64], minimum_acceptable: f64) -> Metric {
    let downside: Vec<f64> = returns
        .iter()
        .copied()
        .filter(|r| *r < minimum_acceptable)
        .collect();

    if downside.is_empty() {
        return Metric::Undefined;
    }

    let downside_dev = downside.iter().quadratic_mean();
    if downside_dev == 0.0 || !downside_dev.is_finite() {
        return Metric::Undefined;
    }

    Metric::new((returns.iter().mean() - minimum_acceptable) / downside_dev)
}

/// Intercept of the ordinary least squares fit `y = a + b·x`.
///
/// Takes `(y, x)` pairs. Undefined for fewer than two points or when `x`
/// has zero variance. Variance is compared against the mean square of `x`
/// since a constant series leaves rounding noise rather than an exact zero.
pub fn regression_intercept(pairs: &[(f64, f64)]) -> Metric {
    if pairs.len() < 2 {
        return Metric::Undefined;
    }

    let ys: Vec<f64> = pairs.iter().map(|(y, _)| *y).collect();
    let xs: Vec<f64> = pairs.iter().map(|(_, x)| *x).collect();

    let var_x = xs.iter().variance();
    let scale = xs.iter().map(|x| x * x).mean();
    if !var_x.is_finite() || var_x <= f64::EPSILON * scale {
        return Metric::Undefined;
    }

    let slope = xs.iter().covariance(ys.iter()) / var_x;
    Metric::new(ys.iter().mean() - slope * xs.iter().mean())
}

/// Annualised CAPM alpha of `returns` against `benchmark`.
///
/// The two series are inner-joined on date. Fewer than `min_overlap` common
/// dates leaves alpha undefined.
pub fn annualised_alpha(
    returns: &ReturnSeries,
    benchmark: &ReturnSeries,
    min_overlap: usize,
    periods_per_year: u32,
) -> Metric {
    let aligned = returns.align_with(benchmark);
    if aligned.len() < min_overlap {
        return Metric::Undefined;
    }

    annualise(regression_intercept(&aligned), periods_per_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReturnPoint;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        ReturnSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| ReturnPoint {
                    date: start + Duration::days(i as i64),
                    value: *v,
                })
                .collect(),
        )
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| ((i as f64) * 0.7).sin() * 0.01).collect()
    }

    #[test]
    fn test_sortino_no_downside_is_undefined() {
        assert_eq!(sortino_ratio(&[0.01, 0.02, 0.03], 0.0), Metric::Undefined);
        assert_eq!(sortino_ratio(&[5.0; 300], 0.0), Metric::Undefined);
        assert_eq!(sortino_ratio(&[], 0.0), Metric::Undefined);
    }

    #[test]
    fn test_sortino_value() {
        // downside = [-0.02]; dd = 0.02; mean = 0.02 / 4 = 0.005
        let r = sortino_ratio(&[0.01, -0.02, 0.03, 0.0], 0.0);
        let v = r.value().unwrap();
        assert!((v - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_sortino_with_threshold() {
        // returns below 0.01: [0.0, -0.01]; dd = sqrt((0 + 0.0001) / 2)
        let returns = [0.02, 0.0, -0.01, 0.03];
        let dd = (0.0001f64 / 2.0).sqrt();
        let expected = (0.01 - 0.01) / dd;
        let v = sortino_ratio(&returns, 0.01).value().unwrap();
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sortino_zero_downside_deviation() {
        // every return is below the threshold but all are zero
        assert_eq!(sortino_ratio(&[0.0, 0.0, 0.0], 1e-300), Metric::Undefined);
    }

    #[test]
    fn test_intercept_recovers_line() {
        let pairs: Vec<(f64, f64)> = (0..50)
            .map(|i| {
                let x = i as f64 * 0.001 - 0.02;
                (0.0005 + 1.3 * x, x)
            })
            .collect();

        let a = regression_intercept(&pairs).value().unwrap();
        assert!((a - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn test_intercept_zero_variance_is_undefined() {
        let pairs = vec![(0.01, 0.002); 40];
        assert_eq!(regression_intercept(&pairs), Metric::Undefined);

        let pairs: Vec<(f64, f64)> = (0..300).map(|i| (i as f64 * 1e-5, 0.0013)).collect();
        assert_eq!(regression_intercept(&pairs), Metric::Undefined);

        assert_eq!(regression_intercept(&[(0.01, 0.0); 10]), Metric::Undefined);
    }

    #[test]
    fn test_intercept_small_variance_is_defined() {
        // benchmark moves by a few basis points around a constant drift
        let pairs: Vec<(f64, f64)> = (0..100)
            .map(|i| {
                let x = 0.001 + if i % 2 == 0 { 1e-4 } else { -1e-4 };
                (0.0003 + 0.5 * x, x)
            })
            .collect();

        let a = regression_intercept(&pairs).value().unwrap();
        assert!((a - 0.0003).abs() < 1e-10);
    }

    #[test]
    fn test_alpha_constant_benchmark_is_undefined() {
        let bench = series(&[0.0004; 300]);
        let stock = series(&wave(300));
        assert_eq!(annualised_alpha(&stock, &bench, 30, 252), Metric::Undefined);
    }

    #[test]
    fn test_alpha_requires_overlap() {
        let bench = wave(29);
        let stock: Vec<f64> = bench.iter().map(|b| 0.001 + b).collect();
        assert_eq!(
            annualised_alpha(&series(&stock), &series(&bench), 30, 252),
            Metric::Undefined
        );
    }

    #[test]
    fn test_alpha_overlap_counts_common_dates_only() {
        // 40 points each but shifted by 15 days: 25 common dates
        let bench = series(&wave(40));
        let start = NaiveDate::from_ymd_opt(2023, 1, 17).unwrap();
        let stock = ReturnSeries::new(
            wave(40)
                .into_iter()
                .enumerate()
                .map(|(i, v)| ReturnPoint {
                    date: start + Duration::days(i as i64),
                    value: v,
                })
                .collect(),
        );
        assert_eq!(annualised_alpha(&stock, &bench, 30, 252), Metric::Undefined);
    }

    #[test]
    fn test_alpha_annualised_intercept() {
        let bench = wave(300);
        let stock: Vec<f64> = bench.iter().map(|b| 0.0002 + 0.8 * b).collect();

        let alpha = annualised_alpha(&series(&stock), &series(&bench), 30, 252)
            .value()
            .unwrap();
        assert!((alpha - 0.0002 * 252.0).abs() < 1e-9);
    }
}
