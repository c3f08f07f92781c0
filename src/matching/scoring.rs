use std::collections::BTreeMap;

use crate::core::bead::INVALID_SILHOUETTE;
use crate::core::types::Distance;

/// Hairpins sorted by increasing cost.
///
/// The sort is stable: equal costs keep the map's name order.
#[must_use]
pub fn ranking(distances: &BTreeMap<String, Distance>) -> Vec<(&String, &Distance)> {
    let mut ranked: Vec<_> = distances.iter().collect();
    ranked.sort_by(|a, b| {
        a.1.value
            .partial_cmp(&b.1.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Confidence of the best fit against the runner-up.
///
/// `((b - a) / max(a, b) - 0.5) * 2` with `a` the best cost and `b` the
/// second best. A single candidate scores 1 and no candidate scores
/// [`INVALID_SILHOUETTE`].
#[must_use]
pub fn silhouette(distances: &BTreeMap<String, Distance>) -> f64 {
    let ranked = ranking(distances);
    match ranked.as_slice() {
        [] => INVALID_SILHOUETTE,
        [_] => 1.0,
        [(_, best), (_, second), ..] => {
            let (a, b) = (best.value, second.value);
            let scale = a.max(b);
            let ratio = if scale > 0.0 { (b - a) / scale } else { 0.0 };
            (ratio - 0.5) * 2.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distances(values: &[f64]) -> BTreeMap<String, Distance> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (format!("hp{i}"), Distance::new(v, 1.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_ranking_is_stable() {
        let map = distances(&[0.5, 0.1, 0.5]);
        let names: Vec<&str> = ranking(&map).iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["hp1", "hp0", "hp2"]);
    }

    #[test]
    fn test_silhouette_edge_cases() {
        assert_eq!(silhouette(&BTreeMap::new()), INVALID_SILHOUETTE);
        assert_eq!(silhouette(&distances(&[0.3])), 1.0);
        // Identical costs: no contrast at all
        assert_eq!(silhouette(&distances(&[0.3, 0.3])), -1.0);
        assert_eq!(silhouette(&distances(&[0.0, 0.0])), -1.0);
    }

    #[test]
    fn test_silhouette_contrast() {
        assert!((silhouette(&distances(&[0.1, 1.0])) - 0.8).abs() < 1e-12);
        assert!((silhouette(&distances(&[0.5, 1.0, 0.75])) - (-1.0 / 3.0)).abs() < 1e-12);
        assert!((silhouette(&distances(&[0.0, 1.0])) - 1.0).abs() < 1e-12);
    }
}
