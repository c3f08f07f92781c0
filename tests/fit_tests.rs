//! End-to-end fits through the library API
//!
//! These tests build catalogs and beads the way a caller would and check
//! the recovered transforms, the confidence scores and the peak labels.

use std::collections::BTreeMap;

use hairpin_solver::matching::{silhouette, PeakIdentifier};
use hairpin_solver::sequences::split;
use hairpin_solver::{
    Bead, BeadClassifier, ClassifierConfig, Distance, FitParams, FitterKind, HairpinCatalog,
    HairpinFitter, HairpinModel, Range, INVALID_SILHOUETTE,
};

const STRETCH: f64 = 1100.0;
const BIAS: f64 = 0.01;

/// Bead measured on `model` with one binding missed and one spurious blockage
fn measured_bead(key: &str) -> Bead {
    let positions: Vec<f64> = [0.0, 210.0, 480.0, 1400.0, 2000.0]
        .iter()
        .map(|t| t / STRETCH + BIAS)
        .collect();
    let mut positions = positions;
    positions.push(1.0);
    positions.sort_by(f64::total_cmp);
    Bead::new(key, &positions)
}

fn catalog() -> HairpinCatalog {
    let mut catalog = HairpinCatalog::new();
    catalog.add(
        "good",
        HairpinModel::new(vec![0.0, 210.0, 480.0, 890.0, 1400.0, 2000.0], true).unwrap(),
    );
    catalog.add(
        "other",
        HairpinModel::new(vec![0.0, 350.0, 700.0, 1150.0, 1600.0, 2000.0], true).unwrap(),
    );
    catalog
}

fn small_params() -> FitParams {
    FitParams {
        stretch: Range::new(Some(2.0), 0.5, 0.25),
        bias: Range::new(None, 0.5, 0.25),
        sigma: 1.0,
        window: 1.5,
        ..FitParams::default()
    }
}

#[test]
fn test_every_fitter_recovers_transform_with_outlier() {
    let model = HairpinModel::new(vec![0.0, 5.0, 12.0, 20.0], true).unwrap();
    let shuffled = HairpinModel::new(vec![0.0, 9.0, 15.0, 20.0], true).unwrap();
    // Affine image of 0, 5 and 20 plus an outlier at 5.0
    let experimental = [1.0, 3.5, 5.0, 11.0];

    for kind in [FitterKind::Gaussian, FitterKind::ChiSquare, FitterKind::PeakGrid] {
        let found = HairpinFitter::new(&model, small_params(), kind).optimize(&experimental);
        assert!(found.is_fitted(), "{kind:?}");
        assert!((found.stretch - 2.0).abs() < 0.05, "{kind:?}: {found:?}");
        assert!((found.bias - 1.0).abs() < 0.05, "{kind:?}: {found:?}");
        if kind == FitterKind::Gaussian {
            continue;
        }

        // Chi-square costs are comparable across hairpins
        let other = HairpinFitter::new(&shuffled, small_params(), kind).optimize(&experimental);
        assert!(found.value < other.value, "{kind:?}: {found:?} vs {other:?}");
    }
}

#[test]
fn test_classify_with_default_configuration() {
    let catalog = catalog();
    let classifier = BeadClassifier::new(&catalog);
    let result = classifier.classify(&measured_bead("b0"), None);

    assert_eq!(result.hairpin.as_deref(), Some("good"));
    let best = result.best().unwrap();
    assert!((best.stretch - STRETCH).abs() < STRETCH * 0.01, "{best:?}");
    assert!((best.bias - BIAS).abs() < 5e-4, "{best:?}");
    assert!(best.value < result.distances["other"].value);
    assert!(result.silhouette > -1.0 && result.silhouette <= 1.0);

    // The spurious blockage at 1 µm stays unassigned
    let keys: Vec<Option<i64>> = result.peaks.iter().map(|p| p.key).collect();
    assert_eq!(keys, vec![Some(0), Some(210), Some(480), None, Some(1400), Some(2000)]);
}

#[test]
fn test_classify_from_sequences() {
    let oligos = split("atat,ccc,$").unwrap();
    let sequences = vec![("hp".to_string(), "atcgATATATgtcgCCCaaGGG".to_string())];
    let catalog = HairpinCatalog::from_sequences(&sequences, &oligos);
    assert_eq!(catalog.get("hp").unwrap().peaks(), &[0.0, 8.0, 10.0, 17.0, 22.0]);

    let config = ClassifierConfig {
        params: small_params(),
        identify_window: 0.9,
        ..ClassifierConfig::default()
    };
    // stretch 2, bias 1 image of 0, 8, 17 and 22
    let bead = Bead::new(4, &[1.0, 5.0, 9.5, 12.0]);
    let result = BeadClassifier::with_config(&catalog, config).classify(&bead, None);

    assert_eq!(result.hairpin.as_deref(), Some("hp"));
    assert_eq!(result.silhouette, 1.0);
    let best = result.best().unwrap();
    assert!((best.stretch - 2.0).abs() < 1e-2, "{best:?}");
    assert!((best.bias - 1.0).abs() < 1e-2, "{best:?}");
}

#[test]
fn test_silhouette_by_candidate_count() {
    let model = HairpinModel::new(vec![0.0, 210.0, 480.0, 890.0, 1400.0, 2000.0], true).unwrap();
    let bead = measured_bead("b1");

    let empty = HairpinCatalog::new();
    let result = BeadClassifier::new(&empty).classify(&bead, None);
    assert_eq!(result.silhouette, INVALID_SILHOUETTE);
    assert!(result.hairpin.is_none());

    let mut single = HairpinCatalog::new();
    single.add("a", model.clone());
    assert_eq!(BeadClassifier::new(&single).classify(&bead, None).silhouette, 1.0);

    let mut duplicates = HairpinCatalog::new();
    duplicates.add("a", model.clone());
    duplicates.add("b", model.clone());
    duplicates.add("c", model);
    let result = BeadClassifier::new(&duplicates).classify(&bead, None);
    assert_eq!(result.silhouette, -1.0);
    assert_eq!(result.hairpin.as_deref(), Some("a"));
}

#[test]
fn test_silhouette_is_bounded() {
    let mut distances = BTreeMap::new();
    distances.insert("a".to_string(), Distance::new(0.5, 1.0, 0.0));
    distances.insert("b".to_string(), Distance::new(3.0, 1.0, 0.0));
    distances.insert("c".to_string(), Distance::new(9.0, 1.0, 0.0));
    let score = silhouette(&distances);
    assert!((-1.0..=1.0).contains(&score));
    assert!((score - ((2.5 / 3.0) - 0.5) * 2.0).abs() < 1e-12);
}

#[test]
fn test_identify_labels_each_position_once() {
    let model = HairpinModel::new(vec![0.0, 10.0, 20.0, 30.0, 40.0], true).unwrap();
    let identifier = PeakIdentifier::new(&model, 4.0);
    let distance = Distance::new(0.0, 1.0, 0.0);
    let labels = identifier.identify(&[0.0, 9.0, 11.0, 12.0, 29.0, 31.0, 40.0], &distance);

    let found: Vec<f64> = labels.iter().flatten().copied().collect();
    let mut unique = found.clone();
    unique.dedup();
    assert_eq!(found, unique);
    assert_eq!(labels.len(), 7);
}
