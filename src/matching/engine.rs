use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::store::HairpinCatalog;
use crate::core::bead::{Bead, BeadConstraint, FitResult, PivotContext};
use crate::core::hairpin::HairpinModel;
use crate::core::types::Pivot;
use crate::matching::fitter::{FitParams, FitterKind, HairpinFitter, DEFAULT_WINDOW};
use crate::matching::identify::{unassigned, PeakIdentifier};
use crate::matching::scoring::{ranking, silhouette};
use crate::utils::validation::{check_positive, Validate};

/// Configuration of the bead classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub fitter: FitterKind,
    pub params: FitParams,
    /// Window used to label peaks once the best hairpin is known, in base pairs
    pub identify_window: f64,
    /// Skip hairpins whose size does not fit the bead extension
    pub pull_phase_ratio: Option<f64>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            fitter: FitterKind::default(),
            params: FitParams::default(),
            identify_window: DEFAULT_WINDOW,
            pull_phase_ratio: None,
        }
    }
}

impl Validate for ClassifierConfig {
    fn invalid(&self) -> Option<String> {
        self.params
            .invalid()
            .or_else(|| check_positive("identify_window", self.identify_window))
            .or_else(|| {
                self.pull_phase_ratio
                    .and_then(|ratio| check_positive("pull_phase_ratio", ratio))
            })
    }
}

/// Fits beads to every hairpin of a catalog and keeps the best one
pub struct BeadClassifier<'a> {
    catalog: &'a HairpinCatalog,
    config: ClassifierConfig,
}

impl<'a> BeadClassifier<'a> {
    /// Create a classifier with default configuration
    #[must_use]
    pub fn new(catalog: &'a HairpinCatalog) -> Self {
        Self {
            catalog,
            config: ClassifierConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(catalog: &'a HairpinCatalog, config: ClassifierConfig) -> Self {
        Self { catalog, config }
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Hairpins to fit, in name order
    fn candidates(
        &self,
        bead: &Bead,
        constraint: Option<&BeadConstraint>,
        params: &FitParams,
    ) -> Vec<(&'a String, &'a HairpinModel)> {
        if let Some(name) = constraint.and_then(|c| c.hairpin.as_ref()) {
            if let Some(found) = self.catalog.hairpins().get_key_value(name) {
                return vec![found];
            }
            warn!(
                "Bead {}: unknown hairpin {name}, fitting all hairpins",
                bead.key_string()
            );
        }

        self.catalog
            .iter()
            .filter(|(name, model)| {
                match (self.config.pull_phase_ratio, bead.extension) {
                    (Some(ratio), Some(extension)) => {
                        let keep =
                            model.within_range(extension * ratio, &params.stretch, &params.bias);
                        if !keep {
                            debug!("Bead {}: {name} does not fit the extension", bead.key_string());
                        }
                        keep
                    }
                    _ => true,
                }
            })
            .collect()
    }

    /// Fit a single bead.
    ///
    /// A bead without peaks, or a catalog without hairpins, still yields a
    /// result: sentinel distances and an invalid silhouette respectively.
    #[must_use]
    pub fn classify(&self, bead: &Bead, constraint: Option<&BeadConstraint>) -> FitResult {
        let params = match constraint {
            Some(constraint) => self.config.params.with_constraint(constraint),
            None => self.config.params.clone(),
        };
        let positions = bead.positions();

        let mut models = BTreeMap::new();
        let mut distances = BTreeMap::new();
        for (name, model) in self.candidates(bead, constraint, &params) {
            let (model, params) = adapt(model, &params, bead.context);
            let distance = if positions.is_empty() {
                params.sentinel()
            } else {
                HairpinFitter::new(&model, params, self.config.fitter).optimize(&positions)
            };
            debug!(
                "Bead {}: {name} cost {:.4} stretch {:.2} bias {:.5}",
                bead.key_string(),
                distance.value,
                distance.stretch,
                distance.bias
            );
            distances.insert(name.clone(), distance);
            models.insert(name.clone(), model);
        }

        let score = silhouette(&distances);
        let best = ranking(&distances)
            .into_iter()
            .next()
            .filter(|(_, distance)| distance.is_fitted())
            .map(|(name, distance)| (name.clone(), *distance));

        let peaks = match best
            .as_ref()
            .and_then(|(name, distance)| Some((models.get(name)?, distance)))
        {
            Some((model, distance)) => PeakIdentifier::new(model, self.config.identify_window)
                .assign(&bead.peaks, distance),
            None => unassigned(&bead.peaks),
        };
        let hairpin = best.map(|(name, _)| name);

        FitResult {
            key: bead.key.clone(),
            silhouette: score,
            distances,
            hairpin,
            peaks,
        }
    }
}

/// Model and parameters adjusted to the ends detected in the bead
fn adapt(
    model: &HairpinModel,
    params: &FitParams,
    context: PivotContext,
) -> (HairpinModel, FitParams) {
    let mut model = model.clone();
    let mut params = params.clone();
    match context.single_strand {
        Some(true) if model.single_strand => params.pivot = Pivot::Top,
        Some(false) => model = model.with_single_strand(false),
        _ => {}
    }
    if context.baseline == Some(false) && !model.single_strand {
        params.pivot = Pivot::Absolute;
    }
    (model, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bead::INVALID_SILHOUETTE;
    use crate::core::types::{Range, RangeOverride};

    fn config() -> ClassifierConfig {
        ClassifierConfig {
            fitter: FitterKind::PeakGrid,
            params: FitParams {
                stretch: Range::new(Some(2.0), 0.5, 0.25),
                bias: Range::new(None, 0.5, 0.25),
                sigma: 1.0,
                window: 1.5,
                ..FitParams::default()
            },
            identify_window: 1.5,
            pull_phase_ratio: None,
        }
    }

    fn catalog() -> HairpinCatalog {
        let mut catalog = HairpinCatalog::new();
        catalog.add("good", HairpinModel::new(vec![0.0, 5.0, 12.0, 20.0], true).unwrap());
        catalog.add("other", HairpinModel::new(vec![0.0, 9.0, 15.0, 20.0], true).unwrap());
        catalog
    }

    fn bead() -> Bead {
        Bead::new("b0", &[1.0, 3.5, 5.0, 11.0])
    }

    #[test]
    fn test_classify_picks_best_hairpin() {
        let catalog = catalog();
        let classifier = BeadClassifier::with_config(&catalog, config());
        let result = classifier.classify(&bead(), None);

        assert_eq!(result.hairpin.as_deref(), Some("good"));
        assert_eq!(result.distances.len(), 2);
        assert!(result.silhouette > -1.0 && result.silhouette <= 1.0);
        let best = result.best().unwrap();
        assert!((best.stretch - 2.0).abs() < 1e-6);
        assert!((best.bias - 1.0).abs() < 1e-6);

        let keys: Vec<Option<i64>> = result.peaks.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![Some(0), Some(5), None, Some(20)]);
        assert_eq!(result.assigned(), 3);
    }

    #[test]
    fn test_classify_forced_hairpin() {
        let catalog = catalog();
        let classifier = BeadClassifier::with_config(&catalog, config());
        let constraint = BeadConstraint {
            hairpin: Some("other".to_string()),
            stretch: Some(RangeOverride {
                size: Some(0.1),
                ..RangeOverride::default()
            }),
            bias: None,
        };
        let result = classifier.classify(&bead(), Some(&constraint));
        assert_eq!(result.distances.len(), 1);
        assert_eq!(result.silhouette, 1.0);
        assert_eq!(result.hairpin.as_deref(), Some("other"));
        // The shared configuration is untouched
        assert_eq!(classifier.config().params.stretch.size, 0.5);
    }

    #[test]
    fn test_classify_unknown_forced_hairpin_fits_all() {
        let catalog = catalog();
        let classifier = BeadClassifier::with_config(&catalog, config());
        let constraint = BeadConstraint {
            hairpin: Some("missing".to_string()),
            ..BeadConstraint::default()
        };
        let result = classifier.classify(&bead(), Some(&constraint));
        assert_eq!(result.distances.len(), 2);
    }

    #[test]
    fn test_classify_duplicate_hairpins() {
        let mut catalog = HairpinCatalog::new();
        let model = HairpinModel::new(vec![0.0, 5.0, 12.0, 20.0], true).unwrap();
        catalog.add("a", model.clone());
        catalog.add("b", model);
        let result = BeadClassifier::with_config(&catalog, config()).classify(&bead(), None);
        assert_eq!(result.silhouette, -1.0);
        assert_eq!(result.hairpin.as_deref(), Some("a"));
    }

    #[test]
    fn test_classify_empty_inputs() {
        let empty = HairpinCatalog::new();
        let result = BeadClassifier::with_config(&empty, config()).classify(&bead(), None);
        assert_eq!(result.silhouette, INVALID_SILHOUETTE);
        assert!(result.hairpin.is_none());
        assert_eq!(result.peaks.len(), 4);
        assert_eq!(result.assigned(), 0);

        let catalog = catalog();
        let classifier = BeadClassifier::with_config(&catalog, config());
        let result = classifier.classify(&Bead::new(1, &[]), None);
        assert_eq!(result.distances.len(), 2);
        assert!(result.distances.values().all(|d| !d.is_fitted()));
        assert!(result.hairpin.is_none());
        assert!(result.peaks.is_empty());
    }

    #[test]
    fn test_classify_extension_filter() {
        let catalog = catalog();
        let mut config = config();
        config.pull_phase_ratio = Some(1.0);
        let classifier = BeadClassifier::with_config(&catalog, config);

        let mut bead = bead();
        // Both hairpins are 20 bp long, 10 µm at stretch 2.
        bead.extension = Some(10.0);
        assert_eq!(classifier.classify(&bead, None).distances.len(), 2);
        bead.extension = Some(20.0);
        assert!(classifier.classify(&bead, None).distances.is_empty());
    }

    #[test]
    fn test_classify_extension_filter_follows_ranges() {
        let mut catalog = HairpinCatalog::new();
        catalog.add("hp", HairpinModel::new(vec![0.0, 500.0, 1200.0, 2000.0], true).unwrap());
        let config = ClassifierConfig {
            pull_phase_ratio: Some(1.0),
            ..ClassifierConfig::default()
        };
        let classifier = BeadClassifier::with_config(&catalog, config);

        // Stretch 1000 is far from the default center but inside its range
        let mut bead = Bead::new("b1", &[0.0, 0.5, 1.2, 2.0]);
        bead.extension = Some(2.0);
        let result = classifier.classify(&bead, None);
        assert_eq!(result.hairpin.as_deref(), Some("hp"));
        let best = result.best().unwrap();
        assert!((best.stretch - 1000.0).abs() < 1e-3, "{best:?}");
        assert!(best.bias.abs() < 1e-6, "{best:?}");
    }

    #[test]
    fn test_adapt_pivot() {
        let params = FitParams::default();
        let model = HairpinModel::new(vec![0.0, 5.0, 20.0], true).unwrap();

        let context = |baseline, single_strand| PivotContext {
            baseline,
            single_strand,
        };

        let (adapted, p) = adapt(&model, &params, context(None, Some(true)));
        assert_eq!(p.pivot, Pivot::Top);
        assert!(adapted.single_strand);

        let (adapted, p) = adapt(&model, &params, context(Some(false), Some(false)));
        assert!(!adapted.single_strand);
        assert_eq!(p.pivot, Pivot::Absolute);

        let (_, p) = adapt(&model, &params, context(Some(false), None));
        assert_eq!(p.pivot, Pivot::Bottom);
    }
}
