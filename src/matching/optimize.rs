//! Bounded Nelder-Mead minimizer.
//!
//! Bounds come in two flavors:
//!
//! - [`Bounds::Box`]: trial points are projected onto the box
//! - [`Bounds::Inequalities`]: trial points outside the intervals are
//!   rejected (their value is `+∞`)

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("objective is not finite at {0:?}")]
    Divergence(Vec<f64>),
}

pub const DEFAULT_XREL: f64 = 1e-4;
pub const DEFAULT_XABS: f64 = 1e-8;
pub const DEFAULT_FREL: f64 = 1e-4;
pub const DEFAULT_STOPVAL: f64 = 1e-8;
pub const DEFAULT_MAX_EVAL: usize = 100;

/// Stopping criteria of the local optimizer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Relative tolerance on parameters
    pub xrel: f64,
    /// Absolute tolerance on parameters
    pub xabs: f64,
    /// Relative tolerance on the objective
    pub frel: f64,
    /// Stop as soon as the objective is below this value
    pub stopval: f64,
    /// Maximum number of objective evaluations
    pub max_eval: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            xrel: DEFAULT_XREL,
            xabs: DEFAULT_XABS,
            frel: DEFAULT_FREL,
            stopval: DEFAULT_STOPVAL,
            max_eval: DEFAULT_MAX_EVAL,
        }
    }
}

/// Feasible region, one `(lower, upper)` interval per parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    Box(Vec<(f64, f64)>),
    Inequalities(Vec<(f64, f64)>),
}

impl Bounds {
    fn intervals(&self) -> &[(f64, f64)] {
        match self {
            Self::Box(v) | Self::Inequalities(v) => v,
        }
    }

    fn project(&self, x: &mut [f64]) {
        if let Self::Box(intervals) = self {
            for (value, &(lower, upper)) in x.iter_mut().zip(intervals) {
                *value = value.clamp(lower, upper);
            }
        }
    }

    fn feasible(&self, x: &[f64]) -> bool {
        match self {
            Self::Box(_) => true,
            Self::Inequalities(intervals) => x
                .iter()
                .zip(intervals)
                .all(|(value, &(lower, upper))| lower <= *value && *value <= upper),
        }
    }
}

/// Best point found
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub evaluations: usize,
}

struct Objective<'a, F> {
    func: F,
    bounds: &'a Bounds,
    evaluations: usize,
}

impl<F: FnMut(&[f64]) -> f64> Objective<'_, F> {
    fn eval(&mut self, mut x: Vec<f64>) -> (Vec<f64>, f64) {
        self.bounds.project(&mut x);
        if !self.bounds.feasible(&x) {
            return (x, f64::INFINITY);
        }
        self.evaluations += 1;
        let value = (self.func)(&x);
        (x, if value.is_nan() { f64::INFINITY } else { value })
    }
}

fn combine(a: &[f64], b: &[f64], coef: f64) -> Vec<f64> {
    // a + coef * (a - b)
    a.iter().zip(b).map(|(x, y)| x + coef * (x - y)).collect()
}

/// Minimize `func` starting from `start`.
///
/// `steps` gives the initial simplex size along each parameter; steps
/// pointing out of the bounds are mirrored.
///
/// # Errors
///
/// Returns `OptimizerError::Divergence` if the objective is not finite at
/// the start point or at the returned minimum.
pub fn minimize<F>(
    func: F,
    start: &[f64],
    steps: &[f64],
    bounds: &Bounds,
    config: &OptimizerConfig,
) -> Result<Minimum, OptimizerError>
where
    F: FnMut(&[f64]) -> f64,
{
    let dims = start.len();
    let mut objective = Objective {
        func,
        bounds,
        evaluations: 0,
    };

    let first = objective.eval(start.to_vec());
    if !first.1.is_finite() {
        return Err(OptimizerError::Divergence(first.0));
    }

    let mut simplex = vec![first];
    for k in 0..dims {
        let mut vertex = simplex[0].0.clone();
        let step = steps.get(k).copied().unwrap_or(0.0);
        let (lower, upper) = bounds
            .intervals()
            .get(k)
            .copied()
            .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
        vertex[k] = if vertex[k] + step <= upper {
            vertex[k] + step
        } else {
            (vertex[k] - step).max(lower)
        };
        simplex.push(objective.eval(vertex));
    }

    loop {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let (best, worst) = (simplex[0].1, simplex[dims].1);

        if best <= config.stopval || objective.evaluations >= config.max_eval {
            break;
        }
        if worst.is_finite() && (worst - best).abs() <= config.frel * best.abs() {
            break;
        }
        let small = (0..dims).all(|k| {
            let (lo, hi) = simplex.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, v| {
                (acc.0.min(v.0[k]), acc.1.max(v.0[k]))
            });
            hi - lo <= config.xrel * simplex[0].0[k].abs() + config.xabs
        });
        if small {
            break;
        }

        let mut centroid = vec![0.0; dims];
        for vertex in &simplex[..dims] {
            for (c, x) in centroid.iter_mut().zip(&vertex.0) {
                *c += x;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let count = dims as f64;
        centroid.iter_mut().for_each(|c| *c /= count);

        let reflected = objective.eval(combine(&centroid, &simplex[dims].0, 1.0));
        if reflected.1 < simplex[0].1 {
            let expanded = objective.eval(combine(&centroid, &simplex[dims].0, 2.0));
            simplex[dims] = if expanded.1 < reflected.1 {
                expanded
            } else {
                reflected
            };
        } else if reflected.1 < simplex[dims - 1].1 {
            simplex[dims] = reflected;
        } else {
            let contracted = if reflected.1 < simplex[dims].1 {
                objective.eval(combine(&centroid, &simplex[dims].0, 0.5))
            } else {
                objective.eval(combine(&centroid, &simplex[dims].0, -0.5))
            };
            if contracted.1 < simplex[dims].1.min(reflected.1) {
                simplex[dims] = contracted;
            } else {
                let anchor = simplex[0].0.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let shrunk = anchor
                        .iter()
                        .zip(&vertex.0)
                        .map(|(a, x)| a + 0.5 * (x - a))
                        .collect();
                    *vertex = objective.eval(shrunk);
                }
            }
        }
    }

    let (x, value) = simplex.swap_remove(0);
    if !value.is_finite() {
        return Err(OptimizerError::Divergence(x));
    }
    Ok(Minimum {
        x,
        value,
        evaluations: objective.evaluations,
    })
}
