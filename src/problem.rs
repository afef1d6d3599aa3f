use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::annealer::{AnnealConfig, AnnealOutcome, Annealer, RunLog};
use crate::cost::CostAnalyzer;
use crate::error::ConfigError;
use crate::mover::{DEFAULT_MAX_MOVE_LIMIT, DEFAULT_MIN_MOVE_LIMIT, MoveProposer};
use crate::types::{Color, Container, PoseHistory, Rectangle, Size};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectangleSpec {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub iterations: usize,
    pub early_stop: bool,
    pub start_temperature: f64,
    pub end_temperature: f64,
    pub max_move_limit: f64,
    pub min_move_limit: f64,
    /// Fixed seed for a reproducible run; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let anneal = AnnealConfig::default();
        Self {
            iterations: anneal.iterations,
            early_stop: anneal.early_stop,
            start_temperature: anneal.start_temperature,
            end_temperature: anneal.end_temperature,
            max_move_limit: DEFAULT_MAX_MOVE_LIMIT,
            min_move_limit: DEFAULT_MIN_MOVE_LIMIT,
            seed: None,
        }
    }
}

impl Settings {
    pub fn anneal_config(&self) -> AnnealConfig {
        AnnealConfig {
            iterations: self.iterations,
            early_stop: self.early_stop,
            start_temperature: self.start_temperature,
            end_temperature: self.end_temperature,
        }
    }
}

/// Everything needed to set up and run one packing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingProblem {
    pub container: Size,
    pub rectangles: Vec<RectangleSpec>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementReport {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotated: bool,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct RectangleHistory {
    pub name: String,
    #[serde(flatten)]
    pub history: PoseHistory,
}

/// Read-only view of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct PackingReport {
    pub container: Size,
    pub outcome: AnnealOutcome,
    pub placements: Vec<PlacementReport>,
    pub histories: Vec<RectangleHistory>,
    pub log: RunLog,
}

impl PackingReport {
    pub fn new(container: &Container, outcome: AnnealOutcome, log: RunLog) -> Self {
        let placements = container
            .rectangles()
            .iter()
            .map(|r| {
                let pose = r.committed_pose();
                let size = r.committed_size();
                PlacementReport {
                    name: r.name().to_string(),
                    x: pose.x,
                    y: pose.y,
                    width: size.width,
                    height: size.height,
                    rotated: pose.rotated,
                    color: r.color,
                }
            })
            .collect();
        let histories = container
            .rectangles()
            .iter()
            .map(|r| RectangleHistory {
                name: r.name().to_string(),
                history: r.history().clone(),
            })
            .collect();

        Self {
            container: container.size(),
            outcome,
            placements,
            histories,
            log,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub container: Container,
    pub report: PackingReport,
}

impl PackingProblem {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.container.is_positive() {
            return Err(ConfigError::NonPositiveContainer {
                width: self.container.width,
                height: self.container.height,
            });
        }
        if !self.container.has_finite_area() {
            return Err(ConfigError::NonFiniteArea {
                name: "container".to_string(),
                width: self.container.width,
                height: self.container.height,
            });
        }

        let mut seen = HashSet::new();
        for spec in &self.rectangles {
            let size = Size::new(spec.width, spec.height);
            if !size.is_positive() {
                return Err(ConfigError::NonPositiveRectangle {
                    name: spec.name.clone(),
                });
            }
            if !size.has_finite_area() {
                return Err(ConfigError::NonFiniteArea {
                    name: format!("rectangle '{}'", spec.name),
                    width: spec.width,
                    height: spec.height,
                });
            }
            if !size.fits_in(&self.container) {
                return Err(ConfigError::RectangleTooLarge {
                    name: spec.name.clone(),
                    size: size.to_string(),
                    container: self.container.to_string(),
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: spec.name.clone(),
                });
            }
        }

        self.settings.anneal_config().validate()
    }

    pub fn build_container(&self) -> Container {
        let mut container = Container::new(self.container.width, self.container.height);
        for spec in &self.rectangles {
            let mut rect = Rectangle::new(spec.name.clone(), spec.width, spec.height);
            if let Some(color) = spec.color {
                rect = rect.with_color(color);
            }
            container.add_rectangle(rect);
        }
        container
    }

    /// Validates, scatters the rectangles randomly and anneals them.
    pub fn solve(&self) -> Result<Solution, ConfigError> {
        self.validate()?;
        let settings = &self.settings;

        // The acceptance draws get their own stream, derived from the same seed.
        let (mover_rng, accept_rng) = match settings.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        let mover = MoveProposer::new(settings.max_move_limit, settings.min_move_limit, mover_rng)?;
        let mut annealer = Annealer::new(
            settings.anneal_config(),
            mover,
            CostAnalyzer::new(),
            accept_rng,
        )?;

        let mut container = self.build_container();
        annealer.mover_mut().random_initialization(&mut container)?;
        let outcome = annealer.optimize(&mut container);
        let report = PackingReport::new(&container, outcome, annealer.log().clone());

        Ok(Solution { container, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annealer::Convergence;

    fn problem(rects: &[(&str, f64, f64)]) -> PackingProblem {
        PackingProblem {
            container: Size::new(10.0, 10.0),
            rectangles: rects
                .iter()
                .map(|&(name, width, height)| RectangleSpec {
                    name: name.to_string(),
                    width,
                    height,
                    color: None,
                })
                .collect(),
            settings: Settings {
                iterations: 2_000,
                seed: Some(1),
                ..Settings::default()
            },
        }
    }

    #[test]
    fn test_validation_errors() {
        let mut p = problem(&[("a", 2.0, 2.0), ("a", 3.0, 3.0)]);
        assert_eq!(
            p.validate(),
            Err(ConfigError::DuplicateName {
                name: "a".to_string()
            })
        );

        p = problem(&[("a", 11.0, 2.0)]);
        assert!(matches!(p.validate(), Err(ConfigError::RectangleTooLarge { .. })));

        p = problem(&[("a", 0.0, 2.0)]);
        assert!(matches!(p.validate(), Err(ConfigError::NonPositiveRectangle { .. })));

        p = problem(&[("a", 2.0, 2.0)]);
        p.container = Size::new(0.0, 5.0);
        assert!(matches!(p.validate(), Err(ConfigError::NonPositiveContainer { .. })));

        p = problem(&[("a", 2.0, 2.0)]);
        p.settings.iterations = 0;
        assert_eq!(p.validate(), Err(ConfigError::ZeroIterations));

        p.settings.iterations = crate::annealer::MAX_ITERATIONS + 1;
        assert!(matches!(p.validate(), Err(ConfigError::TooManyIterations { .. })));

        p = problem(&[("a", 2.0, 2.0)]);
        p.container = Size::new(1e200, 1e200);
        assert!(matches!(p.validate(), Err(ConfigError::NonFiniteArea { .. })));

        p = problem(&[("a", 1e200, 1e200)]);
        p.container = Size::new(1e150, f64::INFINITY);
        assert!(matches!(p.validate(), Err(ConfigError::NonFiniteArea { .. })));
    }

    #[test]
    fn test_bad_move_limits_surface_from_solve() {
        let mut p = problem(&[("a", 2.0, 2.0)]);
        p.settings.min_move_limit = 20.0;
        assert!(matches!(p.solve(), Err(ConfigError::InvalidMoveLimits { .. })));
    }

    #[test]
    fn test_solve_easy_packing() {
        let p = problem(&[("a", 3.0, 3.0), ("b", 3.0, 3.0), ("c", 2.0, 2.0)]);
        let solution = p.solve().unwrap();
        let report = &solution.report;

        assert_eq!(report.outcome.status, Convergence::Converged);
        assert_eq!(report.outcome.final_cost, 0.0);
        assert_eq!(report.placements.len(), 3);
        assert_eq!(report.histories.len(), 3);
        assert_eq!(report.log.len(), report.outcome.iterations_run);
        for h in &report.histories {
            assert_eq!(h.history.len(), report.outcome.iterations_run);
        }
        for pl in &report.placements {
            assert!(pl.x >= 0.0 && pl.x + pl.width <= 10.0);
            assert!(pl.y >= 0.0 && pl.y + pl.height <= 10.0);
        }
    }

    #[test]
    fn test_problem_from_json() {
        let json = r#"{
            "container": {"width": 10, "height": 6},
            "rectangles": [
                {"name": "a", "width": 4, "height": 3, "color": [255, 0, 0]},
                {"name": "b", "width": 2, "height": 5}
            ],
            "settings": {"iterations": 500, "seed": 9}
        }"#;
        let p: PackingProblem = serde_json::from_str(json).unwrap();
        assert_eq!(p.settings.iterations, 500);
        assert_eq!(p.settings.max_move_limit, DEFAULT_MAX_MOVE_LIMIT);
        assert!(p.settings.early_stop);
        assert_eq!(p.rectangles[0].color, Some([255, 0, 0]));

        let first = p.solve().unwrap().report;
        let second = p.solve().unwrap().report;
        assert_eq!(first.log, second.log);

        let value = serde_json::to_value(&first).unwrap();
        assert!(value["log"]["acceptance_probabilities"].is_array());
        assert!(value["histories"][0]["x"].is_array());
    }
}
