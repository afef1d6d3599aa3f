use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, trace};

use crate::cost::CostAnalyzer;
use crate::error::ConfigError;
use crate::mover::MoveProposer;
use crate::types::Container;

/// Guards the acceptance formula against zero cost or zero temperature.
const EPSILON: f64 = 1e-12;

/// Exponent of the temperature schedule. Decays a bit faster than linear early
/// on and flattens out towards the end.
const COOLING_EXPONENT: f64 = 1.20;

/// Upper bound on the iteration budget. Every iteration grows the run log and
/// each rectangle's history.
pub const MAX_ITERATIONS: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealConfig {
    pub iterations: usize,
    pub early_stop: bool,
    pub start_temperature: f64,
    pub end_temperature: f64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            early_stop: true,
            start_temperature: 1.0,
            end_temperature: 0.01,
        }
    }
}

impl AnnealConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.iterations > MAX_ITERATIONS {
            return Err(ConfigError::TooManyIterations {
                iterations: self.iterations,
                max: MAX_ITERATIONS,
            });
        }
        let valid = self.end_temperature >= 0.0 && self.end_temperature <= self.start_temperature;
        if !valid {
            return Err(ConfigError::InvalidTemperatures {
                start: self.start_temperature,
                end: self.end_temperature,
            });
        }
        Ok(())
    }

    /// Temperature at `progress` (0 = start of run, 1 = end).
    pub fn temperature(&self, progress: f64) -> f64 {
        let temp = self.start_temperature * (1.0 - progress).powf(COOLING_EXPONENT);
        temp.max(self.end_temperature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl From<Decision> for u8 {
    fn from(d: Decision) -> u8 {
        match d {
            Decision::Accept => 1,
            Decision::Reject => 0,
        }
    }
}

/// How a proposal's acceptance probability came about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acceptance {
    /// Cost did not increase; always accepted.
    Improving,
    /// Cost increased; accepted with the computed probability.
    Uncertain(f64),
}

impl Acceptance {
    pub fn probability(&self) -> f64 {
        match self {
            Acceptance::Improving => 1.0,
            Acceptance::Uncertain(p) => *p,
        }
    }
}

/// Per-iteration records of a run. All vectors share the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunLog {
    pub costs: Vec<f64>,
    /// `None` where the move did not increase cost.
    pub acceptance_probabilities: Vec<Option<f64>>,
    pub decisions: Vec<u8>,
    pub temperatures: Vec<f64>,
}

impl RunLog {
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    fn push(&mut self, cost: f64, acceptance: Acceptance, decision: Decision, temperature: f64) {
        self.costs.push(cost);
        self.acceptance_probabilities.push(match acceptance {
            Acceptance::Improving => None,
            Acceptance::Uncertain(p) => Some(p),
        });
        self.decisions.push(decision.into());
        self.temperatures.push(temperature);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// Zero cost: no overlaps, everything inside the container.
    Converged,
    NotConverged,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnnealOutcome {
    pub final_cost: f64,
    pub iterations_run: usize,
    pub early_stopped: bool,
    pub status: Convergence,
}

/// Simulated annealing driver.
///
/// Each iteration proposes a move, scores the container with the move pending,
/// then commits or rejects it. Worse moves are accepted with probability
/// `exp(-(new / old) / T)`, using the cost ratio rather than the difference so
/// large early costs do not swamp the temperature.
#[derive(Debug)]
pub struct Annealer<R = StdRng> {
    config: AnnealConfig,
    mover: MoveProposer<R>,
    analyzer: CostAnalyzer,
    rng: R,
    current_temperature: f64,
    log: RunLog,
}

impl Annealer<StdRng> {
    /// Seeds the acceptance draws. The mover carries its own generator.
    pub fn seeded(
        config: AnnealConfig,
        mover: MoveProposer<StdRng>,
        analyzer: CostAnalyzer,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::new(config, mover, analyzer, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Annealer<R> {
    pub fn new(
        config: AnnealConfig,
        mover: MoveProposer<R>,
        analyzer: CostAnalyzer,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            current_temperature: config.start_temperature,
            config,
            mover,
            analyzer,
            rng,
            log: RunLog::default(),
        })
    }

    pub fn mover_mut(&mut self) -> &mut MoveProposer<R> {
        &mut self.mover
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn current_temperature(&self) -> f64 {
        self.current_temperature
    }

    /// Fraction of the iteration budget used before `iteration` starts.
    pub fn progress(&self, iteration: usize) -> f64 {
        iteration as f64 / self.config.iterations as f64
    }

    pub fn update_temperature(&mut self, iteration: usize) {
        self.current_temperature = self.config.temperature(self.progress(iteration));
    }

    pub fn acceptance(&self, cost: f64, new_cost: f64) -> Acceptance {
        if new_cost <= cost {
            return Acceptance::Improving;
        }
        let ratio = (new_cost + EPSILON) / (cost + EPSILON);
        Acceptance::Uncertain((-ratio / (self.current_temperature + EPSILON)).exp())
    }

    pub fn acceptance_probability(&self, cost: f64, new_cost: f64) -> f64 {
        self.acceptance(cost, new_cost).probability()
    }

    /// Runs the search on `container`, which must already hold its starting poses.
    ///
    /// The run log and the rectangles' histories are cleared first, so after
    /// every run they cover exactly the iterations of that run.
    pub fn optimize(&mut self, container: &mut Container) -> AnnealOutcome {
        self.log = RunLog::default();
        for rect in container.rectangles_mut() {
            rect.clear_history();
        }

        let mut cost = self.analyzer.analyze(container);
        let mut iterations_run = 0;
        let mut early_stopped = false;

        info!(
            iterations = self.config.iterations,
            start_temperature = self.config.start_temperature,
            end_temperature = self.config.end_temperature,
            start_cost = cost,
            "annealing started"
        );

        for iteration in 0..self.config.iterations {
            self.update_temperature(iteration);
            let progress = self.progress(iteration);

            self.mover.make_move(container, progress);
            let new_cost = self.analyzer.analyze(container);

            let acceptance = self.acceptance(cost, new_cost);
            let decision = if self.rng.r#gen::<f64>() < acceptance.probability() {
                self.mover.deploy_moves(container);
                cost = new_cost;
                Decision::Accept
            } else {
                self.mover.reject_moves(container);
                Decision::Reject
            };

            self.mover.save_history(container);
            self.log.push(cost, acceptance, decision, self.current_temperature);
            iterations_run += 1;

            trace!(iteration, cost, new_cost, ?decision, "iteration resolved");

            if self.config.early_stop && cost == 0.0 {
                info!(iteration, "early stop, zero cost reached");
                early_stopped = true;
                break;
            }
        }

        // A NaN cost must not read as converged.
        let status = if cost == 0.0 {
            Convergence::Converged
        } else {
            Convergence::NotConverged
        };
        info!(final_cost = cost, ?status, iterations_run, "annealing finished");

        AnnealOutcome {
            final_cost: cost,
            iterations_run,
            early_stopped,
            status,
        }
    }
}
