/// Setup faults. Everything here is detected before the first iteration runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("container dimensions must be positive, got {width}x{height}")]
    NonPositiveContainer { width: f64, height: f64 },

    #[error("rectangle '{name}' dimensions must be positive")]
    NonPositiveRectangle { name: String },

    #[error("rectangle '{name}' ({size}) does not fit in container {container}")]
    RectangleTooLarge {
        name: String,
        size: String,
        container: String,
    },

    #[error("duplicate rectangle name '{name}'")]
    DuplicateName { name: String },

    #[error("{name} area {width}x{height} is not a finite number")]
    NonFiniteArea {
        name: String,
        width: f64,
        height: f64,
    },

    #[error("iteration count must be non-zero")]
    ZeroIterations,

    #[error("iteration count {iterations} exceeds the limit of {max}")]
    TooManyIterations { iterations: usize, max: usize },

    #[error("invalid move limits: min={min}, max={max} (need 0 < min <= max)")]
    InvalidMoveLimits { min: f64, max: f64 },

    #[error("invalid temperatures: start={start}, end={end} (need 0 <= end <= start)")]
    InvalidTemperatures { start: f64, end: f64 },
}
