pub mod annealer;
pub mod cost;
pub mod error;
pub mod mover;
pub mod problem;
pub mod render;
pub mod types;
