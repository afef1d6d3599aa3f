use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::types::Container;

pub const DEFAULT_MAX_MOVE_LIMIT: f64 = 10.0;
pub const DEFAULT_MIN_MOVE_LIMIT: f64 = 0.02;

/// Proposes, commits and rejects single-rectangle moves.
///
/// A move shifts one randomly chosen rectangle along one axis and sometimes
/// flips its rotation. Step sizes shrink quadratically with run progress and
/// rotations become rarer.
#[derive(Debug, Clone)]
pub struct MoveProposer<R = StdRng> {
    max_move_limit: f64,
    min_move_limit: f64,
    rng: R,
}

impl MoveProposer<StdRng> {
    pub fn seeded(max_move_limit: f64, min_move_limit: f64, seed: u64) -> Result<Self, ConfigError> {
        Self::new(max_move_limit, min_move_limit, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MoveProposer<R> {
    pub fn new(max_move_limit: f64, min_move_limit: f64, rng: R) -> Result<Self, ConfigError> {
        let valid = min_move_limit > 0.0 && max_move_limit > 0.0 && min_move_limit <= max_move_limit;
        if !valid {
            return Err(ConfigError::InvalidMoveLimits {
                min: min_move_limit,
                max: max_move_limit,
            });
        }
        Ok(Self {
            max_move_limit,
            min_move_limit,
            rng,
        })
    }

    /// Largest step allowed at `progress` (0 = start of run, 1 = end).
    pub fn move_limit(&self, progress: f64) -> f64 {
        let limit = self.max_move_limit * (1.0 - progress).powi(2);
        limit.max(self.min_move_limit)
    }

    /// Scatters every rectangle uniformly inside the container, keeping its
    /// current rotation. Fails without touching anything if a rectangle is
    /// larger than the container.
    pub fn random_initialization(&mut self, container: &mut Container) -> Result<(), ConfigError> {
        let bounds = container.size();
        if let Some(rect) = container
            .rectangles()
            .iter()
            .find(|r| !r.size().fits_in(&bounds))
        {
            return Err(ConfigError::RectangleTooLarge {
                name: rect.name().to_string(),
                size: rect.size().to_string(),
                container: bounds.to_string(),
            });
        }

        for rect in container.rectangles_mut() {
            let x = self.rng.r#gen::<f64>() * (bounds.width - rect.width());
            let y = self.rng.r#gen::<f64>() * (bounds.height - rect.height());
            rect.set_position(x, y);
        }
        tracing::debug!(rectangles = container.len(), "random initialization done");
        Ok(())
    }

    /// Index of a uniformly chosen rectangle, `None` for an empty container.
    pub fn select_random_rectangle(&mut self, container: &Container) -> Option<usize> {
        if container.is_empty() {
            return None;
        }
        Some(self.rng.gen_range(0..container.len()))
    }

    /// Proposes a move for one rectangle and returns its index.
    ///
    /// The pending position is clamped into the container on the moved axis.
    /// The rotation flip is applied afterwards and is not clamped, so a
    /// rotated rectangle may stick out and be penalized by the cost.
    pub fn make_move(&mut self, container: &mut Container, progress: f64) -> Option<usize> {
        let limit = self.move_limit(progress);
        let along_x = self.rng.r#gen::<f64>() < 0.5;
        let delta = (self.rng.r#gen::<f64>() - 0.5) * limit;

        let idx = self.select_random_rectangle(container)?;
        let bounds = container.size();
        let rect = &mut container.rectangles_mut()[idx];
        let size = rect.committed_size();

        let mut pose = rect.committed_pose();
        if along_x {
            pose.x = clamp_upper(pose.x + delta, bounds.width - size.width);
        } else {
            pose.y = clamp_upper(pose.y + delta, bounds.height - size.height);
        }

        if self.rng.r#gen::<f64>() < 1.0 - progress {
            pose.rotated = !pose.rotated;
        }

        rect.propose(pose);
        Some(idx)
    }

    /// Commits every pending proposal.
    pub fn deploy_moves(&self, container: &mut Container) {
        for rect in container.rectangles_mut() {
            if rect.has_pending() {
                rect.commit();
            }
        }
    }

    /// Drops every pending proposal. Safe on rectangles with nothing pending.
    pub fn reject_moves(&self, container: &mut Container) {
        for rect in container.rectangles_mut() {
            rect.discard();
        }
    }

    pub fn save_history(&self, container: &mut Container) {
        for rect in container.rectangles_mut() {
            rect.record_history();
        }
    }
}

// Lower bound first, then upper: an upper bound below zero wins.
fn clamp_upper(value: f64, upper: f64) -> f64 {
    value.max(0.0).min(upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pose, Rectangle};

    fn sample_container() -> Container {
        let mut c = Container::new(20.0, 10.0);
        c.add_rectangle(Rectangle::new("a", 4.0, 3.0));
        c.add_rectangle(Rectangle::new("b", 2.0, 6.0));
        c.add_rectangle(Rectangle::new("c", 5.0, 5.0));
        c
    }

    fn committed_poses(c: &Container) -> Vec<Pose> {
        c.rectangles().iter().map(|r| r.committed_pose()).collect()
    }

    #[test]
    fn test_invalid_limits_rejected() {
        assert!(MoveProposer::seeded(1.0, 2.0, 0).is_err());
        assert!(MoveProposer::seeded(0.0, 0.0, 0).is_err());
        assert!(MoveProposer::seeded(1.0, -0.1, 0).is_err());
        assert!(MoveProposer::seeded(1.0, 1.0, 0).is_ok());
    }

    #[test]
    fn test_move_limit_shrinks_to_floor() {
        let mover = MoveProposer::seeded(10.0, 0.02, 0).unwrap();
        assert_eq!(mover.move_limit(0.0), 10.0);
        assert!((mover.move_limit(0.5) - 2.5).abs() < 1e-12);
        assert_eq!(mover.move_limit(1.0), 0.02);
        let mut prev = f64::INFINITY;
        for i in 0..=100 {
            let limit = mover.move_limit(i as f64 / 100.0);
            assert!(limit <= prev);
            prev = limit;
        }
    }

    #[test]
    fn test_random_initialization_inside_container() {
        let mut c = sample_container();
        let mut mover = MoveProposer::seeded(10.0, 0.02, 7).unwrap();
        mover.random_initialization(&mut c).unwrap();
        for r in c.rectangles() {
            assert!(r.x() >= 0.0 && r.x() + r.width() <= c.width());
            assert!(r.y() >= 0.0 && r.y() + r.height() <= c.height());
        }
    }

    #[test]
    fn test_random_initialization_rejects_oversized() {
        let mut c = Container::new(5.0, 5.0);
        c.add_rectangle(Rectangle::new("ok", 1.0, 1.0));
        c.add_rectangle(Rectangle::new("big", 6.0, 1.0));
        let mut mover = MoveProposer::seeded(10.0, 0.02, 7).unwrap();
        let err = mover.random_initialization(&mut c).unwrap_err();
        assert!(matches!(err, ConfigError::RectangleTooLarge { ref name, .. } if name == "big"));
        assert_eq!(c.rectangles()[0].committed_pose(), Pose::default());
    }

    #[test]
    fn test_make_move_touches_one_rectangle_on_one_axis() {
        let mut c = sample_container();
        let mut mover = MoveProposer::seeded(10.0, 0.02, 3).unwrap();
        mover.random_initialization(&mut c).unwrap();

        for step in 0..200 {
            let before = committed_poses(&c);
            let idx = mover.make_move(&mut c, step as f64 / 200.0).unwrap();

            let pending: Vec<usize> = (0..c.len())
                .filter(|&i| c.rectangles()[i].has_pending())
                .collect();
            assert_eq!(pending, vec![idx]);

            let pose = c.rectangles()[idx].pending_pose().unwrap();
            let old = before[idx];
            assert!(pose.x == old.x || pose.y == old.y);

            let size = c.rectangles()[idx].committed_size();
            assert!(pose.x >= 0.0 && pose.x <= c.width() - size.width);
            assert!(pose.y >= 0.0 && pose.y <= c.height() - size.height);

            mover.reject_moves(&mut c);
        }
    }

    #[test]
    fn test_reject_restores_committed_pose() {
        let mut c = sample_container();
        let mut mover = MoveProposer::seeded(10.0, 0.02, 11).unwrap();
        mover.random_initialization(&mut c).unwrap();
        let before = committed_poses(&c);

        for step in 0..50 {
            mover.make_move(&mut c, step as f64 / 50.0);
            mover.reject_moves(&mut c);
            let effective: Vec<Pose> = c.rectangles().iter().map(|r| r.effective_pose()).collect();
            assert_eq!(effective, before);
            assert!(c.rectangles().iter().all(|r| !r.has_pending()));
        }
    }

    #[test]
    fn test_deploy_commits_pending_pose() {
        let mut c = sample_container();
        let mut mover = MoveProposer::seeded(10.0, 0.02, 5).unwrap();
        mover.random_initialization(&mut c).unwrap();

        let idx = mover.make_move(&mut c, 0.2).unwrap();
        let pending = c.rectangles()[idx].pending_pose().unwrap();
        mover.deploy_moves(&mut c);

        assert_eq!(c.rectangles()[idx].committed_pose(), pending);
        assert!(c.rectangles().iter().all(|r| !r.has_pending()));
    }

    #[test]
    fn test_no_rotation_at_end_of_run() {
        let mut c = sample_container();
        let mut mover = MoveProposer::seeded(10.0, 0.02, 9).unwrap();
        mover.random_initialization(&mut c).unwrap();
        for _ in 0..100 {
            let idx = mover.make_move(&mut c, 1.0).unwrap();
            assert!(!c.rectangles()[idx].rotated());
            mover.reject_moves(&mut c);
        }
    }

    #[test]
    fn test_oversized_rotation_clamps_to_upper_bound() {
        // 2x12 rotated would not fit a 10 wide box; the clamp must not panic.
        let mut c = Container::new(10.0, 20.0);
        let mut r = Rectangle::new("tall", 2.0, 12.0);
        r.set_rotated(true);
        c.add_rectangle(r);
        let mut mover = MoveProposer::seeded(10.0, 0.02, 1).unwrap();
        for _ in 0..50 {
            mover.make_move(&mut c, 0.5);
            let pose = c.rectangles()[0].effective_pose();
            assert!(pose.x == 0.0 || pose.x == -2.0, "x = {}", pose.x);
            mover.reject_moves(&mut c);
        }
    }

    #[test]
    fn test_save_history_records_resolved_pose() {
        let mut c = sample_container();
        let mut mover = MoveProposer::seeded(10.0, 0.02, 2).unwrap();
        mover.random_initialization(&mut c).unwrap();

        mover.make_move(&mut c, 0.0);
        mover.reject_moves(&mut c);
        mover.save_history(&mut c);

        let idx = mover.make_move(&mut c, 0.0).unwrap();
        mover.deploy_moves(&mut c);
        mover.save_history(&mut c);

        for r in c.rectangles() {
            assert_eq!(r.history().len(), 2);
        }
        let moved = &c.rectangles()[idx];
        assert_eq!(moved.history().x[1], moved.committed_pose().x);
        assert_eq!(moved.history().rotated[1], moved.committed_pose().rotated);
    }

    #[test]
    fn test_empty_container_has_no_move() {
        let mut c = Container::new(10.0, 10.0);
        let mut mover = MoveProposer::seeded(10.0, 0.02, 0).unwrap();
        assert_eq!(mover.make_move(&mut c, 0.0), None);
        assert_eq!(mover.select_random_rectangle(&c), None);
    }
}
