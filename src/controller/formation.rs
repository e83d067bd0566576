use glam::Vec3;

use crate::model::world::HeightField;
use crate::model::Panda;
use crate::utils::{ease_in_out_quad, normalize_degrees, shortest_angle_delta, xz_distance};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormationConfig {
    /// A baby starts following when the player comes closer than this
    pub follow_distance: f32,
    /// Distance from the player to the formation center
    pub follow_offset: f32,
    /// Gap between neighbours on the formation line
    pub spacing: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Progress added per tick while the formation swings around
    pub transition_speed: f32,
    /// Followers this close to their slot stand still
    pub stop_radius: f32,
    pub reach_main_radius: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            follow_distance: 5.0,
            follow_offset: 3.5,
            spacing: 1.0,
            min_speed: 0.03,
            max_speed: 0.15,
            transition_speed: 0.02,
            stop_radius: 0.5,
            reach_main_radius: 3.0,
        }
    }
}

/// Player position feed. Keeps the last meaningful movement direction on
/// the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerTracker {
    position: Vec3,
    direction: Vec3,
}

impl PlayerTracker {
    pub fn new(position: Vec3) -> Self {
        Self { position, direction: Vec3::ZERO }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit XZ vector, zero until the player has moved
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_position(&mut self, position: Vec3) {
        let dx = position.x - self.position.x;
        let dz = position.z - self.position.z;
        if dx.abs() > 0.01 || dz.abs() > 0.01 {
            self.direction = Vec3::new(dx, 0.0, dz).normalize_or_zero();
        }
        self.position = position;
    }
}

/// Follow direction (player to formation center) and the line the
/// followers stand on, for a movement direction. First matching axis wins:
/// +Z, -Z, +X, -X; standing still keeps them behind on an X line.
pub fn formation_axes(moving: Vec3) -> (Vec3, Vec3) {
    if moving.z > 0.1 {
        (Vec3::NEG_Z, Vec3::X)
    } else if moving.z < -0.1 {
        (Vec3::Z, Vec3::X)
    } else if moving.x > 0.1 {
        (Vec3::NEG_X, Vec3::Z)
    } else if moving.x < -0.1 {
        (Vec3::X, Vec3::Z)
    } else {
        (Vec3::NEG_Z, Vec3::X)
    }
}

/// Smallest formation index not held by a follower, among `0..total`
pub fn next_formation_index(babies: &[Panda], total: usize) -> usize {
    let used: Vec<usize> = babies.iter().filter_map(Panda::formation_index).collect();
    (0..total).find(|i| !used.contains(i)).unwrap_or(used.len())
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormationFrame {
    pub direction: Vec3,
    pub line: Vec3,
}

/// Slots for following babies behind the player. When the player turns,
/// the formation swings to the new side over a short eased transition
/// instead of jumping.
pub struct FormationController {
    config: FormationConfig,
    previous_direction: Vec3,
    progress: f32,
}

impl FormationController {
    pub fn new(config: FormationConfig) -> Self {
        Self { config, previous_direction: Vec3::NEG_Z, progress: 1.0 }
    }

    pub fn config(&self) -> &FormationConfig {
        &self.config
    }

    pub fn in_transition(&self) -> bool {
        self.progress < 1.0
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Advance the transition one tick and return the blended frame
    pub fn advance(&mut self, moving: Vec3) -> FormationFrame {
        let (target_dir, target_line) = formation_axes(moving);
        let from = self.previous_direction;

        if from != target_dir && self.progress >= 1.0 {
            self.progress = 0.0;
            tracing::debug!(?from, to = ?target_dir, "formation turning");
        }
        if self.progress < 1.0 {
            self.progress += self.config.transition_speed;
            if self.progress >= 1.0 {
                self.progress = 1.0;
                self.previous_direction = target_dir;
            }
        }

        let eased = ease_in_out_quad(self.progress);
        let direction = from.lerp(target_dir, eased).normalize_or_zero();
        let line = if self.in_transition() {
            let from_line = if from.x.abs() > from.z.abs() { Vec3::Z } else { Vec3::X };
            from_line.lerp(target_line, eased).normalize_or_zero()
        } else {
            target_line
        };
        FormationFrame { direction, line }
    }

    /// Slot for one follower; a lone follower stands at the center
    pub fn slot(&self, player: Vec3, frame: FormationFrame, index: usize, following: usize) -> Vec3 {
        let center = player + frame.direction * self.config.follow_offset;
        let offset = if following > 1 {
            (index as f32 - (following / 2) as f32) * self.config.spacing
        } else {
            0.0
        };
        Vec3::new(center.x + frame.line.x * offset, player.y, center.z + frame.line.z * offset)
    }

    /// Advance one tick and store each follower's slot in `formation_target`
    pub fn assign_targets(&mut self, player: Vec3, moving: Vec3, babies: &mut [Panda]) {
        let frame = self.advance(moving);
        let following = babies.iter().filter(|b| b.is_following()).count();
        for baby in babies.iter_mut() {
            baby.formation_target = baby.formation_index().map(|i| self.slot(player, frame, i, following));
        }
    }

    /// Step a follower toward its slot. Far followers move faster, and
    /// everyone hurries while the formation is turning.
    pub fn move_follower(&self, panda: &mut Panda, terrain: Option<&HeightField>) {
        let Some(target) = panda.formation_target else {
            return;
        };
        let distance = xz_distance(target, panda.position);
        if distance <= self.config.stop_radius {
            return;
        }
        let dx = target.x - panda.position.x;
        let dz = target.z - panda.position.z;

        let heading = dx.atan2(dz).to_degrees();
        let rate = if self.in_transition() { 0.2 } else { 0.1 };
        panda.facing = normalize_degrees(panda.facing + shortest_angle_delta(panda.facing, heading) * rate);

        let mut factor = (distance * 0.05).min(1.0);
        if self.in_transition() {
            factor = (factor * 1.5).min(1.0);
        }
        let speed = self.config.min_speed + (self.config.max_speed - self.config.min_speed) * factor;
        panda.position.x += dx * speed;
        panda.position.z += dz * speed;

        if let Some(field) = terrain {
            panda.position.y = field.height_at(panda.position.x.floor(), panda.position.z.floor()) + panda.standing_offset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follower(index: usize, position: Vec3) -> Panda {
        let mut baby = Panda::baby(position);
        baby.start_following(index);
        baby
    }

    #[test]
    fn test_axes_priority() {
        assert_eq!(formation_axes(Vec3::new(0.0, 0.0, 1.0)), (Vec3::NEG_Z, Vec3::X));
        assert_eq!(formation_axes(Vec3::new(0.0, 0.0, -1.0)), (Vec3::Z, Vec3::X));
        assert_eq!(formation_axes(Vec3::new(1.0, 0.0, 0.0)), (Vec3::NEG_X, Vec3::Z));
        assert_eq!(formation_axes(Vec3::new(-1.0, 0.0, 0.0)), (Vec3::X, Vec3::Z));
        // diagonal: the Z test comes first
        assert_eq!(formation_axes(Vec3::new(0.7, 0.0, 0.7)), (Vec3::NEG_Z, Vec3::X));
        assert_eq!(formation_axes(Vec3::ZERO), (Vec3::NEG_Z, Vec3::X));
    }

    #[test]
    fn test_tracker_ignores_jitter() {
        let mut tracker = PlayerTracker::new(Vec3::ZERO);
        tracker.set_position(Vec3::new(0.005, 0.0, 0.005));
        assert_eq!(tracker.direction(), Vec3::ZERO);
        tracker.set_position(Vec3::new(0.005, 3.0, 1.0));
        assert!((tracker.direction() - Vec3::Z).length() < 1e-3, "height changes are ignored");
        tracker.set_position(Vec3::new(0.005, 3.0, 1.0));
        assert!((tracker.direction() - Vec3::Z).length() < 1e-3, "kept while standing");
    }

    #[test]
    fn test_no_transition_while_behind() {
        let mut formation = FormationController::new(FormationConfig::default());
        let frame = formation.advance(Vec3::Z);
        assert!(!formation.in_transition());
        assert_eq!(frame, FormationFrame { direction: Vec3::NEG_Z, line: Vec3::X });
    }

    #[test]
    fn test_transition_swings_then_commits() {
        let mut formation = FormationController::new(FormationConfig::default());
        let first = formation.advance(Vec3::X);
        assert!(formation.in_transition());
        assert!((formation.progress() - 0.02).abs() < 1e-6);
        assert!(first.direction.z < -0.99, "barely moved yet");

        let mut ticks = 1;
        let mut halfway = None;
        while formation.in_transition() {
            let frame = formation.advance(Vec3::X);
            ticks += 1;
            if halfway.is_none() && formation.progress() >= 0.5 {
                halfway = Some(frame);
            }
        }
        assert!((50..=51).contains(&ticks), "about 1 / 0.02 ticks, got {ticks}");
        let halfway = halfway.expect("passed the midpoint");
        assert!((halfway.direction.length() - 1.0).abs() < 1e-4);
        assert!(halfway.direction.x < 0.0 && halfway.direction.z < 0.0);

        let settled = formation.advance(Vec3::X);
        assert_eq!(settled, FormationFrame { direction: Vec3::NEG_X, line: Vec3::Z });
    }

    #[test]
    fn test_slots_spread_along_line() {
        let formation = FormationController::new(FormationConfig::default());
        let frame = FormationFrame { direction: Vec3::NEG_Z, line: Vec3::X };
        let player = Vec3::new(10.0, 1.0, 10.0);

        assert_eq!(formation.slot(player, frame, 0, 1), Vec3::new(10.0, 1.0, 6.5));
        let slots: Vec<Vec3> = (0..3).map(|i| formation.slot(player, frame, i, 3)).collect();
        assert_eq!(slots, vec![Vec3::new(9.0, 1.0, 6.5), Vec3::new(10.0, 1.0, 6.5), Vec3::new(11.0, 1.0, 6.5)]);
    }

    #[test]
    fn test_next_index_fills_gaps() {
        let babies = vec![
            follower(0, Vec3::ZERO),
            follower(2, Vec3::ZERO),
            Panda::baby(Vec3::ZERO),
        ];
        assert_eq!(next_formation_index(&babies, 4), 1);
        assert_eq!(next_formation_index(&[], 4), 0);
        assert_eq!(next_formation_index(&babies[..2], 2), 1);
    }

    #[test]
    fn test_follower_approaches_and_stops() {
        let mut formation = FormationController::new(FormationConfig::default());
        let mut babies = vec![follower(0, Vec3::new(10.0, 0.35, 20.0))];
        let player = Vec3::new(10.0, 0.0, 10.0);
        let field = HeightField::flat(64, 64);

        let mut last = f32::MAX;
        for _ in 0..400 {
            formation.assign_targets(player, Vec3::ZERO, &mut babies);
            formation.move_follower(&mut babies[0], Some(&field));
            let target = babies[0].formation_target.expect("has a slot");
            let d = xz_distance(target, babies[0].position);
            assert!(d <= last + 1e-5, "never moves away from its slot");
            last = d;
        }
        assert!(last <= 0.5);
        assert!((babies[0].position.y - 0.35).abs() < 1e-6);
        // heading toward -Z
        assert!((babies[0].facing - 180.0).abs() < 1.0);

        let settled = babies[0].position;
        formation.move_follower(&mut babies[0], Some(&field));
        assert_eq!(babies[0].position, settled);
    }

    #[test]
    fn test_idle_babies_get_no_slot() {
        let mut formation = FormationController::new(FormationConfig::default());
        let mut babies = vec![Panda::baby(Vec3::ZERO)];
        formation.assign_targets(Vec3::ZERO, Vec3::ZERO, &mut babies);
        assert_eq!(babies[0].formation_target, None);
    }
}
