use glam::Vec3;

use crate::model::world::HeightField;
use crate::utils::normalize_degrees;

/// Length of the flip/unflip transition started by a poke
pub const POKE_DURATION_MS: f32 = 1000.0;

/// Feet-to-center height for a panda of scale 1
pub const STANDING_HEIGHT: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PandaRole {
    Main,
    Baby,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowState {
    NotFollowing,
    /// One-way: once a baby follows it keeps its slot for the session
    Following { formation_index: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum FlipState {
    Normal,
    Poking { elapsed_ms: f32, to_flipped: bool },
    Flipped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Animation {
    pub animating: bool,
    /// Seconds since the animation was (re)started
    pub time: f32,
    pub head: f32,
    pub left_leg: f32,
    pub right_leg: f32,
}

/// Joint angles in degrees, for the renderer
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub body_roll: f32,
    pub head: f32,
    pub left_leg: f32,
    pub right_leg: f32,
    pub tail: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panda {
    pub position: Vec3,
    pub scale: f32,
    /// Degrees in [0, 360); 0 faces +Z
    pub facing: f32,
    pub role: PandaRole,
    pub animation: Animation,
    pub follow: FollowState,
    pub reached_main: bool,
    pub formation_target: Option<Vec3>,
    flip: FlipState,
    clock_ms: f32,
}

impl Panda {
    fn new(role: PandaRole, position: Vec3, scale: f32, facing: f32) -> Self {
        Self {
            position,
            scale,
            facing,
            role,
            animation: Animation::default(),
            follow: FollowState::NotFollowing,
            reached_main: false,
            formation_target: None,
            flip: FlipState::Normal,
            clock_ms: 0.0,
        }
    }

    pub fn main(position: Vec3) -> Self {
        Self::new(PandaRole::Main, position, 1.0, 225.0)
    }

    pub fn baby(position: Vec3) -> Self {
        Self::new(PandaRole::Baby, position, 0.5, 180.0)
    }

    pub fn is_following(&self) -> bool {
        matches!(self.follow, FollowState::Following { .. })
    }

    pub fn formation_index(&self) -> Option<usize> {
        match self.follow {
            FollowState::Following { formation_index } => Some(formation_index),
            FollowState::NotFollowing => None,
        }
    }

    /// Enter the following state with a formation slot. No-op if already following.
    pub fn start_following(&mut self, formation_index: usize) -> bool {
        if self.is_following() {
            return false;
        }
        self.follow = FollowState::Following { formation_index };
        self.start_animation();
        true
    }

    /// Height of the body center above the ground
    pub fn standing_offset(&self) -> f32 {
        STANDING_HEIGHT * self.scale
    }

    pub fn face_towards(&mut self, target: Vec3) {
        let dx = target.x - self.position.x;
        let dz = target.z - self.position.z;
        if dx != 0.0 || dz != 0.0 {
            self.facing = normalize_degrees(dx.atan2(dz).to_degrees());
        }
    }

    pub fn start_animation(&mut self) {
        self.animation.animating = true;
        self.animation.time = 0.0;
    }

    pub fn stop_animation(&mut self) {
        self.animation = Animation::default();
    }

    pub fn toggle_animation(&mut self) {
        if self.animation.animating {
            self.stop_animation();
        } else {
            self.start_animation();
        }
    }

    /// Toggle the flip target and (re)start the transition toward it.
    /// Poking mid-transition turns around from the current angle.
    pub fn poke(&mut self) {
        self.flip = match self.flip {
            FlipState::Normal => FlipState::Poking { elapsed_ms: 0.0, to_flipped: true },
            FlipState::Flipped => FlipState::Poking { elapsed_ms: 0.0, to_flipped: false },
            FlipState::Poking { elapsed_ms, to_flipped } => FlipState::Poking {
                elapsed_ms: (POKE_DURATION_MS - elapsed_ms).max(0.0),
                to_flipped: !to_flipped,
            },
        };
    }

    /// Flip target; true while flipping over or lying flipped
    pub fn is_flipped(&self) -> bool {
        matches!(self.flip, FlipState::Flipped | FlipState::Poking { to_flipped: true, .. })
    }

    pub fn is_poking(&self) -> bool {
        matches!(self.flip, FlipState::Poking { .. })
    }

    /// Linear transition progress in [0, 1], `None` outside a poke
    pub fn poke_progress(&self) -> Option<f32> {
        match self.flip {
            FlipState::Poking { elapsed_ms, .. } => Some((elapsed_ms / POKE_DURATION_MS).clamp(0.0, 1.0)),
            _ => None,
        }
    }

    pub fn update(&mut self, dt_ms: f32, terrain: Option<&HeightField>) {
        self.clock_ms += dt_ms;

        if self.animation.animating {
            let a = &mut self.animation;
            a.time += dt_ms * 0.001;
            a.head = (a.time * 0.5).sin() * 8.0;
            a.left_leg = (a.time * 3.0).sin() * 30.0;
            a.right_leg = -a.left_leg;
        }

        if let Some(field) = terrain {
            let ground = field.height_at(self.position.x.floor(), self.position.z.floor());
            self.position.y = ground + self.standing_offset();
        }

        if let FlipState::Poking { elapsed_ms, to_flipped } = self.flip {
            let elapsed_ms = elapsed_ms + dt_ms;
            self.flip = if elapsed_ms >= POKE_DURATION_MS {
                if to_flipped { FlipState::Flipped } else { FlipState::Normal }
            } else {
                FlipState::Poking { elapsed_ms, to_flipped }
            };
        }
    }

    pub fn pose(&self) -> Pose {
        let a = &self.animation;
        let t = self.clock_ms;
        match self.flip {
            FlipState::Normal => Pose {
                body_roll: 0.0,
                head: a.head,
                left_leg: a.left_leg,
                right_leg: a.right_leg,
                tail: 0.0,
            },
            FlipState::Poking { elapsed_ms, to_flipped } => {
                let p = (elapsed_ms / POKE_DURATION_MS).clamp(0.0, 1.0);
                let flipped = if to_flipped { p } else { 1.0 - p };
                Pose {
                    body_roll: flipped * 180.0,
                    head: a.head,
                    left_leg: flipped * 90.0,
                    right_leg: -flipped * 90.0,
                    tail: (t * 0.003).sin() * (30.0 + 15.0 * flipped),
                }
            }
            FlipState::Flipped => {
                let kick = (t * 0.004).sin() * 30.0;
                Pose {
                    body_roll: 180.0 + (t * 0.002).sin() * 10.0,
                    head: a.head,
                    left_leg: kick,
                    right_leg: -kick,
                    tail: (t * 0.005).sin() * 45.0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_legs_in_antiphase() {
        let mut panda = Panda::baby(Vec3::ZERO);
        panda.start_animation();
        panda.update(400.0, None);
        assert!(panda.animation.left_leg != 0.0);
        assert_eq!(panda.animation.left_leg, -panda.animation.right_leg);
        assert!(panda.animation.head.abs() <= 8.0);
    }

    #[test]
    fn test_idle_panda_holds_still() {
        let mut panda = Panda::main(Vec3::ZERO);
        panda.update(500.0, None);
        assert_eq!(panda.animation, Animation::default());

        panda.start_animation();
        panda.update(500.0, None);
        panda.toggle_animation();
        assert!(!panda.animation.animating);
        assert_eq!(panda.animation.head, 0.0);
    }

    #[test]
    fn test_poke_transition_snaps_after_duration() {
        let mut panda = Panda::main(Vec3::ZERO);
        panda.poke();
        assert!(panda.is_flipped());
        panda.update(500.0, None);
        let pose = panda.pose();
        assert!((pose.body_roll - 90.0).abs() < 1e-3);
        assert_eq!(panda.poke_progress(), Some(0.5));

        panda.update(600.0, None);
        assert!(!panda.is_poking());
        assert!(panda.is_flipped());
        let roll = panda.pose().body_roll;
        assert!((170.0..=190.0).contains(&roll), "lying on its back, rocking: {roll}");

        panda.poke();
        assert!(!panda.is_flipped());
        panda.update(250.0, None);
        assert!((panda.pose().body_roll - 135.0).abs() < 1e-3);
        panda.update(800.0, None);
        assert!(!panda.is_poking());
        assert_eq!(panda.pose().body_roll, 0.0);
    }

    #[test]
    fn test_poke_mid_transition_turns_around() {
        let mut panda = Panda::main(Vec3::ZERO);
        panda.poke();
        panda.update(300.0, None);
        panda.poke();
        // 30% flipped, now heading back
        assert!((panda.pose().body_roll - 54.0).abs() < 1e-3);
        panda.update(300.0, None);
        assert!(!panda.is_poking());
        assert_eq!(panda.pose().body_roll, 0.0);
    }

    #[test]
    fn test_terrain_adherence_scales_with_size() {
        let field = HeightField::new();
        let x = 19.3;
        let z = 45.6;
        let ground = field.height_at(x, z);

        let mut baby = Panda::baby(Vec3::new(x, 100.0, z));
        baby.update(16.0, Some(&field));
        assert!((baby.position.y - (ground + 0.35)).abs() < 1e-5);

        let mut parent = Panda::main(Vec3::new(x, -3.0, z));
        parent.update(16.0, Some(&field));
        assert!((parent.position.y - (ground + 0.7)).abs() < 1e-5);
    }

    #[test]
    fn test_following_is_one_way() {
        let mut panda = Panda::baby(Vec3::ZERO);
        assert!(panda.start_following(2));
        assert!(panda.animation.animating);
        assert!(!panda.start_following(0));
        assert_eq!(panda.formation_index(), Some(2));
    }

    #[test]
    fn test_face_towards() {
        let mut panda = Panda::baby(Vec3::ZERO);
        panda.face_towards(Vec3::new(1.0, 0.0, 0.0));
        assert!((panda.facing - 90.0).abs() < 1e-4);
        panda.face_towards(Vec3::new(0.0, 0.0, -1.0));
        assert!((panda.facing - 180.0).abs() < 1e-4);
    }
}
