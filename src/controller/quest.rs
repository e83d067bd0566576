use glam::Vec3;

use crate::controller::formation::{next_formation_index, FormationConfig, FormationController, PlayerTracker};
use crate::model::Scene;
use crate::utils::xz_distance;

/// What happened during one quest tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestEvents {
    /// Indices into `Scene::babies` that started following this tick
    pub found: Vec<usize>,
    pub won: bool,
}

/// The rescue quest: babies join the player when found, trail behind in
/// formation, and the game is won once all of them stand with the parent.
pub struct QuestController {
    pub formation: FormationController,
    player: PlayerTracker,
}

impl QuestController {
    pub fn new(config: FormationConfig, player_position: Vec3) -> Self {
        Self {
            formation: FormationController::new(config),
            player: PlayerTracker::new(player_position),
        }
    }

    pub fn player(&self) -> &PlayerTracker {
        &self.player
    }

    /// Feet position of the player for this tick
    pub fn set_player_position(&mut self, position: Vec3) {
        self.player.set_position(position);
    }

    pub fn update(&mut self, scene: &mut Scene) -> QuestEvents {
        let mut events = QuestEvents::default();
        if scene.progress.is_won() {
            return events;
        }

        let player = self.player.position();
        self.formation.assign_targets(player, self.player.direction(), &mut scene.babies);

        let config = *self.formation.config();
        let main_position = scene.main_panda.position;
        let total = scene.progress.total();

        for i in 0..scene.babies.len() {
            if scene.babies[i].is_following() {
                let baby = &mut scene.babies[i];
                self.formation.move_follower(baby, Some(&scene.terrain));

                baby.reached_main = xz_distance(baby.position, main_position) < config.reach_main_radius;
                if baby.reached_main {
                    baby.face_towards(main_position);
                }
                continue;
            }

            if xz_distance(player, scene.babies[i].position) < config.follow_distance {
                let index = next_formation_index(&scene.babies, total);
                let baby = &mut scene.babies[i];
                baby.start_following(index);
                baby.face_towards(player);
                scene.progress.record_found();
                tracing::info!(baby = i, formation_index = index, "baby panda starts following");
                events.found.push(i);
            }
        }

        let all_with_parent = scene.babies.iter().all(|b| b.reached_main);
        events.won = scene.progress.evaluate(all_with_parent);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Panda, WorldConfig};

    fn scene_with_babies(positions: &[Vec3]) -> Scene {
        let mut scene = Scene::generate(&WorldConfig::default());
        scene.babies = positions.iter().map(|&p| Panda::baby(p)).collect();
        scene.progress = crate::model::GameProgress::new(positions.len());
        scene
    }

    #[test]
    fn test_baby_activates_inside_follow_distance() {
        let baby_at = Vec3::new(20.0, 0.35, 20.0);
        let mut scene = scene_with_babies(&[baby_at]);
        let mut quest = QuestController::new(FormationConfig::default(), baby_at + Vec3::new(6.0, 0.0, 0.0));

        let events = quest.update(&mut scene);
        assert!(events.found.is_empty());
        assert!(!scene.babies[0].is_following());
        assert_eq!(scene.progress.found(), 0);

        quest.set_player_position(baby_at + Vec3::new(4.9, 0.0, 0.0));
        let events = quest.update(&mut scene);
        assert_eq!(events.found, vec![0]);
        assert!(scene.babies[0].is_following());
        assert_eq!(scene.babies[0].formation_index(), Some(0));
        assert_eq!(scene.progress.found(), 1);
        assert!((scene.babies[0].facing - 90.0).abs() < 1e-3, "turns to the player");

        let events = quest.update(&mut scene);
        assert!(events.found.is_empty(), "activation happens once");
        assert_eq!(scene.progress.found(), 1);
    }

    #[test]
    fn test_formation_indices_are_unique() {
        let player = Vec3::new(20.0, 0.0, 20.0);
        let positions = [
            player + Vec3::new(1.0, 0.0, 0.0),
            player + Vec3::new(-1.0, 0.0, 0.0),
            player + Vec3::new(0.0, 0.0, 2.0),
        ];
        let mut scene = scene_with_babies(&positions);
        let mut quest = QuestController::new(FormationConfig::default(), player);
        let events = quest.update(&mut scene);
        assert_eq!(events.found, vec![0, 1, 2]);

        let mut indices: Vec<usize> = scene.babies.iter().filter_map(Panda::formation_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_win_after_reunion() {
        let mut scene = Scene::generate(&WorldConfig::default());
        let parent = scene.main_panda.position;
        scene.babies = vec![Panda::baby(parent + Vec3::new(3.0, 0.0, 0.0))];
        scene.progress = crate::model::GameProgress::new(1);

        // player stands next to the parent, the baby is already close
        let mut quest = QuestController::new(FormationConfig::default(), parent + Vec3::new(0.0, 0.0, 1.0));
        let mut won_at = None;
        for tick in 0..200 {
            let events = quest.update(&mut scene);
            if events.won {
                won_at = Some(tick);
                break;
            }
        }
        assert!(won_at.is_some(), "baby should reach the parent");
        assert!(scene.progress.is_won());

        // walking off with the baby doesn't undo the win
        for step in 0..50 {
            quest.set_player_position(parent + Vec3::new(step as f32, 0.0, 20.0));
            let events = quest.update(&mut scene);
            assert!(!events.won);
            assert!(scene.progress.is_won());
        }
    }

    #[test]
    fn test_reached_main_can_drop_before_win() {
        let mut scene = Scene::generate(&WorldConfig::default());
        let parent = scene.main_panda.position;
        let far = parent + Vec3::new(15.0, 0.0, 0.0);
        scene.babies = vec![Panda::baby(parent + Vec3::new(1.0, 0.0, 0.0)), Panda::baby(far)];
        scene.progress = crate::model::GameProgress::new(2);

        let mut quest = QuestController::new(FormationConfig::default(), parent + Vec3::new(0.0, 0.0, 2.0));
        quest.update(&mut scene);
        quest.update(&mut scene);
        assert!(scene.babies[0].is_following());
        assert!(scene.babies[0].reached_main);
        assert!(!scene.babies[1].is_following());

        // lead the first baby away toward the second one
        for step in 1..=40 {
            let t = step as f32 / 40.0;
            quest.set_player_position(parent.lerp(far, t) + Vec3::new(0.0, 0.0, 2.0));
            quest.update(&mut scene);
        }
        assert!(scene.babies[1].is_following());
        assert!(!scene.babies[0].reached_main, "left the parent behind");
        assert!(!scene.progress.is_won());
    }

    #[test]
    fn test_no_babies_is_won_immediately() {
        let mut scene = scene_with_babies(&[]);
        let mut quest = QuestController::new(FormationConfig::default(), Vec3::ZERO);
        let events = quest.update(&mut scene);
        assert!(events.won);
        assert!(!quest.update(&mut scene).won);
    }
}
