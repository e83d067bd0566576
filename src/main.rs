use glam::Vec3;

// Import from the library crate
use panda_quest::controller::camera_controller::REFERENCE_FRAME_MS;
use panda_quest::controller::{GameState, InputEvent};
use panda_quest::model::WorldConfig;
use panda_quest::utils::xz_distance;
use panda_quest::{logging, ui};

const DEFAULT_TICK_LIMIT: u64 = 20_000;
const PROGRESS_EVERY: u64 = 600;
/// Close enough to a baby for it to notice the player
const BABY_APPROACH: f32 = 3.0;
/// The final walk passes the parent along +Z by this much, which leaves
/// the trailing formation standing around it
const PARENT_PASS: f32 = 3.0;
const ARRIVE_RADIUS: f32 = 0.3;

/// Accepts decimal or `0x` hex
fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim().replace('_', "");
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn env_or<T>(name: &str, parse: impl Fn(&str) -> Option<T>, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => parse(&raw).unwrap_or_else(|| {
            tracing::warn!(name, %raw, "ignoring unparsable environment variable");
            default
        }),
        Err(_) => default,
    }
}

/// Walks the player from baby to baby, then across the parent
struct Autopilot {
    /// Remaining waypoints of the walk back, nearest first
    homeward: Option<Vec<Vec3>>,
    walking: bool,
}

impl Autopilot {
    fn new() -> Self {
        Self { homeward: None, walking: false }
    }

    fn goal(&mut self, state: &GameState) -> Option<(Vec3, f32)> {
        if let Some(baby) = state.scene.babies.iter().find(|b| !b.is_following()) {
            return Some((baby.position, BABY_APPROACH));
        }

        let parent = state.scene.main_panda.position;
        let player = state.player_position();
        let waypoints = self.homeward.get_or_insert_with(|| {
            tracing::info!(x = parent.x, z = parent.z, "all babies found, heading back to the parent");
            vec![parent - Vec3::Z * PARENT_PASS, parent + Vec3::Z * PARENT_PASS]
        });
        while waypoints.len() > 1 && xz_distance(player, waypoints[0]) <= ARRIVE_RADIUS {
            waypoints.remove(0);
        }
        waypoints.first().map(|&w| (w, ARRIVE_RADIUS))
    }

    fn steer(&mut self, state: &mut GameState) {
        let player = state.player_position();
        let walk = match self.goal(state) {
            Some((goal, radius)) if xz_distance(player, goal) > radius => {
                state.camera.yaw = (goal.z - player.z).atan2(goal.x - player.x);
                state.camera.pitch = 0.0;
                true
            }
            _ => false,
        };

        if walk != self.walking {
            let event = if walk { InputEvent::KeyDown("w".into()) } else { InputEvent::KeyUp("w".into()) };
            state.input.process_event(&event);
            self.walking = walk;
        }
    }
}

fn main() {
    logging::init_with_filter("panda_quest=info");

    let config = WorldConfig {
        seed: env_or("PANDA_SEED", parse_seed, WorldConfig::default().seed),
        ..WorldConfig::default()
    };
    let tick_limit = env_or("PANDA_TICKS", |raw| raw.trim().parse().ok(), DEFAULT_TICK_LIMIT);
    tracing::info!(seed = config.seed, tick_limit, "starting headless run");

    let mut state = GameState::new(&config);
    let mut autopilot = Autopilot::new();

    while state.tick_count() < tick_limit {
        autopilot.steer(&mut state);
        state.tick(REFERENCE_FRAME_MS);

        if state.scene.progress.is_won() {
            let seconds = state.tick_count() as f32 * REFERENCE_FRAME_MS / 1000.0;
            tracing::info!(ticks = state.tick_count(), seconds, "{}", ui::WIN_MESSAGE);
            return;
        }
        if state.tick_count() % PROGRESS_EVERY == 0 {
            let player = state.player_position();
            tracing::info!(
                tick = state.tick_count(),
                x = player.x,
                z = player.z,
                "{}",
                ui::Hud::counter_text(&state.scene.progress)
            );
        }
    }

    tracing::warn!(
        ticks = tick_limit,
        found = state.scene.progress.found(),
        total = state.scene.progress.total(),
        "tick limit reached before the rescue finished"
    );
}
