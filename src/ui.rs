use crate::controller::targeting::TargetResult;
use crate::model::world::{BlockType, SELECTABLE_BLOCKS};
use crate::model::GameProgress;

/// How long a status message stays up
pub const STATUS_DURATION_MS: f32 = 2000.0;

pub const HELP_TEXT: &str = "WASD move, Q/E turn, click to remove, right click to place, 1-6 select block";

pub const WIN_MESSAGE: &str = "You found all the baby pandas! They are safely back with their parent.";

#[derive(Clone, Debug, PartialEq)]
struct StatusMessage {
    text: String,
    expires_at_tick: u64,
}

/// One hotbar entry, left to right
#[derive(Clone, Debug, PartialEq)]
pub struct HotbarSlot {
    pub key: char,
    pub name: &'static str,
    pub color: [f32; 3],
    pub selected: bool,
}

/// HUD text. Status messages replace the help line until their expiry
/// tick; nothing here runs on a timer.
#[derive(Clone, Debug, Default)]
pub struct Hud {
    status: Option<StatusMessage>,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` for about `STATUS_DURATION_MS`, measured in ticks of `tick_ms`
    pub fn show_status(&mut self, text: impl Into<String>, now_tick: u64, tick_ms: f32) {
        let ticks = (STATUS_DURATION_MS / tick_ms.max(1.0)).ceil() as u64;
        let text = text.into();
        tracing::debug!(%text, expires_in = ticks, "status message");
        self.status = Some(StatusMessage { text, expires_at_tick: now_tick + ticks.max(1) });
    }

    pub fn expire(&mut self, now_tick: u64) {
        if self.status.as_ref().is_some_and(|s| now_tick >= s.expires_at_tick) {
            self.status = None;
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn status_line(&self) -> &str {
        self.status().unwrap_or(HELP_TEXT)
    }

    pub fn counter_text(progress: &GameProgress) -> String {
        format!("Pandas Found: {}/{}", progress.found(), progress.total())
    }

    pub fn win_text(progress: &GameProgress) -> Option<&'static str> {
        progress.is_won().then_some(WIN_MESSAGE)
    }

    pub fn target_text(target: &TargetResult) -> String {
        match *target {
            TargetResult::RegularBlock { x, y, z, .. } => format!("Target: block ({x}, {y}, {z})"),
            TargetResult::TreeBlock { x, y, z, .. } => format!("Target: tree ({x}, {y}, {z})"),
            TargetResult::DetachedBlock { x, y, z, .. } => format!("Target: block on terrain ({x}, {y}, {z})"),
            TargetResult::TerrainSurface { x, z, terrain_height, .. } => {
                format!("Target: terrain ({x}, {z}) height {terrain_height:.2}")
            }
            TargetResult::FloorPlane { x, z, .. } => format!("Target: floor ({x}, {z})"),
            TargetResult::None => "No target block".to_string(),
        }
    }

    pub fn hotbar(selected: BlockType) -> Vec<HotbarSlot> {
        SELECTABLE_BLOCKS
            .iter()
            .zip('1'..='6')
            .map(|(&block, key)| HotbarSlot {
                key,
                name: block.name(),
                color: block.color(),
                selected: block == selected,
            })
            .collect()
    }
}
