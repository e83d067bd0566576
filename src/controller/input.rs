/// Platform-agnostic input handling system
use std::collections::HashSet;

use glam::Vec3;

use crate::model::world::{BlockType, SELECTABLE_BLOCKS};

/// Platform-independent input events
#[derive(Debug, Clone)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseClick { button: MouseButton, is_down: bool },
    MouseWheel { delta_y: f32 },

    // Window events
    FocusLost,
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// Discrete requests, each handled once on the tick after it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Left click or F: remove the target block, or toggle a panda's animation
    Primary,
    /// Right click or G: place the selected block, or poke a panda
    Secondary,
    ToggleAllAnimations,
}

/// Everything the frame tick needs from the input layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// x: strafe right, y: up, z: forward; each in [-1, 1]
    pub move_vector: Vec3,
    /// Key yaw direction: -1 turns left, 1 turns right
    pub rotate_delta: f32,
    /// Pointer delta in pixels since the last tick
    pub look_delta: (f32, f32),
    pub actions: Vec<Action>,
}

pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub look_delta: (f32, f32),
    pub pointer_locked: bool,
    pub selected_block: BlockType,
    just_pressed: Vec<String>,
    clicks: Vec<MouseButton>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            look_delta: (0.0, 0.0),
            pointer_locked: false,
            selected_block: BlockType::Dirt,
            just_pressed: Vec::new(),
            clicks: Vec::new(),
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                let key = key.to_lowercase();
                // auto-repeat keeps the key held; only the first press counts
                if self.pressed_keys.insert(key.clone()) {
                    self.just_pressed.push(key);
                }
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(&key.to_lowercase());
            }
            InputEvent::MouseMove { dx, dy } => {
                if self.pointer_locked {
                    self.look_delta.0 += dx;
                    self.look_delta.1 += dy;
                }
            }
            InputEvent::MouseClick { button, is_down } => {
                if *is_down && self.pointer_locked {
                    self.clicks.push(*button);
                }
            }
            InputEvent::MouseWheel { delta_y } => {
                if *delta_y < 0.0 {
                    self.cycle_selected_block(false);
                } else if *delta_y > 0.0 {
                    self.cycle_selected_block(true);
                }
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
            InputEvent::PointerLockChanged { locked } => {
                self.pointer_locked = *locked;
                if !locked {
                    self.clear_keys();
                }
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
        self.just_pressed.clear();
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn set_selected_block(&mut self, block: BlockType) {
        self.selected_block = block;
    }

    pub fn cycle_selected_block(&mut self, forward: bool) {
        let n = SELECTABLE_BLOCKS.len();
        let current = self.selected_block.selection_index().unwrap_or(0);
        let next = if forward { (current + 1) % n } else { (current + n - 1) % n };
        self.selected_block = SELECTABLE_BLOCKS[next];
    }
}

/// Key mapping configuration. Keys are matched lowercased.
#[derive(Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub rotate_left: String,
    pub rotate_right: String,
    pub remove: String,
    pub place: String,
    pub toggle_animations: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            up: " ".to_string(),
            down: "shift".to_string(),
            rotate_left: "q".to_string(),
            rotate_right: "e".to_string(),
            remove: "f".to_string(),
            place: "g".to_string(),
            toggle_animations: "p".to_string(),
        }
    }
}

/// High-level input processor
#[derive(Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    fn axis(&self, input: &InputState, negative: &str, positive: &str) -> f32 {
        let mut v = 0.0;
        if input.is_key_pressed(positive) {
            v += 1.0;
        }
        if input.is_key_pressed(negative) {
            v -= 1.0;
        }
        v
    }

    pub fn is_moving(&self, input: &InputState) -> bool {
        self.move_vector(input) != Vec3::ZERO
    }

    pub fn move_vector(&self, input: &InputState) -> Vec3 {
        let b = &self.bindings;
        Vec3::new(
            self.axis(input, &b.left, &b.right),
            self.axis(input, &b.down, &b.up),
            self.axis(input, &b.backward, &b.forward),
        )
    }

    pub fn block_from_key(&self, key: &str) -> Option<BlockType> {
        let digit = key.parse::<usize>().ok()?;
        (1..=SELECTABLE_BLOCKS.len())
            .contains(&digit)
            .then(|| BlockType::from_selection_index(digit - 1))
    }

    /// Drain this tick's input: held keys become a movement vector, fresh
    /// presses and clicks become actions, number keys change the selection.
    pub fn tick_input(&self, input: &mut InputState) -> TickInput {
        let b = &self.bindings;
        let mut actions = Vec::new();

        for key in std::mem::take(&mut input.just_pressed) {
            if let Some(block) = self.block_from_key(&key) {
                input.set_selected_block(block);
            } else if key == b.remove {
                actions.push(Action::Primary);
            } else if key == b.place {
                actions.push(Action::Secondary);
            } else if key == b.toggle_animations {
                actions.push(Action::ToggleAllAnimations);
            }
        }
        for button in std::mem::take(&mut input.clicks) {
            match button {
                MouseButton::Left => actions.push(Action::Primary),
                MouseButton::Right => actions.push(Action::Secondary),
                MouseButton::Middle => {}
            }
        }

        TickInput {
            move_vector: self.move_vector(input),
            rotate_delta: self.axis(input, &b.rotate_left, &b.rotate_right),
            look_delta: input.consume_look(),
            actions,
        }
    }
}

pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent, WheelEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove { dx: e.movement_x() as f32, dy: e.movement_y() as f32 }
    }

    pub fn mouse_click_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        InputEvent::MouseClick { button: MouseButton::from_web_button(e.button()), is_down }
    }

    pub fn mouse_wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::MouseWheel { delta_y: e.delta_y() as f32 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_down(input: &mut InputState, key: &str) {
        input.process_event(&InputEvent::KeyDown(key.to_string()));
    }

    #[test]
    fn test_move_vector_from_held_keys() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        key_down(&mut input, "W");
        key_down(&mut input, "d");
        key_down(&mut input, "Shift");
        let tick = processor.tick_input(&mut input);
        assert_eq!(tick.move_vector, Vec3::new(1.0, -1.0, 1.0));

        key_down(&mut input, "s");
        assert_eq!(processor.move_vector(&input).z, 0.0, "opposites cancel");
        input.process_event(&InputEvent::FocusLost);
        assert!(!processor.is_moving(&input));
    }

    #[test]
    fn test_actions_fire_once_per_press() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        key_down(&mut input, "g");
        key_down(&mut input, "g"); // auto-repeat
        key_down(&mut input, "p");
        let tick = processor.tick_input(&mut input);
        assert_eq!(tick.actions, vec![Action::Secondary, Action::ToggleAllAnimations]);
        assert!(processor.tick_input(&mut input).actions.is_empty());

        input.process_event(&InputEvent::KeyUp("G".to_string()));
        key_down(&mut input, "g");
        assert_eq!(processor.tick_input(&mut input).actions, vec![Action::Secondary]);
    }

    #[test]
    fn test_clicks_need_pointer_lock() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Left, is_down: true });
        input.process_event(&InputEvent::MouseMove { dx: 5.0, dy: 1.0 });
        let tick = processor.tick_input(&mut input);
        assert!(tick.actions.is_empty());
        assert_eq!(tick.look_delta, (0.0, 0.0));

        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Right, is_down: true });
        input.process_event(&InputEvent::MouseClick { button: MouseButton::Right, is_down: false });
        input.process_event(&InputEvent::MouseMove { dx: 5.0, dy: 1.0 });
        input.process_event(&InputEvent::MouseMove { dx: -2.0, dy: 1.0 });
        let tick = processor.tick_input(&mut input);
        assert_eq!(tick.actions, vec![Action::Secondary]);
        assert_eq!(tick.look_delta, (3.0, 2.0));
        assert_eq!(input.look_delta, (0.0, 0.0));
    }

    #[test]
    fn test_block_selection() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        assert_eq!(input.selected_block, BlockType::Dirt);

        key_down(&mut input, "6");
        processor.tick_input(&mut input);
        assert_eq!(input.selected_block, BlockType::Brick);

        input.process_event(&InputEvent::MouseWheel { delta_y: 100.0 });
        assert_eq!(input.selected_block, BlockType::Grass, "wraps forward");
        input.process_event(&InputEvent::MouseWheel { delta_y: -100.0 });
        assert_eq!(input.selected_block, BlockType::Brick, "wraps back");

        assert_eq!(processor.block_from_key("7"), None);
        assert_eq!(processor.block_from_key("0"), None);
    }

    #[test]
    fn test_rotate_keys() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        key_down(&mut input, "q");
        assert_eq!(processor.tick_input(&mut input).rotate_delta, -1.0);
        input.process_event(&InputEvent::KeyUp("q".to_string()));
        key_down(&mut input, "E");
        assert_eq!(processor.tick_input(&mut input).rotate_delta, 1.0);
    }
}
