// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
#[cfg(target_arch = "wasm32")]
use web_sys::{Document, Event, EventTarget, KeyboardEvent, MouseEvent, WheelEvent, Window};

#[cfg(target_arch = "wasm32")]
use controller::input::wasm as web_input;
#[cfg(target_arch = "wasm32")]
use controller::{GameState, InputEvent};
#[cfg(target_arch = "wasm32")]
use view::{MeshHandle, MeshLibrary};

/// The running page session, shared by the frame loop and the exported getters
#[cfg(target_arch = "wasm32")]
struct Session {
    state: Rc<RefCell<GameState>>,
    meshes: MeshLibrary,
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    logging::init();

    let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
    let document = window.document().ok_or_else(|| js_error("no document on window"))?;

    let state = Rc::new(RefCell::new(GameState::new(&model::WorldConfig::default())));
    let meshes = MeshLibrary::new(&state.borrow().scene.terrain);
    setup_input_listeners(&window, &document, state.clone())?;
    SESSION.with(|s| *s.borrow_mut() = Some(Session { state: state.clone(), meshes }));

    start_frame_loop(window, state)
}

/// Packed draw list for the current frame, `view::PACKED_ITEM_LEN` floats per item
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn draw_list() -> js_sys::Float32Array {
    let packed = with_session(|s| view::pack_draw_list(&view::build_draw_list(&s.state.borrow()))).unwrap_or_default();
    js_sys::Float32Array::from(packed.as_slice())
}

/// Vertex bytes of a shared mesh (`MeshHandle::index` numbering)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn mesh_vertices(handle: u8) -> js_sys::Uint8Array {
    let bytes = with_mesh(handle, |m| m.vertex_bytes().to_vec()).unwrap_or_default();
    js_sys::Uint8Array::from(bytes.as_slice())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn mesh_indices(handle: u8) -> js_sys::Uint32Array {
    let indices = with_mesh(handle, |m| m.indices.clone()).unwrap_or_default();
    js_sys::Uint32Array::from(indices.as_slice())
}

/// Column-major view-projection matrix of the player camera
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn camera_matrix() -> js_sys::Float32Array {
    let matrix = with_session(|s| s.state.borrow().camera.view_proj().to_cols_array()).unwrap_or_default();
    js_sys::Float32Array::from(&matrix[..])
}

/// Keep the projection in step with the canvas size
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn resize(width: u32, height: u32) {
    with_session(|s| s.state.borrow_mut().camera.set_aspect(width, height));
}

/// Overlay lines: counter, target, status or help, and the win message once won
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn hud_lines() -> js_sys::Array {
    let lines = js_sys::Array::new();
    with_session(|s| {
        let state = s.state.borrow();
        let progress = &state.scene.progress;
        lines.push(&ui::Hud::counter_text(progress).into());
        lines.push(&ui::Hud::target_text(&state.target).into());
        lines.push(&state.hud.status_line().into());
        if let Some(win) = ui::Hud::win_text(progress) {
            lines.push(&win.into());
        }
    });
    lines
}

#[cfg(target_arch = "wasm32")]
fn with_session<T>(f: impl FnOnce(&Session) -> T) -> Option<T> {
    SESSION.with(|s| s.borrow().as_ref().map(f))
}

#[cfg(target_arch = "wasm32")]
fn with_mesh<T>(handle: u8, f: impl FnOnce(&utils::Mesh) -> T) -> Option<T> {
    let handle = MeshHandle::from_index(handle)?;
    with_session(|s| f(s.meshes.get(handle)))
}

/// Route DOM input into the session's `InputState`
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(window: &Window, document: &Document, state: Rc<RefCell<GameState>>) -> Result<(), JsValue> {
    // Keyboard down
    {
        let state = state.clone();
        let doc = document.clone();
        listen(document, "keydown", move |e| {
            let Some(e) = e.dyn_ref::<KeyboardEvent>() else { return };
            let key = e.key();
            if key == "Escape" {
                doc.exit_pointer_lock();
                return;
            }
            if matches!(key.to_lowercase().as_str(), "w" | "a" | "s" | "d" | "q" | "e" | " " | "shift") {
                e.prevent_default();
            }
            state.borrow_mut().input.process_event(&web_input::keyboard_event_to_input(e, true));
        })?;
    }

    // Keyboard up
    {
        let state = state.clone();
        listen(document, "keyup", move |e| {
            if let Some(e) = e.dyn_ref::<KeyboardEvent>() {
                state.borrow_mut().input.process_event(&web_input::keyboard_event_to_input(e, false));
            }
        })?;
    }

    // Focus loss and hidden tab both release held keys
    let release_targets: [(&EventTarget, &str); 2] = [(window, "blur"), (document, "visibilitychange")];
    for (target, name) in release_targets {
        let state = state.clone();
        listen(target, name, move |_| {
            state.borrow_mut().input.process_event(&InputEvent::FocusLost);
        })?;
    }

    // Pointer lock change
    {
        let state = state.clone();
        let doc = document.clone();
        listen(document, "pointerlockchange", move |_| {
            let locked = doc.pointer_lock_element().is_some();
            tracing::debug!(locked, "pointer lock changed");
            state.borrow_mut().input.process_event(&InputEvent::PointerLockChanged { locked });
        })?;
    }

    // Mouse down: the first click captures the pointer, later clicks edit
    {
        let state = state.clone();
        let doc = document.clone();
        listen(document, "mousedown", move |e| {
            let Some(e) = e.dyn_ref::<MouseEvent>() else { return };
            if !state.borrow().input.pointer_locked {
                if let Some(body) = doc.body() {
                    body.request_pointer_lock();
                }
                return;
            }
            e.prevent_default();
            state.borrow_mut().input.process_event(&web_input::mouse_click_to_input(e, true));
        })?;
    }

    // Mouse move
    {
        let state = state.clone();
        listen(document, "mousemove", move |e| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                state.borrow_mut().input.process_event(&web_input::mouse_move_to_input(e));
            }
        })?;
    }

    // Mouse wheel cycles the hotbar
    {
        let state = state.clone();
        listen(document, "wheel", move |e| {
            if let Some(e) = e.dyn_ref::<WheelEvent>() {
                e.prevent_default();
                state.borrow_mut().input.process_event(&web_input::mouse_wheel_to_input(e));
            }
        })?;
    }

    // Context menu prevention
    listen(document, "contextmenu", |e| e.prevent_default())?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn listen(target: &EventTarget, name: &str, f: impl FnMut(Event) + 'static) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    // listeners live as long as the page
    closure.forget();
    Ok(())
}

/// Tick once per animation frame with `performance.now()` deltas
#[cfg(target_arch = "wasm32")]
fn start_frame_loop(window: Window, state: Rc<RefCell<GameState>>) -> Result<(), JsValue> {
    let performance = window.performance().ok_or_else(|| js_error("no performance on window"))?;
    let mut last = performance.now();

    let frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let next = frame.clone();
    let loop_window = window.clone();

    *frame.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let now = performance.now();
        state.borrow_mut().tick((now - last) as f32);
        last = now;

        // the closure holds a handle to itself, so the loop never drops
        if let Some(callback) = next.borrow().as_ref() {
            if let Err(e) = loop_window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                tracing::error!(?e, "requestAnimationFrame failed");
            }
        }
    }) as Box<dyn FnMut()>));

    let first = frame.borrow();
    let callback = first.as_ref().ok_or_else(|| js_error("frame callback missing"))?;
    window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}
