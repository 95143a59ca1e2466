pub mod fetch;
pub mod runner;

use std::cell::RefCell;
use std::rc::Rc;

pub use fetch::JsSource;
pub use runner::MapRunner;
pub use starchart;
pub use console_error_panic_hook;
pub use console_log;
pub use js_sys;
pub use log;

use starchart::{DataCache, LoadMap, MapConfig};
use wasm_bindgen::JsValue;

/// Build a runner for `R` from host-supplied JSON and start loading it.
pub fn start_map<R: LoadMap>(
    props_json: &str,
    config_json: &str,
    fetch: js_sys::Function,
) -> Result<Rc<RefCell<MapRunner<R>>>, JsValue> {
    let props: R::Props = serde_json::from_str(props_json).map_err(|e| JsValue::from_str(&format!("invalid map props: {e}")))?;
    let config = MapConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let cache = DataCache::new(Rc::new(JsSource::new(fetch)));
    let runner = Rc::new(RefCell::new(MapRunner::new(cache, config)));
    wasm_bindgen_futures::spawn_local(runner::load(&runner, props));
    Ok(runner)
}

/// Convert a serialization failure into a JS exception value.
pub fn to_js(err: serde_json::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Generate all `#[wasm_bindgen]` exports for a map.
///
/// Generates:
/// - `thread_local!` storage for the MapRunner
/// - `with_runner()` helper function
/// - All wasm-bindgen exports (map_init, map_tick, input handlers, scene accessors)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
/// use starchart::GalaxyMapRenderer;
///
/// starchart_web::export_map!(GalaxyMapRenderer, "galaxy-map");
/// ```
///
/// # Arguments
///
/// - `$map_type`: The renderer type that implements `starchart::LoadMap`
/// - `$map_name`: A string literal used in log messages
#[macro_export]
macro_rules! export_map {
    ($map_type:ty, $map_name:literal) => {
        use std::cell::RefCell;
        use std::rc::Rc;
        use $crate::starchart::InputEvent;

        thread_local! {
            static RUNNER: RefCell<Option<Rc<RefCell<$crate::MapRunner<$map_type>>>>> = RefCell::new(None);
        }

        fn with_runner<T>(f: impl FnOnce(&mut $crate::MapRunner<$map_type>) -> T) -> Option<T> {
            let runner = RUNNER.with(|cell| cell.borrow().clone());
            match runner {
                Some(runner) => Some(f(&mut runner.borrow_mut())),
                None => {
                    $crate::log::warn!("{}: not initialized, call map_init() first", $map_name);
                    None
                }
            }
        }

        fn push(event: InputEvent) {
            with_runner(|r| r.push_input(event));
        }

        /// `fetch(path)` must return the document text (or a promise of it),
        /// or `null` when the document does not exist.
        #[wasm_bindgen]
        pub fn map_init(props_json: &str, config_json: &str, fetch: $crate::js_sys::Function) -> Result<(), JsValue> {
            $crate::console_error_panic_hook::set_once();
            let _ = $crate::console_log::init_with_level($crate::log::Level::Info);

            let runner = $crate::start_map::<$map_type>(props_json, config_json, fetch)?;
            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });
            $crate::log::info!("{}: loading", $map_name);
            Ok(())
        }

        #[wasm_bindgen]
        pub fn map_status() -> String {
            with_runner(|r| r.status()).unwrap_or("uninitialized").to_string()
        }

        #[wasm_bindgen]
        pub fn map_error() -> Option<String> {
            with_runner(|r| r.error().map(|e| e.to_string())).flatten()
        }

        /// Returns true if the host must redraw.
        #[wasm_bindgen]
        pub fn map_tick() -> bool {
            with_runner(|r| r.tick()).unwrap_or(false)
        }

        // ---- Input ----

        #[wasm_bindgen]
        pub fn map_pointer_move(dx: f64, dy: f64, buttons: u32) {
            push(InputEvent::PointerMove { dx, dy, buttons });
        }

        #[wasm_bindgen]
        pub fn map_touch_start(x: f64, y: f64) {
            push(InputEvent::TouchStart { x, y });
        }

        #[wasm_bindgen]
        pub fn map_touch_move(x: f64, y: f64) {
            push(InputEvent::TouchMove { x, y });
        }

        #[wasm_bindgen]
        pub fn map_touch_end() {
            push(InputEvent::TouchEnd);
        }

        #[wasm_bindgen]
        pub fn map_click(x: f64, y: f64) {
            push(InputEvent::Click { x, y });
        }

        #[wasm_bindgen]
        pub fn map_double_click(x: f64, y: f64) {
            push(InputEvent::DoubleClick { x, y });
        }

        #[wasm_bindgen]
        pub fn map_zoom(direction: i32, modifier: bool) {
            push(InputEvent::Zoom { direction, modifier });
        }

        #[wasm_bindgen]
        pub fn map_toggle(index: usize) {
            push(InputEvent::Toggle { index });
        }

        #[wasm_bindgen]
        pub fn map_set_time(time: f64) {
            push(InputEvent::SetTime { time });
        }

        // ---- Scene accessors ----

        #[wasm_bindgen]
        pub fn map_scene() -> Result<String, JsValue> {
            with_runner(|r| r.scene_json())
                .unwrap_or_else(|| Ok("null".to_string()))
                .map_err($crate::to_js)
        }

        /// Secondary scene (the galaxy map's selected system), or `null`.
        #[wasm_bindgen]
        pub fn map_inset_scene() -> Result<String, JsValue> {
            with_runner(|r| r.inset_scene_json())
                .unwrap_or_else(|| Ok("null".to_string()))
                .map_err($crate::to_js)
        }

        /// Acknowledge the drawn scene; returns the cleared dirty mask.
        #[wasm_bindgen]
        pub fn map_bake() -> u16 {
            with_runner(|r| r.bake()).unwrap_or(0)
        }

        #[wasm_bindgen]
        pub fn map_take_events() -> Result<String, JsValue> {
            with_runner(|r| r.take_events_json())
                .unwrap_or_else(|| Ok("[]".to_string()))
                .map_err($crate::to_js)
        }

        #[wasm_bindgen]
        pub fn map_toggles() -> Result<String, JsValue> {
            with_runner(|r| r.toggles_json())
                .unwrap_or_else(|| Ok("[]".to_string()))
                .map_err($crate::to_js)
        }

        /// Drop every cached lookup; the next load fetches again.
        #[wasm_bindgen]
        pub fn map_reset_cache() {
            with_runner(|r| r.cache().reset());
        }
    };
}
