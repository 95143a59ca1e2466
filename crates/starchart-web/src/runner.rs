use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use starchart::{DataCache, DataError, InputEvent, LoadMap, MapConfig, MapView};

enum LoadState<R: LoadMap> {
    Loading,
    Ready(MapView<R>),
    Failed(DataError),
}

/// Generic map runner that wires a renderer to the host page.
///
/// Each concrete map (e.g. `galaxy-map`) keeps one runner in a
/// `thread_local!` and exports free functions via `#[wasm_bindgen]`,
/// because wasm-bindgen cannot export generic structs directly.
pub struct MapRunner<R: LoadMap> {
    cache: DataCache,
    config: MapConfig,
    state: LoadState<R>,
    /// Bumped on every load; results of superseded loads are dropped.
    load_id: u32,
}

impl<R: LoadMap> MapRunner<R> {
    pub fn new(cache: DataCache, config: MapConfig) -> Self {
        Self {
            cache,
            config,
            state: LoadState::Loading,
            load_id: 0,
        }
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }

    /// `"loading"`, `"ready"` or `"failed"`.
    pub fn status(&self) -> &'static str {
        match self.state {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        }
    }

    pub fn error(&self) -> Option<&DataError> {
        match &self.state {
            LoadState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&MapView<R>> {
        match &self.state {
            LoadState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut MapView<R>> {
        match &mut self.state {
            LoadState::Ready(view) => Some(view),
            _ => None,
        }
    }

    fn begin_load(&mut self) -> u32 {
        self.load_id = self.load_id.wrapping_add(1);
        self.state = LoadState::Loading;
        self.load_id
    }

    fn finish_load(&mut self, id: u32, result: Result<R, DataError>) {
        if id != self.load_id {
            log::debug!("dropping superseded load {id}");
            return;
        }
        self.state = match result {
            Ok(renderer) => LoadState::Ready(MapView::new(renderer, &self.config)),
            Err(err) => {
                log::error!("map load failed: {err}");
                LoadState::Failed(err)
            }
        };
    }

    /// Input arriving before the map is ready is dropped.
    pub fn push_input(&mut self, event: InputEvent) {
        match self.view_mut() {
            Some(view) => view.push_input(event),
            None => log::debug!("input ignored while {}", self.status()),
        }
    }

    /// Run one frame. Returns true if the host must redraw.
    pub fn tick(&mut self) -> bool {
        self.view_mut().is_some_and(|view| view.tick())
    }

    /// Serialized scene: transform plus every layer.
    pub fn scene_json(&self) -> Result<String, serde_json::Error> {
        match self.view() {
            Some(view) => serde_json::to_string(view.scene()),
            None => Ok("null".to_string()),
        }
    }

    /// Serialized inset scene, `null` when the map shows none.
    pub fn inset_scene_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.view().and_then(|view| view.inset_scene()))
    }

    /// Acknowledge the current scene. Returns the dirty mask that was cleared.
    pub fn bake(&mut self) -> u16 {
        self.view_mut().map_or(0, |view| view.scene_mut().bake().mask)
    }

    pub fn take_events_json(&mut self) -> Result<String, serde_json::Error> {
        let events = self.view_mut().map(|view| view.take_events()).unwrap_or_default();
        serde_json::to_string(&events)
    }

    pub fn toggles_json(&self) -> Result<String, serde_json::Error> {
        let toggles = self.view().map(|view| view.toggle_buttons()).unwrap_or_default();
        serde_json::to_string(&toggles)
    }
}

/// Start loading `R` into `runner`. The returned future completes once the
/// runner is ready or failed; it holds only a weak reference to the runner.
pub fn load<R: LoadMap>(runner: &Rc<RefCell<MapRunner<R>>>, props: R::Props) -> impl Future<Output = ()> + 'static {
    let (id, pending) = {
        let mut r = runner.borrow_mut();
        let id = r.begin_load();
        (id, R::load(r.cache.clone(), props, r.config.clone()))
    };
    let weak = Rc::downgrade(runner);
    async move {
        let result = pending.await;
        if let Some(runner) = weak.upgrade() {
            runner.borrow_mut().finish_load(id, result);
        }
    }
}
