use wasm_bindgen::prelude::*;
use starchart::GalaxyMapRenderer;

starchart_web::export_map!(GalaxyMapRenderer, "galaxy-map");
