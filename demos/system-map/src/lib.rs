use wasm_bindgen::prelude::*;
use starchart::SystemMapRenderer;

starchart_web::export_map!(SystemMapRenderer, "system-map");
