use async_trait::async_trait;
use js_sys::{Function, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use starchart::{DataError, EntitySource};

/// `EntitySource` backed by a host callback.
///
/// The callback receives a data path and returns the document text, or a
/// promise of it. `null` and `undefined` mean the document does not exist;
/// a thrown error or rejected promise is a transport failure.
pub struct JsSource {
    fetch: Function,
}

impl JsSource {
    pub fn new(fetch: Function) -> Self {
        Self { fetch }
    }
}

fn fetch_error(path: &str, err: JsValue) -> DataError {
    let reason = err
        .as_string()
        .or_else(|| err.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{err:?}"));
    DataError::Fetch {
        path: path.to_string(),
        reason,
    }
}

#[async_trait(?Send)]
impl EntitySource for JsSource {
    async fn fetch(&self, path: &str) -> Result<Option<String>, DataError> {
        let returned = self
            .fetch
            .call1(&JsValue::NULL, &JsValue::from_str(path))
            .map_err(|e| fetch_error(path, e))?;
        let value = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|e| fetch_error(path, e))?;

        if value.is_null() || value.is_undefined() {
            log::debug!("fetch {path}: missing");
            return Ok(None);
        }
        match value.as_string() {
            Some(text) => Ok(Some(text)),
            None => Err(DataError::Fetch {
                path: path.to_string(),
                reason: "callback did not return a string".into(),
            }),
        }
    }
}
