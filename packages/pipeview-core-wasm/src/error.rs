use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("error decompressing gzip data: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid payload shape: {0}")]
    InvalidShape(String),
    #[error("no structure with id '{0}'")]
    UnknownStructure(String),
}

impl From<ViewerError> for JsValue {
    fn from(err: ViewerError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}
