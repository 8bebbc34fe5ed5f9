use flate2::read::GzDecoder;
use futures::future::join;
use js_sys::Uint8Array;
use std::io::Read;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::error::ViewerError;
use crate::geojson_features::FeatureCollection;
use crate::models::{CatalogReport, GeometryReport};
use crate::module_state::ModuleState;
use crate::structures::StructureCatalog;
use crate::{console_log, fetch};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Fetch a resource through the page's `wasmJsHelpers.fetch` helper, which
/// resolves to the response body as a `Uint8Array`.
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, ViewerError> {
    let to_err = |e: JsValue| ViewerError::Fetch {
        url: url.to_string(),
        message: js_message(&e),
    };
    let promise = fetch(url).map_err(to_err)?;
    let body = JsFuture::from(promise).await.map_err(to_err)?;
    let data = Uint8Array::new(&body).to_vec();
    decode_payload(data)
}

/// Transparently inflate gzip payloads; anything else passes through.
pub fn decode_payload(data: Vec<u8>) -> Result<Vec<u8>, ViewerError> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(data);
    }
    console_log!("Detected gzipped payload, decompressing...");
    let mut decoder = GzDecoder::new(&data[..]);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(ViewerError::Decompress)?;
    Ok(decompressed)
}

/// Invalid JSON is an error; valid JSON of the wrong shape is an empty catalog.
pub fn parse_catalog(bytes: &[u8]) -> Result<StructureCatalog, ViewerError> {
    let value: serde_json::Value = serde_json::from_slice(&decode_payload(bytes.to_vec())?)?;
    Ok(StructureCatalog::from_value(&value))
}

pub fn parse_geometry(bytes: &[u8]) -> Result<FeatureCollection, ViewerError> {
    FeatureCollection::from_slice(&decode_payload(bytes.to_vec())?)
}

/// Apply a catalog payload to the shared engine. Failures degrade to an empty
/// catalog and are reported, not raised.
pub fn apply_catalog_bytes(bytes: &[u8]) -> CatalogReport {
    let parsed = parse_catalog(bytes);
    ModuleState::with_mut(|engine| match parsed {
        Ok(catalog) => engine.apply_catalog(catalog),
        Err(err) => engine.catalog_failed(&err),
    })
}

/// Apply a geometry payload to the shared engine. On failure the engine drops
/// its geometry and the error is passed on to the caller.
pub fn apply_geometry_bytes(bytes: &[u8]) -> Result<GeometryReport, ViewerError> {
    match parse_geometry(bytes) {
        Ok(collection) => Ok(ModuleState::with_mut(|engine| engine.apply_geometry(collection))),
        Err(err) => {
            ModuleState::with_mut(|engine| engine.geometry_failed(&err));
            Err(err)
        }
    }
}

pub async fn load_structures(url: &str) -> CatalogReport {
    match fetch_bytes(url).await {
        Ok(bytes) => apply_catalog_bytes(&bytes),
        Err(err) => ModuleState::with_mut(|engine| engine.catalog_failed(&err)),
    }
}

pub async fn load_geometry(url: &str) -> Result<GeometryReport, ViewerError> {
    match fetch_bytes(url).await {
        Ok(bytes) => apply_geometry_bytes(&bytes),
        Err(err) => {
            ModuleState::with_mut(|engine| engine.geometry_failed(&err));
            Err(err)
        }
    }
}

/// Run both loads concurrently. Each one applies its result and refreshes the
/// engine as soon as it completes, so whichever finishes last sets the final state.
pub async fn load_all(
    structures_url: &str,
    geometry_url: &str,
) -> (CatalogReport, Result<GeometryReport, ViewerError>) {
    join(load_structures(structures_url), load_geometry(geometry_url)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).expect("write");
        encoder.finish().expect("finish")
    }

    #[test]
    fn plain_payload_passes_through() {
        let data = br#"{"structures": []}"#.to_vec();
        assert_eq!(decode_payload(data.clone()).expect("decode"), data);
    }

    #[test]
    fn gzipped_payload_is_inflated() {
        let body = br#"{"type": "FeatureCollection", "features": [{"type": "Feature", "properties": {}}]}"#;
        let collection = parse_geometry(&gzip(body)).expect("collection");
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn truncated_gzip_is_an_error() {
        let mut data = gzip(b"{\"structures\": []}");
        data.truncate(8);
        assert!(matches!(decode_payload(data), Err(ViewerError::Decompress(_))));
    }

    #[test]
    fn catalog_shape_is_lenient_but_json_is_not() {
        assert!(parse_catalog(b"{\"other\": 1}").expect("catalog").is_empty());
        assert!(matches!(parse_catalog(b"{not json"), Err(ViewerError::Json(_))));
        assert!(matches!(parse_geometry(b"[]"), Err(ViewerError::InvalidShape(_))));
    }
}
