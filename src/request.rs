//! Entry points for callers that hand over a wrapped configuration: a JSON
//! request body or a URL-encoded query value.

use std::io::Read;

use log::{debug, warn};
use serde_json::Value;

use crate::error::{CigraphError, Result};
use crate::pipeline::{process, PipelineReport};

const MISSING_CONFIG: &str = "Missing config string in body.";

/// Request body accepted by [`handle_request`].
#[derive(Debug)]
pub struct AnalyzeRequest {
    pub config: String,
}

impl AnalyzeRequest {
    /// Parses a JSON body, requiring an object with a string `config` field.
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(|e| {
            warn!("Rejecting request with malformed JSON: {e}");
            CigraphError::Request(MISSING_CONFIG.to_string())
        })?;

        match value.get("config") {
            Some(Value::String(config)) => Ok(Self {
                config: config.clone(),
            }),
            _ => Err(CigraphError::Request(MISSING_CONFIG.to_string())),
        }
    }
}

/// Runs the full pipeline for a JSON request body.
pub fn handle_request(body: &str) -> Result<PipelineReport> {
    let request = AnalyzeRequest::from_json(body)?;
    debug!("Handling request with {} bytes of config", request.config.len());
    Ok(process(&request.config))
}

/// Reads a JSON request body from `reader` and runs the full pipeline.
pub fn handle_reader<R: Read>(mut reader: R) -> Result<PipelineReport> {
    let mut body = String::new();
    reader.read_to_string(&mut body)?;
    handle_request(&body)
}

/// Percent-decodes a configuration passed as a URL query value.
///
/// `+` is kept literally; only `%XX` escapes are decoded. An absent value
/// decodes to the empty document.
pub fn decode_config(encoded: Option<&str>) -> Result<String> {
    let Some(encoded) = encoded.filter(|e| !e.is_empty()) else {
        return Ok(String::new());
    };

    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| CigraphError::Decode(e.to_string()))
}

/// Decodes a URL-encoded configuration and runs the full pipeline.
pub fn process_encoded(encoded: Option<&str>) -> Result<PipelineReport> {
    let config = decode_config(encoded)?;
    Ok(process(&config))
}

/// Serializes a report as the JSON response body.
pub fn to_response(report: &PipelineReport, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}
