//! `data:` URL helpers for panoramas embedded directly in a tour.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

const PREFIX: &str = "data:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL has no payload separator")]
    MissingComma,
    #[error("only base64 data URLs are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

pub fn is_data_url(value: &str) -> bool {
    value
        .get(..PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(PREFIX))
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("{PREFIX}{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn decode(value: &str) -> Result<DataUrl, DataUrlError> {
    if !is_data_url(value) {
        return Err(DataUrlError::NotDataUrl);
    }
    let rest = &value[PREFIX.len()..];
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;
    let Some(mime) = header.strip_suffix(";base64") else {
        return Err(DataUrlError::NotBase64);
    };
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(DataUrl {
        mime: mime.to_string(),
        bytes,
    })
}
