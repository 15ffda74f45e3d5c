//! Model input types shared by the prompt builder and the model clients

use base64::{Engine, engine::general_purpose::STANDARD};

pub const JPEG_MIME_TYPE: &str = "image/jpeg";
pub const JSON_MIME_TYPE: &str = "application/json";

/// Low temperature keeps the model close to the schema.
pub const TEMPERATURE: f64 = 0.2;

/// An image attached to a scheduling request, e.g. a photo of a flyer
/// or a timetable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl UserImage {
    pub fn new(mime_type: &str, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::new(JPEG_MIME_TYPE, data)
    }

    /// Decode a base64 image sent by a client. Browsers usually hand
    /// over a data URL (`data:image/png;base64,...`) so the prefix is
    /// accepted and its MIME type kept, otherwise JPEG is assumed.
    pub fn from_base64(encoded: &str) -> Result<Self, base64::DecodeError> {
        let encoded = encoded.trim();
        let (mime_type, payload) = match encoded
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
        {
            Some((mime_type, payload)) if !mime_type.is_empty() => (mime_type, payload),
            _ => (JPEG_MIME_TYPE, encoded),
        };
        let data = STANDARD.decode(payload)?;
        Ok(Self::new(mime_type, data))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

/// One part of a multimodal request. Text and images are kept as
/// separate parts so the model receives them as distinct inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData(UserImage),
}

/// Everything a generative model needs for a single call, minus the
/// model identifier and credentials which belong to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub parts: Vec<Part>,
    pub temperature: f64,
    pub response_mime_type: String,
}

impl GenerationRequest {
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            Part::Text(text) => Some(text.as_str()),
            Part::InlineData(_) => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &UserImage> {
        self.parts.iter().filter_map(|part| match part {
            Part::InlineData(image) => Some(image),
            Part::Text(_) => None,
        })
    }
}
