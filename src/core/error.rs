//! Error kinds surfaced to the driver. No error-derive crate is pulled in for two variants;
//! `std::error::Error`/`Display` are implemented by hand.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone)]
pub enum RenderError {
    /// Scene referenced unknown material, OBJ parse failure, zero image dimensions: surfaced
    /// before any pixel is computed.
    Configuration(String),
    /// Device creation or `commit()` failure from the geometry backend.
    GeometryBackend(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            RenderError::GeometryBackend(msg) => write!(f, "geometry backend error: {}", msg),
        }
    }
}

impl Error for RenderError {}
