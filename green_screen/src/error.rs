//! Error types for the platform side of the pipeline.

use matte_core::GeometryError;
use thiserror::Error;

/// Failures reported by a [`SensorSource`](crate::sensor::SensorSource).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// No frame waiting on the stream; try again next cycle.
    #[error("no frame ready")]
    NotReady,

    #[error("sensor disconnected")]
    Disconnected,

    #[error("sensor runtime error: {0}")]
    Sdk(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("window error: {0}")]
    Window(String),

    #[error("stride {stride} does not match {width} pixels of 4 bytes")]
    Stride { width: usize, stride: usize },

    #[error("background image: {0}")]
    Background(String),

    #[error("renderer not initialized")]
    NotInitialized,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
