// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! visiond - Autonomous camera pipeline construction for embedded boards
//!
//! visiond picks a working V4L2 camera, works out which raw or encoded stream
//! it can deliver, chooses an encoder and hands a complete pipeline to
//! GStreamer. It is meant to run unattended (drones, single-board computers)
//! and keeps retrying until a pipeline is playing.
//!
//! # Quick Start
//!
//! ```no_run
//! use visiond::config::Config;
//! use visiond::engine::GstEngine;
//! use visiond::supervisor::Supervisor;
//! use visiond::v4l2::V4l2Query;
//!
//! let config = Config::from_file("/etc/visiond.json")?;
//! let engine = GstEngine::new(config.debug);
//! let mut supervisor = Supervisor::new(config, V4l2Query::new(), engine);
//! supervisor.run()?;
//! # Ok::<(), visiond::Error>(())
//! ```
//!
//! # Decision Flow
//!
//! | Stage | Module | Outcome |
//! |-------|--------|---------|
//! | Device selection | [`v4l2::DeviceEnumerator`] | First node with a camera input |
//! | Capability probe | [`v4l2::DeviceProbe`] | Driver, card, inputs, formats, controls |
//! | Hardware encoder scan | [`v4l2::DeviceEnumerator::find_hardware_encoder`] | Logged only |
//! | Format selection | [`format::select_format`] | Stream format, pixel format, encoder |
//! | Pipeline assembly | [`pipeline::PipelineConfig`] | GStreamer launch description |
//! | Supervision | [`supervisor::Supervisor`] | Retry until playing |

use std::{error, fmt, io};

/// Error type for visiond operations
#[derive(Debug)]
pub enum Error {
    /// No enumerated device node exposes a camera input
    NoCameraFound,

    /// The selected camera reports no YUV, MJPEG or H.264 format
    NoFormatFound,

    /// The pipeline could not be assembled or the execution engine rejected it
    PipelineConstruction(String),

    /// The configuration cannot work at all; retrying would not help
    Configuration(String),

    /// I/O error while reading configuration or devices
    Io(io::Error),

    /// Malformed JSON configuration
    Json(serde_json::Error),
}

impl Error {
    /// Whether the supervisor should retry after this error.
    ///
    /// Only [`Error::Configuration`] is fatal.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::Configuration(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoCameraFound => write!(f, "Error detecting camera video device"),
            Error::NoFormatFound => write!(f, "Error detecting camera video format"),
            Error::PipelineConstruction(msg) => write!(f, "Error constructing pipeline: {}", msg),
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

/// The config module provides the daemon configuration and its defaults.
pub mod config;

/// The engine module provides the GStreamer execution boundary.
pub mod engine;

/// The format module provides stream format, pixel format and encoder selection.
pub mod format;

/// The fourcc module provides portable handling of fourcc codes.
pub mod fourcc;

/// The pipeline module provides the final pipeline configuration.
pub mod pipeline;

/// The supervisor module provides the retrying control loop.
pub mod supervisor;

/// The v4l2 module provides device discovery and capability probing.
pub mod v4l2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(Error::NoCameraFound.is_retryable());
        assert!(Error::NoFormatFound.is_retryable());
        assert!(Error::PipelineConstruction("x".into()).is_retryable());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Other, "x")).is_retryable());
        assert!(!Error::Configuration("x".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::NoCameraFound.to_string(),
            "Error detecting camera video device"
        );
        assert_eq!(
            Error::PipelineConstruction("no element \"foo\"".into()).to_string(),
            "Error constructing pipeline: no element \"foo\""
        );
    }
}
