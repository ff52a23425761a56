// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Daemon configuration
//!
//! Every option is optional. Absent values fall back to detection or to the
//! defaults below, never to error handling:
//!
//! | Key | Default |
//! |-----|---------|
//! | `pipeline_override` | auto-construct |
//! | `camera_device` | first camera found |
//! | `format` | detected |
//! | `encoder` | `h264` |
//! | `pixelformat` | `YUY2` (`I420` on the Raspberry Pi camera) |
//! | `width` / `height` / `framerate` | 640 / 480 / 30 |
//! | `brightness` | driver default |
//! | `output` / `output_dest` / `output_port` | required by the auto path |
//! | `retry` | 30 seconds |
//! | `debug` | GStreamer debug off |

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::format::{Encoder, FormatOverrides, PixelFormat, StreamFormat};
use crate::pipeline::{Geometry, OutputSettings, OutputSink};
use crate::Error;

/// Retry delay when `retry` is absent or zero.
pub const DEFAULT_RETRY_SECONDS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Literal GStreamer launch description; selects the manual path
    pub pipeline_override: Option<String>,
    pub camera_device: Option<String>,
    pub format: Option<StreamFormat>,
    pub encoder: Option<Encoder>,
    pub pixelformat: Option<PixelFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub framerate: Option<u32>,
    pub brightness: Option<i32>,
    pub output: Option<OutputSink>,
    pub output_dest: Option<String>,
    pub output_port: Option<u16>,
    /// Seconds between construction attempts
    pub retry: Option<u64>,
    /// GStreamer debug threshold (1 = error .. 9 = memdump)
    pub debug: Option<u32>,
}

impl Config {
    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Config) -> Config {
        Config {
            pipeline_override: other.pipeline_override.or(self.pipeline_override),
            camera_device: other.camera_device.or(self.camera_device),
            format: other.format.or(self.format),
            encoder: other.encoder.or(self.encoder),
            pixelformat: other.pixelformat.or(self.pixelformat),
            width: other.width.or(self.width),
            height: other.height.or(self.height),
            framerate: other.framerate.or(self.framerate),
            brightness: other.brightness.or(self.brightness),
            output: other.output.or(self.output),
            output_dest: other.output_dest.or(self.output_dest),
            output_port: other.output_port.or(self.output_port),
            retry: other.retry.or(self.retry),
            debug: other.debug.or(self.debug),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        let seconds = self
            .retry
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_RETRY_SECONDS);
        Duration::from_secs(seconds)
    }

    pub fn geometry(&self) -> Geometry {
        let defaults = Geometry::default();
        Geometry {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            framerate: self.framerate.unwrap_or(defaults.framerate),
        }
    }

    pub fn format_overrides(&self) -> FormatOverrides {
        FormatOverrides {
            format: self.format,
            pixel_format: self.pixelformat.clone(),
            encoder: self.encoder.clone(),
        }
    }

    pub fn output_settings(&self) -> OutputSettings {
        OutputSettings {
            sink: self.output,
            destination: self.output_dest.clone(),
            port: self.output_port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retry_delay(), Duration::from_secs(30));
        assert_eq!(config.geometry(), Geometry::default());
        assert_eq!(config.format_overrides(), FormatOverrides::default());
        assert!(config.output_settings().sink.is_none());
    }

    #[test]
    fn test_zero_retry_uses_default() {
        let config = Config {
            retry: Some(0),
            ..Default::default()
        };
        assert_eq!(config.retry_delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_json() {
        let config = Config::from_json(
            r#"{
                "camera_device": "/dev/video2",
                "format": "raw",
                "pixelformat": "I420",
                "width": 1280,
                "height": 720,
                "output": "udp",
                "output_dest": "192.168.1.5",
                "output_port": 5600,
                "retry": 10
            }"#,
        )
        .unwrap();
        assert_eq!(config.camera_device.as_deref(), Some("/dev/video2"));
        assert_eq!(config.format, Some(StreamFormat::Yuv));
        assert_eq!(config.pixelformat, Some(PixelFormat::I420));
        assert_eq!(config.geometry().framerate, 30);
        assert_eq!(config.output, Some(OutputSink::Udp));
        assert_eq!(config.retry_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_values_are_case_insensitive() {
        let config = Config::from_json(
            r#"{"format": "MJPEG", "output": "UDP", "pixelformat": "i420", "encoder": "OMX"}"#,
        )
        .unwrap();
        assert_eq!(config.format, Some(StreamFormat::Mjpeg));
        assert_eq!(config.output, Some(OutputSink::Udp));
        assert_eq!(config.pixelformat, Some(PixelFormat::I420));
        // Encoder names stay as written; element lookup ignores case.
        assert_eq!(config.encoder.as_ref().map(|e| e.as_str()), Some("OMX"));

        let config = Config::from_json(r#"{"format": "H264", "output": "File"}"#).unwrap();
        assert_eq!(config.format, Some(StreamFormat::H264));
        assert_eq!(config.output, Some(OutputSink::File));
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert!(matches!(
            Config::from_json(r#"{"format": "bayer"}"#),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"output": "http"}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            Config::from_json(r#"{"camera": "/dev/video0"}"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let file = Config {
            camera_device: Some("/dev/video0".into()),
            retry: Some(5),
            ..Default::default()
        };
        let flags = Config {
            camera_device: Some("/dev/video1".into()),
            ..Default::default()
        };
        let merged = file.merge(flags);
        assert_eq!(merged.camera_device.as_deref(), Some("/dev/video1"));
        assert_eq!(merged.retry, Some(5));
    }
}
