// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Stream format, pixel format and encoder selection
//!
//! Selection works on a [`DeviceCapability`] snapshot only, so the policy is
//! testable without devices. Stream format detection is an ordered rule
//! table over free-text driver strings; the first matching rule wins:
//!
//! | Order | Rule | Outcome |
//! |-------|------|---------|
//! | 1 | Configured format | As configured |
//! | 2 | Card name contains `C920` | [`StreamFormat::H264`] passthrough |
//! | 3 | A format description starts with `yu` | [`StreamFormat::Yuv`] |
//! | 4 | A format description contains `jpeg` | [`StreamFormat::Mjpeg`] |
//! | 5 | A format description contains `h264` or `h.264` | [`StreamFormat::H264`] |
//!
//! All description matches are case-insensitive.

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::v4l2::DeviceCapability;
use crate::Error;

/// Card name fragment of webcams whose raw mode is unusable.
pub const PASSTHROUGH_CARD: &str = "C920";

/// Driver name of the Raspberry Pi camera.
pub const SOC_CAMERA_DRIVER: &str = "bm2835 mmal";

/// Encoder used when none is configured.
pub const DEFAULT_ENCODER: &str = "h264";

/// Stream delivered by the camera
///
/// Configuration values are read case-insensitively through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum StreamFormat {
    /// Raw YUV frames, encoded in software or by an encoder element
    Yuv,
    /// Motion JPEG, decoded then encoded
    Mjpeg,
    /// H.264 produced by the camera itself, passed through
    H264,
}

impl StreamFormat {
    pub fn name(&self) -> &'static str {
        match self {
            StreamFormat::Yuv => "yuv",
            StreamFormat::Mjpeg => "mjpeg",
            StreamFormat::H264 => "h264",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for StreamFormat {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for StreamFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yuv" | "raw" => Ok(StreamFormat::Yuv),
            "mjpeg" => Ok(StreamFormat::Mjpeg),
            "h264" => Ok(StreamFormat::H264),
            other => Err(format!(
                "unknown stream format '{}' (expected yuv, mjpeg or h264)",
                other
            )),
        }
    }
}

/// Raw pixel layout requested from the camera.
///
/// `YUY2` and `I420` are recognized in any letter case and always rendered in
/// the upper-case spelling GStreamer caps require, so a configured `i420`
/// reaches the pipeline as `I420`. Other values are kept verbatim and handed
/// to GStreamer as the caps `format` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PixelFormat {
    #[default]
    Yuy2,
    I420,
    Other(String),
}

impl PixelFormat {
    pub fn as_str(&self) -> &str {
        match self {
            PixelFormat::Yuy2 => "YUY2",
            PixelFormat::I420 => "I420",
            PixelFormat::Other(name) => name,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PixelFormat {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "YUY2" => PixelFormat::Yuy2,
            "I420" => PixelFormat::I420,
            _ => PixelFormat::Other(s),
        }
    }
}

impl From<&str> for PixelFormat {
    fn from(s: &str) -> Self {
        PixelFormat::from(s.to_string())
    }
}

impl From<PixelFormat> for String {
    fn from(p: PixelFormat) -> Self {
        p.as_str().to_string()
    }
}

/// Encoder identifier, free-form (e.g. "h264", "omx", "mfc").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoder(String);

impl Encoder {
    pub fn new(name: impl Into<String>) -> Self {
        Encoder(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new(DEFAULT_ENCODER)
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Encoder {
    fn from(s: &str) -> Self {
        Encoder::new(s)
    }
}

/// Explicit choices that take precedence over detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOverrides {
    pub format: Option<StreamFormat>,
    pub pixel_format: Option<PixelFormat>,
    pub encoder: Option<Encoder>,
}

/// Outcome of format selection for one construction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    pub stream_format: StreamFormat,
    pub pixel_format: PixelFormat,
    pub encoder: Encoder,
}

/// One row of the stream format policy
pub struct FormatRule {
    /// Log line emitted when the rule fires
    pub reason: &'static str,
    pub applies: fn(&DeviceCapability) -> bool,
    pub outcome: StreamFormat,
}

fn any_description(capability: &DeviceCapability, matches: impl Fn(&str) -> bool) -> bool {
    capability
        .formats()
        .iter()
        .any(|format| matches(&format.description.to_lowercase()))
}

fn is_passthrough_card(capability: &DeviceCapability) -> bool {
    capability.card().contains(PASSTHROUGH_CARD)
}

fn has_yuv(capability: &DeviceCapability) -> bool {
    any_description(capability, |d| d.starts_with("yu"))
}

fn has_mjpeg(capability: &DeviceCapability) -> bool {
    any_description(capability, |d| d.contains("jpeg"))
}

fn has_h264(capability: &DeviceCapability) -> bool {
    any_description(capability, |d| d.contains("h264") || d.contains("h.264"))
}

/// Detection rules in priority order.
pub const STREAM_FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        reason: "Logitech C920 detected, forcing H264 passthrough",
        applies: is_passthrough_card,
        outcome: StreamFormat::H264,
    },
    FormatRule {
        reason: "Camera YUV stream available, using yuv stream",
        applies: has_yuv,
        outcome: StreamFormat::Yuv,
    },
    FormatRule {
        reason: "Camera MJPEG stream available, using mjpeg stream",
        applies: has_mjpeg,
        outcome: StreamFormat::Mjpeg,
    },
    FormatRule {
        reason: "Camera H264 stream available, using H264 stream",
        applies: has_h264,
        outcome: StreamFormat::H264,
    },
];

/// Detect the stream format from the capability snapshot alone.
pub fn detect_stream_format(capability: &DeviceCapability) -> Option<StreamFormat> {
    STREAM_FORMAT_RULES
        .iter()
        .find(|rule| (rule.applies)(capability))
        .map(|rule| {
            info!("{}", rule.reason);
            rule.outcome
        })
}

/// Pixel format: YUY2, I420 for the Raspberry Pi camera, configuration wins.
pub fn select_pixel_format(
    capability: &DeviceCapability,
    configured: Option<&PixelFormat>,
) -> PixelFormat {
    if let Some(pixel_format) = configured {
        return pixel_format.clone();
    }
    if capability.driver() == SOC_CAMERA_DRIVER {
        info!("Raspberry Pi Camera detected, setting pixel format to I420");
        return PixelFormat::I420;
    }
    PixelFormat::Yuy2
}

/// Choose stream format, pixel format and encoder.
///
/// The encoder is never inferred from the device; it is the configured one or
/// [`DEFAULT_ENCODER`].
///
/// # Errors
///
/// [`Error::NoFormatFound`] when nothing is configured and no rule matches.
pub fn select_format(
    capability: &DeviceCapability,
    overrides: &FormatOverrides,
) -> Result<FormatSelection, Error> {
    let stream_format = match overrides.format {
        Some(format) => {
            debug!("Using configured stream format: {}", format);
            format
        }
        None => detect_stream_format(capability).ok_or(Error::NoFormatFound)?,
    };

    let encoder = overrides.encoder.clone().unwrap_or_default();
    debug!("Using encoder: {}", encoder);

    let pixel_format = select_pixel_format(capability, overrides.pixel_format.as_ref());
    debug!("Using pixelformat: {}", pixel_format);

    Ok(FormatSelection {
        stream_format,
        pixel_format,
        encoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v4l2::{CardIdentity, FormatDescriptor};

    fn capability(driver: &str, card: &str, formats: &[&str]) -> DeviceCapability {
        let formats = formats
            .iter()
            .enumerate()
            .map(|(i, d)| FormatDescriptor::new(i as u32, *d))
            .collect();
        DeviceCapability::new(
            CardIdentity {
                driver: driver.into(),
                card: card.into(),
                bus_info: String::new(),
            },
            vec![],
            formats,
            vec![],
        )
    }

    #[test]
    fn test_yuv_before_mjpeg() {
        let cap = capability("uvcvideo", "USB Camera", &["YUYV 4:2:2", "Motion-JPEG"]);
        let sel = select_format(&cap, &FormatOverrides::default()).unwrap();
        assert_eq!(sel.stream_format, StreamFormat::Yuv);
        assert_eq!(sel.pixel_format, PixelFormat::Yuy2);
        assert_eq!(sel.encoder.as_str(), "h264");
    }

    #[test]
    fn test_device_order_does_not_override_rule_order() {
        let cap = capability("uvcvideo", "USB Camera", &["Motion-JPEG", "YUYV 4:2:2"]);
        assert_eq!(detect_stream_format(&cap), Some(StreamFormat::Yuv));
    }

    #[test]
    fn test_yuv_requires_prefix() {
        let cap = capability("uvcvideo", "USB Camera", &["Planar YUV 4:2:0", "Motion-JPEG"]);
        assert_eq!(detect_stream_format(&cap), Some(StreamFormat::Mjpeg));
    }

    #[test]
    fn test_h264_patterns() {
        let cap = capability("uvcvideo", "USB Camera", &["H.264"]);
        assert_eq!(detect_stream_format(&cap), Some(StreamFormat::H264));
        let cap = capability("uvcvideo", "USB Camera", &["h264 stream"]);
        assert_eq!(detect_stream_format(&cap), Some(StreamFormat::H264));
    }

    #[test]
    fn test_passthrough_card_forces_h264() {
        let cap = capability(
            "uvcvideo",
            "HD Pro Webcam C920",
            &["YUYV 4:2:2", "H.264", "Motion-JPEG"],
        );
        assert_eq!(detect_stream_format(&cap), Some(StreamFormat::H264));
    }

    #[test]
    fn test_no_format_found() {
        let cap = capability("uvcvideo", "USB Camera", &["Bayer RGGB", "GREY"]);
        assert!(matches!(
            select_format(&cap, &FormatOverrides::default()),
            Err(Error::NoFormatFound)
        ));
    }

    #[test]
    fn test_override_skips_detection() {
        let cap = capability("uvcvideo", "USB Camera", &[]);
        let overrides = FormatOverrides {
            format: Some(StreamFormat::Mjpeg),
            pixel_format: Some(PixelFormat::from("NV12")),
            encoder: Some(Encoder::from("omx")),
        };
        let sel = select_format(&cap, &overrides).unwrap();
        assert_eq!(sel.stream_format, StreamFormat::Mjpeg);
        assert_eq!(sel.pixel_format, PixelFormat::Other("NV12".into()));
        assert_eq!(sel.encoder, Encoder::from("omx"));
    }

    #[test]
    fn test_soc_camera_pixel_format() {
        let cap = capability(SOC_CAMERA_DRIVER, "mmal service 16.1", &["YU12"]);
        assert_eq!(select_pixel_format(&cap, None), PixelFormat::I420);
        assert_eq!(
            select_pixel_format(&cap, Some(&PixelFormat::Yuy2)),
            PixelFormat::Yuy2
        );
    }

    #[test]
    fn test_stream_format_parsing() {
        assert_eq!("raw".parse::<StreamFormat>().unwrap(), StreamFormat::Yuv);
        assert_eq!("MJPEG".parse::<StreamFormat>().unwrap(), StreamFormat::Mjpeg);
        assert!("vp8".parse::<StreamFormat>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let f: StreamFormat = serde_json::from_str("\"raw\"").unwrap();
        assert_eq!(f, StreamFormat::Yuv);
        let p: PixelFormat = serde_json::from_str("\"i420\"").unwrap();
        assert_eq!(p, PixelFormat::I420);
        assert_eq!(serde_json::to_string(&PixelFormat::Yuy2).unwrap(), "\"YUY2\"");
        let f: StreamFormat = serde_json::from_str("\"H264\"").unwrap();
        assert_eq!(f, StreamFormat::H264);
        assert_eq!(serde_json::to_string(&StreamFormat::Mjpeg).unwrap(), "\"mjpeg\"");
    }

    #[test]
    fn test_pixel_format_spelling() {
        // Known layouts take the caps spelling, others are kept as written.
        assert_eq!(PixelFormat::from("i420").to_string(), "I420");
        assert_eq!(PixelFormat::from("Yuy2").to_string(), "YUY2");
        assert_eq!(PixelFormat::from("nv12").to_string(), "nv12");

        let cap = DeviceCapability::default();
        let configured = PixelFormat::from("i420");
        assert_eq!(select_pixel_format(&cap, Some(&configured)), PixelFormat::I420);
    }
}
