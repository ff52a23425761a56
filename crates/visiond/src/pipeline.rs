// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Pipeline configuration
//!
//! [`PipelineConfig`] is the fully resolved description of one streaming
//! pipeline. It is built once per construction attempt, never modified, and
//! rendered into a GStreamer launch description for the execution engine.
//!
//! # Example
//!
//! ```
//! use visiond::format::{Encoder, FormatSelection, PixelFormat, StreamFormat};
//! use visiond::pipeline::{Geometry, OutputSettings, OutputSink, PipelineConfig};
//!
//! let selection = FormatSelection {
//!     stream_format: StreamFormat::Yuv,
//!     pixel_format: PixelFormat::Yuy2,
//!     encoder: Encoder::default(),
//! };
//! let output = OutputSettings {
//!     sink: Some(OutputSink::Udp),
//!     destination: Some("192.168.1.10".into()),
//!     port: Some(5600),
//! };
//! let config = PipelineConfig::build(
//!     "/dev/video0".into(),
//!     selection,
//!     Geometry::default(),
//!     None,
//!     &output,
//! )?;
//! assert!(config.launch_description().starts_with("v4l2src device=\"/dev/video0\""));
//! # Ok::<(), visiond::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::{Encoder, FormatSelection, PixelFormat, StreamFormat};
use crate::v4l2::DeviceNode;
use crate::Error;

/// Where the encoded stream goes
///
/// Configuration values are read case-insensitively through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutputSink {
    /// RTP/H.264 over UDP to `destination:port`
    Udp,
    /// Publish to the RTSP server at `rtsp://destination:port/video`
    Rtsp,
    /// Matroska file at `destination`
    File,
}

impl OutputSink {
    pub fn name(&self) -> &'static str {
        match self {
            OutputSink::Udp => "udp",
            OutputSink::Rtsp => "rtsp",
            OutputSink::File => "file",
        }
    }

    fn needs_port(&self) -> bool {
        matches!(self, OutputSink::Udp | OutputSink::Rtsp)
    }
}

impl fmt::Display for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for OutputSink {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for OutputSink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(OutputSink::Udp),
            "rtsp" => Ok(OutputSink::Rtsp),
            "file" => Ok(OutputSink::File),
            other => Err(format!(
                "unknown output '{}' (expected udp, rtsp or file)",
                other
            )),
        }
    }
}

/// Frame size and rate requested from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            width: 640,
            height: 480,
            framerate: 30,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} / {}", self.width, self.height, self.framerate)
    }
}

/// Output parameters as configured, possibly incomplete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSettings {
    pub sink: Option<OutputSink>,
    pub destination: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    camera_device: DeviceNode,
    stream_format: StreamFormat,
    pixel_format: PixelFormat,
    encoder: Encoder,
    geometry: Geometry,
    brightness: Option<i32>,
    output_sink: OutputSink,
    output_destination: String,
    output_port: Option<u16>,
}

impl PipelineConfig {
    /// Assemble a pipeline from the selection results.
    ///
    /// Performs no I/O.
    ///
    /// # Errors
    ///
    /// [`Error::PipelineConstruction`] if the output sink, its destination or
    /// (for network sinks) its port is missing, or the geometry is zero.
    pub fn build(
        camera_device: DeviceNode,
        selection: FormatSelection,
        geometry: Geometry,
        brightness: Option<i32>,
        output: &OutputSettings,
    ) -> Result<Self, Error> {
        let output_sink = output
            .sink
            .ok_or_else(|| Error::PipelineConstruction("no output sink configured".into()))?;

        let output_destination = output
            .destination
            .clone()
            .filter(|dest| !dest.is_empty())
            .ok_or_else(|| {
                Error::PipelineConstruction(format!(
                    "output_dest is required for {} output",
                    output_sink
                ))
            })?;

        if output_sink.needs_port() && output.port.is_none() {
            return Err(Error::PipelineConstruction(format!(
                "output_port is required for {} output",
                output_sink
            )));
        }

        if geometry.width == 0 || geometry.height == 0 || geometry.framerate == 0 {
            return Err(Error::PipelineConstruction(format!(
                "invalid geometry {}",
                geometry
            )));
        }

        Ok(PipelineConfig {
            camera_device,
            stream_format: selection.stream_format,
            pixel_format: selection.pixel_format,
            encoder: selection.encoder,
            geometry,
            brightness,
            output_sink,
            output_destination,
            output_port: output.port,
        })
    }

    pub fn camera_device(&self) -> &DeviceNode {
        &self.camera_device
    }

    pub fn stream_format(&self) -> StreamFormat {
        self.stream_format
    }

    pub fn pixel_format(&self) -> &PixelFormat {
        &self.pixel_format
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn brightness(&self) -> Option<i32> {
        self.brightness
    }

    pub fn output_sink(&self) -> OutputSink {
        self.output_sink
    }

    pub fn output_destination(&self) -> &str {
        &self.output_destination
    }

    pub fn output_port(&self) -> Option<u16> {
        self.output_port
    }

    /// Render the GStreamer launch description.
    ///
    /// Raw and MJPEG streams are encoded with the configured encoder, H.264
    /// streams are passed through untouched.
    pub fn launch_description(&self) -> String {
        let mut stages = Vec::new();

        let device = quoted(&self.camera_device.to_string());
        let mut source = format!("v4l2src device={}", device);
        if let Some(brightness) = self.brightness {
            source.push_str(&format!(" extra-controls=\"c,brightness={}\"", brightness));
        }
        stages.push(source);

        let Geometry {
            width,
            height,
            framerate,
        } = self.geometry;
        let size = format!("width={},height={},framerate={}/1", width, height, framerate);

        match self.stream_format {
            StreamFormat::Yuv => {
                stages.push(format!("video/x-raw,format={},{}", self.pixel_format, size));
                stages.push("videoconvert".to_string());
                stages.push(encoder_element(&self.encoder));
            }
            StreamFormat::Mjpeg => {
                stages.push(format!("image/jpeg,{}", size));
                stages.push("jpegdec".to_string());
                stages.push("videoconvert".to_string());
                stages.push(encoder_element(&self.encoder));
            }
            StreamFormat::H264 => {
                stages.push(format!("video/x-h264,{}", size));
            }
        }
        stages.push("h264parse".to_string());

        let port = self.output_port.unwrap_or_default();
        match self.output_sink {
            OutputSink::Udp => {
                stages.push("rtph264pay config-interval=1 pt=96".to_string());
                stages.push(format!(
                    "udpsink host={} port={} sync=false",
                    quoted(&self.output_destination),
                    port
                ));
            }
            OutputSink::Rtsp => {
                stages.push(format!(
                    "rtspclientsink location={}",
                    quoted(&format!("rtsp://{}:{}/video", self.output_destination, port))
                ));
            }
            OutputSink::File => {
                stages.push("matroskamux".to_string());
                stages.push(format!("filesink location={}", quoted(&self.output_destination)));
            }
        }

        stages.join(" ! ")
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "camera:{}, stream:{}, pixelformat:{}, encoder:{}, size:({}), output:{}",
            self.camera_device,
            self.stream_format,
            self.pixel_format,
            self.encoder,
            self.geometry,
            self.output_sink
        )?;
        if let Some(brightness) = self.brightness {
            write!(f, ", brightness:{}", brightness)?;
        }
        Ok(())
    }
}

/// Quote a property value for a launch description.
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// GStreamer element for an encoder identifier.
///
/// Known identifiers match in any letter case; unknown identifiers are used
/// verbatim as the element name.
pub fn encoder_element(encoder: &Encoder) -> String {
    match encoder.as_str().to_ascii_lowercase().as_str() {
        "h264" | "x264" => "x264enc tune=zerolatency speed-preset=ultrafast".to_string(),
        "omx" => "omxh264enc".to_string(),
        "v4l2" | "mfc" => "v4l2h264enc".to_string(),
        "vaapi" => "vaapih264enc".to_string(),
        "nvenc" => "nvh264enc".to_string(),
        _ => encoder.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(stream_format: StreamFormat) -> FormatSelection {
        FormatSelection {
            stream_format,
            pixel_format: PixelFormat::Yuy2,
            encoder: Encoder::default(),
        }
    }

    fn udp() -> OutputSettings {
        OutputSettings {
            sink: Some(OutputSink::Udp),
            destination: Some("10.0.0.2".into()),
            port: Some(5600),
        }
    }

    #[test]
    fn test_missing_sink() {
        let err = PipelineConfig::build(
            "/dev/video0".into(),
            selection(StreamFormat::Yuv),
            Geometry::default(),
            None,
            &OutputSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PipelineConstruction(_)));
    }

    #[test]
    fn test_network_sink_needs_port() {
        let output = OutputSettings {
            port: None,
            ..udp()
        };
        let err = PipelineConfig::build(
            "/dev/video0".into(),
            selection(StreamFormat::Yuv),
            Geometry::default(),
            None,
            &output,
        )
        .unwrap_err();
        assert!(err.to_string().contains("output_port"));

        let file = OutputSettings {
            sink: Some(OutputSink::File),
            destination: Some("/srv/video/out.mkv".into()),
            port: None,
        };
        assert!(PipelineConfig::build(
            "/dev/video0".into(),
            selection(StreamFormat::Yuv),
            Geometry::default(),
            None,
            &file,
        )
        .is_ok());
    }

    #[test]
    fn test_yuv_udp_description() {
        let config = PipelineConfig::build(
            "/dev/video0".into(),
            selection(StreamFormat::Yuv),
            Geometry::default(),
            Some(10),
            &udp(),
        )
        .unwrap();
        assert_eq!(
            config.launch_description(),
            "v4l2src device=\"/dev/video0\" extra-controls=\"c,brightness=10\" \
             ! video/x-raw,format=YUY2,width=640,height=480,framerate=30/1 \
             ! videoconvert \
             ! x264enc tune=zerolatency speed-preset=ultrafast \
             ! h264parse \
             ! rtph264pay config-interval=1 pt=96 \
             ! udpsink host=\"10.0.0.2\" port=5600 sync=false"
        );
    }

    #[test]
    fn test_h264_passthrough_has_no_encoder() {
        let config = PipelineConfig::build(
            "/dev/video1".into(),
            selection(StreamFormat::H264),
            Geometry {
                width: 1920,
                height: 1080,
                framerate: 30,
            },
            None,
            &OutputSettings {
                sink: Some(OutputSink::Rtsp),
                destination: Some("127.0.0.1".into()),
                port: Some(8554),
            },
        )
        .unwrap();
        let desc = config.launch_description();
        assert!(desc.contains("video/x-h264,width=1920,height=1080,framerate=30/1"));
        assert!(!desc.contains("x264enc"));
        assert!(desc.ends_with("rtspclientsink location=\"rtsp://127.0.0.1:8554/video\""));
    }

    #[test]
    fn test_values_with_spaces_are_quoted() {
        let output = OutputSettings {
            sink: Some(OutputSink::File),
            destination: Some("/srv/my \"clips\"/out.mkv".into()),
            port: None,
        };
        let config = PipelineConfig::build(
            "/dev/v4l/by-id/usb-HD Webcam-video-index0".into(),
            selection(StreamFormat::H264),
            Geometry::default(),
            None,
            &output,
        )
        .unwrap();
        let desc = config.launch_description();
        assert!(desc.starts_with(
            "v4l2src device=\"/dev/v4l/by-id/usb-HD Webcam-video-index0\" ! video/x-h264"
        ));
        assert!(desc.ends_with("filesink location=\"/srv/my \\\"clips\\\"/out.mkv\""));
    }

    #[test]
    fn test_mjpeg_is_decoded() {
        let mut sel = selection(StreamFormat::Mjpeg);
        sel.encoder = Encoder::from("omx");
        let config =
            PipelineConfig::build("/dev/video0".into(), sel, Geometry::default(), None, &udp())
                .unwrap();
        assert!(config
            .launch_description()
            .contains("image/jpeg,width=640,height=480,framerate=30/1 ! jpegdec ! videoconvert ! omxh264enc"));
    }

    #[test]
    fn test_encoder_element() {
        assert_eq!(encoder_element(&Encoder::from("mfc")), "v4l2h264enc");
        assert_eq!(encoder_element(&Encoder::from("openh264enc")), "openh264enc");
        assert_eq!(encoder_element(&Encoder::from("OMX")), "omxh264enc");
    }

    #[test]
    fn test_output_sink_parsing() {
        assert_eq!("UDP".parse::<OutputSink>().unwrap(), OutputSink::Udp);
        assert!("wbc".parse::<OutputSink>().is_err());
    }
}
