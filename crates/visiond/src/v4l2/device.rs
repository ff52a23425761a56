// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! V4L2 device types
//!
//! This module defines the values produced by capability probing:
//!
//! - [`DeviceNode`] - Path of one `/dev/video*` node
//! - [`CardIdentity`] - Driver and card strings from `VIDIOC_QUERYCAP`
//! - [`InputDescriptor`] - One entry of `VIDIOC_ENUMINPUT`
//! - [`FormatDescriptor`] - One entry of `VIDIOC_ENUM_FMT`
//! - [`ControlDescriptor`] - One entry of `VIDIOC_QUERYCTRL`
//! - [`DeviceCapability`] - Immutable snapshot combining all of the above

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fourcc::FourCC;

/// Kernel value of `V4L2_INPUT_TYPE_CAMERA`.
pub const V4L2_INPUT_TYPE_CAMERA: u32 = 2;

/// Path of a V4L2 device node (e.g. `/dev/video0`).
///
/// Nodes are re-enumerated on every construction attempt and never cached.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceNode(PathBuf);

impl DeviceNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DeviceNode(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Device path as string, empty if the path is not valid UTF-8.
    pub fn path_str(&self) -> &str {
        self.0.to_str().unwrap_or("")
    }
}

impl fmt::Display for DeviceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for DeviceNode {
    fn from(path: &str) -> Self {
        DeviceNode::new(path)
    }
}

impl From<String> for DeviceNode {
    fn from(path: String) -> Self {
        DeviceNode::new(path)
    }
}

/// Driver identity reported by `VIDIOC_QUERYCAP`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardIdentity {
    /// Kernel driver name (e.g. "uvcvideo", "bm2835 mmal")
    pub driver: String,
    /// Card name (e.g. "HD Pro Webcam C920", "s5p-mfc-enc")
    pub card: String,
    /// Bus information (e.g. "usb-0000:01:00.0-1.3")
    pub bus_info: String,
}

/// Input type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputType {
    /// `V4L2_INPUT_TYPE_CAMERA`
    Camera,
    /// Tuner, touch or any other input type, with the raw kernel value
    Other(u32),
}

impl InputType {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            V4L2_INPUT_TYPE_CAMERA => InputType::Camera,
            other => InputType::Other(other),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputType::Camera => write!(f, "camera"),
            InputType::Other(raw) => write!(f, "other({})", raw),
        }
    }
}

/// One video input of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDescriptor {
    pub index: u32,
    pub name: String,
    pub input_type: InputType,
}

impl InputDescriptor {
    pub fn is_camera(&self) -> bool {
        self.input_type == InputType::Camera
    }
}

/// One capture format of a device.
///
/// Classification is done on `description`; the fourcc is informational
/// because many drivers report it inconsistently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub index: u32,
    pub description: String,
    pub fourcc: FourCC,
}

impl FormatDescriptor {
    pub fn new(index: u32, description: impl Into<String>) -> Self {
        FormatDescriptor {
            index,
            description: description.into(),
            fourcc: FourCC::default(),
        }
    }
}

impl fmt::Display for FormatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fourcc.is_empty() {
            write!(f, "{}", self.description)
        } else {
            write!(f, "{} ({})", self.description, self.fourcc)
        }
    }
}

/// One control of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlDescriptor {
    pub id: u32,
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub default_value: i32,
}

impl ControlDescriptor {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        ControlDescriptor {
            id,
            name: name.into(),
            minimum: 0,
            maximum: 0,
            default_value: 0,
        }
    }
}

/// Capability snapshot of one device.
///
/// Produced by [`DeviceProbe::capability`](super::DeviceProbe::capability)
/// and never modified afterwards. Sequence order is the order the device
/// reported, which format selection relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceCapability {
    identity: CardIdentity,
    inputs: Vec<InputDescriptor>,
    formats: Vec<FormatDescriptor>,
    controls: Vec<ControlDescriptor>,
}

impl DeviceCapability {
    pub fn new(
        identity: CardIdentity,
        inputs: Vec<InputDescriptor>,
        formats: Vec<FormatDescriptor>,
        controls: Vec<ControlDescriptor>,
    ) -> Self {
        DeviceCapability {
            identity,
            inputs,
            formats,
            controls,
        }
    }

    pub fn identity(&self) -> &CardIdentity {
        &self.identity
    }

    /// Driver name (e.g. "uvcvideo")
    pub fn driver(&self) -> &str {
        &self.identity.driver
    }

    /// Card name (e.g. "HD Pro Webcam C920")
    pub fn card(&self) -> &str {
        &self.identity.card
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        &self.inputs
    }

    /// Capture formats in device reporting order
    pub fn formats(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    pub fn controls(&self) -> &[ControlDescriptor] {
        &self.controls
    }

    /// A device is camera-capable if any of its inputs is a camera.
    pub fn is_camera(&self) -> bool {
        self.inputs.iter().any(InputDescriptor::is_camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_from_raw() {
        assert_eq!(InputType::from_raw(2), InputType::Camera);
        assert_eq!(InputType::from_raw(1), InputType::Other(1));
        assert_eq!(InputType::from_raw(3).to_string(), "other(3)");
    }

    #[test]
    fn test_capability_is_camera() {
        let tuner = InputDescriptor {
            index: 0,
            name: "Tuner".into(),
            input_type: InputType::Other(1),
        };
        let camera = InputDescriptor {
            index: 1,
            name: "Camera 1".into(),
            input_type: InputType::Camera,
        };

        let cap = DeviceCapability::new(CardIdentity::default(), vec![tuner.clone()], vec![], vec![]);
        assert!(!cap.is_camera());

        let cap = DeviceCapability::new(CardIdentity::default(), vec![tuner, camera], vec![], vec![]);
        assert!(cap.is_camera());
    }

    #[test]
    fn test_device_node_ordering() {
        let mut nodes = vec![
            DeviceNode::from("/dev/video2"),
            DeviceNode::from("/dev/video10"),
            DeviceNode::from("/dev/video0"),
        ];
        nodes.sort();
        let paths: Vec<&str> = nodes.iter().map(DeviceNode::path_str).collect();
        assert_eq!(paths, ["/dev/video0", "/dev/video10", "/dev/video2"]);
    }

    #[test]
    fn test_format_display() {
        let mut fmt = FormatDescriptor::new(0, "YUYV 4:2:2");
        assert_eq!(fmt.to_string(), "YUYV 4:2:2");
        fmt.fourcc = FourCC(*b"YUYV");
        assert_eq!(fmt.to_string(), "YUYV 4:2:2 (YUYV)");
    }
}
