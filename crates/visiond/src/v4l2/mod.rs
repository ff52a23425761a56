// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! V4L2 Device Discovery and Capability Probing
//!
//! This module finds the camera to stream from and captures what it can do,
//! using nothing but the four capability ioctls:
//!
//! | Request | ioctl | Used for |
//! |---------|-------|----------|
//! | Query capability | `VIDIOC_QUERYCAP` | Driver and card identity |
//! | Enumerate input | `VIDIOC_ENUMINPUT` | Camera classification |
//! | Enumerate control | `VIDIOC_QUERYCTRL` | Control dump |
//! | Enumerate format | `VIDIOC_ENUM_FMT` | Stream format selection |
//!
//! Query failures are absorbed here. A device that does not answer is simply
//! "not a camera" or "has no such format".
//!
//! # Quick Start
//!
//! ```no_run
//! use visiond::v4l2::{DeviceEnumerator, DeviceProbe, V4l2Query};
//!
//! let query = V4l2Query::new();
//! let camera = DeviceEnumerator::new(&query).select_camera(None)?;
//! let capability = DeviceProbe::new(&query).capability(&camera);
//! for format in capability.formats() {
//!     println!("{}: {}", camera, format);
//! }
//! # Ok::<(), visiond::Error>(())
//! ```

mod device;
mod enumerator;
mod ioctl;
mod probe;
mod query;

pub use device::{
    CardIdentity, ControlDescriptor, DeviceCapability, DeviceNode, FormatDescriptor,
    InputDescriptor, InputType, V4L2_INPUT_TYPE_CAMERA,
};
pub use enumerator::{DeviceEnumerator, HARDWARE_ENCODER_CARD};
pub use ioctl::V4l2Query;
pub use probe::DeviceProbe;
pub use query::{
    CapabilityQuery, QueryError, RequestKind, V4L2_CID_BASE, V4L2_CID_LASTP1,
    V4L2_CID_PRIVATE_BASE,
};
