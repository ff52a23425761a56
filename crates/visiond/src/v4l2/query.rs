// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Device capability query boundary
//!
//! [`CapabilityQuery`] is the only way the decision engine talks to devices.
//! Each request maps onto one V4L2 ioctl. Replies distinguish the kernel's
//! "invalid argument" answer ([`QueryError::Invalid`]), which ends an
//! enumeration, from hard failures ([`QueryError::Io`]).

use std::{error, fmt, io};

use super::device::{CardIdentity, ControlDescriptor, DeviceNode, FormatDescriptor, InputDescriptor};

/// First id of the standard user control class (`V4L2_CID_BASE`).
pub const V4L2_CID_BASE: u32 = 0x0098_0900;
/// One past the last standard user control (`V4L2_CID_LASTP1`).
pub const V4L2_CID_LASTP1: u32 = V4L2_CID_BASE + 44;
/// First driver-private control id (`V4L2_CID_PRIVATE_BASE`).
pub const V4L2_CID_PRIVATE_BASE: u32 = 0x0800_0000;

/// Kind of capability request, used for ioctl dispatch and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    QueryCapability,
    EnumerateInput,
    EnumerateControl,
    EnumerateFormat,
}

impl RequestKind {
    /// Kernel ioctl name for this request
    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::QueryCapability => "VIDIOC_QUERYCAP",
            RequestKind::EnumerateInput => "VIDIOC_ENUMINPUT",
            RequestKind::EnumerateControl => "VIDIOC_QUERYCTRL",
            RequestKind::EnumerateFormat => "VIDIOC_ENUM_FMT",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-success reply to a capability request.
#[derive(Debug)]
pub enum QueryError {
    /// The id or index is not supported (`EINVAL`). Ends an enumeration.
    Invalid,
    /// The device could not be opened or the request failed otherwise.
    Io(io::Error),
}

impl QueryError {
    pub fn is_invalid(&self) -> bool {
        matches!(self, QueryError::Invalid)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Invalid => write!(f, "invalid or unsupported request"),
            QueryError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl error::Error for QueryError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            QueryError::Invalid => None,
            QueryError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for QueryError {
    fn from(err: io::Error) -> Self {
        if err.raw_os_error() == Some(libc::EINVAL) {
            QueryError::Invalid
        } else {
            QueryError::Io(err)
        }
    }
}

/// Capability query backend.
///
/// Production code uses [`V4l2Query`](super::V4l2Query); tests substitute a
/// deterministic fake. Every call is a single synchronous request. A backend
/// may keep the last node open between requests until [`release`] is called.
///
/// [`release`]: CapabilityQuery::release
pub trait CapabilityQuery {
    /// List candidate device nodes (`/dev/video*`). Order is not significant.
    fn device_nodes(&self) -> io::Result<Vec<DeviceNode>>;

    /// `VIDIOC_QUERYCAP`
    fn query_capability(&self, node: &DeviceNode) -> Result<CardIdentity, QueryError>;

    /// `VIDIOC_ENUMINPUT` for one input index
    fn enumerate_input(&self, node: &DeviceNode, index: u32)
        -> Result<InputDescriptor, QueryError>;

    /// `VIDIOC_QUERYCTRL` for one control id
    fn enumerate_control(&self, node: &DeviceNode, id: u32)
        -> Result<ControlDescriptor, QueryError>;

    /// `VIDIOC_ENUM_FMT` (capture queue) for one format index
    fn enumerate_format(&self, node: &DeviceNode, index: u32)
        -> Result<FormatDescriptor, QueryError>;

    /// Close anything kept open by earlier requests.
    fn release(&self) {}
}

impl<Q: CapabilityQuery + ?Sized> CapabilityQuery for &Q {
    fn device_nodes(&self) -> io::Result<Vec<DeviceNode>> {
        (**self).device_nodes()
    }

    fn query_capability(&self, node: &DeviceNode) -> Result<CardIdentity, QueryError> {
        (**self).query_capability(node)
    }

    fn enumerate_input(
        &self,
        node: &DeviceNode,
        index: u32,
    ) -> Result<InputDescriptor, QueryError> {
        (**self).enumerate_input(node, index)
    }

    fn enumerate_control(
        &self,
        node: &DeviceNode,
        id: u32,
    ) -> Result<ControlDescriptor, QueryError> {
        (**self).enumerate_control(node, id)
    }

    fn enumerate_format(
        &self,
        node: &DeviceNode,
        index: u32,
    ) -> Result<FormatDescriptor, QueryError> {
        (**self).enumerate_format(node, index)
    }

    fn release(&self) {
        (**self).release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_einval_is_invalid() {
        let err: QueryError = io::Error::from_raw_os_error(libc::EINVAL).into();
        assert!(err.is_invalid());

        let err: QueryError = io::Error::from_raw_os_error(libc::EBUSY).into();
        assert!(!err.is_invalid());
    }

    #[test]
    fn test_control_ranges() {
        assert_eq!(V4L2_CID_LASTP1 - V4L2_CID_BASE, 44);
        assert!(V4L2_CID_PRIVATE_BASE > V4L2_CID_LASTP1);
    }

    #[test]
    fn test_request_kind_name() {
        assert_eq!(RequestKind::EnumerateFormat.to_string(), "VIDIOC_ENUM_FMT");
    }
}
