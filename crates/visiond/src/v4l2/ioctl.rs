// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Kernel-backed [`CapabilityQuery`] using raw V4L2 ioctls.

use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use log::trace;

use super::device::{
    CardIdentity, ControlDescriptor, DeviceNode, FormatDescriptor, InputDescriptor, InputType,
};
use super::query::{CapabilityQuery, QueryError, RequestKind};
use crate::fourcc::FourCC;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 3=READ|WRITE

/// v4l2_capability: 104 bytes
const VIDIOC_QUERYCAP: libc::c_ulong = 0x8068_5600;
/// v4l2_fmtdesc: 64 bytes
const VIDIOC_ENUM_FMT: libc::c_ulong = 0xC040_5602;
/// v4l2_input: 80 bytes
const VIDIOC_ENUMINPUT: libc::c_ulong = 0xC050_561A;
/// v4l2_queryctrl: 68 bytes
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC044_5624;

const V4L2_BUF_TYPE_VIDEO_CAPTURE: u32 = 1;

// ===== V4L2 ioctl Structures =====

#[repr(C)]
#[allow(dead_code)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

#[repr(C)]
#[allow(dead_code)]
struct V4l2Input {
    index: u32,
    name: [u8; 32],
    input_type: u32,
    audioset: u32,
    tuner: u32,
    std: u64,
    status: u32,
    capabilities: u32,
    reserved: [u32; 3],
}

#[repr(C)]
#[allow(dead_code)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

#[repr(C)]
#[allow(dead_code)]
struct V4l2Fmtdesc {
    index: u32,
    buf_type: u32,
    flags: u32,
    description: [u8; 32],
    pixelformat: u32,
    mbus_code: u32,
    reserved: [u32; 3],
}

/// Extract a null-terminated string from a fixed-size byte array
fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// Issue one ioctl, mapping a negative return to the current errno.
///
/// # Safety
/// `request` must be an ioctl whose argument type is `T`.
unsafe fn ioctl<T>(file: &File, request: libc::c_ulong, arg: &mut T) -> Result<(), QueryError> {
    let result = unsafe { libc::ioctl(file.as_raw_fd(), request as _, arg as *mut T) };
    if result < 0 {
        Err(io::Error::last_os_error().into())
    } else {
        Ok(())
    }
}

/// Capability queries against real `/dev/video*` nodes.
///
/// The node of the last request stays open so a probe walking hundreds of
/// control ids opens the device once. It is closed by
/// [`release`](CapabilityQuery::release), by a request for another node, or
/// when the backend is dropped.
#[derive(Debug)]
pub struct V4l2Query {
    dev_dir: PathBuf,
    open: RefCell<Option<(DeviceNode, File)>>,
}

impl Default for V4l2Query {
    fn default() -> Self {
        V4l2Query::new()
    }
}

impl V4l2Query {
    /// Query backend scanning `/dev`
    pub fn new() -> Self {
        V4l2Query::with_dev_dir("/dev")
    }

    /// Query backend scanning a different directory for `video*` nodes
    pub fn with_dev_dir(dev_dir: impl Into<PathBuf>) -> Self {
        V4l2Query {
            dev_dir: dev_dir.into(),
            open: RefCell::new(None),
        }
    }

    fn request<T>(
        &self,
        node: &DeviceNode,
        kind: RequestKind,
        arg: &mut T,
    ) -> Result<(), QueryError> {
        let request = match kind {
            RequestKind::QueryCapability => VIDIOC_QUERYCAP,
            RequestKind::EnumerateInput => VIDIOC_ENUMINPUT,
            RequestKind::EnumerateControl => VIDIOC_QUERYCTRL,
            RequestKind::EnumerateFormat => VIDIOC_ENUM_FMT,
        };

        let mut open = self.open.borrow_mut();
        if !matches!(&*open, Some((current, _)) if current == node) {
            *open = None;
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(node.path())
                .map_err(QueryError::Io)?;
            trace!("Opened {}", node);
            *open = Some((node.clone(), file));
        }

        let file = open
            .as_ref()
            .map(|(_, file)| file)
            .ok_or_else(|| QueryError::Io(io::Error::from(io::ErrorKind::NotFound)))?;
        let result = unsafe { ioctl(file, request, arg) };
        if let Err(err) = &result {
            trace!("{} on {} failed: {}", kind, node, err);
        }
        result
    }

    #[cfg(test)]
    fn open_node(&self) -> Option<DeviceNode> {
        self.open.borrow().as_ref().map(|(node, _)| node.clone())
    }
}

impl CapabilityQuery for V4l2Query {
    fn device_nodes(&self) -> io::Result<Vec<DeviceNode>> {
        let mut nodes = Vec::new();
        for entry in fs::read_dir(&self.dev_dir)?.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with("video") {
                nodes.push(DeviceNode::new(entry.path()));
            }
        }
        nodes.sort();
        Ok(nodes)
    }

    fn release(&self) {
        self.open.borrow_mut().take();
    }

    fn query_capability(&self, node: &DeviceNode) -> Result<CardIdentity, QueryError> {
        let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
        self.request(node, RequestKind::QueryCapability, &mut cap)?;
        Ok(CardIdentity {
            driver: c_string(&cap.driver),
            card: c_string(&cap.card),
            bus_info: c_string(&cap.bus_info),
        })
    }

    fn enumerate_input(
        &self,
        node: &DeviceNode,
        index: u32,
    ) -> Result<InputDescriptor, QueryError> {
        let mut input: V4l2Input = unsafe { std::mem::zeroed() };
        input.index = index;
        self.request(node, RequestKind::EnumerateInput, &mut input)?;
        Ok(InputDescriptor {
            index: input.index,
            name: c_string(&input.name),
            input_type: InputType::from_raw(input.input_type),
        })
    }

    fn enumerate_control(
        &self,
        node: &DeviceNode,
        id: u32,
    ) -> Result<ControlDescriptor, QueryError> {
        let mut qctrl: V4l2Queryctrl = unsafe { std::mem::zeroed() };
        qctrl.id = id;
        self.request(node, RequestKind::EnumerateControl, &mut qctrl)?;
        Ok(ControlDescriptor {
            id: qctrl.id,
            name: c_string(&qctrl.name),
            minimum: qctrl.minimum,
            maximum: qctrl.maximum,
            default_value: qctrl.default_value,
        })
    }

    fn enumerate_format(
        &self,
        node: &DeviceNode,
        index: u32,
    ) -> Result<FormatDescriptor, QueryError> {
        let mut fmt: V4l2Fmtdesc = unsafe { std::mem::zeroed() };
        fmt.index = index;
        fmt.buf_type = V4L2_BUF_TYPE_VIDEO_CAPTURE;
        self.request(node, RequestKind::EnumerateFormat, &mut fmt)?;
        Ok(FormatDescriptor {
            index: fmt.index,
            description: c_string(&fmt.description),
            fourcc: FourCC::from_u32(fmt.pixelformat),
        })
    }
}
