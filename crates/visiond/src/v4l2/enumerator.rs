// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! V4L2 Device Enumerator
//!
//! Camera selection and the hardware encoder scan. Both walk the complete
//! set of device nodes independently and in lexicographic path order.

use log::{debug, info, warn};

use super::device::DeviceNode;
use super::probe::DeviceProbe;
use super::query::CapabilityQuery;
use crate::Error;

/// Card name of the Samsung Exynos MFC hardware encoder.
pub const HARDWARE_ENCODER_CARD: &str = "s5p-mfc-enc";

/// Device discovery over a [`CapabilityQuery`] backend.
///
/// # Example
///
/// ```no_run
/// use visiond::v4l2::{DeviceEnumerator, V4l2Query};
///
/// let query = V4l2Query::new();
/// let enumerator = DeviceEnumerator::new(&query);
/// let camera = enumerator.select_camera(None)?;
/// println!("Camera: {}", camera);
///
/// if let Some(mfc) = enumerator.find_hardware_encoder() {
///     println!("Hardware encoder: {}", mfc);
/// }
/// # Ok::<(), visiond::Error>(())
/// ```
pub struct DeviceEnumerator<'q, Q: ?Sized> {
    query: &'q Q,
}

impl<'q, Q: CapabilityQuery + ?Sized> DeviceEnumerator<'q, Q> {
    pub fn new(query: &'q Q) -> Self {
        DeviceEnumerator { query }
    }

    /// All candidate device nodes, sorted by path.
    ///
    /// A failing directory scan is logged and treated as "no devices".
    pub fn nodes(&self) -> Vec<DeviceNode> {
        match self.query.device_nodes() {
            Ok(mut nodes) => {
                nodes.sort();
                nodes
            }
            Err(e) => {
                warn!("Unable to enumerate video devices: {}", e);
                Vec::new()
            }
        }
    }

    /// Pick the camera device.
    ///
    /// A non-empty `device_override` is returned as-is without probing.
    /// Otherwise the first node whose input 0 is a camera wins; later nodes
    /// are not probed.
    ///
    /// # Errors
    ///
    /// [`Error::NoCameraFound`] when no node qualifies.
    pub fn select_camera(&self, device_override: Option<&str>) -> Result<DeviceNode, Error> {
        if let Some(path) = device_override.filter(|path| !path.is_empty()) {
            debug!("Using configured camera device {}", path);
            return Ok(DeviceNode::from(path));
        }

        let probe = DeviceProbe::new(self.query);
        for node in self.nodes() {
            if probe.is_camera(&node) {
                info!("v4l2 device {} is a camera, autoselecting", node);
                return Ok(node);
            }
            debug!("v4l2 device {} is not a camera, ignoring", node);
        }

        Err(Error::NoCameraFound)
    }

    /// Find the first node whose card name is exactly [`HARDWARE_ENCODER_CARD`].
    ///
    /// Detection is only logged; encoder selection does not consult it.
    pub fn find_hardware_encoder(&self) -> Option<DeviceNode> {
        let found = self.nodes().into_iter().find(|node| {
            match self.query.query_capability(node) {
                Ok(identity) => identity.card == HARDWARE_ENCODER_CARD,
                Err(e) => {
                    debug!("Unable to query capabilities of {}: {}", node, e);
                    false
                }
            }
        });
        self.query.release();

        if let Some(node) = &found {
            info!("MFC Hardware encoder detected, autoselecting {}", node);
        }
        found
    }
}
