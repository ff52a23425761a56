// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Per-device capability probing.

use log::debug;

use super::device::{
    CardIdentity, ControlDescriptor, DeviceCapability, DeviceNode, FormatDescriptor,
    InputDescriptor,
};
use super::query::{CapabilityQuery, QueryError, V4L2_CID_BASE, V4L2_CID_LASTP1, V4L2_CID_PRIVATE_BASE};

/// Upper bound on private controls, inputs and formats walked per device.
const MAX_ENUMERATION: u32 = 256;

/// Capability probe for single device nodes.
///
/// Query failures never escape the probe: a failed input query means "not a
/// camera", a failed enumeration ends that enumeration.
pub struct DeviceProbe<'q, Q: ?Sized> {
    query: &'q Q,
}

impl<'q, Q: CapabilityQuery + ?Sized> DeviceProbe<'q, Q> {
    pub fn new(query: &'q Q) -> Self {
        DeviceProbe { query }
    }

    /// Whether input 0 of `node` is a camera input.
    ///
    /// Any query error, including the device having no inputs, yields false.
    pub fn is_camera(&self, node: &DeviceNode) -> bool {
        let camera = match self.query.enumerate_input(node, 0) {
            Ok(input) => {
                debug!(
                    "V4L2 device input {}: {}:{}",
                    node, input.name, input.input_type
                );
                input.is_camera()
            }
            Err(e) => {
                debug!("Error checking input of {}: {}", node, e);
                false
            }
        };
        self.query.release();
        camera
    }

    /// Capture a full capability snapshot of `node`.
    ///
    /// Controls and formats are enumerated whether or not the device has a
    /// camera input.
    pub fn capability(&self, node: &DeviceNode) -> DeviceCapability {
        let identity = self.identity(node);
        let inputs = self.inputs(node);
        let capability = self.describe(node, identity, inputs);
        self.query.release();
        capability
    }

    /// Capture a capability snapshot of `node` if it has a camera input.
    ///
    /// Inputs are checked first; a device without a camera input returns
    /// `None` before any control or format is queried.
    pub fn camera_capability(&self, node: &DeviceNode) -> Option<DeviceCapability> {
        let identity = self.identity(node);
        let inputs = self.inputs(node);

        let capability = if inputs.iter().any(InputDescriptor::is_camera) {
            Some(self.describe(node, identity, inputs))
        } else {
            debug!("{} has no camera input", node);
            None
        };
        self.query.release();
        capability
    }

    fn identity(&self, node: &DeviceNode) -> CardIdentity {
        let identity = match self.query.query_capability(node) {
            Ok(identity) => identity,
            Err(e) => {
                debug!("Unable to query capabilities of {}: {}", node, e);
                Default::default()
            }
        };
        debug!("driver: {}", identity.driver);
        debug!("card: {}", identity.card);
        identity
    }

    fn describe(
        &self,
        node: &DeviceNode,
        identity: CardIdentity,
        inputs: Vec<InputDescriptor>,
    ) -> DeviceCapability {
        let controls = self.controls(node);
        let formats = self.formats(node);
        DeviceCapability::new(identity, inputs, formats, controls)
    }

    fn inputs(&self, node: &DeviceNode) -> Vec<InputDescriptor> {
        let mut inputs = Vec::new();
        for index in 0..MAX_ENUMERATION {
            match self.query.enumerate_input(node, index) {
                Ok(input) => {
                    debug!("Camera input: {} ({})", input.name, input.input_type);
                    inputs.push(input);
                }
                Err(_) => break,
            }
        }
        inputs
    }

    fn controls(&self, node: &DeviceNode) -> Vec<ControlDescriptor> {
        let mut controls = Vec::new();

        // Standard controls: unsupported ids are skipped, not terminal.
        for id in V4L2_CID_BASE..V4L2_CID_LASTP1 {
            match self.query.enumerate_control(node, id) {
                Ok(control) => {
                    debug!("Camera control: {}", control.name);
                    controls.push(control);
                }
                Err(QueryError::Invalid) => continue,
                Err(e) => {
                    debug!("Control enumeration of {} aborted: {}", node, e);
                    break;
                }
            }
        }

        // Driver-private controls end at the first unsupported id.
        for id in V4L2_CID_PRIVATE_BASE..V4L2_CID_PRIVATE_BASE + MAX_ENUMERATION {
            match self.query.enumerate_control(node, id) {
                Ok(control) => {
                    debug!("Camera control: {}", control.name);
                    controls.push(control);
                }
                Err(QueryError::Invalid) => break,
                Err(e) => {
                    debug!("Private control enumeration of {} aborted: {}", node, e);
                    break;
                }
            }
        }

        controls
    }

    fn formats(&self, node: &DeviceNode) -> Vec<FormatDescriptor> {
        let mut formats = Vec::new();
        for index in 0..MAX_ENUMERATION {
            match self.query.enumerate_format(node, index) {
                Ok(format) => {
                    debug!("Camera format: {}", format);
                    formats.push(format);
                }
                Err(_) => break,
            }
        }
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v4l2::{InputType, V4L2_INPUT_TYPE_CAMERA};
    use std::cell::Cell;
    use std::io;

    /// Answers controls from a fixed id list; everything else is EINVAL.
    struct ControlQuery {
        supported: Vec<u32>,
        hard_error_at: Option<u32>,
        camera: bool,
        private_calls: Cell<u32>,
        format_calls: Cell<u32>,
        releases: Cell<u32>,
    }

    impl ControlQuery {
        fn new(supported: Vec<u32>) -> Self {
            ControlQuery {
                supported,
                hard_error_at: None,
                camera: true,
                private_calls: Cell::new(0),
                format_calls: Cell::new(0),
                releases: Cell::new(0),
            }
        }
    }

    impl CapabilityQuery for ControlQuery {
        fn device_nodes(&self) -> io::Result<Vec<DeviceNode>> {
            Ok(vec![DeviceNode::from("/dev/video0")])
        }

        fn query_capability(&self, _node: &DeviceNode) -> Result<CardIdentity, QueryError> {
            Err(QueryError::Io(io::Error::from(io::ErrorKind::PermissionDenied)))
        }

        fn enumerate_input(
            &self,
            _node: &DeviceNode,
            index: u32,
        ) -> Result<InputDescriptor, QueryError> {
            let input_type = if self.camera {
                InputType::from_raw(V4L2_INPUT_TYPE_CAMERA)
            } else {
                InputType::Other(1)
            };
            match index {
                0 => Ok(InputDescriptor {
                    index,
                    name: "Camera 1".into(),
                    input_type,
                }),
                _ => Err(QueryError::Invalid),
            }
        }

        fn enumerate_control(
            &self,
            _node: &DeviceNode,
            id: u32,
        ) -> Result<ControlDescriptor, QueryError> {
            if id >= V4L2_CID_PRIVATE_BASE {
                self.private_calls.set(self.private_calls.get() + 1);
            }
            if self.hard_error_at == Some(id) {
                return Err(QueryError::Io(io::Error::from(io::ErrorKind::Other)));
            }
            if self.supported.contains(&id) {
                Ok(ControlDescriptor::new(id, format!("ctrl {:#x}", id)))
            } else {
                Err(QueryError::Invalid)
            }
        }

        fn enumerate_format(
            &self,
            _node: &DeviceNode,
            index: u32,
        ) -> Result<FormatDescriptor, QueryError> {
            self.format_calls.set(self.format_calls.get() + 1);
            match index {
                0 => Ok(FormatDescriptor::new(0, "YUYV 4:2:2")),
                _ => Err(QueryError::Invalid),
            }
        }

        fn release(&self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn control_ids(query: &ControlQuery) -> Vec<u32> {
        DeviceProbe::new(query)
            .capability(&DeviceNode::from("/dev/video0"))
            .controls()
            .iter()
            .map(|c| c.id)
            .collect()
    }

    #[test]
    fn test_standard_controls_skip_unsupported() {
        let query = ControlQuery::new(vec![V4L2_CID_BASE, V4L2_CID_BASE + 2, V4L2_CID_BASE + 9]);
        assert_eq!(
            control_ids(&query),
            [V4L2_CID_BASE, V4L2_CID_BASE + 2, V4L2_CID_BASE + 9]
        );
    }

    #[test]
    fn test_private_controls_stop_at_first_gap() {
        let query = ControlQuery::new(vec![
            V4L2_CID_PRIVATE_BASE,
            V4L2_CID_PRIVATE_BASE + 1,
            V4L2_CID_PRIVATE_BASE + 3,
        ]);
        assert_eq!(
            control_ids(&query),
            [V4L2_CID_PRIVATE_BASE, V4L2_CID_PRIVATE_BASE + 1]
        );
        assert_eq!(query.private_calls.get(), 3);
    }

    #[test]
    fn test_private_controls_capped() {
        let query = ControlQuery::new((0..1000).map(|i| V4L2_CID_PRIVATE_BASE + i).collect());
        assert_eq!(control_ids(&query).len(), MAX_ENUMERATION as usize);
    }

    #[test]
    fn test_hard_error_ends_standard_walk() {
        let mut query = ControlQuery::new(vec![V4L2_CID_BASE, V4L2_CID_BASE + 5]);
        query.hard_error_at = Some(V4L2_CID_BASE + 1);
        assert_eq!(control_ids(&query), [V4L2_CID_BASE]);
    }

    #[test]
    fn test_identity_failure_is_absorbed() {
        let query = ControlQuery::new(Vec::new());
        let capability = DeviceProbe::new(&query).capability(&DeviceNode::from("/dev/video0"));
        assert_eq!(capability.driver(), "");
        assert!(capability.is_camera());
        assert_eq!(capability.formats().len(), 1);
    }

    #[test]
    fn test_camera_capability_checks_inputs_first() {
        let mut query = ControlQuery::new(vec![V4L2_CID_BASE]);
        query.camera = false;
        let node = DeviceNode::from("/dev/video0");

        assert!(DeviceProbe::new(&query).camera_capability(&node).is_none());
        assert_eq!(query.format_calls.get(), 0);
        assert_eq!(query.private_calls.get(), 0);
        assert_eq!(query.releases.get(), 1);

        // The full dump still lists formats of non-camera devices.
        let capability = DeviceProbe::new(&query).capability(&node);
        assert!(!capability.is_camera());
        assert_eq!(capability.formats().len(), 1);
    }

    #[test]
    fn test_camera_capability_of_camera() {
        let query = ControlQuery::new(vec![V4L2_CID_BASE]);
        let capability = DeviceProbe::new(&query)
            .camera_capability(&DeviceNode::from("/dev/video0"))
            .unwrap();
        assert_eq!(capability.controls().len(), 1);
        assert_eq!(capability.formats().len(), 1);
        assert!(query.format_calls.get() > 0);
    }
}
