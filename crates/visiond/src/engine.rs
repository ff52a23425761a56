// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Execution engine boundary
//!
//! The decision engine hands a launch description to an [`ExecutionEngine`]
//! and asks it to start playing. Capture, encoding and transport all happen
//! inside the engine. Every engine failure is reported as
//! [`Error::PipelineConstruction`] so the supervisor treats them alike.

use std::ffi::{CStr, CString};
use std::ptr::{self, NonNull};

use log::{debug, warn};
use visiond_sys as ffi;

use crate::Error;

/// Something that can build and start a pipeline from a launch description.
pub trait ExecutionEngine {
    /// Live pipeline; dropping it tears the pipeline down.
    type Handle;

    fn build_pipeline(&mut self, description: &str) -> Result<Self::Handle, Error>;

    fn set_playing(&mut self, handle: &Self::Handle) -> Result<(), Error>;
}

fn symbol<'a, T>(
    sym: &'a Result<T, ffi::libloading::Error>,
    name: &str,
) -> Result<&'a T, Error> {
    sym.as_ref()
        .map_err(|_| Error::PipelineConstruction(format!("GStreamer symbol not found: {}", name)))
}

/// GStreamer engine loaded at runtime through `visiond-sys`.
///
/// The library is loaded and `gst_init` called on the first pipeline build,
/// so constructing the engine never fails.
#[derive(Debug, Default)]
pub struct GstEngine {
    debug_level: Option<u32>,
    initialized: bool,
}

impl GstEngine {
    /// Create an engine; `debug_level` enables GStreamer debug output at
    /// that threshold.
    pub fn new(debug_level: Option<u32>) -> Self {
        GstEngine {
            debug_level,
            initialized: false,
        }
    }

    fn library(&mut self) -> Result<&'static ffi::GstLibrary, Error> {
        let lib = ffi::init().map_err(|e| {
            Error::PipelineConstruction(format!("GStreamer library could not be loaded: {}", e))
        })?;

        if !self.initialized {
            let gst_init = symbol(&lib.gst_init, "gst_init")?;
            unsafe { gst_init(ptr::null_mut(), ptr::null_mut()) };

            if let Some(level) = self.debug_level.filter(|&level| level > 0) {
                let set_active = symbol(&lib.gst_debug_set_active, "gst_debug_set_active")?;
                let set_threshold = symbol(
                    &lib.gst_debug_set_default_threshold,
                    "gst_debug_set_default_threshold",
                )?;
                unsafe {
                    set_active(1);
                    set_threshold(level);
                }
                debug!("GStreamer debug threshold set to {}", level);
            }

            self.initialized = true;
        }

        Ok(lib)
    }
}

impl ExecutionEngine for GstEngine {
    type Handle = GstPipeline;

    fn build_pipeline(&mut self, description: &str) -> Result<GstPipeline, Error> {
        let lib = self.library()?;
        let parse_launch = symbol(&lib.gst_parse_launch, "gst_parse_launch")?;
        let ref_sink = symbol(&lib.gst_object_ref_sink, "gst_object_ref_sink")?;

        let description = CString::new(description).map_err(|e| {
            Error::PipelineConstruction(format!("invalid pipeline description: {}", e))
        })?;

        let mut error: *mut ffi::GError = ptr::null_mut();
        let element = unsafe { parse_launch(description.as_ptr(), &mut error) };
        let message = unsafe { take_error(lib, error) };

        let element = match (NonNull::new(element), message) {
            (Some(element), None) => element,
            (Some(element), Some(message)) => {
                // Recoverable parse problem (e.g. unknown property): the
                // pipeline exists and may still play.
                warn!("Pipeline created with warnings: {}", message);
                element
            }
            (None, message) => {
                return Err(Error::PipelineConstruction(
                    message.unwrap_or_else(|| "gst_parse_launch returned no pipeline".into()),
                ))
            }
        };

        // gst_parse_launch hands out a floating reference; the handle owns it.
        unsafe { ref_sink(element.as_ptr().cast()) };
        Ok(GstPipeline { element })
    }

    fn set_playing(&mut self, handle: &GstPipeline) -> Result<(), Error> {
        let lib = self.library()?;
        let set_state = symbol(&lib.gst_element_set_state, "gst_element_set_state")?;

        let ret = unsafe { set_state(handle.element.as_ptr(), ffi::GstState_GST_STATE_PLAYING) };
        if ret == ffi::GstStateChangeReturn_GST_STATE_CHANGE_FAILURE {
            return Err(Error::PipelineConstruction(
                "unable to set the pipeline to the playing state".into(),
            ));
        }

        debug!("Pipeline state change to PLAYING returned {}", ret);
        Ok(())
    }
}

/// Extract and free a `GError`.
///
/// # Safety
/// `error` must be null or a `GError` owned by the caller.
unsafe fn take_error(lib: &ffi::GstLibrary, error: *mut ffi::GError) -> Option<String> {
    if error.is_null() {
        return None;
    }

    let message = unsafe {
        let msg = (*error).message;
        if msg.is_null() {
            String::from("unknown GStreamer error")
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    };

    if let Ok(free) = lib.g_error_free.as_ref() {
        unsafe { free(error) };
    }

    Some(message)
}

/// A parsed GStreamer pipeline.
///
/// Dropping the handle stops the pipeline and releases the element.
pub struct GstPipeline {
    element: NonNull<ffi::GstElement>,
}

impl GstPipeline {
    #[cfg(test)]
    fn is_floating(&self) -> bool {
        ffi::try_library()
            .and_then(|lib| lib.g_object_is_floating.as_ref().ok())
            .map(|is_floating| unsafe { is_floating(self.element.as_ptr().cast()) } != 0)
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for GstPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GstPipeline")
            .field("element", &self.element)
            .finish()
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        if let Some(lib) = ffi::try_library() {
            if let Ok(set_state) = lib.gst_element_set_state.as_ref() {
                unsafe { set_state(self.element.as_ptr(), ffi::GstState_GST_STATE_NULL) };
            }
            if let Ok(unref) = lib.gst_object_unref.as_ref() {
                unsafe { unref(self.element.as_ptr().cast()) };
            }
        }
    }
}
