// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

// Hand-maintained subset of the GStreamer 1.x core API, shaped like
// `bindgen --dynamic-loading` output so symbols resolve at runtime.

pub type gboolean = ::std::os::raw::c_int;
pub type gchar = ::std::os::raw::c_char;
pub type gint = ::std::os::raw::c_int;
pub type guint32 = u32;
pub type gpointer = *mut ::std::os::raw::c_void;
pub type GQuark = guint32;

pub type GstState = ::std::os::raw::c_uint;
pub const GstState_GST_STATE_VOID_PENDING: GstState = 0;
pub const GstState_GST_STATE_NULL: GstState = 1;
pub const GstState_GST_STATE_READY: GstState = 2;
pub const GstState_GST_STATE_PAUSED: GstState = 3;
pub const GstState_GST_STATE_PLAYING: GstState = 4;

pub type GstStateChangeReturn = ::std::os::raw::c_uint;
pub const GstStateChangeReturn_GST_STATE_CHANGE_FAILURE: GstStateChangeReturn = 0;
pub const GstStateChangeReturn_GST_STATE_CHANGE_SUCCESS: GstStateChangeReturn = 1;
pub const GstStateChangeReturn_GST_STATE_CHANGE_ASYNC: GstStateChangeReturn = 2;
pub const GstStateChangeReturn_GST_STATE_CHANGE_NO_PREROLL: GstStateChangeReturn = 3;

pub type GstDebugLevel = ::std::os::raw::c_uint;
pub const GstDebugLevel_GST_LEVEL_NONE: GstDebugLevel = 0;
pub const GstDebugLevel_GST_LEVEL_ERROR: GstDebugLevel = 1;
pub const GstDebugLevel_GST_LEVEL_WARNING: GstDebugLevel = 2;
pub const GstDebugLevel_GST_LEVEL_FIXME: GstDebugLevel = 3;
pub const GstDebugLevel_GST_LEVEL_INFO: GstDebugLevel = 4;
pub const GstDebugLevel_GST_LEVEL_DEBUG: GstDebugLevel = 5;
pub const GstDebugLevel_GST_LEVEL_LOG: GstDebugLevel = 6;
pub const GstDebugLevel_GST_LEVEL_TRACE: GstDebugLevel = 7;
pub const GstDebugLevel_GST_LEVEL_MEMDUMP: GstDebugLevel = 9;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GError {
    pub domain: GQuark,
    pub code: gint,
    pub message: *mut gchar,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GstElement {
    _unused: [u8; 0],
}

pub struct GstLibrary {
    __library: ::libloading::Library,
    pub gst_init: Result<
        unsafe extern "C" fn(argc: *mut ::std::os::raw::c_int, argv: *mut *mut *mut gchar),
        ::libloading::Error,
    >,
    pub gst_parse_launch: Result<
        unsafe extern "C" fn(
            pipeline_description: *const gchar,
            error: *mut *mut GError,
        ) -> *mut GstElement,
        ::libloading::Error,
    >,
    pub gst_element_set_state: Result<
        unsafe extern "C" fn(element: *mut GstElement, state: GstState) -> GstStateChangeReturn,
        ::libloading::Error,
    >,
    pub gst_object_ref_sink:
        Result<unsafe extern "C" fn(object: gpointer) -> gpointer, ::libloading::Error>,
    pub gst_object_unref: Result<unsafe extern "C" fn(object: gpointer), ::libloading::Error>,
    pub gst_debug_set_active:
        Result<unsafe extern "C" fn(active: gboolean), ::libloading::Error>,
    pub gst_debug_set_default_threshold:
        Result<unsafe extern "C" fn(level: GstDebugLevel), ::libloading::Error>,
    pub g_error_free: Result<unsafe extern "C" fn(error: *mut GError), ::libloading::Error>,
    pub g_object_is_floating:
        Result<unsafe extern "C" fn(object: gpointer) -> gboolean, ::libloading::Error>,
}

impl GstLibrary {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: AsRef<::std::ffi::OsStr>,
    {
        let library = unsafe { ::libloading::Library::new(path)? };
        unsafe { Self::from_library(library) }
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let gst_init = unsafe { __library.get(b"gst_init\0").map(|sym| *sym) };
        let gst_parse_launch = unsafe { __library.get(b"gst_parse_launch\0").map(|sym| *sym) };
        let gst_element_set_state =
            unsafe { __library.get(b"gst_element_set_state\0").map(|sym| *sym) };
        let gst_object_ref_sink =
            unsafe { __library.get(b"gst_object_ref_sink\0").map(|sym| *sym) };
        let gst_object_unref = unsafe { __library.get(b"gst_object_unref\0").map(|sym| *sym) };
        let gst_debug_set_active =
            unsafe { __library.get(b"gst_debug_set_active\0").map(|sym| *sym) };
        let gst_debug_set_default_threshold =
            unsafe { __library.get(b"gst_debug_set_default_threshold\0").map(|sym| *sym) };
        let g_error_free = unsafe { __library.get(b"g_error_free\0").map(|sym| *sym) };
        let g_object_is_floating =
            unsafe { __library.get(b"g_object_is_floating\0").map(|sym| *sym) };
        Ok(GstLibrary {
            __library,
            gst_init,
            gst_parse_launch,
            gst_element_set_state,
            gst_object_ref_sink,
            gst_object_unref,
            gst_debug_set_active,
            gst_debug_set_default_threshold,
            g_error_free,
            g_object_is_floating,
        })
    }

    pub unsafe fn gst_init(
        &self,
        argc: *mut ::std::os::raw::c_int,
        argv: *mut *mut *mut gchar,
    ) {
        unsafe { (self.gst_init.as_ref().expect("Expected function, got error."))(argc, argv) }
    }

    pub unsafe fn gst_parse_launch(
        &self,
        pipeline_description: *const gchar,
        error: *mut *mut GError,
    ) -> *mut GstElement {
        unsafe {
            (self
                .gst_parse_launch
                .as_ref()
                .expect("Expected function, got error."))(pipeline_description, error)
        }
    }

    pub unsafe fn gst_element_set_state(
        &self,
        element: *mut GstElement,
        state: GstState,
    ) -> GstStateChangeReturn {
        unsafe {
            (self
                .gst_element_set_state
                .as_ref()
                .expect("Expected function, got error."))(element, state)
        }
    }

    pub unsafe fn gst_object_ref_sink(&self, object: gpointer) -> gpointer {
        unsafe {
            (self
                .gst_object_ref_sink
                .as_ref()
                .expect("Expected function, got error."))(object)
        }
    }

    pub unsafe fn gst_object_unref(&self, object: gpointer) {
        unsafe {
            (self
                .gst_object_unref
                .as_ref()
                .expect("Expected function, got error."))(object)
        }
    }

    pub unsafe fn gst_debug_set_active(&self, active: gboolean) {
        unsafe {
            (self
                .gst_debug_set_active
                .as_ref()
                .expect("Expected function, got error."))(active)
        }
    }

    pub unsafe fn gst_debug_set_default_threshold(&self, level: GstDebugLevel) {
        unsafe {
            (self
                .gst_debug_set_default_threshold
                .as_ref()
                .expect("Expected function, got error."))(level)
        }
    }

    pub unsafe fn g_error_free(&self, error: *mut GError) {
        unsafe { (self.g_error_free.as_ref().expect("Expected function, got error."))(error) }
    }

    pub unsafe fn g_object_is_floating(&self, object: gpointer) -> gboolean {
        unsafe {
            (self
                .g_object_is_floating
                .as_ref()
                .expect("Expected function, got error."))(object)
        }
    }
}
