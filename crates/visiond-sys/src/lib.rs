// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_safety_doc)]

include!("ffi.rs");

// Re-export libloading for error handling
pub use libloading;

use std::sync::{Mutex, OnceLock};

/// Library name used when `VISIOND_GST_LIBRARY` is not set.
pub const DEFAULT_LIBRARY: &str = "libgstreamer-1.0.so.0";

static LIBRARY: OnceLock<GstLibrary> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Load the GStreamer core library.
///
/// The environment variable `VISIOND_GST_LIBRARY` can be used to point at a
/// specific `libgstreamer-1.0.so`. If not set, the dynamic loader searches
/// the standard system paths for [`DEFAULT_LIBRARY`].
///
/// Loading happens once per process; later calls return the cached library.
/// This does not call `gst_init`, callers own engine initialization.
pub fn init() -> Result<&'static GstLibrary, libloading::Error> {
    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    // A poisoned lock only means another loader panicked; the OnceLock is
    // still consistent.
    let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(lib) = LIBRARY.get() {
        return Ok(lib);
    }

    let lib_path = library_path();
    let lib = unsafe { GstLibrary::new(lib_path.as_str())? };

    Ok(LIBRARY.get_or_init(|| lib))
}

/// Resolve the library path from the environment.
pub fn library_path() -> String {
    std::env::var("VISIOND_GST_LIBRARY")
        .ok()
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| DEFAULT_LIBRARY.to_string())
}

/// Try to get a reference to the loaded library without loading it
pub fn try_library() -> Option<&'static GstLibrary> {
    LIBRARY.get()
}
