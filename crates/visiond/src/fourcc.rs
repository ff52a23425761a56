// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors
#![forbid(unsafe_code)]

use core::fmt;

/// V4L2 pixel format code, stored in kernel byte order (little endian).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Decode the `pixelformat` field of a kernel structure.
    pub const fn from_u32(val: u32) -> FourCC {
        FourCC(val.to_le_bytes())
    }

    pub const fn as_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    /// Whether the code is all zero (driver did not report one).
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(buf: &[u8; 4]) -> FourCC {
        FourCC(*buf)
    }
}

impl From<u32> for FourCC {
    fn from(val: u32) -> FourCC {
        FourCC::from_u32(val)
    }
}

impl From<FourCC> for u32 {
    fn from(val: FourCC) -> Self {
        val.as_u32()
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match core::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s.trim_end()),
            Err(_) => {
                for b in self.0 {
                    write!(f, "{}", core::ascii::escape_default(b))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

impl serde::Serialize for FourCC {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_byte_order() {
        // V4L2_PIX_FMT_YUYV
        assert_eq!(FourCC::from_u32(0x5659_5559), FourCC(*b"YUYV"));
        assert_eq!(FourCC(*b"MJPG").as_u32(), 0x4750_4a4d);
    }

    #[test]
    fn test_display() {
        assert_eq!(FourCC(*b"H264").to_string(), "H264");
        assert_eq!(FourCC(*b"Y8  ").to_string(), "Y8");
        assert_eq!(FourCC([0xff, b'A', b'B', b'C']).to_string(), "\\xffABC");
    }
}
