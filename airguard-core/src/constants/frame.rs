//! Sensor Frame Layout
//!
//! The particulate sensor reports over a 9600 baud serial line in fixed
//! 20-byte frames:
//!
//! ```text
//! offset: 0    1    2    3   4   5    6    7 ........ 18   19
//!        ┌────┬────┬────┬───┬───┬────┬────┬───────────────┬────┐
//!        │0x16│0x11│0x0B│DF1│DF2│DF3 │DF4 │   DF5..DF16   │ CS │
//!        └────┴────┴────┴───┴───┴────┴────┴───────────────┴────┘
//!                                 └ value ┘ (big-endian u16)
//! ```
//!
//! The checksum byte is chosen so that all 20 bytes sum to 0 mod 256.

/// Length of one sensor frame in bytes.
pub const FRAME_LEN: usize = 20;

/// Magic header opening every frame.
pub const FRAME_MAGIC: [u8; 3] = [0x16, 0x11, 0x0B];

/// Offset of the big-endian particulate value (DF3, DF4).
pub const VALUE_OFFSET: usize = 5;

/// Offset of the trailing checksum byte.
pub const CHECKSUM_OFFSET: usize = FRAME_LEN - 1;

/// Maximum frames kept from a single transport read.
///
/// The sensor emits a burst of frames roughly every 20-30 seconds and a
/// 3 second read window captures a handful of them. 32 frames (640 bytes)
/// leaves ample headroom; anything beyond that keeps the most recent frames.
pub const MAX_BATCH_FRAMES: usize = 32;

/// Size of the read buffer handed to the transport.
pub const READ_BUFFER_LEN: usize = FRAME_LEN * MAX_BATCH_FRAMES;

/// Maximum malformed strides remembered per read for diagnostics.
pub const MAX_STRIDE_ISSUES: usize = 8;
