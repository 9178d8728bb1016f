//! bitwire-core: bit-packed serialization for real-time game network
//! traffic.
//!
//! Datagrams for unreliable transports are assembled bit by bit rather
//! than byte by byte: a flag costs one bit, a bounded integer costs
//! exactly the bits its range needs, and domain values (unit vectors,
//! transforms, world positions) are quantized against what the simulation
//! already knows about them. Short strings go through a static canonical
//! Huffman code with suffix-only retransmission of near-duplicates.
//!
//! # Architecture
//!
//! - `bitio`: the [`BitCursor`] read/write head, the wire format's
//!   foundation
//! - `grow`: cursors that own and grow their buffer
//! - `math`: vector/quaternion/matrix collaborators of the compressors
//! - `compress`: quantized encoders for directions, magnitudes,
//!   transforms and origin-relative points
//! - `huffman`: the static string codec and prefix memoization
//! - `registry`: the class-id table seam
//! - `packet`: the process-wide packet staging buffer and transport seam
//!
//! # Design principles
//!
//! - **Bit-exact wire format**: every field width, packing direction and
//!   tie-break is specified; two hosts produce identical bytes
//! - **No panics on bad traffic**: overflow sets a sticky per-cursor flag
//!   that callers check at packet boundaries
//! - **No hot-path allocation**: fixed cursors borrow their buffer, and
//!   packets stage in one process-wide scratch buffer

pub mod bitio;
pub mod compress;
pub mod error;
pub mod grow;
pub mod huffman;
pub mod math;
pub mod packet;
pub mod registry;

// Re-export commonly used types
pub use bitio::{BitCursor, STRING_BUFFER_SIZE};
pub use compress::{quantize_normal, POINT_TIER_BITS};
pub use error::{Error, Result};
pub use grow::{InfiniteCursor, ResizeCursor};
pub use huffman::{HuffmanCodec, CHAR_FREQS};
pub use math::{Mat4, Point3, Quat};
pub use packet::{packet_stream, PacketStream, Transport, MAX_PACKET_DATA_SIZE};
pub use registry::{ClassRegistry, StaticClassRegistry};
