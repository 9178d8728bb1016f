//! Packet staging: a process-wide cursor over a fixed scratch buffer.
//!
//! Outgoing datagrams are assembled in one shared buffer of
//! [`MAX_PACKET_DATA_SIZE`] bytes instead of allocating per packet. One
//! actor at a time acquires the buffer with [`packet_stream`], fills it
//! through the returned cursor, and hands the filled region to a
//! [`Transport`] with [`PacketStream::send`].
//!
//! The pair is **not reentrant**: acquiring a second stream while one is
//! alive blocks (and deadlocks within a single thread). Drop the previous
//! stream first. Concurrent use from multiple threads serializes on the
//! internal lock, but the engine's concurrency model assumes a single
//! packet assembler per process.

use crate::bitio::BitCursor;
use std::net::{SocketAddr, UdpSocket};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Maximum datagram payload the engine will assemble.
pub const MAX_PACKET_DATA_SIZE: usize = 1500;

static PACKET_BUFFER: Mutex<[u8; MAX_PACKET_DATA_SIZE]> =
    Mutex::new([0u8; MAX_PACKET_DATA_SIZE]);

/// Exclusive hold on the process-wide staging buffer.
pub struct StagingBuffer(MutexGuard<'static, [u8; MAX_PACKET_DATA_SIZE]>);

impl AsRef<[u8]> for StagingBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl AsMut<[u8]> for StagingBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }
}

/// A bit cursor bound to the staging buffer for the lifetime of one
/// packet. Dereferences to [`BitCursor`]; dropping it releases the buffer.
pub struct PacketStream {
    cursor: BitCursor<StagingBuffer>,
}

impl PacketStream {
    /// Sends the filled region (`position()` bytes, partially-filled
    /// trailing byte included) to `addr` through `transport`.
    pub fn send<T: Transport>(
        &self,
        transport: &mut T,
        addr: &SocketAddr,
    ) -> std::io::Result<usize> {
        transport.sendto(addr, &self.cursor.buffer()[..self.cursor.position()])
    }
}

impl Deref for PacketStream {
    type Target = BitCursor<StagingBuffer>;
    fn deref(&self) -> &Self::Target {
        &self.cursor
    }
}

impl DerefMut for PacketStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.cursor
    }
}

/// Acquires the staging buffer and returns a cursor over it, positioned at
/// zero with a write budget of `min(write_size, MAX_PACKET_DATA_SIZE)`
/// bytes. A `write_size` of 0 means the full buffer. The whole buffer
/// stays readable regardless of the budget.
pub fn packet_stream(write_size: usize) -> PacketStream {
    let guard = PACKET_BUFFER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    let limit = if write_size == 0 {
        MAX_PACKET_DATA_SIZE
    } else {
        write_size.min(MAX_PACKET_DATA_SIZE)
    };

    PacketStream {
        cursor: BitCursor::with_write_limit(StagingBuffer(guard), limit),
    }
}

/// Outbound datagram hook. The engine never opens sockets itself; the host
/// supplies whatever carries bytes to a peer.
pub trait Transport {
    /// Sends one datagram payload to `addr`.
    fn sendto(&mut self, addr: &SocketAddr, payload: &[u8]) -> std::io::Result<usize>;
}

impl Transport for UdpSocket {
    fn sendto(&mut self, addr: &SocketAddr, payload: &[u8]) -> std::io::Result<usize> {
        self.send_to(payload, *addr)
    }
}
