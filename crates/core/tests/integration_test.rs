//! Integration tests for the serialization engine.
//!
//! These exercise the whole stack the way a netcode layer would: stage a
//! packet, mix primitive fields with domain compressors and strings, hand
//! the bytes to a transport, and decode them on the "other side" with an
//! independent cursor.

use bitwire_core::{
    huffman::HuffmanCodec, math::Point3, packet_stream, BitCursor, StaticClassRegistry,
    Transport, MAX_PACKET_DATA_SIZE, STRING_BUFFER_SIZE,
};
use std::net::SocketAddr;

/// Transport that loops the datagram back into a buffer.
struct Loopback {
    delivered: Vec<Vec<u8>>,
}

impl Transport for Loopback {
    fn sendto(&mut self, _addr: &SocketAddr, payload: &[u8]) -> std::io::Result<usize> {
        self.delivered.push(payload.to_vec());
        Ok(payload.len())
    }
}

#[test]
fn test_flag_and_int_byte_layout() {
    let mut buf = [0u8; 16];
    let mut cursor = BitCursor::new(&mut buf[..]);

    assert!(cursor.write_flag(true));
    cursor.write_int(0x12345678, 32);

    // LSB-first packing: the flag occupies bit 0 and the little-endian
    // integer follows, shifted up one bit.
    assert_eq!(&cursor.buffer()[..6], &[0xF1, 0xAC, 0x68, 0x24, 0x00, 0x00]);

    cursor.set_bit_position(0);
    assert!(cursor.read_flag());
    assert_eq!(cursor.read_int(32), 0x12345678);
}

#[test]
fn test_signed_int_width_and_value() {
    let mut buf = [0u8; 8];
    let mut cursor = BitCursor::new(&mut buf[..]);

    cursor.write_signed_int(-5, 8);
    assert_eq!(cursor.bit_position(), 8);

    cursor.set_bit_position(0);
    assert_eq!(cursor.read_signed_int(8), -5);
}

#[test]
fn test_up_vector_survives_exactly() {
    let mut buf = [0u8; 8];
    let mut cursor = BitCursor::new(&mut buf[..]);

    cursor.write_normal_vector_z(Point3::new(0.0, 0.0, 1.0), 8, 10);
    cursor.set_bit_position(0);
    assert_eq!(
        cursor.read_normal_vector_z(8, 10),
        Point3::new(0.0, 0.0, 1.0)
    );
}

#[test]
fn test_packet_staging_with_string() {
    let addr: SocketAddr = "127.0.0.1:28000".parse().unwrap();
    let mut transport = Loopback { delivered: Vec::new() };

    let payload = {
        let mut stream = packet_stream(0);
        assert_eq!(stream.stream_size(), MAX_PACKET_DATA_SIZE);
        assert_eq!(stream.position(), 0);

        stream.write_string("hello", 32);

        // No memo slot bound: one coded flag, 8 length bits, then the
        // Huffman codes of each byte.
        let codec = HuffmanCodec::shared();
        let expected_bits = 1 + 8 + codec.coded_bits(b"hello");
        assert_eq!(stream.position(), (expected_bits + 7) / 8);

        stream.send(&mut transport, &addr).unwrap();
        transport.delivered[0].clone()
    };

    let mut reader = BitCursor::new(&payload[..]);
    assert_eq!(reader.read_string(), "hello");
    assert!(!reader.error());
}

#[test]
fn test_prefix_memo_sends_only_suffix() {
    let mut buf = [0u8; 256];
    let mut writer = BitCursor::new(&mut buf[..]);
    writer.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));

    writer.write_string("serverName/playerA", 255);
    let first_end = writer.bit_position();
    writer.write_string("serverName/playerB", 255);
    let used = writer.position();

    // The second write carries an 8-bit prefix length of 17 and a
    // one-byte payload.
    let mut probe = BitCursor::new(writer.buffer());
    probe.set_bit_position(first_end);
    assert!(probe.read_flag());
    assert_eq!(probe.read_int(8), 17);

    let mut reader = BitCursor::new(&buf[..used]);
    reader.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));
    assert_eq!(reader.read_string(), "serverName/playerA");
    assert_eq!(reader.read_string(), "serverName/playerB");
}

#[test]
fn test_compressed_point_near_origin() {
    let origin = Point3::new(100.0, 200.0, 300.0);
    let p = Point3::new(100.5, 200.25, 299.5);
    let scale = 0.25;

    let mut buf = [0u8; 32];
    let mut writer = BitCursor::new(&mut buf[..]);
    writer.set_compression_point(origin);
    writer.write_compressed_point(p, scale);
    let used = writer.position();

    let mut reader = BitCursor::new(&buf[..used]);
    reader.set_compression_point(origin);

    // Close to the origin: tier 0, then half-a-quantum accuracy per axis.
    let mut tier_probe = BitCursor::new(&buf[..used]);
    assert_eq!(tier_probe.read_int(2), 0);

    let back = reader.read_compressed_point(scale);
    assert!((back.x - p.x).abs() <= 0.125);
    assert!((back.y - p.y).abs() <= 0.125);
    assert!((back.z - p.z).abs() <= 0.125);
}

/// A full snapshot assembly: class ids, compressed points, vectors and
/// memoized strings in one staged packet, decoded independently.
#[test]
fn test_snapshot_packet_round_trip() {
    let registry = StaticClassRegistry::<1, 2> {
        bit_sizes: [[6, 4]],
        counts: [[40, 10]],
    };
    let origin = Point3::new(512.0, 512.0, 64.0);
    let scale = 0.01;
    let addr: SocketAddr = "127.0.0.1:28000".parse().unwrap();
    let mut transport = Loopback { delivered: Vec::new() };

    struct Entity {
        class_id: u32,
        position: Point3,
        velocity: Point3,
        name: &'static str,
    }

    let entities = [
        Entity {
            class_id: 3,
            position: Point3::new(510.0, 514.5, 64.25),
            velocity: Point3::new(2.0, -1.5, 0.0),
            name: "match/team0/keeper",
        },
        Entity {
            class_id: 17,
            position: Point3::new(530.0, 500.0, 66.0),
            velocity: Point3::ZERO,
            name: "match/team0/runner",
        },
        Entity {
            class_id: 3,
            position: Point3::new(490.0, 512.0, 63.0),
            velocity: Point3::new(-8.0, 0.5, 1.0),
            name: "match/team1/keeper",
        },
    ];

    let payload = {
        let mut stream = packet_stream(0);
        stream.set_compression_point(origin);
        stream.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));

        stream.write_int(entities.len() as u32, 8);
        for entity in &entities {
            stream.write_class_id(&registry, entity.class_id, 0, 0);
            stream.write_compressed_point(entity.position, scale);
            stream.write_vector(entity.velocity, 0.01, 64.0, 12, 10, 10);
            stream.write_string(entity.name, 255);
        }
        stream.check().expect("snapshot must fit one packet");
        stream.send(&mut transport, &addr).unwrap();
        transport.delivered[0].clone()
    };

    let mut reader = BitCursor::new(&payload[..]);
    reader.set_compression_point(origin);
    reader.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));

    let count = reader.read_int(8) as usize;
    assert_eq!(count, entities.len());

    for entity in &entities {
        assert_eq!(reader.read_class_id(&registry, 0, 0), Some(entity.class_id));

        let position = reader.read_compressed_point(scale);
        assert!((position - entity.position).len() < scale, "{}", entity.name);

        let velocity = reader.read_vector(0.01, 64.0, 12, 10, 10);
        assert!((velocity - entity.velocity).len() < 0.25, "{}", entity.name);

        assert_eq!(reader.read_string(), entity.name);
    }
    reader.check().expect("decode must consume cleanly");
}

#[test]
fn test_trailing_bits_stay_zero() {
    let mut buf = [0u8; 64];
    let mut cursor = BitCursor::new(&mut buf[..]);

    cursor.write_int(0xFFFF_FFFF, 32);
    cursor.write_signed_int(-1023, 11);
    cursor.write_flag(true);
    let written = cursor.bit_position();

    for bit in written..(64 * 8) {
        assert!(!cursor.test_bit(bit), "bit {} is set", bit);
    }
}

#[test]
fn test_int_round_trip_all_widths() {
    for bits in 1..=32usize {
        let mask = if bits == 32 {
            u32::MAX
        } else {
            (1u32 << bits) - 1
        };
        for value in [0u32, 1, 0x5A5A_5A5A, u32::MAX] {
            let mut buf = [0u8; 8];
            let mut cursor = BitCursor::new(&mut buf[..]);
            cursor.write_int(value, bits);
            cursor.set_bit_position(0);
            assert_eq!(cursor.read_int(bits), value & mask, "width {}", bits);
        }
    }
}

#[test]
fn test_string_round_trip_all_lengths() {
    // Lengths that straddle the interesting boundaries, including 255.
    for len in [0usize, 1, 2, 3, 31, 128, 255] {
        let s: String = (0..len)
            .map(|i| (b'a' + (i % 26) as u8) as char)
            .collect();

        let mut buf = vec![0u8; 600];
        let mut cursor = BitCursor::new(&mut buf[..]);
        cursor.write_string(&s, 255);
        cursor.set_bit_position(0);
        assert_eq!(cursor.read_string(), s, "length {}", len);
    }
}
