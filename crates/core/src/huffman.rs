//! Canonical static Huffman codec for short strings, with prefix
//! memoization.
//!
//! The codec is built once, from a fixed table of natural-language
//! character frequencies, so writer and reader need no codebook exchange:
//! the tree itself is part of the wire format. Construction must therefore
//! be fully deterministic, down to the tie-breaking order of the merge
//! loop.
//!
//! # String wire format
//!
//! ```text
//! [prefix flag + 8-bit offset]   only while a memo slot is bound
//! coded flag (1 bit)             1 = Huffman codes, 0 = raw bytes
//! length (8 bits)
//! payload                        per-byte codes, or raw bytes
//! ```
//!
//! The encoder totals the code lengths first and falls back to raw bytes
//! whenever coding would not win. With a memo slot bound (see
//! [`BitCursor::set_string_buffer`]), consecutive strings that share more
//! than two leading bytes transmit only the changed suffix plus an 8-bit
//! prefix length.

use crate::bitio::{BitCursor, STRING_BUFFER_SIZE};
use std::sync::OnceLock;

/// Character frequencies the static tree is built from, indexed by byte
/// value. Weighted toward ASCII text; every entry is smoothed by +1 during
/// the build so no symbol is uncodable.
pub const CHAR_FREQS: [u32; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 329, 21, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    2809, 68, 0, 27, 0, 58, 3, 62, 4, 7, 0, 0, 15, 65, 554, 3, //
    394, 404, 189, 117, 30, 51, 27, 15, 34, 32, 80, 1, 142, 3, 142, 39, //
    0, 144, 125, 44, 122, 275, 70, 135, 61, 127, 8, 12, 113, 246, 122, 36, //
    185, 1, 149, 309, 335, 12, 11, 14, 54, 151, 0, 0, 2, 0, 0, 211, //
    0, 2090, 344, 736, 993, 2872, 701, 605, 646, 1552, 328, 305, 1240, 735, 1533, 1713, //
    562, 3, 1775, 1149, 1469, 979, 407, 553, 59, 279, 31, 0, 0, 0, 68, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// One coded symbol: its population, its code and the code's bit length.
#[derive(Clone, Copy, Debug)]
struct Leaf {
    pop: u32,
    symbol: u8,
    /// Code length; never exceeds 32.
    num_bits: u8,
    /// Code bits, LSB-first in the stream.
    code: u32,
}

/// Internal tree node. A non-negative child index refers to another node;
/// a negative index encodes leaf `-(index + 1)`.
#[derive(Clone, Copy, Debug)]
struct Node {
    pop: u32,
    child0: i16,
    child1: i16,
}

/// Working-set entry of the merge loop: a reference to either a leaf or an
/// already-merged subtree, by index.
#[derive(Clone, Copy, Debug)]
enum WrapRef {
    Node(u16),
    Leaf(u16),
}

/// The static canonical Huffman tables: 256 leaves and the merged tree,
/// with node 0 as the root.
pub struct HuffmanCodec {
    leaves: Vec<Leaf>,
    nodes: Vec<Node>,
}

impl HuffmanCodec {
    /// The process-wide codec, built on first use. The tables are immutable
    /// once built and safe to share across threads.
    pub fn shared() -> &'static HuffmanCodec {
        static CODEC: OnceLock<HuffmanCodec> = OnceLock::new();
        CODEC.get_or_init(HuffmanCodec::build)
    }

    /// Builds the tables from [`CHAR_FREQS`].
    ///
    /// The merge loop scans linearly for the two lowest-population entries
    /// (first-seen wins ties), merges them into a new node at the
    /// lower-ranked slot and swap-removes the other slot. The scan order is
    /// part of the wire format and must not be changed.
    fn build() -> Self {
        let leaves: Vec<Leaf> = (0..256)
            .map(|i| Leaf {
                pop: CHAR_FREQS[i] + 1,
                symbol: i as u8,
                num_bits: 0,
                code: 0,
            })
            .collect();

        let mut nodes: Vec<Node> = Vec::with_capacity(256);
        // Slot 0 is reserved for the root and filled in after the merge.
        nodes.push(Node {
            pop: 0,
            child0: 0,
            child1: 0,
        });

        let mut wraps: Vec<WrapRef> = (0..256u16).map(WrapRef::Leaf).collect();

        let wrap_pop = |wrap: WrapRef, nodes: &[Node], leaves: &[Leaf]| -> u32 {
            match wrap {
                WrapRef::Node(n) => nodes[n as usize].pop,
                WrapRef::Leaf(l) => leaves[l as usize].pop,
            }
        };
        let wrap_index = |wrap: WrapRef| -> i16 {
            match wrap {
                WrapRef::Node(n) => n as i16,
                WrapRef::Leaf(l) => -(l as i16 + 1),
            }
        };

        while wraps.len() > 1 {
            let mut min1 = u32::MAX - 1;
            let mut min2 = u32::MAX;
            let mut index1 = usize::MAX;
            let mut index2 = usize::MAX;

            for (i, &wrap) in wraps.iter().enumerate() {
                let pop = wrap_pop(wrap, &nodes, &leaves);
                if pop < min1 {
                    min2 = min1;
                    index2 = index1;
                    min1 = pop;
                    index1 = i;
                } else if pop < min2 {
                    min2 = pop;
                    index2 = i;
                }
            }
            debug_assert!(index1 != usize::MAX && index2 != usize::MAX && index1 != index2);

            nodes.push(Node {
                pop: min1 + min2,
                child0: wrap_index(wraps[index1]),
                child1: wrap_index(wraps[index2]),
            });
            let merged = (nodes.len() - 1) as u16;

            let keep = index1.min(index2);
            let nuke = index1.max(index2);
            wraps[keep] = WrapRef::Node(merged);
            wraps.swap_remove(nuke);
        }

        debug_assert!(matches!(wraps[0], WrapRef::Node(_)));
        if let WrapRef::Node(root) = wraps[0] {
            nodes[0] = nodes[root as usize];
        }

        let mut codec = HuffmanCodec { leaves, nodes };
        codec.assign_codes(0, 0, 0);
        codec
    }

    /// Walks the tree assigning codes: a 0 bit for the child0 descent and a
    /// 1 bit for child1, accumulated LSB-first so the root decision is the
    /// first bit on the wire.
    fn assign_codes(&mut self, index: i16, code: u32, depth: u8) {
        if index < 0 {
            let leaf = &mut self.leaves[(-(index as i32 + 1)) as usize];
            debug_assert!(depth as usize <= 32, "code length {} out of range", depth);
            leaf.code = code;
            leaf.num_bits = depth;
        } else {
            debug_assert!(depth < 32);
            let Node { child0, child1, .. } = self.nodes[index as usize];
            self.assign_codes(child0, code, depth + 1);
            self.assign_codes(child1, code | (1u32 << depth), depth + 1);
        }
    }

    /// Code length in bits for one symbol.
    pub fn code_length(&self, symbol: u8) -> usize {
        self.leaves[symbol as usize].num_bits as usize
    }

    /// Total Huffman-coded bit length of `bytes`.
    pub fn coded_bits(&self, bytes: &[u8]) -> usize {
        bytes.iter().map(|&b| self.code_length(b)).sum()
    }

    /// Writes up to 255 bytes: a coded/raw flag, an 8-bit length and the
    /// payload. Coding is used only when it is strictly smaller than the
    /// raw bytes.
    pub(crate) fn write_buffer<B: AsRef<[u8]> + AsMut<[u8]>>(
        &self,
        stream: &mut BitCursor<B>,
        bytes: &[u8],
    ) {
        let len = bytes.len().min(255);
        let bytes = &bytes[..len];

        if self.coded_bits(bytes) >= len * 8 {
            stream.write_flag(false);
            stream.write_int(len as u32, 8);
            stream.write_bytes(bytes);
        } else {
            stream.write_flag(true);
            stream.write_int(len as u32, 8);
            for &b in bytes {
                let leaf = self.leaves[b as usize];
                stream.write_bits(leaf.num_bits as usize, &leaf.code.to_le_bytes());
            }
        }
    }

    /// Reads a payload written by [`HuffmanCodec::write_buffer`]. Coded
    /// bytes are resolved by walking the tree from the root one flag at a
    /// time.
    pub(crate) fn read_buffer<B: AsRef<[u8]>>(&self, stream: &mut BitCursor<B>) -> Vec<u8> {
        let coded = stream.read_flag();
        let len = stream.read_int(8) as usize;
        let mut out = vec![0u8; len];

        if coded {
            for slot in out.iter_mut() {
                let mut index: i16 = 0;
                loop {
                    if index >= 0 {
                        let node = self.nodes[index as usize];
                        index = if stream.read_flag() {
                            node.child1
                        } else {
                            node.child0
                        };
                    } else {
                        *slot = self.leaves[(-(index as i32 + 1)) as usize].symbol;
                        break;
                    }
                }
            }
        } else {
            stream.read_bytes(&mut out);
        }

        out
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitCursor<B> {
    /// Writes a string of at most `min(max_len, 255)` bytes.
    ///
    /// With a memo slot bound, the longest common prefix against the
    /// previous string is counted first; a prefix longer than two bytes is
    /// transmitted as its 8-bit length plus the coded tail, and the slot is
    /// updated to the new string either way. Longer inputs are truncated
    /// (with a warning) to fit the 8-bit length field.
    pub fn write_string(&mut self, s: &str, max_len: usize) {
        let codec = HuffmanCodec::shared();
        let max_len = max_len.min(STRING_BUFFER_SIZE - 1);
        let bytes = s.as_bytes();
        if bytes.len() > max_len {
            log::warn!(
                "string of {} bytes truncated to {} for transmission",
                bytes.len(),
                max_len
            );
        }
        let len = bytes.len().min(max_len);
        let bytes = &bytes[..len];

        if let Some(mut memo) = self.string_memo.take() {
            let mut j = 0;
            while j < len && memo[j] == bytes[j] && bytes[j] != 0 {
                j += 1;
            }
            memo[..len].copy_from_slice(bytes);
            memo[len..].fill(0);

            let shared_prefix = self.write_flag(j > 2);
            if shared_prefix {
                self.write_int(j as u32, 8);
                codec.write_buffer(self, &bytes[j..]);
            }
            self.string_memo = Some(memo);
            if shared_prefix {
                return;
            }
        }

        codec.write_buffer(self, bytes);
    }
}

impl<B: AsRef<[u8]>> BitCursor<B> {
    /// Reads a string written by [`BitCursor::write_string`]. The memo
    /// slot, when bound, must mirror the writer's: a transmitted prefix
    /// length splices the decoded tail onto the previous string.
    pub fn read_string(&mut self) -> String {
        let codec = HuffmanCodec::shared();

        if let Some(mut memo) = self.string_memo.take() {
            if self.read_flag() {
                let offset = (self.read_int(8) as usize).min(STRING_BUFFER_SIZE - 1);
                let tail = codec.read_buffer(self);
                let copy_len = tail.len().min(STRING_BUFFER_SIZE - 1 - offset);
                memo[offset..offset + copy_len].copy_from_slice(&tail[..copy_len]);
                memo[offset + copy_len..].fill(0);

                let end = memo.iter().position(|&b| b == 0).unwrap_or(memo.len());
                let s = String::from_utf8_lossy(&memo[..end]).into_owned();
                self.string_memo = Some(memo);
                return s;
            }

            let bytes = codec.read_buffer(self);
            let len = bytes.len().min(STRING_BUFFER_SIZE - 1);
            memo[..len].copy_from_slice(&bytes[..len]);
            memo[len..].fill(0);
            self.string_memo = Some(memo);
            return String::from_utf8_lossy(&bytes).into_owned();
        }

        let bytes = codec.read_buffer(self);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_symbol_has_a_code() {
        let codec = HuffmanCodec::shared();
        for symbol in 0..=255u8 {
            let bits = codec.code_length(symbol);
            assert!(bits > 0, "symbol {} has no code", symbol);
            assert!(bits <= 32, "symbol {} code too long: {}", symbol, bits);
        }
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let codec = HuffmanCodec::shared();
        for a in 0..256usize {
            for b in (a + 1)..256usize {
                let (la, lb) = (codec.leaves[a].num_bits, codec.leaves[b].num_bits);
                let shorter = la.min(lb) as u32;
                let mask = if shorter == 32 {
                    u32::MAX
                } else {
                    (1u32 << shorter) - 1
                };
                assert!(
                    codec.leaves[a].code & mask != codec.leaves[b].code & mask,
                    "code of {} is a prefix of code of {}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_common_letters_code_shorter() {
        let codec = HuffmanCodec::shared();
        // 'e' is the most frequent letter; '~' barely appears.
        assert!(codec.code_length(b'e') < codec.code_length(b'~'));
        assert!(codec.code_length(b' ') < codec.code_length(b'X'));
    }

    #[test]
    fn test_every_symbol_round_trips() {
        let codec = HuffmanCodec::shared();
        for symbol in 0..=255u8 {
            let mut buf = [0u8; 16];
            let mut cursor = BitCursor::new(&mut buf[..]);
            codec.write_buffer(&mut cursor, &[symbol]);
            cursor.set_bit_position(0);
            assert_eq!(codec.read_buffer(&mut cursor), vec![symbol]);
        }
    }

    #[test]
    fn test_text_round_trip() {
        let codec = HuffmanCodec::shared();
        let text = b"the quick brown fox jumps over the lazy dog";

        let mut buf = [0u8; 128];
        let mut cursor = BitCursor::new(&mut buf[..]);
        codec.write_buffer(&mut cursor, text);
        let used = cursor.bit_position();

        // English text codes well below 8 bits per byte.
        assert!(used < 1 + 8 + text.len() * 8);

        cursor.set_bit_position(0);
        assert_eq!(codec.read_buffer(&mut cursor), text);
    }

    #[test]
    fn test_incompressible_bytes_go_raw() {
        let codec = HuffmanCodec::shared();
        // Rare symbols whose codes are all longer than 8 bits.
        let data = [0u8, 1, 2, 3, 200, 201, 202, 255];
        assert!(codec.coded_bits(&data) >= data.len() * 8);

        let mut buf = [0u8; 64];
        let mut cursor = BitCursor::new(&mut buf[..]);
        codec.write_buffer(&mut cursor, &data);
        assert_eq!(cursor.bit_position(), 1 + 8 + data.len() * 8);

        cursor.set_bit_position(0);
        assert!(!cursor.read_flag(), "expected the raw form");
        cursor.set_bit_position(0);
        assert_eq!(codec.read_buffer(&mut cursor), data);
    }

    #[test]
    fn test_size_choice_is_strict() {
        let codec = HuffmanCodec::shared();
        for sample in [&b"hello"[..], b"AAAA", b"\x00\x01\x02", b"mixed UP and down"] {
            let mut buf = [0u8; 128];
            let mut cursor = BitCursor::new(&mut buf[..]);
            codec.write_buffer(&mut cursor, sample);
            cursor.set_bit_position(0);
            let coded = cursor.read_flag();
            assert_eq!(
                coded,
                codec.coded_bits(sample) < sample.len() * 8,
                "sample {:?}",
                sample
            );
        }
    }

    #[test]
    fn test_empty_string() {
        let mut buf = [0u8; 8];
        let mut cursor = BitCursor::new(&mut buf[..]);
        cursor.write_string("", 255);
        assert_eq!(cursor.bit_position(), 9);

        cursor.set_bit_position(0);
        assert_eq!(cursor.read_string(), "");
    }

    #[test]
    fn test_string_round_trip_without_memo() {
        let mut buf = [0u8; 256];
        let mut cursor = BitCursor::new(&mut buf[..]);
        cursor.write_string("hello world", 255);
        cursor.write_string("second", 255);

        cursor.set_bit_position(0);
        assert_eq!(cursor.read_string(), "hello world");
        assert_eq!(cursor.read_string(), "second");
        assert!(!cursor.error());
    }

    #[test]
    fn test_string_truncates_to_max_len() {
        let long = "x".repeat(300);
        let mut buf = [0u8; 512];
        let mut cursor = BitCursor::new(&mut buf[..]);
        cursor.write_string(&long, 255);

        cursor.set_bit_position(0);
        assert_eq!(cursor.read_string().len(), 255);
    }

    #[test]
    fn test_string_respects_caller_max_len() {
        let mut buf = [0u8; 64];
        let mut cursor = BitCursor::new(&mut buf[..]);
        cursor.write_string("abcdefgh", 4);

        cursor.set_bit_position(0);
        assert_eq!(cursor.read_string(), "abcd");
    }

    #[test]
    fn test_memo_skips_shared_prefix() {
        let mut buf = [0u8; 256];
        let mut cursor = BitCursor::new(&mut buf[..]);
        cursor.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));

        cursor.write_string("serverName/playerA", 255);
        let first_end = cursor.bit_position();
        cursor.write_string("serverName/playerB", 255);
        let second_len = cursor.bit_position() - first_end;

        // Second write: outer flag + 8-bit offset + the one-byte tail "B"
        // (coded only if its code beats the raw byte).
        let codec = HuffmanCodec::shared();
        let tail_bits = codec.code_length(b'B').min(8);
        assert_eq!(second_len, 1 + 8 + 1 + 8 + tail_bits);

        // The transmitted prefix length is 17 ("serverName/player").
        let mut probe = BitCursor::new(cursor.buffer());
        probe.set_bit_position(first_end);
        assert!(probe.read_flag());
        assert_eq!(probe.read_int(8), 17);
    }

    #[test]
    fn test_memo_round_trip() {
        let names = ["arena/red/alpha", "arena/red/bravo", "arena/blue/alpha", "zz"];

        let mut buf = [0u8; 512];
        let mut writer = BitCursor::new(&mut buf[..]);
        writer.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));
        for name in names {
            writer.write_string(name, 255);
        }
        let used = writer.position();
        assert!(!writer.error());

        let mut reader = BitCursor::new(&buf[..used]);
        reader.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));
        for name in names {
            assert_eq!(reader.read_string(), name);
        }
        assert!(!reader.error());
    }

    #[test]
    fn test_memo_short_prefix_sends_full_string() {
        // A shared prefix of two bytes is not worth the offset byte.
        let mut buf = [0u8; 256];
        let mut writer = BitCursor::new(&mut buf[..]);
        writer.set_string_buffer(Some(Box::new([0u8; STRING_BUFFER_SIZE])));
        writer.write_string("abXXXX", 255);
        let mid = writer.bit_position();
        writer.write_string("abYYYY", 255);

        let mut probe = BitCursor::new(writer.buffer());
        probe.set_bit_position(mid);
        assert!(!probe.read_flag(), "prefix of 2 must not be memoized");
    }
}
