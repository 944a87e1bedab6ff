//! WAL frame format (bit-exact, spec.md §6):
//!
//! `uint32_be length` (payload bytes) ‖ `uint32_be crc32` (IEEE, over payload)
//! ‖ `length` bytes of UTF-8 JSON payload.
//!
//! Sealed partition trailer: ASCII `"WALEND"` ‖ `uint32_be record_count` ‖
//! `uint32_be trailer_crc`, where `trailer_crc` is the running CRC32 over
//! every payload byte written to the partition (spec.md §4.5's
//! "trailing_crc32_of_file").

pub const TRAILER_MAGIC: &[u8; 6] = b"WALEND";
const HEADER_LEN: usize = 8; // length(4) + crc32(4)

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&crc32fast::hash(payload).to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Total on-disk size of a frame carrying a payload of `payload_len` bytes —
/// the amount to add to a frame's start offset to get the next frame's.
pub fn frame_size(payload_len: usize) -> u64 {
    (HEADER_LEN + payload_len) as u64
}

pub fn encode_trailer(record_count: u32, trailer_crc: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(TRAILER_MAGIC.len() + 8);
    buf.extend_from_slice(TRAILER_MAGIC);
    buf.extend_from_slice(&record_count.to_be_bytes());
    buf.extend_from_slice(&trailer_crc.to_be_bytes());
    buf
}

/// One decoded frame plus the byte offset it started at.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub offset: u64,
    pub payload: Vec<u8>,
}

/// Scans `bytes` for complete, CRC-valid frames starting at `from_offset`.
/// Stops at the first incomplete or corrupt frame (the WAL truncation rule):
/// a record whose length prefix extends past the end of `bytes`, or whose
/// CRC does not match, is never returned, and scanning stops there even if
/// further bytes follow (they are presumed to belong to a future write that
/// never fully landed).
pub fn scan_frames(bytes: &[u8], from_offset: u64) -> Vec<DecodedFrame> {
    let mut out = Vec::new();
    let mut pos = from_offset as usize;

    loop {
        if pos + HEADER_LEN > bytes.len() {
            break;
        }
        // A trailer can immediately follow the last frame; stop cleanly
        // rather than trying to parse it as a frame header.
        if bytes[pos..].starts_with(TRAILER_MAGIC) {
            break;
        }

        let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        let crc = u32::from_be_bytes(bytes[pos + 4..pos + 8].try_into().unwrap());
        let payload_start = pos + HEADER_LEN;
        let payload_end = payload_start + len;

        if payload_end > bytes.len() {
            break;
        }

        let payload = &bytes[payload_start..payload_end];
        if crc32fast::hash(payload) != crc {
            break;
        }

        out.push(DecodedFrame {
            offset: pos as u64,
            payload: payload.to_vec(),
        });
        pos = payload_end;
    }

    out
}

/// Byte offset of the first byte that is not part of a complete, valid
/// frame — i.e. where a writer should resume appending after recovery.
pub fn last_good_offset(bytes: &[u8]) -> u64 {
    scan_frames(bytes, 0)
        .last()
        .map(|f| f.offset + HEADER_LEN as u64 + f.payload.len() as u64)
        .unwrap_or(0)
}
