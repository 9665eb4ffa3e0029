//! Back-to-back request batching.
//!
//! The output buffer is sized with an allocation stride, but frames are
//! always placed `COPY_STRIDE` bytes apart. The two strides are independent:
//! with 8-byte read requests and the default stride the result is a plain
//! concatenation, anything else leaves zero-filled gaps or lets a later
//! frame overwrite the tail of an earlier one.

/// Allocation stride used by `concat_frames`.
pub const DEFAULT_BLOCK_STRIDE: usize = 8;

/// Offset increment between frames, fixed to the read-request length.
pub const COPY_STRIDE: usize = 8;

pub fn concat_frames<F: AsRef<[u8]>>(frames: &[F]) -> Vec<u8> {
    concat_frames_with_stride(frames, DEFAULT_BLOCK_STRIDE)
}

/// Allocates `allocation_stride * frames.len()` zeroed bytes and copies frame
/// `i` to offset `i * COPY_STRIDE`. Bytes that would land past the end of the
/// buffer are dropped.
pub fn concat_frames_with_stride<F: AsRef<[u8]>>(frames: &[F], allocation_stride: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; allocation_stride.saturating_mul(frames.len())];

    for (index, frame) in frames.iter().enumerate() {
        let frame = frame.as_ref();
        let offset = index.saturating_mul(COPY_STRIDE);
        if offset >= buffer.len() {
            if !frame.is_empty() {
                log::warn!(
                    "batch frame #{index} starts past the {}-byte buffer, dropped",
                    buffer.len()
                );
            }
            continue;
        }

        let len = frame.len().min(buffer.len() - offset);
        if len < frame.len() {
            log::warn!("batch frame #{index} truncated from {} to {len} bytes", frame.len());
        }
        buffer[offset..offset + len].copy_from_slice(&frame[..len]);
    }
    buffer
}
