//! Additive mod-256 frame checksum.
//!
//! The checksum byte is chosen so that the sum of every byte in the frame,
//! including the checksum itself, is 0 mod 256. Both sides of the link
//! compute this with plain unsigned byte arithmetic; any deviation here
//! silently corrupts the whole protocol.

/// Compute the checksum for a byte sequence.
///
/// Appending the returned byte makes the total wrapping sum zero.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    sum.wrapping_neg()
}

/// Validate a complete frame, trailing checksum byte included.
///
/// True iff the wrapping sum of all bytes is zero.
pub fn validate(frame: &[u8]) -> bool {
    if frame.is_empty() {
        return false;
    }
    frame.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)) == 0
}
