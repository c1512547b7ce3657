//! The gameplay section of a recording, after decryption and inflation, is
//! a flat run of length prefixed packets:
//!
//! ```text
//! [u32 payload_length][i32 packet_type][payload_length + 4 bytes payload]
//! ```
//!
//! The extra 4 bytes on every payload are a little endian f32 clock,
//! seconds since the start of the battle, present whatever the type. The
//! bytes after the clock are a type specific layout of hand calibrated
//! offsets recovered from captured recordings.
//!
//! Decoding is best effort in exactly two places: packet types this module
//! does not know about still yield their clock, and unknown tag bytes in
//! the tagged fields of type 0 drop that one field. Everything else that
//! goes wrong in a payload surfaces as an error for that packet, because a
//! silently misread field would be worse than a loud one. The segmenter
//! itself never errors at end of stream; it simply stops.

/// Contains code related to the deserialisation of gameplay packets
pub mod de;
/// Contains the structure of the gameplay stream and decoded packets
pub mod model;
