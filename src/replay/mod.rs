//! A `.wotreplay` recording is two sections back to back:
//!
//! ```text
//! [8 byte magic, byte 4 = document count]
//! document count x [i32 LE length][length bytes of JSON]
//! [4 byte gameplay marker][i32 LE plaintext length][ciphertext to EOF]
//! ```
//!
//! The JSON preamble describes the arena setup and, once the battle has
//! finished, its results. The ciphertext tail is the network traffic of
//! the battle: Blowfish under a fixed embedded key in a non standard
//! output feedback chaining, then zlib. Decoding runs the tail through
//! [`crypto`], truncates to the declared plaintext length and inflates the
//! result into a [`crate::gameplay::model::GameplayStream`].

/// Contains code related to the deserialisation of the recording container
pub mod de;
/// Contains the structure of the recording and its metadata preamble
pub mod model;

pub(crate) mod crypto;
