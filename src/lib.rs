#![warn(missing_docs)]
//! # wotreplay
//!
//! wotreplay is a rust library for decoding Wargaming `.wotreplay` battle
//! recordings: the JSON metadata preamble and the encrypted, compressed
//! packet stream of the battle itself.
//!
//! A recording already read into memory can be decoded with
//!
//! ```no_run
//! use wotreplay::replay::model::Replay;
//!
//! # fn main() -> wotreplay::Result<()> {
//! let buf = std::fs::read("battle.wotreplay").unwrap();
//! let replay = Replay::from_slice(&buf)?;
//!
//! println!("map: {:?}", replay.head.map_display_name());
//! for packet in replay.gameplay.packets() {
//!     println!("{:?}", packet?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! When only the battle metadata is of interest,
//! [`replay::model::Replay::head_from_slice`] skips the decryption
//! entirely. The queries in [`battle`] (map, teams, win/loss, scoreboard
//! aggregates) all run off that head.
//!
//! Decoding is one directional and best effort: corrupt metadata documents
//! are skipped, a cut off packet stream ends cleanly, and both conditions
//! are reported as diagnostics rather than errors.

/// Contains battle level queries over the metadata preamble
pub mod battle;
/// Contains the library's aggregate error type
pub mod errors;
/// Contains low level structures and formats for the gameplay packet stream
pub mod gameplay;
/// Contains low level structures and formats for the recording container
pub mod replay;
/// Contains the process wide vehicle name catalog
pub mod vehicles;

pub use errors::{Error, Result};
