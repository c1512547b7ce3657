use serde::Serialize;
use std::collections::HashMap;

use super::de::{self, Packets};

/// One byte tag announcing a byte wide ordinal
pub(super) const TAG_BYTE: u8 = 75;
/// One byte tag announcing a 4 byte little endian integer
pub(super) const TAG_INT32: u8 = 74;

/// The decrypted, inflated gameplay buffer. Produced once per recording and
/// then only ever read forward.
#[derive(Debug, Clone, Default)]
pub struct GameplayStream {
    data: Vec<u8>,
}

impl GameplayStream {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The raw packet bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Whether any gameplay was recorded at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Walks the stream packet by packet. The walk ends at the first point
    /// where a full length prefixed packet is no longer available; a
    /// truncated trailing fragment is dropped, never half decoded.
    pub fn packets(&self) -> Packets<'_> {
        Packets::new(&self.data)
    }

    /// Decodes every packet up front and reports how many bytes of
    /// truncated fragment (if any) were left at the end of the stream, so
    /// a clean end can be told apart from a cut off recording.
    pub fn decode(&self) -> Result<GameplayDecode, de::Error> {
        let mut packets = Vec::new();
        let mut walker = self.packets();
        for packet in &mut walker {
            packets.push(packet?);
        }
        Ok(GameplayDecode {
            packets,
            trailing_bytes: walker.trailing_bytes(),
        })
    }
}

/// The result of decoding a whole gameplay stream.
#[derive(Debug, Clone)]
pub struct GameplayDecode {
    /// Every decoded packet, in stream order.
    pub packets: Vec<DecodedPacket>,
    /// Bytes of a truncated trailing packet that were dropped. Zero for a
    /// recording that ends on a packet boundary.
    pub trailing_bytes: usize,
}

/// One decoded packet.
///
/// `fields` only carries values the original client wrote as "present":
/// integers that are non zero and strings that are non empty. A field whose
/// decoded value is zero is therefore indistinguishable from an absent one.
/// That conflation is part of the format's observable behaviour and is kept
/// for output compatibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedPacket {
    /// Seconds since the start of the battle.
    pub clock: f32,
    /// The dispatch tag from the packet header.
    pub packet_type: i32,
    /// The type specific fields, keyed by their wire names.
    pub fields: HashMap<&'static str, FieldValue>,
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// An integer field. All widths are widened to `i64`.
    Int(i64),
    /// A UTF-8 text field.
    Text(String),
    /// A field captured as raw bytes. Only the entity nickname of packet
    /// type 5 uses this; every other string in the format is text. The
    /// asymmetry is kept on purpose, pending clarification from captures.
    Bytes(Vec<u8>),
    /// A little endian f32 triple.
    Coordinate([f32; 3]),
}

impl FieldValue {
    /// The presence rule applied before a value enters
    /// [`DecodedPacket::fields`].
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Int(v) => *v != 0,
            FieldValue::Text(v) => !v.is_empty(),
            FieldValue::Bytes(v) => !v.is_empty(),
            FieldValue::Coordinate(_) => true,
        }
    }
}

/// A tag discriminated value, as used by the arena fields of packet type 0.
///
/// The tag byte picks the width of the value that follows. Tags other than
/// the two known ones are an explicit [`TaggedValue::Unknown`]: no value
/// byte is consumed for them and the field is left out of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggedValue {
    /// Tag 75: a single byte ordinal.
    Byte(u8),
    /// Tag 74: a 4 byte little endian integer.
    Int32(i32),
    /// Any other tag. The cursor does not advance past the tag byte.
    Unknown,
}

impl TaggedValue {
    /// The carried integer, if the tag was recognised. Note that `Some(0)`
    /// is a present value here: tagged fields are filtered on presence,
    /// not on the zero test used for plain integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TaggedValue::Byte(v) => Some(*v as i64),
            TaggedValue::Int32(v) => Some(*v as i64),
            TaggedValue::Unknown => None,
        }
    }
}
