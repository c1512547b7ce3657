use super::model::*;
use err_derive::Error;
use log::*;
use nom::bytes::complete::take;
use nom::bytes::streaming::take as streaming_take;
use nom::combinator::{map, map_res};
use nom::error::context;
use nom::number::complete::{be_i32, le_f32, le_i32, le_i8, le_u8};
use nom::number::streaming::{le_i32 as streaming_i32, le_u32 as streaming_u32};
use nom::sequence::tuple;
use std::collections::HashMap;

type IResult<I, O, E = nom::error::VerboseError<I>> = Result<(I, O), nom::Err<E>>;
type NomErrorType<'a> = nom::error::VerboseError<&'a [u8]>;

type Fields = HashMap<&'static str, FieldValue>;

/// The error types used while decoding packet payloads
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// A Nom parsing error, a payload too short or malformed for its type
    #[error(display = "Parsing error: {}", _0)]
    NomError(String),
}

impl<'a> From<nom::Err<NomErrorType<'a>>> for Error {
    fn from(k: nom::Err<NomErrorType<'a>>) -> Self {
        let reason = match k {
            nom::Err::Error(e) => format!("Nom Error: {:x?}", e),
            nom::Err::Failure(e) => format!("Nom Error: {:x?}", e),
            _ => "Unknown Nom error".to_string(),
        };
        Error::NomError(reason)
    }
}

struct RawPacket<'a> {
    packet_type: i32,
    payload: &'a [u8],
}

/// Length prefix, type tag, then the payload. The payload always holds 4
/// bytes of clock on top of its declared length, whatever the type.
fn raw_packet(buf: &[u8]) -> IResult<&[u8], RawPacket> {
    let (buf, payload_length) = streaming_u32(buf)?;
    let (buf, packet_type) = streaming_i32(buf)?;
    let (buf, payload) = streaming_take(payload_length as usize + 4)(buf)?;
    Ok((
        buf,
        RawPacket {
            packet_type,
            payload,
        },
    ))
}

/// Walks a gameplay buffer as a sequence of packets.
///
/// The segmenter never moves backward and never emits a partial packet: the
/// first time a length prefix or a declared payload does not fit in the
/// remaining bytes, iteration ends. Use [`Packets::trailing_bytes`]
/// afterwards to learn how much of a truncated fragment was left behind.
pub struct Packets<'a> {
    buf: &'a [u8],
    done: bool,
}

impl<'a> Packets<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, done: false }
    }

    /// Bytes of the stream that were not part of any emitted packet.
    pub fn trailing_bytes(&self) -> usize {
        self.buf.len()
    }
}

impl<'a> Iterator for Packets<'a> {
    type Item = Result<DecodedPacket, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match raw_packet(self.buf) {
            Ok((rest, raw)) => {
                self.buf = rest;
                trace!(
                    "packet type {}, {} payload bytes",
                    raw.packet_type,
                    raw.payload.len()
                );
                Some(decode_packet(&raw))
            }
            // End of stream; a trailing fragment is dropped, not emitted
            Err(nom::Err::Incomplete(_)) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

fn decode_packet(raw: &RawPacket) -> Result<DecodedPacket, Error> {
    let (_, packet) = packet_data(raw.packet_type, raw.payload)?;
    Ok(packet)
}

/// Inserts under the format's presence rule: zero integers and empty
/// strings are treated as "not written" and never reach the output.
fn keep(fields: &mut Fields, name: &'static str, value: FieldValue) {
    if value.is_truthy() {
        fields.insert(name, value);
    }
}

fn packet_data(packet_type: i32, payload: &[u8]) -> IResult<&[u8], DecodedPacket> {
    // Every payload leads with the clock, whatever the type
    let (buf, clock) = context("Clock field is missing", le_f32)(payload)?;

    let mut fields = Fields::new();
    match packet_type {
        0 => {
            battle_header(buf, &mut fields)?;
        }
        1 => {
            player_position(payload, buf, &mut fields)?;
        }
        2 => {
            let (_, world_id) = le_i32(buf)?;
            keep(&mut fields, "world_id", FieldValue::Int(world_id as i64));
        }
        4 | 6 | 7 => {
            let (_, entity_id) = le_i32(buf)?;
            keep(&mut fields, "entity_id", FieldValue::Int(entity_id as i64));
        }
        5 => {
            entity_create(payload, buf, &mut fields)?;
        }
        35 => {
            chat_message(buf, &mut fields)?;
        }
        // Unrecognised types still carry the universal clock
        _ => {}
    }

    Ok((
        &[][..],
        DecodedPacket {
            clock,
            packet_type,
            fields,
        },
    ))
}

/// Tag byte, then a value whose width the tag picks. An unknown tag
/// consumes nothing beyond the tag byte itself; the fixed skips that
/// follow each tagged field keep the cursor calibrated in that case.
fn tagged_field(buf: &[u8]) -> IResult<&[u8], TaggedValue> {
    let (buf, tag) = le_u8(buf)?;
    match tag {
        TAG_BYTE => map(le_u8, TaggedValue::Byte)(buf),
        TAG_INT32 => map(le_i32, TaggedValue::Int32)(buf),
        _ => Ok((buf, TaggedValue::Unknown)),
    }
}

/// Packet type 0: battle and player identity, written once at the start of
/// the recording. The offsets and skip widths in here are calibrated
/// against observed recordings; do not "straighten" them.
fn battle_header<'a>(buf: &'a [u8], fields: &mut Fields) -> IResult<&'a [u8], ()> {
    // The id is read in place, the skip then steps over it and 7 more bytes
    let (_, unknown_id) = le_i32(buf)?;
    keep(fields, "unknown_id", FieldValue::Int(unknown_id as i64));
    let (buf, _) = take(11usize)(buf)?;

    // The nickname length is the format's one big endian field
    let (buf, name_length) = context("Nickname length is missing", be_i32)(buf)?;
    let (buf, nick_name) = map_res(take(name_length as usize), std::str::from_utf8)(buf)?;
    keep(fields, "nick_name", FieldValue::Text(nick_name.to_string()));

    // The player id is ASCII decimal digits, not binary
    let (buf, id_length) = le_u8(buf)?;
    let (buf, game_player_id) = context(
        "Player id is not decimal",
        map_res(take(id_length as usize), |digits: &[u8]| {
            std::str::from_utf8(digits)
                .map_err(drop)
                .and_then(|s| s.parse::<i64>().map_err(drop))
        }),
    )(buf)?;
    keep(fields, "game_player_id", FieldValue::Int(game_player_id));

    let (buf, timestamp_start) = le_i32(buf)?;
    keep(
        fields,
        "timestamp_start",
        FieldValue::Int(timestamp_start as i64),
    );
    let (buf, _) = take(33usize)(buf)?;

    // Only the first 16 bytes of this 30 byte field hold the revision text
    let (_, game_params_rev) = map_res(take(16usize), std::str::from_utf8)(buf)?;
    let game_params_rev = game_params_rev.to_string();
    keep(fields, "gameParamsRev", FieldValue::Text(game_params_rev));
    let (buf, _) = take(30usize)(buf)?;

    // Tagged fields are kept on presence: a recognised tag carrying zero is
    // still a value, an unknown tag leaves the field out entirely
    let (buf, battle_level) = tagged_field(buf)?;
    if let Some(v) = battle_level.as_int() {
        fields.insert("battleLevel", FieldValue::Int(v));
    }
    let (buf, _) = take(13usize)(buf)?;

    let (buf, arena_type_id) = tagged_field(buf)?;
    if let Some(v) = arena_type_id.as_int() {
        fields.insert("arenaTypeID", FieldValue::Int(v));
    }
    let (buf, _) = take(11usize)(buf)?;

    let (buf, arena_kind) = tagged_field(buf)?;
    if let Some(v) = arena_kind.as_int() {
        fields.insert("arenaKind", FieldValue::Int(v));
    }

    Ok((buf, ()))
}

/// Packet type 1: the recording player's position. The world id sits right
/// after the clock but the entity id and coordinate are anchored at
/// absolute payload offset 14, so the parse restarts from the payload
/// start rather than running on.
fn player_position<'a>(
    payload: &'a [u8],
    buf: &'a [u8],
    fields: &mut Fields,
) -> IResult<&'a [u8], ()> {
    let (_, world_id) = le_i32(buf)?;
    keep(fields, "world_id", FieldValue::Int(world_id as i64));

    let (buf, _) = take(14usize)(payload)?;
    let (buf, entity_id) = le_i32(buf)?;
    keep(fields, "entity_id", FieldValue::Int(entity_id as i64));
    let (buf, position) = coordinate(buf)?;
    fields.insert("coordinate", FieldValue::Coordinate(position));

    Ok((buf, ()))
}

/// Packet type 5: an entity entering the world. Vehicle entities
/// (entity type 6) restart at absolute payload offset 61 for the nickname
/// block, whose shape depends on a leading type byte.
fn entity_create<'a>(
    payload: &'a [u8],
    buf: &'a [u8],
    fields: &mut Fields,
) -> IResult<&'a [u8], ()> {
    let (buf, entity_id) = le_i32(buf)?;
    keep(fields, "entity_id", FieldValue::Int(entity_id as i64));
    let (buf, entity_type) = le_i32(buf)?;
    keep(fields, "entity_type", FieldValue::Int(entity_type as i64));
    let (buf, _) = take(10usize)(buf)?;
    let (buf, position) = coordinate(buf)?;
    fields.insert("coordinate", FieldValue::Coordinate(position));

    if entity_type != 6 {
        return Ok((buf, ()));
    }

    let (buf, _) = take(61usize)(payload)?;
    let (buf, type_byte) = le_i8(buf)?;
    let (buf, nick_length) = match type_byte {
        12 => {
            let (buf, _) = take(3usize)(buf)?;
            let (buf, length) = le_i8(buf)?;
            (buf, Some(length))
        }
        20 => {
            let (buf, length) = le_i8(buf)?;
            (buf, Some(length))
        }
        _ => (buf, None),
    };

    if let Some(length) = nick_length {
        if length > 0 {
            // Unlike every other string in the format this one is kept as
            // raw bytes; see FieldValue::Bytes
            let (buf, nick_name) = take(length as usize)(buf)?;
            keep(fields, "nick_name", FieldValue::Bytes(nick_name.to_vec()));
            return Ok((buf, ()));
        }
    }

    Ok((buf, ()))
}

/// Packet type 35: an in-battle chat line.
fn chat_message<'a>(buf: &'a [u8], fields: &mut Fields) -> IResult<&'a [u8], ()> {
    let (buf, text_length) = le_i32(buf)?;
    let (buf, message_user) = map_res(take(text_length as usize), std::str::from_utf8)(buf)?;
    keep(
        fields,
        "message_user",
        FieldValue::Text(message_user.to_string()),
    );
    Ok((buf, ()))
}

fn coordinate(buf: &[u8]) -> IResult<&[u8], [f32; 3]> {
    map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| [x, y, z])(buf)
}
