use super::crypto;
use super::model::*;
use crate::gameplay::model::GameplayStream;
use err_derive::Error;
use flate2::read::ZlibDecoder;
use log::*;
use nom::bytes::streaming::take;
use nom::error::context;
use nom::number::streaming::le_i32;
use std::io::Read;
use std::sync::Arc;

type IResult<I, O, E = nom::error::VerboseError<I>> = Result<(I, O), nom::Err<E>>;
type NomErrorType<'a> = nom::error::VerboseError<&'a [u8]>;

/// The error types used while deserialising the recording container
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// A Nom parsing error, usually a malformed or truncated recording
    #[error(display = "Parsing error: {}", _0)]
    NomError(String),
    /// The decrypted gameplay section did not inflate
    #[error(display = "Decompression error")]
    Decompression(#[error(source)] Arc<std::io::Error>),
}

impl<'a> From<nom::Err<NomErrorType<'a>>> for Error {
    fn from(k: nom::Err<NomErrorType<'a>>) -> Self {
        let reason = match k {
            nom::Err::Error(e) => format!("Nom Error: {:?}", e),
            nom::Err::Failure(e) => format!("Nom Error: {:?}", e),
            _ => "Unknown Nom error".to_string(),
        };
        Error::NomError(reason)
    }
}

impl Replay {
    /// Decodes a whole recording: preamble, then decrypt and inflate of the
    /// gameplay section.
    pub fn from_slice(buf: &[u8]) -> Result<Replay, Error> {
        let (buf, head) = replay_head(buf)?;
        let (_, (plaintext_length, ciphertext)) = gameplay_section(buf)?;

        let plaintext = crypto::decrypt(ciphertext, plaintext_length);
        let gameplay = if plaintext.is_empty() {
            // A declared length of zero means no gameplay was recorded;
            // there is no zlib stream to speak of
            GameplayStream::default()
        } else {
            GameplayStream::new(inflate(&plaintext)?)
        };

        Ok(Replay { head, gameplay })
    }

    /// Decodes only the metadata preamble. This is cheap (no decryption)
    /// and all the battle queries in [`crate::battle`] run off it.
    pub fn head_from_slice(buf: &[u8]) -> Result<ReplayHead, Error> {
        let (_, head) = replay_head(buf)?;
        Ok(head)
    }
}

fn replay_head(buf: &[u8]) -> IResult<&[u8], ReplayHead> {
    let (buf, header) = context("Recording magic is missing", take(HEAD_MAGIC_LENGTH))(buf)?;
    let document_count = header[DOCUMENT_COUNT_OFFSET];

    let mut documents = Vec::with_capacity(document_count as usize);
    let mut skipped_documents = 0;
    let mut buf = buf;
    for _ in 0..document_count {
        match json_document(buf) {
            Ok((rest, raw)) => {
                buf = rest;
                match serde_json::from_slice(raw) {
                    Ok(document) => documents.push(document),
                    Err(e) => {
                        // One corrupt document must not sink the preamble
                        debug!("Skipping unparsable metadata document: {}", e);
                        skipped_documents += 1;
                    }
                }
            }
            // The preamble ended early; keep what we have
            Err(nom::Err::Incomplete(_)) => break,
            Err(e) => return Err(e),
        }
    }

    Ok((
        buf,
        ReplayHead {
            documents,
            skipped_documents,
        },
    ))
}

fn json_document(buf: &[u8]) -> IResult<&[u8], &[u8]> {
    let (buf, length) = le_i32(buf)?;
    take(length as usize)(buf)
}

/// Returns the declared plaintext length and the ciphertext tail, which
/// runs to the end of the file.
fn gameplay_section(buf: &[u8]) -> IResult<&[u8], (usize, &[u8])> {
    let (buf, _magic) = context(
        "Gameplay section marker is missing",
        take(GAMEPLAY_MAGIC_LENGTH),
    )(buf)?;
    let (buf, plaintext_length) = context("Plaintext length is missing", le_i32)(buf)?;
    Ok((&[][..], (plaintext_length.max(0) as usize, buf)))
}

fn inflate(buf: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = ZlibDecoder::new(buf);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| Error::Decompression(Arc::new(e)))?;
    Ok(inflated)
}
