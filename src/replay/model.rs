use serde_json::Value;

use crate::gameplay::model::GameplayStream;

/// Cipher block width of the gameplay section.
pub(super) const BLOCK_LENGTH: usize = 8;

/// Size of the leading magic header. Byte 4 of it holds the count of
/// metadata documents that follow.
pub(super) const HEAD_MAGIC_LENGTH: usize = 8;
pub(super) const DOCUMENT_COUNT_OFFSET: usize = 4;

/// Size of the version marker in front of the gameplay section. It is
/// consumed but never validated; clients write different values per patch.
pub(super) const GAMEPLAY_MAGIC_LENGTH: usize = 4;

/// The metadata preamble of a recording: the JSON documents that describe
/// the arena setup and, for a finished battle, the results.
///
/// Parsing is best effort. A document that does not parse is skipped and
/// counted rather than failing the preamble, so `documents` can hold fewer
/// entries than the file declared.
#[derive(Debug, Clone, Default)]
pub struct ReplayHead {
    /// The metadata documents in file order.
    pub documents: Vec<Value>,
    /// Documents that were declared but did not parse.
    pub skipped_documents: usize,
}

impl ReplayHead {
    /// A completed battle carries two documents, the arena configuration
    /// and the results. An in-progress (or abandoned) battle carries one.
    pub fn is_full_match(&self) -> bool {
        self.documents.len() == 2
    }
}

/// A fully decoded recording: the metadata preamble plus the decrypted and
/// inflated gameplay stream.
#[derive(Debug, Clone)]
pub struct Replay {
    /// The metadata preamble.
    pub head: ReplayHead,
    /// The packet stream of the battle.
    pub gameplay: GameplayStream,
}
