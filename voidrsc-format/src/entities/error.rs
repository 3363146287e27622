#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unrecognized header {0:?}, expected \"Version 6\"")]
    InvalidHeader(Vec<u8>),

    #[error("Escape character at end of data")]
    DanglingEscape,

    #[error("Unterminated string at end of data")]
    UnterminatedString,

    #[error("Missing token before byte {at}")]
    MissingToken { at: u64 },

    #[error("Invalid UTF-8 in token before byte {at}")]
    InvalidUtf8 { at: u64 },

    #[error("Empty value at byte {at}")]
    EmptyValue { at: u64 },

    #[error("Key-value pair outside of any block at byte {at}")]
    ValueOutsideBlock { at: u64 },

    #[error("Unbalanced closing brace at byte {at}")]
    UnbalancedClose { at: u64 },

    #[error("Block closed at byte {at} has no entity header")]
    MissingEntityHeader { at: u64 },

    #[error("Second entity header in one definition at byte {at}")]
    UnexpectedEntityHeader { at: u64 },

    #[error("Duplicate entity '{id}' at byte {at}")]
    DuplicateEntity { id: String, at: u64 },

    #[error("Found {found} entities but only {kept} are unique")]
    DuplicateEntities { found: usize, kept: usize },

    #[error("Data ended inside a block ({depth} left open)")]
    UnclosedBlocks { depth: usize },

    #[error("Reading entities failed")]
    Io(#[from] std::io::Error),
}
