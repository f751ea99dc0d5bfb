use std::path::PathBuf;

/// Error type for decoding and meshing operations.
///
/// Every error is a deterministic function of the input bytes; there is no
/// transient failure mode and nothing is worth retrying. A failure aborts the
/// file being processed and is reported to the caller, never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("truncated input: needed {needed} more byte(s), {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },
    #[error("string field is not valid UTF-8")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    #[error("palette index {index} out of range for a palette of {len} entries")]
    MalformedPalette { index: usize, len: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a file path to an error bubbling out of a filesystem entry point.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
