mod archive;
mod error;
mod protocol;

pub use archive::{ArchiveKind, TarCompression};
pub use error::HelperError;
pub use protocol::{ActionReply, ActionRequest, HelperMessage, ReplyOutcome};

#[cfg(test)]
mod tests;
