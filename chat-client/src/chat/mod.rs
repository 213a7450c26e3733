//! # Chat Pipeline
//!
//! ```text
//! chat/
//! ├── uploader.rs   - Validate and upload a pending file, yielding an Attachment
//! ├── assembler.rs  - Build outgoing Message records (pure)
//! ├── history.rs    - Fetch a conversation from the REST backend
//! └── session.rs    - ChatSession: contact selection, send and receive flows
//! ```
//!
//! The session is the only stateful piece; the other three are thin and
//! individually testable.

pub mod assembler;
pub mod history;
pub mod session;
pub mod uploader;

pub use assembler::{IgnoreReason, SenderIdentity};
pub use history::HistoryLoader;
pub use session::{ChatSession, EchoPolicy, HistoryOutcome, SendOutcome, SessionEvent};
pub use uploader::{AttachmentFile, AttachmentUploader};
