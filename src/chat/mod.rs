//! Workspace chat: cancellable streaming and session transcripts

pub mod session;
pub mod stream;
pub mod upstream;

pub use session::{Action, ChatMessage, ChatRole, ChatSession, SessionRegistry};
pub use stream::{CancelHandle, StreamChunk, StreamError, TokenStream, TokenStreamSender};
pub use upstream::ChatUpstream;
