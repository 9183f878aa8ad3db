//! SMTP session core

pub mod commands;
pub mod config;
pub mod conversation;
pub mod envelope;
pub mod error;
pub mod response;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod transport;

pub use commands::{SmtpCommand, Verb};
pub use config::SessionConfig;
pub use conversation::{Conversation, ConversationState};
pub use envelope::Envelope;
pub use error::{Precondition, SmtpError, SmtpLimits};
pub use response::SmtpReply;
pub use server::SmtpServer;
pub use session::SmtpSession;
pub use shutdown::{SessionGuard, SessionTracker, ShutdownSignal};
pub use transport::Transport;
