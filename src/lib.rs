//! # Maillennia
//!
//! Maillennia is the session-handling core of an SMTP server.
//!
//! It reads command lines from a connected client, checks their syntax and
//! their order within the conversation, builds the envelope (sender and
//! recipients) and answers with standard status replies.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use maillennia::SmtpServer;
//! use std::thread;
//!
//! let server = SmtpServer::new("mx.example.com");
//!
//! let background = server.clone();
//! let handle = thread::spawn(move || background.start("127.0.0.1:2525"));
//!
//! // ... clients talk to 127.0.0.1:2525 ...
//!
//! // Tell every session to finish and wait until they have
//! server.stop();
//! handle.join().unwrap().unwrap();
//! ```
//!
//! Sessions can also be driven directly over any [`Transport`]:
//!
//! ```rust,no_run
//! use maillennia::{SessionConfig, SessionTracker, ShutdownSignal, SmtpSession};
//! use std::net::TcpListener;
//! use std::sync::Arc;
//!
//! let listener = TcpListener::bind("127.0.0.1:2525").unwrap();
//! let (stream, _) = listener.accept().unwrap();
//!
//! let tracker = SessionTracker::new();
//! let session = SmtpSession::new(
//!     stream,
//!     Arc::new(SessionConfig::new("mx.example.com")),
//!     ShutdownSignal::new(),
//!     &tracker,
//! );
//! session.run();
//! assert_eq!(tracker.active(), 0);
//! ```
//!
//! ## Supported SMTP commands
//!
//! - `HELO` / `EHLO` - Identify the client
//! - `MAIL FROM` - Specify the sender's address
//! - `RCPT TO` - Specify a destination (multiple destinations are supported)
//! - `DATA` - Announce the message body
//! - `RSET` - Reset the current transaction
//! - `NOOP`, `HELP`, `VRFY`, `EXPN`
//! - `QUIT` - Close connection
//!
//! ## Notes
//!
//! - `DATA` only announces readiness with `354`. Receiving the body is left
//!   to whoever takes over the stream.
//! - Recipients are not checked against any directory.
//! - No SMTP extensions (PIPELINING, SIZE, AUTH, STARTTLS).
//!
//! ## Shutdown
//!
//! Sessions look at the shared [`ShutdownSignal`] after every read attempt.
//! Reads are bounded by [`SessionConfig::read_timeout`], so an idle session
//! notices a shutdown within one timeout, replies `453` and closes.

mod smtp;

pub use smtp::{
    Conversation, ConversationState, Envelope, Precondition, SessionConfig, SessionGuard,
    SessionTracker, ShutdownSignal, SmtpCommand, SmtpError, SmtpLimits, SmtpReply, SmtpServer,
    SmtpSession, Transport, Verb,
};
