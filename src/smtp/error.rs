//! Error types for the SMTP session

use std::fmt;

use thiserror::Error;

use crate::smtp::response::SmtpReply;

/// The verb that has to succeed before the rejected one is legal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Greeting,
    Sender,
    Recipient,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Greeting => f.write_str("greeting required"),
            Precondition::Sender => f.write_str("sender required"),
            Precondition::Recipient => f.write_str("recipient required"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error")]
    Syntax,

    #[error("Invalid command arguments")]
    InvalidArguments,

    #[error("Bad sequence of commands: {0}")]
    BadSequence(Precondition),

    #[error("Invalid recipient address")]
    InvalidRecipient,

    #[error("Recipient does not exist")]
    UnknownRecipient,

    #[error("Invalid command")]
    InvalidCommand,

    #[error("Line too long (max {max} characters)")]
    LineTooLong { max: usize },
}

/// SMTP size limits
pub struct SmtpLimits;

impl SmtpLimits {
    /// Maximum length of a command line including CRLF
    pub const COMMAND_LINE_MAX_LENGTH: usize = 512;

    /// Maximum length of a reply line including CRLF
    pub const REPLY_LINE_MAX_LENGTH: usize = 512;
}

const RECIPIENT_HINTS: [&str; 3] = [
    "Please Check for any spelling errors",
    "make sure before & after recipient email address",
    "doesn't contain periods, spaces, or other punctuation.",
];

fn recipient_reply(code: &str, status: &str, headline: &str) -> SmtpReply {
    SmtpReply::new_multiline(
        code,
        &format!("{status} {headline}"),
        RECIPIENT_HINTS
            .iter()
            .map(|hint| format!("{status} {hint}"))
            .collect(),
    )
}

/// Maps SMTP errors to the reply sent to the client
impl SmtpError {
    pub fn to_reply(&self) -> SmtpReply {
        match self {
            SmtpError::Io(_) => SmtpReply::new("421", "4.4.2 Bad connection"),
            SmtpError::Syntax => SmtpReply::new("555", "5.5.2 Syntax error"),
            SmtpError::InvalidArguments => {
                SmtpReply::new("501", "5.5.4 Invalid command arguments")
            }
            SmtpError::BadSequence(Precondition::Greeting) => {
                SmtpReply::new("503", "5.5.1 HELO/EHLO first")
            }
            SmtpError::BadSequence(_) => SmtpReply::new("503", "5.5.1 Bad sequence of commands"),
            SmtpError::InvalidRecipient => {
                recipient_reply("553", "5.1.2", "Invalid recipient email address.")
            }
            SmtpError::UnknownRecipient => {
                recipient_reply("550", "5.1.1", "Recipient email address doesn't exist.")
            }
            SmtpError::InvalidCommand => SmtpReply::new("503", "5.5.1 Invalid command"),
            SmtpError::LineTooLong { max } => {
                SmtpReply::new("500", &format!("5.5.2 Line too long (max {max} characters)"))
            }
        }
    }
}
