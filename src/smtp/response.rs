//! SMTP reply encoding and transmission

use std::io::Write;

use crate::smtp::error::{SmtpError, SmtpLimits};

/// Represents an SMTP reply that can be sent to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    /// The SMTP reply code (e.g., "250", "354", "503")
    pub code: String,
    /// The human-readable message, including the enhanced status code
    pub message: String,
    /// Continuation lines following the message
    pub multiline: Option<Vec<String>>,
}

impl SmtpReply {
    /// Create a new single-line reply
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_owned(),
            message: message.to_owned(),
            multiline: None,
        }
    }

    /// Create a new multiline reply
    pub fn new_multiline(code: &str, message: &str, lines: Vec<String>) -> Self {
        Self {
            code: code.to_owned(),
            message: message.to_owned(),
            multiline: Some(lines),
        }
    }

    /// 220, sent once when the connection opens
    pub fn greeting(hostname: &str, product: &str) -> Self {
        Self::new("220", &format!("{hostname} {product} ready"))
    }

    /// Generic 250
    pub fn ok() -> Self {
        Self::new("250", "2.0.0 OK")
    }

    /// 250 with the destination-address status
    pub fn recipient_ok() -> Self {
        Self::new("250", "2.1.5 OK")
    }

    /// 354, the client may start sending message data
    pub fn data_start() -> Self {
        Self::new("354", "Go ahead")
    }

    pub fn quit() -> Self {
        Self::new("221", "2.0.0 Bye")
    }

    pub fn help() -> Self {
        Self::new(
            "214",
            "2.0.0 Commands: HELO EHLO MAIL RCPT DATA RSET NOOP HELP VRFY EXPN QUIT",
        )
    }

    pub fn cannot_verify() -> Self {
        Self::new(
            "252",
            "2.5.2 Cannot VRFY user, but will accept message and attempt delivery",
        )
    }

    pub fn not_implemented(verb: &str) -> Self {
        Self::new("502", &format!("5.5.1 {verb} not implemented"))
    }

    /// 421, the last read did not produce a usable line
    pub fn try_again() -> Self {
        Self::new("421", "4.4.2 Bad connection, try again")
    }

    /// 453, the server is shutting down and drops the session
    pub fn shutting_down() -> Self {
        Self::new("453", "5.3.2 System not accepting network message")
    }

    /// 451, the client hit the hard error limit
    pub fn too_many_errors() -> Self {
        Self::new("451", "4.7.0 Too many errors from the client")
    }

    /// Format the reply for sending over the wire. Every line but the last
    /// carries `code-`; the last one carries `code `.
    pub fn format(&self) -> String {
        let continuation = self.multiline.as_deref().unwrap_or_default();
        let mut lines = std::iter::once(self.message.as_str())
            .chain(continuation.iter().map(String::as_str))
            .peekable();

        let mut result = String::new();
        while let Some(line) = lines.next() {
            let separator = if lines.peek().is_some() { '-' } else { ' ' };
            result.push_str(&format!("{}{separator}{line}\r\n", self.code));
        }
        result
    }

    /// Whether every wire line, CRLF included, stays within the reply limit
    fn fits_line_limit(&self) -> bool {
        let overhead = self.code.len() + 3;
        std::iter::once(&self.message)
            .chain(self.multiline.iter().flatten())
            .all(|line| line.len() + overhead <= SmtpLimits::REPLY_LINE_MAX_LENGTH)
    }
}

/// Write a reply and flush it. Any failure is a transport error.
pub fn transmit<W: Write>(writer: &mut W, reply: &SmtpReply) -> Result<(), SmtpError> {
    let formatted = if reply.fits_line_limit() {
        reply.format()
    } else {
        SmtpReply::new(&reply.code, "Response too long (truncated)").format()
    };
    writer.write_all(formatted.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write the reply an error maps to, through the same path as [`transmit`]
pub fn transmit_error<W: Write>(writer: &mut W, err: &SmtpError) -> Result<(), SmtpError> {
    transmit(writer, &err.to_reply())
}
