//! One SMTP conversation over one connection

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::smtp::commands::{SmtpCommand, Verb};
use crate::smtp::config::SessionConfig;
use crate::smtp::conversation::Conversation;
use crate::smtp::error::SmtpError;
use crate::smtp::response::{transmit, transmit_error, SmtpReply};
use crate::smtp::shutdown::{SessionGuard, SessionTracker, ShutdownSignal};
use crate::smtp::transport::{LineReader, ReadOutcome, Transport};

/// Whether the read loop keeps going after a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Owns a connection and drives it from greeting to close
pub struct SmtpSession<T: Transport> {
    reader: LineReader<T>,
    config: Arc<SessionConfig>,
    conversation: Conversation,
    shutdown: ShutdownSignal,
    error_count: usize,
    log_prefix: String,
    _registration: SessionGuard,
}

impl<T: Transport> SmtpSession<T> {
    /// Take ownership of `transport` and register with `tracker`. The
    /// registration is released when the session is dropped, which `run`
    /// always does.
    pub fn new(
        transport: T,
        config: Arc<SessionConfig>,
        shutdown: ShutdownSignal,
        tracker: &SessionTracker,
    ) -> Self {
        let registration = tracker.register();
        let log_prefix = format!("[{}]", transport.peer());

        if let Err(e) = transport.set_read_timeout(Some(config.read_timeout)) {
            warn!("{log_prefix} Could not set read timeout: {e}");
        }

        Self {
            reader: LineReader::new(transport, config.max_line_length),
            config,
            conversation: Conversation::new(),
            shutdown,
            error_count: 0,
            log_prefix,
            _registration: registration,
        }
    }

    /// Serve the connection until QUIT, the error limit, a transport error
    /// or shutdown. The transport is closed afterwards in every case.
    pub fn run(mut self) {
        info!("{} Connected", self.log_prefix);

        match self.serve() {
            Ok(()) => info!("{} Disconnected", self.log_prefix),
            Err(e) => error!("{} Session aborted: {e}", self.log_prefix),
        }

        if let Err(e) = self.reader.get_ref().close() {
            debug!("{} Close failed: {e}", self.log_prefix);
        }
    }

    fn serve(&mut self) -> Result<(), SmtpError> {
        let greeting = SmtpReply::greeting(&self.config.hostname, &self.config.product);
        self.send(&greeting)?;

        loop {
            let outcome = self.reader.read_line();

            if self.shutdown.is_raised() {
                info!("{} Server shutting down, dropping session", self.log_prefix);
                return self.send(&SmtpReply::shutting_down());
            }

            let line = match outcome {
                Ok(ReadOutcome::Line(line)) => line,
                Ok(ReadOutcome::Pending) => continue,
                Ok(ReadOutcome::Closed) => {
                    info!("{} Peer closed the connection", self.log_prefix);
                    return Ok(());
                }
                Ok(ReadOutcome::TooLong) => {
                    let err = SmtpError::LineTooLong {
                        max: self.config.max_line_length,
                    };
                    if self.reject(err)? == Flow::Close {
                        return Ok(());
                    }
                    continue;
                }
                Ok(ReadOutcome::Unterminated(fragment)) => {
                    warn!("{} Unterminated line {fragment:?}", self.log_prefix);
                    if self.retry()? == Flow::Close {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => {
                    warn!("{} Read failed: {e}", self.log_prefix);
                    if self.retry()? == Flow::Close {
                        return Ok(());
                    }
                    continue;
                }
            };

            let command = SmtpCommand::new(line);
            debug!("{} C: {:?}", self.log_prefix, command.line());

            let flow = match self.conversation.evaluate(&command) {
                Ok(()) => self.dispatch(&command)?,
                Err(err) => self.reject(err)?,
            };
            if flow == Flow::Close {
                return Ok(());
            }
        }
    }

    fn dispatch(&mut self, command: &SmtpCommand) -> Result<Flow, SmtpError> {
        let reply = match command.verb() {
            Verb::Helo | Verb::Ehlo => {
                debug!("{} Greeted by {}", self.log_prefix, command.argument());
                SmtpReply::ok()
            }
            Verb::Mail => {
                info!(
                    "{} Start mail transaction from <{}>",
                    self.log_prefix,
                    self.conversation.envelope().originator
                );
                SmtpReply::ok()
            }
            Verb::Rcpt => SmtpReply::recipient_ok(),
            Verb::Data => {
                let envelope = self.conversation.envelope();
                info!(
                    "{} Ready for data from <{}> to {:?}",
                    self.log_prefix, envelope.originator, envelope.recipients
                );
                SmtpReply::data_start()
            }
            Verb::Rset | Verb::Noop => SmtpReply::ok(),
            Verb::Help => SmtpReply::help(),
            Verb::Vrfy => SmtpReply::cannot_verify(),
            Verb::Expn => SmtpReply::not_implemented("EXPN"),
            Verb::Quit => {
                info!("{} QUIT", self.log_prefix);
                self.send(&SmtpReply::quit())?;
                return Ok(Flow::Close);
            }
            Verb::Blank => {
                debug!("{} Blank line", self.log_prefix);
                return Ok(Flow::Continue);
            }
            Verb::Unknown => return self.reject(SmtpError::InvalidCommand),
        };

        // Replies to accepted verbs never count toward the error limit
        self.send(&reply)?;
        Ok(Flow::Continue)
    }

    /// Report a recoverable protocol error to the client
    fn reject(&mut self, err: SmtpError) -> Result<Flow, SmtpError> {
        warn!("{} {err}", self.log_prefix);
        transmit_error(self.reader.get_mut(), &err)?;
        self.count_error()
    }

    /// Ask the client to resend after a read that produced no usable line
    fn retry(&mut self) -> Result<Flow, SmtpError> {
        self.send(&SmtpReply::try_again())?;
        self.count_error()
    }

    fn count_error(&mut self) -> Result<Flow, SmtpError> {
        self.error_count += 1;

        let limit = self.config.hard_error_count;
        if limit != 0 && self.error_count >= limit {
            warn!("{} Too many errors, closing connection", self.log_prefix);
            self.send(&SmtpReply::too_many_errors())?;
            return Ok(Flow::Close);
        }
        Ok(Flow::Continue)
    }

    fn send(&mut self, reply: &SmtpReply) -> Result<(), SmtpError> {
        transmit(self.reader.get_mut(), reply)
    }
}
