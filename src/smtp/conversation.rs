//! Command sequencing for one SMTP conversation

use std::mem;

use crate::smtp::commands::{SmtpCommand, Verb};
use crate::smtp::envelope::Envelope;
use crate::smtp::error::{Precondition, SmtpError};

/// Sequencing flags.
///
/// They form a chain: `sender_set` implies `greeted`, `recipient_set`
/// implies `sender_set`, and DATA needs both of the latter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// HELO/EHLO succeeded
    pub greeted: bool,
    /// MAIL succeeded in the current transaction
    pub sender_set: bool,
    /// At least one RCPT succeeded in the current transaction
    pub recipient_set: bool,
}

/// Sequencing flags plus the envelope they guard
#[derive(Debug, Default)]
pub struct Conversation {
    state: ConversationState,
    envelope: Envelope,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Decide whether `command` is legal now, and apply its effect on the
    /// flags and the envelope if it is.
    ///
    /// Nothing is mutated when an error is returned.
    pub fn evaluate(&mut self, command: &SmtpCommand) -> Result<(), SmtpError> {
        command.validate_line()?;

        match command.verb() {
            Verb::Helo | Verb::Ehlo => {
                command.validate_hello()?;
                self.state.greeted = true;
            }
            Verb::Mail => {
                self.require(self.state.greeted, Precondition::Greeting)?;
                command.validate_mail()?;
                self.envelope
                    .set_originator(command.email_address(), command.mail_parameters());
                self.state.sender_set = true;
            }
            Verb::Rcpt => {
                self.require(self.state.greeted, Precondition::Greeting)?;
                self.require(self.state.sender_set, Precondition::Sender)?;
                command.validate_rcpt()?;
                self.envelope.add_recipient(command.email_address());
                self.state.recipient_set = true;
            }
            Verb::Data => {
                self.require(self.state.greeted, Precondition::Greeting)?;
                self.require(self.state.sender_set, Precondition::Sender)?;
                self.require(self.state.recipient_set, Precondition::Recipient)?;
                command.validate_no_argument()?;
            }
            Verb::Rset => {
                command.validate_no_argument()?;
                self.reset_transaction();
            }
            Verb::Quit => command.validate_no_argument()?,
            Verb::Vrfy | Verb::Expn => command.validate_required_argument()?,
            Verb::Noop | Verb::Help | Verb::Blank | Verb::Unknown => {}
        }

        Ok(())
    }

    /// Drop the current mail transaction. The greeting stays in effect.
    ///
    /// Returns the envelope that was being built.
    pub fn reset_transaction(&mut self) -> Envelope {
        self.state.sender_set = false;
        self.state.recipient_set = false;
        mem::take(&mut self.envelope)
    }

    fn require(&self, satisfied: bool, precondition: Precondition) -> Result<(), SmtpError> {
        if satisfied {
            Ok(())
        } else {
            Err(SmtpError::BadSequence(precondition))
        }
    }
}
