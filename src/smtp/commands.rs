//! SMTP command lines: verb and argument extraction, per-verb syntax checks
//!
//! Everything here is a pure function of the raw line. Sequencing lives in
//! [`crate::smtp::conversation`].

use lazy_static::lazy_static;
use regex::Regex;

use crate::smtp::error::SmtpError;

/// Protocol line terminator
pub const CRLF: &str = "\r\n";

lazy_static! {
    static ref RX_ANGLE_ARG: Regex = Regex::new("<(.+)>").unwrap();
    static ref RX_MAIL_ADDR: Regex =
        Regex::new(r"[a-zA-Z0-9._-]+@(?:[a-zA-Z0-9._-]+\.)+[a-zA-Z]{2,}").unwrap();
    static ref RX_MAIL_ARG: Regex =
        Regex::new(r"<[a-zA-Z0-9._-]+@(?:[a-zA-Z0-9._-]+\.)+[a-zA-Z]{2,}>").unwrap();
    // Forward-path with an optional source route: <@hop.one,@hop.two:user@domain>
    static ref RX_RCPT_ARG: Regex = Regex::new(
        r"<(?:@(?:[a-zA-Z0-9._-]+\.)+[a-zA-Z]{2,},?)*:?[a-zA-Z0-9._-]+@(?:[a-zA-Z0-9._-]+\.)+[a-zA-Z]{2,}>"
    )
    .unwrap();
}

/// Every verb the session knows how to dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Helo,
    Ehlo,
    /// `MAIL FROM:`
    Mail,
    /// `RCPT TO:`
    Rcpt,
    Data,
    Rset,
    Quit,
    Noop,
    Help,
    Vrfy,
    Expn,
    /// A line consisting of nothing but CRLF
    Blank,
    Unknown,
}

static VERBS: &[(&str, Verb)] = &[
    ("HELO", Verb::Helo),
    ("EHLO", Verb::Ehlo),
    ("MAIL FROM:", Verb::Mail),
    ("RCPT TO:", Verb::Rcpt),
    ("DATA", Verb::Data),
    ("RSET", Verb::Rset),
    ("QUIT", Verb::Quit),
    ("NOOP", Verb::Noop),
    ("HELP", Verb::Help),
    ("VRFY", Verb::Vrfy),
    ("EXPN", Verb::Expn),
];

impl Verb {
    fn from_token(token: &str) -> Self {
        if token == CRLF {
            return Verb::Blank;
        }

        VERBS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|&(_, verb)| verb)
            .unwrap_or(Verb::Unknown)
    }
}

/// One raw command line as received, terminator included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpCommand {
    line: String,
}

impl SmtpCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// The raw line
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The verb token as the client wrote it.
    ///
    /// A four-character line is the token itself. Longer lines are cut after
    /// the first colon (`MAIL FROM:`, `RCPT TO:`) or, lacking one, at the
    /// first space. A bare CRLF yields CRLF; anything else yields "".
    pub fn verb_token(&self) -> &str {
        if self.line == CRLF {
            return CRLF;
        }

        let trimmed = self.line.trim();
        if trimmed.len() == 4 {
            return trimmed;
        }
        if trimmed.len() > 4 {
            return match trimmed.find(':') {
                Some(i) if i > 0 => &trimmed[..=i],
                _ => trimmed.split(' ').next().unwrap_or(""),
            };
        }
        ""
    }

    pub fn verb(&self) -> Verb {
        Verb::from_token(self.verb_token())
    }

    /// Everything after the verb token, trimmed
    pub fn argument(&self) -> &str {
        if self.line == CRLF {
            return "";
        }

        let trimmed = self.line.trim();
        trimmed[self.verb_token().len()..].trim()
    }

    /// First `local@domain` found in the argument, or ""
    pub fn email_address(&self) -> &str {
        RX_MAIL_ADDR
            .find(self.argument())
            .map_or("", |m| m.as_str())
    }

    /// Parameters following the bracketed reverse-path of a MAIL command
    pub fn mail_parameters(&self) -> Option<&str> {
        let argument = self.argument();
        RX_MAIL_ARG
            .find(argument)
            .map(|m| argument[m.end()..].trim())
            .filter(|rest| !rest.is_empty())
    }

    /// The line is non-empty and CRLF-terminated
    pub fn validate_line(&self) -> Result<(), SmtpError> {
        if self.line.is_empty() || !self.line.ends_with(CRLF) {
            return Err(SmtpError::Syntax);
        }
        Ok(())
    }

    /// HELO/EHLO take exactly one token
    pub fn validate_hello(&self) -> Result<(), SmtpError> {
        let argument = self.argument();
        if argument.is_empty() || argument.contains(char::is_whitespace) {
            return Err(SmtpError::InvalidArguments);
        }
        Ok(())
    }

    /// MAIL FROM:<reverse-path>
    pub fn validate_mail(&self) -> Result<(), SmtpError> {
        let argument = self.argument();
        if argument.is_empty() || !RX_ANGLE_ARG.is_match(argument) {
            return Err(SmtpError::Syntax);
        }
        if !RX_MAIL_ARG.is_match(argument) {
            return Err(SmtpError::InvalidArguments);
        }
        Ok(())
    }

    /// RCPT TO:<forward-path>
    pub fn validate_rcpt(&self) -> Result<(), SmtpError> {
        let argument = self.argument();
        if argument.is_empty() || !RX_ANGLE_ARG.is_match(argument) {
            return Err(SmtpError::Syntax);
        }
        if !RX_RCPT_ARG.is_match(argument) {
            return Err(SmtpError::InvalidRecipient);
        }
        Ok(())
    }

    /// DATA, RSET and QUIT take no argument
    pub fn validate_no_argument(&self) -> Result<(), SmtpError> {
        if !self.argument().is_empty() {
            return Err(SmtpError::InvalidArguments);
        }
        Ok(())
    }

    /// VRFY and EXPN need something to look up
    pub fn validate_required_argument(&self) -> Result<(), SmtpError> {
        if self.argument().is_empty() {
            return Err(SmtpError::InvalidArguments);
        }
        Ok(())
    }
}

impl From<&str> for SmtpCommand {
    fn from(line: &str) -> Self {
        Self::new(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_verb() {
        let cases = [
            ("\r\n", Verb::Blank),
            ("DATA\r\n", Verb::Data),
            ("data\r\n", Verb::Data),
            ("rset\r\n", Verb::Rset),
            ("quit\r\n", Verb::Quit),
            ("noop\r\n", Verb::Noop),
            ("EHLO some-string\r\n", Verb::Ehlo),
            ("helo some-string\r\n", Verb::Helo),
            ("NOOP some-string\r\n", Verb::Noop),
            ("HELP some-string\r\n", Verb::Help),
            ("expn some-string\r\n", Verb::Expn),
            ("vrfy some-string\r\n", Verb::Vrfy),
            ("MAIL FROM: some-string\r\n", Verb::Mail),
            ("mail from: some-string\r\n", Verb::Mail),
            ("RCPT TO: some-string\r\n", Verb::Rcpt),
            ("rcpt to: some-string\r\n", Verb::Rcpt),
            ("MAIL some-string\r\n", Verb::Unknown),
            ("BDAT 12 LAST\r\n", Verb::Unknown),
            ("abc\r\n", Verb::Unknown),
            ("   \r\n", Verb::Unknown),
        ];

        for (line, expected) in cases {
            assert_eq!(SmtpCommand::new(line).verb(), expected, "{line:?}");
        }
    }

    #[test]
    fn test_verb_token() {
        assert_eq!(SmtpCommand::new("mail from:<a@b.com>\r\n").verb_token(), "mail from:");
        assert_eq!(SmtpCommand::new("ehlo client\r\n").verb_token(), "ehlo");
        assert_eq!(SmtpCommand::new("\r\n").verb_token(), "\r\n");
        assert_eq!(SmtpCommand::new("ab\r\n").verb_token(), "");
    }

    #[test]
    fn test_argument() {
        let cases = [
            ("\r\n", ""),
            ("EHLO some-string\r\n", "some-string"),
            ("helo some-string\r\n", "some-string"),
            ("NOOP some-string\r\n", "some-string"),
            ("VRFY some-string \r\n", "some-string"),
            ("DATA\r\n", ""),
            (
                "MAIL FROM:<reverse-path> <mail-parameter>\r\n",
                "<reverse-path> <mail-parameter>",
            ),
            (
                "mail from: <reverse-path> <mail-parameter>\r\n",
                "<reverse-path> <mail-parameter>",
            ),
            ("RCPT TO:<c@d.com>\r\n", "<c@d.com>"),
        ];

        for (line, expected) in cases {
            assert_eq!(SmtpCommand::new(line).argument(), expected, "{line:?}");
        }
    }

    #[test]
    fn test_email_address() {
        let cases = [
            ("EHLO ubuntu-trusty\r\n", ""),
            ("MAIL FROM:<some@domain.com>\r\n", "some@domain.com"),
            ("MAIL FROM:<some@domain.com> with-extension\r\n", "some@domain.com"),
            ("MAIL FROM:<some12@sub.domain.com>\r\n", "some12@sub.domain.com"),
            ("MAIL FROM:<some12-ds@sub.domain.com>\r\n", "some12-ds@sub.domain.com"),
            ("MAIL FROM:<some_rods@sub.domain.com>\r\n", "some_rods@sub.domain.com"),
            ("MAIL FROM:<some.anot-her@sub.domain.com>\r\n", "some.anot-her@sub.domain.com"),
            ("RCPT TO:<@hop.example.org:user@d.com>\r\n", "user@d.com"),
        ];

        for (line, expected) in cases {
            assert_eq!(SmtpCommand::new(line).email_address(), expected, "{line:?}");
        }
    }

    #[test]
    fn test_mail_parameters() {
        assert_eq!(
            SmtpCommand::new("MAIL FROM:<a@b.com> SIZE=100 BODY=8BITMIME\r\n").mail_parameters(),
            Some("SIZE=100 BODY=8BITMIME")
        );
        assert_eq!(SmtpCommand::new("MAIL FROM:<a@b.com>\r\n").mail_parameters(), None);
        assert_eq!(SmtpCommand::new("MAIL FROM:<a@b.com>  \r\n").mail_parameters(), None);
    }

    #[test]
    fn test_validate_line() {
        assert!(matches!(SmtpCommand::new("").validate_line(), Err(SmtpError::Syntax)));
        assert!(matches!(SmtpCommand::new("HELLO").validate_line(), Err(SmtpError::Syntax)));
        assert!(matches!(SmtpCommand::new("NOOP\n").validate_line(), Err(SmtpError::Syntax)));
        assert!(SmtpCommand::new("\r\n").validate_line().is_ok());
        assert!(SmtpCommand::new("NOOP\r\n").validate_line().is_ok());
    }

    #[test]
    fn test_validate_hello() {
        for line in ["EHLO mail.domain.com\r\n", "HELO mail.domain.com \r\n"] {
            assert!(SmtpCommand::new(line).validate_hello().is_ok(), "{line:?}");
        }
        for line in [
            "EHLO\r\n",
            "EHLO \r\n",
            "HELO mail.domain.com test\r\n",
            "HELO mail.domain.com test 1 2 3\r\n",
            "EHLO mail.domain.com\ttab\r\n",
        ] {
            assert!(
                matches!(SmtpCommand::new(line).validate_hello(), Err(SmtpError::InvalidArguments)),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_validate_mail() {
        for line in [
            "MAIL FROM:<some@valid.email.com>\r\n",
            "MAIL FROM: <some@valid.email.com>\r\n",
            "MAIL FROM:<some@valid.email.com> SIZE=1000\r\n",
        ] {
            assert!(SmtpCommand::new(line).validate_mail().is_ok(), "{line:?}");
        }
        for line in [
            "MAIL FROM:\r\n",
            "MAIL FROM: \r\n",
            "MAIL FROM: some invalid argument\r\n",
            "MAIL FROM: some@valid.email.com\r\n",
            "MAIL FROM:<>\r\n",
        ] {
            assert!(
                matches!(SmtpCommand::new(line).validate_mail(), Err(SmtpError::Syntax)),
                "{line:?}"
            );
        }
        assert!(matches!(
            SmtpCommand::new("MAIL FROM:<invalid-email>\r\n").validate_mail(),
            Err(SmtpError::InvalidArguments)
        ));
    }

    #[test]
    fn test_validate_rcpt() {
        for line in [
            "RCPT TO:<user@sub.example.com>\r\n",
            "RCPT TO: <user@example.com>\r\n",
            "RCPT TO:<@hop.example.org:user@example.com>\r\n",
            "RCPT TO:<@one.example.org,@two.example.net:user@example.com>\r\n",
        ] {
            assert!(SmtpCommand::new(line).validate_rcpt().is_ok(), "{line:?}");
        }
        for line in ["RCPT TO:\r\n", "RCPT TO: \r\n", "RCPT TO: forward-path\r\n"] {
            assert!(
                matches!(SmtpCommand::new(line).validate_rcpt(), Err(SmtpError::Syntax)),
                "{line:?}"
            );
        }
        for line in ["RCPT TO:<forward-path>\r\n", "RCPT TO:<user@localhost>\r\n"] {
            assert!(
                matches!(SmtpCommand::new(line).validate_rcpt(), Err(SmtpError::InvalidRecipient)),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_validate_no_argument() {
        for line in ["DATA\r\n", "DATA \r\n", "RSET\r\n", "QUIT \r\n"] {
            assert!(SmtpCommand::new(line).validate_no_argument().is_ok(), "{line:?}");
        }
        for line in ["DATA argument\r\n", "RSET some argument \r\n", "QUIT argument\r\n"] {
            assert!(
                matches!(
                    SmtpCommand::new(line).validate_no_argument(),
                    Err(SmtpError::InvalidArguments)
                ),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_validate_required_argument() {
        assert!(SmtpCommand::new("VRFY mail.domain.com\r\n").validate_required_argument().is_ok());
        assert!(SmtpCommand::new("EXPN list \r\n").validate_required_argument().is_ok());
        for line in ["VRFY\r\n", "VRFY \r\n", "EXPN\r\n", "EXPN \r\n"] {
            assert!(
                matches!(
                    SmtpCommand::new(line).validate_required_argument(),
                    Err(SmtpError::InvalidArguments)
                ),
                "{line:?}"
            );
        }
    }

    #[test]
    fn test_recipient_round_trip() {
        let command = SmtpCommand::new("RCPT TO:<user@sub.example.com>\r\n");
        assert!(command.validate_rcpt().is_ok());
        assert_eq!(command.email_address(), "user@sub.example.com");
    }

    proptest! {
        #[test]
        fn unterminated_lines_are_syntax_errors(line in "[ -~]{1,80}") {
            let result = SmtpCommand::new(line).validate_line();
            prop_assert!(matches!(result, Err(SmtpError::Syntax)));
        }

        #[test]
        fn greeting_argument_with_inner_whitespace_is_rejected(
            verb in "[hH][eE][lL][oO]|[eE][hH][lL][oO]",
            first in "[a-z0-9.-]{1,20}",
            gap in "[ \t]{1,3}",
            second in "[a-z0-9.-]{1,20}",
        ) {
            let command = SmtpCommand::new(format!("{verb} {first}{gap}{second}\r\n"));
            prop_assert!(matches!(command.validate_hello(), Err(SmtpError::InvalidArguments)));
        }

        #[test]
        fn parsing_is_pure(line in "[ -~]{0,60}(\r\n)?") {
            let command = SmtpCommand::new(line);
            prop_assert_eq!(command.verb(), command.verb());
            prop_assert_eq!(command.argument(), command.argument());
            prop_assert_eq!(command.email_address(), command.email_address());
        }
    }
}
