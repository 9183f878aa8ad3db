//! The byte stream a session runs over, and line framing on top of it

use std::io::{self, BufRead, BufReader, Read, Write};
use std::mem;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// A connected peer: a blocking byte stream with a read deadline
pub trait Transport: Read + Write + Send {
    /// Bound every following read to `timeout`
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Close both directions
    fn close(&self) -> io::Result<()>;

    /// Label used in log lines
    fn peer(&self) -> String;
}

impl Transport for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn close(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }

    fn peer(&self) -> String {
        self.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_owned())
    }
}

/// Result of one read attempt
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A full line, LF included
    Line(String),
    /// The deadline passed before a full line arrived. Partial input is kept.
    Pending,
    /// The stream ended in the middle of a line
    Unterminated(String),
    /// The line outgrew the limit; the rest of it will be skipped
    TooLong,
    /// The stream ended cleanly
    Closed,
}

/// Splits a transport into LF-terminated lines of bounded length
#[derive(Debug)]
pub struct LineReader<T> {
    inner: BufReader<T>,
    pending: Vec<u8>,
    max_line_length: usize,
    discarding: bool,
}

impl<T: Transport> LineReader<T> {
    pub fn new(transport: T, max_line_length: usize) -> Self {
        Self {
            inner: BufReader::new(transport),
            pending: Vec::new(),
            max_line_length: max_line_length.max(1),
            discarding: false,
        }
    }

    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// The transport, for writing replies
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    pub fn read_line(&mut self) -> io::Result<ReadOutcome> {
        let limit = self.max_line_length.saturating_sub(self.pending.len()) as u64;
        let read = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.pending);

        match read {
            Ok(_) if self.pending.ends_with(b"\n") => {
                let line = mem::take(&mut self.pending);
                if mem::replace(&mut self.discarding, false) {
                    return Ok(ReadOutcome::Pending);
                }
                Ok(ReadOutcome::Line(decode(line)))
            }
            Ok(_) if self.pending.len() >= self.max_line_length => {
                self.pending.clear();
                if mem::replace(&mut self.discarding, true) {
                    return Ok(ReadOutcome::Pending);
                }
                Ok(ReadOutcome::TooLong)
            }
            Ok(_) if self.pending.is_empty() => Ok(ReadOutcome::Closed),
            Ok(_) => {
                let fragment = mem::take(&mut self.pending);
                self.discarding = false;
                Ok(ReadOutcome::Unterminated(decode(fragment)))
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(ReadOutcome::Pending)
            }
            Err(e) => Err(e),
        }
    }
}

fn decode(bytes: Vec<u8>) -> String {
    // Replace invalid UTF-8 sequences with the replacement character
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
