//! Mail transaction envelope

/// Sender and recipients accumulated over one mail transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// The reverse-path address, empty until MAIL succeeds
    pub originator: String,

    /// Forward-path addresses in the order they were accepted
    pub recipients: Vec<String>,

    /// Parameters that followed the reverse-path, if any
    pub extension: Option<String>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the sender, replacing any earlier one
    pub fn set_originator(&mut self, address: &str, extension: Option<&str>) {
        self.originator = address.to_owned();
        self.extension = extension.map(str::to_owned);
    }

    /// Append a recipient. Duplicates are kept.
    pub fn add_recipient(&mut self, address: &str) {
        self.recipients.push(address.to_owned());
    }

    pub fn is_empty(&self) -> bool {
        self.originator.is_empty() && self.recipients.is_empty() && self.extension.is_none()
    }
}
