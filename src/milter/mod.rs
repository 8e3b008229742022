//! Mail-filter adapter.
//!
//! [`AddressRewriter`] applies the chain graph to SMTP transactions exposed
//! through the [`MailTransaction`] trait. [`MemoryTransaction`] is a plain
//! in-memory transaction for embedding and tests.

mod mailbox;
mod rewriter;

pub use mailbox::Mailbox;
pub use rewriter::{
    AddressRewriter, Decision, EnvelopeAddress, MailTransaction, HIDDEN_MAIL_NAME,
};

/// Default listen address of the milter endpoint.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:6785";

/// Transaction state held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTransaction {
    pub mail_from: EnvelopeAddress,
    pub recipients: Vec<EnvelopeAddress>,
    /// Headers in message order.
    pub headers: Vec<(String, String)>,
}

impl MemoryTransaction {
    pub fn new(mail_from: EnvelopeAddress, recipients: Vec<EnvelopeAddress>) -> Self {
        Self {
            mail_from,
            recipients,
            headers: Vec::new(),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl MailTransaction for MemoryTransaction {
    fn mail_from(&self) -> EnvelopeAddress {
        self.mail_from.clone()
    }

    fn recipients(&self) -> Vec<EnvelopeAddress> {
        self.recipients.clone()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    fn change_mail_from(&mut self, addr: &str, args: &str) {
        self.mail_from = EnvelopeAddress::new(addr, args);
    }

    fn add_recipient(&mut self, addr: &str, args: &str) {
        self.recipients.push(EnvelopeAddress::new(addr, args));
    }

    fn delete_recipient(&mut self, addr: &str) {
        self.recipients.retain(|r| r.addr != addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transaction_headers() {
        let mut trx = MemoryTransaction::default().with_header("Subject", "hi");
        assert_eq!(trx.header("subject").as_deref(), Some("hi"));
        assert!(trx.header("From").is_none());

        trx.set_header("SUBJECT", "changed");
        trx.set_header("From", "<a@x.org>");
        assert_eq!(trx.headers.len(), 2);
        assert_eq!(trx.headers[0], ("Subject".to_string(), "changed".to_string()));
        assert_eq!(trx.header("from").as_deref(), Some("<a@x.org>"));
    }

    #[test]
    fn test_memory_transaction_recipients() {
        let mut trx = MemoryTransaction::new(
            EnvelopeAddress::new("s@y.com", ""),
            vec![EnvelopeAddress::new("a@x.org", "")],
        );
        trx.add_recipient("b@x.org", "NOTIFY=NEVER");
        trx.delete_recipient("a@x.org");
        trx.change_mail_from("r@x.org", "SIZE=1");
        assert_eq!(
            trx.recipients,
            vec![EnvelopeAddress::new("b@x.org", "NOTIFY=NEVER")]
        );
        assert_eq!(trx.mail_from, EnvelopeAddress::new("r@x.org", "SIZE=1"));
    }
}
