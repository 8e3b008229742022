//! Address rewriting for mail passing through the relay.
//!
//! The milter protocol itself lives outside this crate. A protocol
//! implementation exposes each SMTP transaction as a [`MailTransaction`] and
//! lets [`AddressRewriter`] decide what to do with it.

use tracing::{debug, info, warn};

use super::Mailbox;
use crate::db::TransactionalStore;
use crate::entities::{AddressKind, Chain, User};
use crate::services::ChainService;
use crate::{OvooError, Result};

/// Display name put on the `To` header of mail delivered to a protected
/// address.
pub const HIDDEN_MAIL_NAME: &str = "Ovoo Hidden Mail";

/// Envelope address with its ESMTP arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeAddress {
    pub addr: String,
    pub args: String,
}

impl EnvelopeAddress {
    pub fn new(addr: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            args: args.into(),
        }
    }
}

/// One SMTP transaction as seen by a mail filter.
pub trait MailTransaction {
    /// Envelope sender (`MAIL FROM`).
    fn mail_from(&self) -> EnvelopeAddress;

    /// Envelope recipients (`RCPT TO`).
    fn recipients(&self) -> Vec<EnvelopeAddress>;

    /// First value of a header, matched case-insensitively.
    fn header(&self, name: &str) -> Option<String>;

    /// Replace a header value.
    fn set_header(&mut self, name: &str, value: &str);

    fn change_mail_from(&mut self, addr: &str, args: &str);

    fn add_recipient(&mut self, addr: &str, args: &str);

    fn delete_recipient(&mut self, addr: &str);
}

/// Verdict on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Rewrites sender and recipients of relay-domain mail according to the
/// chain graph.
#[derive(Debug, Clone)]
pub struct AddressRewriter<S> {
    domain: String,
    actor: User,
    chains: ChainService<S>,
}

impl<S: TransactionalStore> AddressRewriter<S> {
    /// `actor` is the account chains are created as, normally a Milter user.
    pub fn new(chains: ChainService<S>, actor: User) -> Self {
        Self {
            domain: chains.domain().to_lowercase(),
            actor,
            chains,
        }
    }

    /// Rewrite `trx` in place. Any failure rejects the whole transaction.
    pub async fn rewrite<T: MailTransaction + Send>(&self, trx: &mut T) -> Decision {
        match self.try_rewrite(trx).await {
            Ok(()) => Decision::Accept,
            Err(e) => {
                warn!(error = %e, "rejecting mail transaction");
                Decision::Reject
            }
        }
    }

    async fn try_rewrite<T: MailTransaction + Send>(&self, trx: &mut T) -> Result<()> {
        let from_header = trx
            .header("From")
            .ok_or_else(|| OvooError::Validation("missing From header".to_string()))?;
        let current_from = Mailbox::parse(&from_header)?;

        let mail_from = trx.mail_from();
        for rcpt in trx.recipients() {
            if !self.is_relay_address(&rcpt.addr) {
                debug!(recipient = %rcpt.addr, "recipient outside relay domain, skipping");
                continue;
            }

            let chain = self
                .chains
                .create(&self.actor, &mail_from.addr, &rcpt.addr, None)
                .await?;
            let (new_from, new_to) = rewritten_headers(&chain, &current_from, &rcpt.addr);

            info!(
                from_orig = %mail_from.addr,
                from_changed = %chain.from_address.email,
                to_orig = %rcpt.addr,
                to_changed = %chain.to_address.email,
                "rewrote addresses"
            );

            trx.delete_recipient(&rcpt.addr);
            trx.add_recipient(chain.to_address.email.as_str(), &rcpt.args);
            trx.change_mail_from(chain.from_address.email.as_str(), &mail_from.args);
            trx.set_header("From", &new_from.to_string());
            trx.set_header("To", &new_to.to_string());
        }

        Ok(())
    }

    fn is_relay_address(&self, addr: &str) -> bool {
        addr.rsplit_once('@')
            .is_some_and(|(_, domain)| domain.to_lowercase() == self.domain)
    }
}

/// New `From` and `To` headers for a message travelling along `chain`.
///
/// Replies leave with bare addresses. Inbound mail keeps the sender's display
/// name and shows the alias it was sent to.
fn rewritten_headers(
    chain: &Chain,
    current_from: &Mailbox,
    recipient: &str,
) -> (Mailbox, Mailbox) {
    if chain.orig_to_address.kind == AddressKind::ReplyAlias {
        (
            Mailbox::new("", chain.from_address.email.clone()),
            Mailbox::new("", chain.to_address.email.clone()),
        )
    } else {
        (
            Mailbox::new(current_from.name.clone(), chain.from_address.email.clone()),
            Mailbox::new(HIDDEN_MAIL_NAME, recipient),
        )
    }
}
