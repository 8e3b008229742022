//! Header mailbox parsing (`"Display Name" <user@example.com>`).

use std::fmt;

use crate::entities::Email;
use crate::{OvooError, Result};

/// A single mailbox as found in `From` and `To` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name, empty when absent.
    pub name: String,
    pub address: Email,
}

impl Mailbox {
    pub fn new(name: impl Into<String>, address: impl Into<Email>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Parse `addr`, `<addr>`, `Name <addr>` or `"Quoted Name" <addr>`.
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();
        if header.is_empty() {
            return Err(OvooError::Validation("empty mailbox".to_string()));
        }

        let (name, address) = match header.rfind('<') {
            Some(open) => {
                let rest = &header[open + 1..];
                let close = rest.find('>').ok_or_else(|| {
                    OvooError::Validation(format!("unterminated angle address in '{header}'"))
                })?;
                if !rest[close + 1..].trim().is_empty() {
                    return Err(OvooError::Validation(format!(
                        "unexpected text after address in '{header}'"
                    )));
                }
                (unquote(header[..open].trim())?, rest[..close].trim())
            }
            None => (String::new(), header),
        };

        let address = Email::from(address);
        address
            .validate()
            .map_err(|e| OvooError::Validation(format!("parsing mailbox: {e}")))?;
        Ok(Self { name, address })
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            return write!(f, "<{}>", self.address);
        }
        f.write_str("\"")?;
        for c in self.name.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "\" <{}>", self.address)
    }
}

/// Strip surrounding double quotes and resolve backslash escapes.
fn unquote(name: &str) -> Result<String> {
    let Some(inner) = name.strip_prefix('"') else {
        return Ok(name.to_string());
    };
    let inner = inner
        .strip_suffix('"')
        .ok_or_else(|| OvooError::Validation(format!("unterminated quoted name {name}")))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
