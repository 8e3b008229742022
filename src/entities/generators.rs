//! Alias and reply-alias email generation.

use rand::Rng;

use super::{Email, Hash};
use crate::{OvooError, Result};

/// Generate a random alias `word1-word2-xxx@domain`.
///
/// Words are drawn uniformly from `dict` with the thread-local CSPRNG; `xxx`
/// is the first three hex chars of the hash of the two words. Collisions are
/// possible and left to the store's uniqueness constraint.
pub fn gen_alias(domain: &str, dict: &[String]) -> Result<Email> {
    if domain.is_empty() {
        return Err(OvooError::Validation(
            "domain can not be empty".to_string(),
        ));
    }
    if dict.is_empty() {
        return Err(OvooError::Validation(
            "dictionary can not be empty".to_string(),
        ));
    }

    let mut rng = rand::rng();
    let first = &dict[rng.random_range(0..dict.len())];
    let second = &dict[rng.random_range(0..dict.len())];
    let hash = Hash::new(first, second);

    Ok(Email::from(format!(
        "{first}-{second}-{}@{domain}",
        &hash.as_str()[..3]
    )))
}

/// Derive the reply alias for mail from `sender` to `dest`.
///
/// Deterministic: the same pair always yields the same address. Returns the
/// address and the hash it was built from.
pub fn gen_reply_alias(sender: &Email, dest: &Email, domain: &str) -> Result<(Email, Hash)> {
    sender
        .validate()
        .map_err(|e| OvooError::Validation(format!("invalid sender email: {e}")))?;
    dest.validate()
        .map_err(|e| OvooError::Validation(format!("invalid alias email: {e}")))?;

    let masked_sender = mask_email(sender.as_str());
    let masked_dest = mask_email(dest.as_str());
    let hash = Hash::new(&masked_sender, &masked_dest);
    let h = hash.as_str();

    let email = Email::from(format!(
        "{masked_sender}_{}_{}@{domain}",
        &h[0..10],
        &h[56..64]
    ));
    Ok((email, hash))
}

/// Replace `@` with `_at_` and join the ASCII alphanumeric runs with `_`.
pub fn mask_email(email: &str) -> String {
    email
        .replace('@', "_at_")
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Vec<String> {
        ["amber", "brook", "cedar", "delta"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_gen_alias_shape() {
        let dict = dict();
        for _ in 0..20 {
            let email = gen_alias("x.org", &dict).unwrap();
            assert!(email.validate().is_ok());
            let (local, domain) = email.as_str().split_once('@').unwrap();
            assert_eq!(domain, "x.org");

            let parts: Vec<&str> = local.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert!(dict.iter().any(|w| w == parts[0]));
            assert!(dict.iter().any(|w| w == parts[1]));
            assert_eq!(parts[2], &Hash::new(parts[0], parts[1]).as_str()[..3]);
        }
    }

    #[test]
    fn test_gen_alias_single_word_dictionary() {
        let dict = vec!["solo".to_string()];
        let email = gen_alias("x.org", &dict).unwrap();
        let hash = Hash::new("solo", "solo");
        let suffix = &hash.as_str()[..3];
        assert_eq!(email.as_str(), format!("solo-solo-{suffix}@x.org"));
    }

    #[test]
    fn test_gen_alias_requires_domain_and_dictionary() {
        assert!(matches!(
            gen_alias("", &dict()),
            Err(OvooError::Validation(_))
        ));
        assert!(matches!(
            gen_alias("x.org", &[]),
            Err(OvooError::Validation(_))
        ));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("ext@y.com"), "ext_at_y_com");
        assert_eq!(mask_email("a@x.org"), "a_at_x_org");
        assert_eq!(mask_email("john.doe+tag@mail.example.com"), "john_doe_tag_at_mail_example_com");
    }

    #[test]
    fn test_gen_reply_alias_known_value() {
        let (email, hash) =
            gen_reply_alias(&Email::from("ext@y.com"), &Email::from("a@x.org"), "x.org").unwrap();
        assert_eq!(
            hash.as_str(),
            "36076abf261113c693070f05233cbd217261a305d5538addfee86abeb82d7ede"
        );
        assert_eq!(email.as_str(), "ext_at_y_com_36076abf26_b82d7ede@x.org");
    }

    #[test]
    fn test_gen_reply_alias_deterministic() {
        let s = Email::from("ext@y.com");
        let d = Email::from("a@x.org");
        assert_eq!(
            gen_reply_alias(&s, &d, "x.org").unwrap(),
            gen_reply_alias(&s, &d, "x.org").unwrap()
        );
    }

    #[test]
    fn test_gen_reply_alias_invalid_input() {
        let good = Email::from("a@x.org");
        let bad = Email::from("nope");
        assert!(gen_reply_alias(&bad, &good, "x.org").is_err());
        assert!(gen_reply_alias(&good, &bad, "x.org").is_err());
    }
}
