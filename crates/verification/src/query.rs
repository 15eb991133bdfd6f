//! Canonical query-string encoding for the notify-commit call.
//!
//! Parameters are kept in an ordered list so the encoded string is identical
//! for identical inputs. The order is:
//!
//! | # | Key | Value |
//! |---|-----|-------|
//! | 1 | `repository` | [`TriggerContext::repository`] |
//! | 2 | `job` | [`TriggerContext::job`] |
//! | 3 | `branch` | [`TriggerContext::target_ref`] |
//! | 4 | `user` | [`TriggerContext::acting_user`] |
//! | 5 | `lastCommit` | [`TriggerContext::last_commit`] |
//! | 6 | `ticketTitle` | [`TicketMetadata::title`] (ticket only) |
//! | 7 | `ticketTopic` | [`TicketMetadata::topic`] (ticket only) |
//! | 8 | `ticketType` | [`TicketMetadata::ticket_type`] (ticket only) |
//! | 9 | `ticketPriority` | [`TicketMetadata::priority`] (ticket only) |
//!
//! An absent value is sent as the literal string `null`.

use crate::{TicketMetadata, TriggerContext};

/// Placeholder sent for a parameter that has no value.
pub const NULL_VALUE: &str = "null";

/// Ordered `(key, value)` parameters of one notify-commit call.
///
/// Values are stored raw; [`QueryParameters::encode`] percent-encodes them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParameters {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParameters {
    /// Collects the parameters for `context` and, when present, `ticket`.
    pub fn from_context(context: &TriggerContext, ticket: Option<&TicketMetadata>) -> Self {
        let mut params = Self::default();
        params.push("repository", Some(context.repository.as_str()));
        params.push("job", Some(context.job.as_str()));
        params.push("branch", Some(context.target_ref.as_str()));
        params.push("user", context.acting_user.as_ref().map(|u| u.as_str()));
        params.push("lastCommit", Some(context.last_commit.as_str()));

        if let Some(ticket) = ticket {
            params.push("ticketTitle", ticket.title.as_deref());
            params.push("ticketTopic", ticket.topic.as_deref());
            params.push("ticketType", Some(ticket.ticket_type.as_str()));
            params.push("ticketPriority", Some(ticket.priority.as_str()));
        }
        params
    }

    fn push(&mut self, key: &'static str, value: Option<&str>) {
        self.pairs.push((key, value.unwrap_or(NULL_VALUE).to_string()));
    }

    /// Returns the raw `(key, value)` pairs in order.
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Returns `true` if a parameter named `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| *k == key)
    }

    /// Joins the pairs as `key=value` with `&`, percent-encoding every value.
    ///
    /// Only RFC 3986 unreserved characters are left as-is, so `/`, `&`, `=`,
    /// `+` and spaces inside values can never be confused with delimiters.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Encodes the notify-commit query string for `context` and optional `ticket`.
///
/// Total: every input produces a string, with no trailing `&`.
pub fn encode(context: &TriggerContext, ticket: Option<&TicketMetadata>) -> String {
    QueryParameters::from_context(context, ticket).encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommitSha, JobName, RefName, RepositoryName, TicketPriority, TicketType, UserName};
    use pretty_assertions::assert_eq;

    fn context(user: Option<&str>) -> TriggerContext {
        TriggerContext {
            repository: RepositoryName::new("repo1").unwrap(),
            job: JobName::new("job1").unwrap(),
            target_ref: RefName::new("refs/heads/main").unwrap(),
            last_commit: CommitSha::new("abcd1234").unwrap(),
            acting_user: user.map(|u| UserName::new(u).unwrap()),
        }
    }

    fn decode(query: &str) -> Vec<(String, String)> {
        query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (k.to_string(), urlencoding::decode(v).unwrap().into_owned())
            })
            .collect()
    }

    #[test]
    fn test_encode_without_ticket_matches_golden_output() {
        assert_eq!(
            encode(&context(Some("alice")), None),
            "repository=repo1&job=job1&branch=refs%2Fheads%2Fmain&user=alice&lastCommit=abcd1234"
        );
    }

    #[test]
    fn test_encode_without_ticket_has_no_ticket_keys() {
        let params = QueryParameters::from_context(&context(Some("alice")), None);
        for key in ["ticketTitle", "ticketTopic", "ticketType", "ticketPriority"] {
            assert!(!params.contains(key), "unexpected key {key}");
        }
        assert!(!params.encode().contains("ticket"));
    }

    #[test]
    fn test_encode_with_ticket_appends_ticket_fields_in_order() {
        let ticket = TicketMetadata {
            title: Some("Fix crash & burn".to_string()),
            topic: None,
            ticket_type: TicketType::Bug,
            priority: TicketPriority::High,
        };
        let query = encode(&context(Some("alice")), Some(&ticket));
        assert_eq!(
            query,
            "repository=repo1&job=job1&branch=refs%2Fheads%2Fmain&user=alice&lastCommit=abcd1234\
             &ticketTitle=Fix%20crash%20%26%20burn&ticketTopic=null&ticketType=bug&ticketPriority=high"
        );
    }

    #[test]
    fn test_ticket_does_not_change_base_fields() {
        let ticket = TicketMetadata {
            title: None,
            topic: None,
            ticket_type: TicketType::Task,
            priority: TicketPriority::Low,
        };
        let without = encode(&context(Some("alice")), None);
        let with = encode(&context(Some("alice")), Some(&ticket));
        assert!(with.starts_with(&format!("{without}&")));
    }

    #[test]
    fn test_missing_user_is_sent_as_null_literal() {
        let decoded = decode(&encode(&context(None), None));
        assert_eq!(decoded[3], ("user".to_string(), "null".to_string()));
    }

    #[test]
    fn test_decoding_recovers_original_values() {
        let ticket = TicketMetadata {
            title: Some("naïve 100% = done?/#".to_string()),
            topic: Some("a+b c".to_string()),
            ticket_type: TicketType::Enhancement,
            priority: TicketPriority::Normal,
        };
        let ctx = context(Some("o'brien@corp"));
        let query = encode(&ctx, Some(&ticket));

        assert!(!query.ends_with('&'));
        let decoded = decode(&query);
        let expected: Vec<(String, String)> = QueryParameters::from_context(&ctx, Some(&ticket))
            .pairs()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        assert_eq!(decoded, expected);
        assert_eq!(decoded[5].1, "naïve 100% = done?/#");
    }
}
