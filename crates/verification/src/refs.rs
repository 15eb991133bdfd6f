//! Ref-name helpers.
//!
//! Tickets own two families of refs:
//!
//! - `refs/heads/ticket/{id}`: the integration branch of a ticket, also
//!   accepted in its short form `ticket/{id}`;
//! - `refs/tickets/{shard}/{id}/{patchset}`: one patchset proposed for a
//!   ticket, where `shard` is the last two digits of the id. The patchset
//!   segment is required.

use crate::TicketId;

const HEADS_PREFIX: &str = "refs/heads/";
const TICKET_BRANCH_PREFIX: &str = "ticket/";
const TICKET_PATCHSET_PREFIX: &str = "refs/tickets/";

/// Returns the ticket a ref belongs to, if any.
pub fn ticket_id(ref_name: &str) -> Option<TicketId> {
    if let Some(rest) = ref_name.strip_prefix(TICKET_PATCHSET_PREFIX) {
        let mut segments = rest.splitn(3, '/');
        let _shard = segments.next()?;
        let id = segments.next()?;
        let _patchset = segments.next()?;
        return parse_id(id);
    }
    let branch = ref_name.strip_prefix(HEADS_PREFIX).unwrap_or(ref_name);
    branch
        .strip_prefix(TICKET_BRANCH_PREFIX)
        .and_then(parse_id)
}

fn parse_id(segment: &str) -> Option<TicketId> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok().and_then(TicketId::new)
}
