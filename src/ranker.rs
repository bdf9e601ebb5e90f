//! Ordering of cached hosts, most relevant first.
//!
//! The order is a chain of rules. Each rule returns [`Ordering::Less`] when `a`
//! ranks above `b`; the first rule that is not `Equal` decides.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::record::{Record, NEVER_USED_AT};

pub type Rule = fn(&Record, &Record) -> Ordering;

pub const RULES: [Rule; 3] = [by_recency, by_use_count, by_alias];

pub fn compare(a: &Record, b: &Record) -> Ordering {
    RULES
        .iter()
        .map(|rule| rule(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

pub fn ranks_above(a: &Record, b: &Record) -> bool {
    compare(a, b) == Ordering::Less
}

pub fn sort(records: &mut [Record]) {
    records.sort_by(compare);
}

/// Most recently used first. Garbage timestamps sink below every valid one.
pub fn by_recency(a: &Record, b: &Record) -> Ordering {
    recency(b).cmp(&recency(a))
}

pub fn by_use_count(a: &Record, b: &Record) -> Ordering {
    b.use_count.cmp(&a.use_count)
}

pub fn by_alias(a: &Record, b: &Record) -> Ordering {
    a.alias.cmp(&b.alias)
}

// `None` is the unparsable case and orders below every `Some`.
fn recency(record: &Record) -> Option<NaiveDateTime> {
    match record.last_used() {
        Some(parsed) => parsed.ok(),
        None => Some(*NEVER_USED_AT),
    }
}
