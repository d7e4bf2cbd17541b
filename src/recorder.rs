//! Coalesces bursts of raw edits into single history entries.
//!
//! Each edit target (one property on one element, or the document code)
//! has at most one open session. Every raw change pushes the session's
//! deadline out by the debounce delay; once the deadline passes the
//! session closes and yields one change from the value it started at to
//! the value it ended at. A burst that ends where it began yields nothing.
//!
//! The recorder never reads a clock itself. Callers pass `now`, which keeps
//! it usable from any event loop and deterministic under test.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::context::TemplateSource;
use crate::pending::ElementId;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// A settled burst, ready to become a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedChange {
    Property {
        element_id: ElementId,
        property: String,
        old_value: String,
        new_value: String,
        element_snapshot: String,
    },
    Code {
        old_source: TemplateSource,
        new_source: TemplateSource,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PropertyKey {
    element_id: ElementId,
    property: String,
}

#[derive(Debug)]
struct Session<T> {
    baseline: T,
    latest: T,
    deadline: Instant,
    /// Order the burst started in, breaks deadline ties
    seq: u64,
}

impl<T: PartialEq> Session<T> {
    fn new(baseline: T, latest: T, deadline: Instant, seq: u64) -> Self {
        Self { baseline, latest, deadline, seq }
    }

    fn changed(&self) -> bool {
        self.baseline != self.latest
    }
}

#[derive(Debug)]
pub struct DebouncedChangeRecorder {
    delay: Duration,
    properties: HashMap<PropertyKey, (Session<String>, String)>,
    code: Option<Session<TemplateSource>>,
    next_seq: u64,
}

impl Default for DebouncedChangeRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl DebouncedChangeRecorder {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            properties: HashMap::new(),
            code: None,
            next_seq: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Note a raw property change. `before` only matters for the first
    /// change of a burst; `element_snapshot` is kept from that change too.
    pub fn note_property(
        &mut self,
        element_id: &ElementId,
        property: &str,
        before: &str,
        after: &str,
        element_snapshot: &str,
        now: Instant,
    ) {
        let key = PropertyKey { element_id: element_id.clone(), property: property.to_string() };
        let deadline = now + self.delay;
        match self.properties.get_mut(&key) {
            Some((session, _)) => {
                session.latest = after.to_string();
                session.deadline = deadline;
            }
            None => {
                let seq = self.bump_seq();
                let session = Session::new(before.to_string(), after.to_string(), deadline, seq);
                self.properties.insert(key, (session, element_snapshot.to_string()));
            }
        }
    }

    /// Note a raw change to the document source
    pub fn note_code(&mut self, before: &TemplateSource, after: TemplateSource, now: Instant) {
        let deadline = now + self.delay;
        match self.code.as_mut() {
            Some(session) => {
                session.latest = after;
                session.deadline = deadline;
            }
            None => {
                let seq = self.bump_seq();
                self.code = Some(Session::new(before.clone(), after, deadline, seq));
            }
        }
    }

    /// Close every session whose deadline has passed
    pub fn poll(&mut self, now: Instant) -> Vec<RecordedChange> {
        self.close_where(|deadline| deadline <= now)
    }

    /// Close every open session regardless of deadline
    pub fn flush(&mut self) -> Vec<RecordedChange> {
        self.close_where(|_| true)
    }

    /// Drop all open sessions without recording anything
    pub fn cancel_all(&mut self) {
        self.properties.clear();
        self.code = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.properties
            .values()
            .map(|(s, _)| s.deadline)
            .chain(self.code.as_ref().map(|s| s.deadline))
            .min()
    }

    pub fn is_idle(&self) -> bool {
        self.properties.is_empty() && self.code.is_none()
    }

    /// Value the open burst on this property started from
    pub fn baseline(&self, element_id: &ElementId, property: &str) -> Option<&str> {
        let key = PropertyKey { element_id: element_id.clone(), property: property.to_string() };
        self.properties.get(&key).map(|(s, _)| s.baseline.as_str())
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn close_where(&mut self, due: impl Fn(Instant) -> bool) -> Vec<RecordedChange> {
        let mut closed: Vec<(Instant, u64, Option<RecordedChange>)> = Vec::new();

        let due_keys: Vec<PropertyKey> = self
            .properties
            .iter()
            .filter(|(_, (s, _))| due(s.deadline))
            .map(|(k, _)| k.clone())
            .collect();
        for key in due_keys {
            let Some((session, element_snapshot)) = self.properties.remove(&key) else {
                continue;
            };
            let change = session.changed().then(|| RecordedChange::Property {
                element_id: key.element_id.clone(),
                property: key.property.clone(),
                old_value: session.baseline.clone(),
                new_value: session.latest.clone(),
                element_snapshot,
            });
            if change.is_none() {
                debug!(element_id = %key.element_id, property = %key.property, "burst reverted, nothing recorded");
            }
            closed.push((session.deadline, session.seq, change));
        }

        if self.code.as_ref().is_some_and(|s| due(s.deadline)) {
            if let Some(session) = self.code.take() {
                let change = session.changed().then(|| RecordedChange::Code {
                    old_source: session.baseline.clone(),
                    new_source: session.latest.clone(),
                });
                if change.is_none() {
                    debug!("code burst reverted, nothing recorded");
                }
                closed.push((session.deadline, session.seq, change));
            }
        }

        closed.sort_by_key(|(deadline, seq, _)| (*deadline, *seq));
        closed.into_iter().filter_map(|(_, _, change)| change).collect()
    }
}
