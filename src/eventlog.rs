//! Event-log mapping and de-duplication.
//!
//! The lock keeps its log in a ring buffer and every fetch returns the
//! most recent `N` records, so consecutive fetches overlap.  Records are
//! sorted by index, mapped into [`LogEvent`]s and forwarded only when
//! their index is above the [`LogCursor`] watermark.  Records at or below
//! the watermark still feed the last-actor cache.

use serde::Serialize;

use crate::lock::model::{LogTimestamp, MAX_NAME_LEN};
use crate::lock::{AuthEntry, CompletionStatus, LockAction, LoggingType, Named, RawLogEntry, Trigger};

/// Upper bound for one log fetch.
pub const MAX_FETCH: u8 = 10;

/// Upper bound for the authorization cache.
pub const MAX_AUTH_ENTRIES: usize = 10;

/// Actor name used when neither the record nor the cache names anyone.
pub const FALLBACK_ACTOR: &str = "Manual";

type Name = heapless::String<MAX_NAME_LEN>;

// ---------------------------------------------------------------------------
// Authorization cache
// ---------------------------------------------------------------------------

/// Names of the lock's authorizations, replaced wholesale on each refresh.
#[derive(Debug, Clone, Default)]
pub struct AuthCache {
    entries: heapless::Vec<AuthEntry, MAX_AUTH_ENTRIES>,
}

impl AuthCache {
    pub fn replace(&mut self, entries: impl IntoIterator<Item = AuthEntry>) {
        self.entries.clear();
        for e in entries {
            if self.entries.push(e).is_err() {
                log::warn!("AuthCache: more than {} entries, rest ignored", MAX_AUTH_ENTRIES);
                break;
            }
        }
    }

    pub fn name_of(&self, auth_id: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.auth_id == auth_id)
            .map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Mapped records
// ---------------------------------------------------------------------------

/// Door sensor transition recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorEvent {
    Opened,
    Closed,
    SensorJammed,
    Unknown,
}

impl DoorEvent {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Opened,
            1 => Self::Closed,
            2 => Self::SensorJammed,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Opened => "DoorOpened",
            Self::Closed => "DoorClosed",
            Self::SensorJammed => "SensorJammed",
            Self::Unknown => "Unknown",
        }
    }
}

/// Type-specific fields of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDetail {
    LockAction {
        action: LockAction,
        trigger: Trigger,
        completion: CompletionStatus,
    },
    KeypadAction {
        action: LockAction,
        completion: CompletionStatus,
        code_id: u16,
    },
    DoorSensor(DoorEvent),
    Other,
}

impl LogDetail {
    /// Decode `data` according to the record type.
    ///
    /// | type          | data[0] | data[1] | data[2]    | data[3]     | data[4]  |
    /// |---------------|---------|---------|------------|-------------|----------|
    /// | LockAction    | action  | trigger |            | completion  |          |
    /// | KeypadAction  | action  |         | completion | code id lo  | code id hi |
    /// | DoorSensor    | event   |         |            |             |          |
    pub fn decode(kind: LoggingType, data: &[u8; 5]) -> Self {
        match kind {
            LoggingType::LockAction => Self::LockAction {
                action: LockAction::from_raw(data[0]),
                trigger: Trigger::from_raw(data[1]),
                completion: CompletionStatus::from_raw(data[3]),
            },
            LoggingType::KeypadAction => Self::KeypadAction {
                action: LockAction::from_raw(data[0]),
                completion: CompletionStatus::from_raw(data[2]),
                code_id: u16::from_le_bytes([data[3], data[4]]),
            },
            LoggingType::DoorSensor => Self::DoorSensor(DoorEvent::from_raw(data[0])),
            _ => Self::Other,
        }
    }

    fn is_actor_action(&self) -> bool {
        matches!(self, Self::LockAction { .. } | Self::KeypadAction { .. })
    }
}

/// A structured, forwardable log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub index: u32,
    pub auth_id: u32,
    pub authorization_name: Name,
    pub timestamp: LogTimestamp,
    pub kind: LoggingType,
    pub detail: LogDetail,
}

/// Who last operated the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub auth_id: u32,
    pub name: Name,
}

/// JSON shape handed to the home-automation layer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord<'a> {
    index: u32,
    auth_id: u32,
    authorization_name: &'a str,
    time_year: u16,
    time_month: u8,
    time_day: u8,
    time_hour: u8,
    time_minute: u8,
    time_second: u8,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_id: Option<u16>,
}

impl LogEvent {
    /// Render as a single-line JSON object.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let (action, trigger, completion_status, code_id) = match self.detail {
            LogDetail::LockAction {
                action,
                trigger,
                completion,
            } => (Some(action.name()), Some(trigger.name()), Some(completion.name()), None),
            LogDetail::KeypadAction {
                action,
                completion,
                code_id,
            } => (Some(action.name()), None, Some(completion.name()), Some(code_id)),
            LogDetail::DoorSensor(ev) => (Some(ev.name()), None, None, None),
            LogDetail::Other => (None, None, None, None),
        };
        let ts = &self.timestamp;
        serde_json::to_string(&LogRecord {
            index: self.index,
            auth_id: self.auth_id,
            authorization_name: &self.authorization_name,
            time_year: ts.year,
            time_month: ts.month,
            time_day: ts.day,
            time_hour: ts.hour,
            time_minute: ts.minute,
            time_second: ts.second,
            kind: self.kind.name(),
            action,
            trigger,
            completion_status,
            code_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Watermark
// ---------------------------------------------------------------------------

/// Highest log index already forwarded.  Never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCursor {
    last_rolling_log_id: u32,
}

impl LogCursor {
    pub const fn new() -> Self {
        Self {
            last_rolling_log_id: 0,
        }
    }

    pub fn last_rolling_log_id(&self) -> u32 {
        self.last_rolling_log_id
    }

    /// Advance past `index`.  Returns `false` if it was already seen.
    pub fn advance(&mut self, index: u32) -> bool {
        if index > self.last_rolling_log_id {
            self.last_rolling_log_id = index;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Result of processing one fetched batch.
#[derive(Debug, Default)]
pub struct LogBatch {
    /// New records in ascending index order.
    pub events: Vec<LogEvent>,
    /// Actor of the highest-index lock/keypad action in the batch.
    pub last_actor: Option<Actor>,
}

/// Name shown for a record: cache entry, then the record's own name,
/// then [`FALLBACK_ACTOR`].
fn resolve_name(entry: &RawLogEntry, auth: &AuthCache) -> Name {
    let name = auth
        .name_of(entry.auth_id)
        .filter(|n| !n.is_empty())
        .or_else(|| Some(entry.name.as_str()).filter(|n| !n.is_empty()))
        .unwrap_or(FALLBACK_ACTOR);
    let mut out = Name::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Map, order and de-duplicate one fetch worth of records.
pub fn process(mut entries: Vec<RawLogEntry>, cursor: &mut LogCursor, auth: &AuthCache) -> LogBatch {
    entries.sort_by_key(|e| e.index);

    let mut batch = LogBatch::default();
    for entry in &entries {
        let kind = LoggingType::from_raw(entry.logging_type);
        let detail = LogDetail::decode(kind, &entry.data);
        let name = resolve_name(entry, auth);

        if detail.is_actor_action() {
            batch.last_actor = Some(Actor {
                auth_id: entry.auth_id,
                name: name.clone(),
            });
        }

        if cursor.advance(entry.index) {
            batch.events.push(LogEvent {
                index: entry.index,
                auth_id: entry.auth_id,
                authorization_name: name,
                timestamp: entry.timestamp,
                kind,
                detail,
            });
        }
    }
    batch
}
