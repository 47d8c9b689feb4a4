//! Fuzz target: log record mapping (`eventlog::process`)
//!
//! Builds arbitrary batches of raw log records from the fuzz bytes and
//! feeds them through the watermark twice.
//!
//! Invariants checked:
//! - No panics under any byte sequence (including invalid UTF-8 names)
//! - Emitted indices are strictly increasing and above the old watermark
//! - Replaying the same batch emits nothing
//!
//! cargo fuzz run fuzz_log_records

#![no_main]

use libfuzzer_sys::fuzz_target;
use lockbridge::eventlog::{self, AuthCache, LogCursor};
use lockbridge::lock::RawLogEntry;
use lockbridge::lock::model::LogTimestamp;

/// index (4) + auth id (1) + type (1) + data (5)
const RECORD_LEN: usize = 11;

fuzz_target!(|data: &[u8]| {
    let entries: Vec<RawLogEntry> = data
        .chunks_exact(RECORD_LEN)
        .take(usize::from(eventlog::MAX_FETCH))
        .map(|c| RawLogEntry {
            index: u32::from_le_bytes([c[0], c[1], c[2], c[3]]),
            auth_id: u32::from(c[4]),
            name: heapless::String::new(),
            timestamp: LogTimestamp::default(),
            logging_type: c[5],
            data: [c[6], c[7], c[8], c[9], c[10]],
        })
        .collect();

    let auth = AuthCache::default();
    let mut cursor = LogCursor::new();
    let before = cursor.last_rolling_log_id();

    let batch = eventlog::process(entries.clone(), &mut cursor, &auth);
    let mut prev = before;
    for ev in &batch.events {
        assert!(ev.index > prev, "indices must strictly increase past the watermark");
        prev = ev.index;
        let _ = ev.to_json();
    }

    let replay = eventlog::process(entries, &mut cursor, &auth);
    assert!(replay.events.is_empty(), "replayed records must not be re-emitted");
});
