//! Fuzz target: persisted PIN settings blob
//!
//! Writes arbitrary bytes where the NVS record lives and loads them.
//!
//! Invariants checked:
//! - No panics on corrupted or truncated blobs
//! - Anything that loads successfully carries a PIN in 0..=999999
//!
//! cargo fuzz run fuzz_pin_settings

#![no_main]

use libfuzzer_sys::fuzz_target;
use lockbridge::adapters::nvs::NvsSettings;
use lockbridge::app::ports::SettingsPort;
use lockbridge::config::MAX_SECURITY_PIN;

fuzz_target!(|data: &[u8]| {
    let Ok(mut nvs) = NvsSettings::new() else {
        return;
    };
    nvs.write_raw(data);
    if let Ok(settings) = nvs.load() {
        assert!(settings.security_pin <= MAX_SECURITY_PIN);
    }
});
