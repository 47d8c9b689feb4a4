//! Keypad code validation and the id directory.
//!
//! The lock accepts keypad codes of exactly six digits 1-9 that do not
//! start with "12".  Updates and deletes must name an id that the last
//! listing returned.

use crate::error::KeypadError;
use crate::lock::model::MAX_KEYPAD_NAME_LEN;
use crate::lock::KeypadEntry;

pub type KeypadName = heapless::String<MAX_KEYPAD_NAME_LEN>;

pub fn validate_name(name: &str) -> Result<KeypadName, KeypadError> {
    let len = name.chars().count();
    if !(1..=MAX_KEYPAD_NAME_LEN).contains(&len) {
        return Err(KeypadError::InvalidName);
    }
    let mut out = KeypadName::new();
    out.push_str(name).map_err(|()| KeypadError::InvalidName)?;
    Ok(out)
}

pub fn validate_code(code: u32) -> Result<u32, KeypadError> {
    if !(100_000..=999_999).contains(&code) || code / 10_000 == 12 {
        return Err(KeypadError::InvalidCode);
    }
    let mut rest = code;
    while rest > 0 {
        if rest % 10 == 0 {
            return Err(KeypadError::InvalidCode);
        }
        rest /= 10;
    }
    Ok(code)
}

/// Ids returned by the most recent listing.
#[derive(Debug, Clone, Default)]
pub struct KeypadDirectory {
    ids: Vec<u16>,
}

impl KeypadDirectory {
    pub fn replace(&mut self, entries: &[KeypadEntry]) {
        self.ids = entries.iter().map(|e| e.code_id).collect();
    }

    pub fn contains(&self, code_id: u16) -> bool {
        self.ids.contains(&code_id)
    }

    pub fn remove(&mut self, code_id: u16) {
        self.ids.retain(|id| *id != code_id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn check(&self, code_id: u16) -> Result<(), KeypadError> {
        if self.contains(code_id) {
            Ok(())
        } else {
            Err(KeypadError::UnknownId)
        }
    }
}
