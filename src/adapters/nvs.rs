//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`SettingsPort`]: the PIN settings record is stored as one
//! postcard blob under `lockbridge::pinset`.  The host build keeps blobs
//! in an in-memory map (dev/test only).

use crate::app::ports::SettingsPort;
use crate::error::SettingsError;
use crate::pin::PinSettings;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "lockbridge";
const PIN_KEY: &str = "pinset";

/// Upper bound for a stored blob; the PIN record is a few bytes.
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 64;

#[cfg(target_os = "espidf")]
const BAD_LENGTH: i32 = -1;

pub struct NvsSettings {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsSettings {
    /// Initialise NVS flash (erasing it on a layout/version mismatch).
    pub fn new() -> Result<Self, SettingsError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(SettingsError::Io);
                }
            } else if ret != ESP_OK {
                return Err(SettingsError::Io);
            }
            info!("NvsSettings: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsSettings: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name (max 15 chars).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(NAMESPACE);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };
        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }
        let result = f(handle);
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Vec<u8>, SettingsError> {
        let key = Self::c_name(PIN_KEY);
        let result = Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            if size == 0 || size > MAX_BLOB_SIZE {
                return Err(BAD_LENGTH);
            }
            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(handle, key.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(buf) => Ok(buf),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(SettingsError::NotFound),
            Err(BAD_LENGTH) => Err(SettingsError::Corrupted),
            Err(e) => {
                warn!("NvsSettings: read error {}", e);
                Err(SettingsError::Io)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Vec<u8>, SettingsError> {
        self.store
            .get(&Self::composite_key(NAMESPACE, PIN_KEY))
            .cloned()
            .ok_or(SettingsError::NotFound)
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), SettingsError> {
        let key = Self::c_name(PIN_KEY);
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(handle, key.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsSettings: write error {}", e);
            SettingsError::Io
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), SettingsError> {
        self.store
            .insert(Self::composite_key(NAMESPACE, PIN_KEY), bytes.to_vec());
        Ok(())
    }

    /// Store raw bytes under the PIN key (corruption tests).
    #[cfg(not(target_os = "espidf"))]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        let _ = self.write_blob(bytes);
    }
}

impl SettingsPort for NvsSettings {
    fn load(&self) -> Result<PinSettings, SettingsError> {
        let bytes = self.read_blob()?;
        let settings: PinSettings =
            postcard::from_bytes(&bytes).map_err(|_| SettingsError::Corrupted)?;
        settings.validate().map_err(|_| SettingsError::Corrupted)?;
        info!("NvsSettings: loaded PIN settings ({} bytes)", bytes.len());
        Ok(settings)
    }

    fn save(&mut self, settings: &PinSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        let bytes = postcard::to_allocvec(settings).map_err(|_| SettingsError::Io)?;
        self.write_blob(&bytes)?;
        info!("NvsSettings: PIN settings saved ({} bytes)", bytes.len());
        Ok(())
    }
}
