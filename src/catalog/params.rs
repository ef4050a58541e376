//! Query parameter assembly
//!
//! Catalog requests carry a set of device parameters that every endpoint
//! expects. Callers build their own parameters and let [`Params::filled`]
//! add the defaults for whatever they didn't set. A parameter that was set
//! without a value blocks its default and is then left out entirely.

/// Device type sent unless the request picks its own
pub const DEFAULT_DEVICE_TYPE_ID: &str = "A1MPSLFC7L5AFK";

/// Firmware string sent unless the request picks its own
pub const DEFAULT_FIRMWARE: &str = "fmw:15-app:1.1.19";

/// An ordered set of query parameters, some of which may be unset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Option<String>)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous entry
    pub fn with(self, key: &str, value: impl Into<String>) -> Self {
        self.with_opt(key, Some(value.into()))
    }

    /// Sets `key` only when `condition` holds; otherwise marks it unset
    pub fn with_if(self, condition: bool, key: &str, value: impl Into<String>) -> Self {
        self.with_opt(key, condition.then(|| value.into()))
    }

    /// Sets `key` to an optional value, replacing any previous entry
    pub fn with_opt(mut self, key: &str, value: Option<String>) -> Self {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    /// Returns the value of `key`, if it is set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Adds the device defaults for keys not present, then drops unset keys
    pub fn filled(self, device_id: &str) -> Vec<(String, String)> {
        self.with_default("deviceID", device_id)
            .with_default("deviceTypeID", DEFAULT_DEVICE_TYPE_ID)
            .with_default("firmware", DEFAULT_FIRMWARE)
            .with_default("format", "json")
            .into_pairs()
    }

    /// Drops unset keys, keeping the rest in insertion order
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }

    fn with_default(mut self, key: &str, value: &str) -> Self {
        if !self.entries.iter().any(|(k, _)| k == key) {
            self.entries.push((key.to_string(), Some(value.to_string())));
        }
        self
    }
}
