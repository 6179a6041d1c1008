// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Record identifier assigned by the query service. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(String);

impl LeadId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LeadId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for LeadId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic re-query counter. Every filter, sort or group change mints a new
/// generation; replies tagged with an older one are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::{Generation, LeadId};

    #[test]
    fn lead_id_serializes_as_plain_string() {
        let id = LeadId::from("a0B5g00000XyZ");
        let json = serde_json::to_string(&id).expect("serialize id");
        assert_eq!(json, "\"a0B5g00000XyZ\"");
        assert_eq!(id.to_string(), "a0B5g00000XyZ");
    }

    #[test]
    fn generation_advances_by_one() {
        let generation = Generation::default().next().next();
        assert_eq!(generation.get(), 2);
        assert!(generation > Generation::new(1));
    }
}
