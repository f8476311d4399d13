use crate::error::{Error, Result};
use log::info;

pub const ACCESS_KEY_VAR: &str = "ACCESS_KEY";

/// Write access is granted by presenting the configured key. Without a
/// configured key nothing unlocks.
#[derive(Clone, Debug, Default)]
pub struct AccessGate {
    expected: Option<String>,
}

impl AccessGate {
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.filter(|k| !k.is_empty()),
        }
    }

    /// Reads the key from the `ACCESS_KEY` environment variable.
    pub fn from_env() -> Self {
        let gate = Self::new(std::env::var(ACCESS_KEY_VAR).ok());
        if gate.expected.is_none() {
            info!("{} is not set, editing is locked", ACCESS_KEY_VAR);
        }
        gate
    }

    pub fn unlocks(&self, key: Option<&str>) -> bool {
        match (&self.expected, key) {
            (Some(expected), Some(key)) => expected == key,
            _ => false,
        }
    }

    pub fn require(&self, key: Option<&str>) -> Result<()> {
        if self.unlocks(key) {
            Ok(())
        } else {
            Err(Error::AccessDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_matching_key_unlocks() {
        let gate = AccessGate::new(Some("s3cret".to_string()));
        assert!(gate.unlocks(Some("s3cret")));
        assert!(gate.require(Some("s3cret")).is_ok());
        assert!(!gate.unlocks(Some("S3CRET")));
        assert!(!gate.unlocks(None));
        assert!(matches!(gate.require(Some("")), Err(Error::AccessDenied)));
    }

    #[test]
    fn test_unconfigured_gate_stays_locked() {
        let gate = AccessGate::new(None);
        assert!(!gate.unlocks(Some("")));
        assert!(!gate.unlocks(None));

        let empty = AccessGate::new(Some(String::new()));
        assert!(!empty.unlocks(Some("")));
    }
}
