//! Configuration access port trait.

use crate::domain::error::EngineError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// `default` when the key is absent; a present value that is not an
    /// integer is a `ConfigInvalid` error.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, EngineError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, EngineError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// A value with no sensible default.
    fn require_string(&self, section: &str, key: &str) -> Result<String, EngineError> {
        self.get_string(section, key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| EngineError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
