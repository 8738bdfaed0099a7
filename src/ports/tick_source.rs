//! Recorded tick source port.

use crate::domain::error::EngineError;
use crate::domain::tick::TickSnapshot;

pub trait TickSource {
    /// All recorded ticks for `symbol`, in stream order.
    fn fetch_ticks(&self, symbol: &str) -> Result<Vec<TickSnapshot>, EngineError>;

    fn list_symbols(&self) -> Result<Vec<String>, EngineError>;
}
