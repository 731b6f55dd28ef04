//! Input data model: price history, fundamentals and assembled snapshots

pub mod history;
pub mod snapshot;

pub use history::{Lookback, PriceBar, PriceHistory};
pub use snapshot::{
    AllTimeHigh, AthDate, Fundamentals, HistoryConfig, SecurityRole, SecuritySnapshot, TickerSpec,
};
