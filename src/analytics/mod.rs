pub mod calendar;
pub mod distribution;
pub mod equity;
pub mod evaluation;
pub mod metrics;
pub mod pnl;
pub mod recompute;
pub mod reports;
pub mod setups;

pub use calendar::*;
pub use distribution::*;
pub use equity::*;
pub use evaluation::*;
pub use metrics::*;
pub use pnl::*;
pub use recompute::*;
pub use reports::*;
pub use setups::*;
