pub mod instrument;
pub mod settings;
pub mod tags;
pub mod trade;
pub mod withdrawal;

pub use instrument::*;
pub use settings::*;
pub use tags::*;
pub use trade::*;
pub use withdrawal::*;
