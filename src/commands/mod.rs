//! CLI command implementations
//!
//! Every command that touches the board takes the transport opened by
//! [`crate::programmers::with_transport`] and drives it through a
//! [`ProgramSession`](mercflash_core::flash::ProgramSession).

mod erase;
mod list;
mod probe;
mod program;
mod progress;

pub use erase::run_erase;
pub use list::{list_chips, list_programmers};
pub use probe::run_probe;
pub use program::run_program;
pub use progress::IndicatifProgress;
