//! CLI subcommand implementations.

pub mod away;
pub mod day;
pub mod entry;
pub mod events;
pub mod holidays;
pub mod progress;
pub mod recent;
pub mod start_date;
pub mod status;
pub mod util;
