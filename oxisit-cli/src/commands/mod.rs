//! Command implementations for OxiSit CLI.

pub mod completions;
pub mod detect;
pub mod extract;
pub mod info;
pub mod list;
pub mod test;

pub use completions::cmd_completions;
pub use detect::cmd_detect;
pub use extract::{ExtractOptions, cmd_extract};
pub use info::cmd_info;
pub use list::{ListOptions, cmd_list};
pub use test::cmd_test;
