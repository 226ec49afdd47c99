//! Command implementations.

pub mod export;
pub mod profile;
pub mod records;
pub mod review;
pub mod watch;

pub use self::export::execute_export;
pub use self::profile::execute_profile;
pub use self::records::{execute_list, execute_show, execute_stats};
pub use self::review::{execute_approve, execute_edit, execute_reject};
pub use self::watch::execute_watch;
