pub mod shutdown;

pub use shutdown::{ShutdownReason, wait_for_signal};
