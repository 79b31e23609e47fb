pub mod in_flight;
pub mod mount_guard;
pub mod panic_hook;
