//! Application layer - use-case handlers composed from ports.

mod register_account;

pub use register_account::RegisterAccountHandler;
