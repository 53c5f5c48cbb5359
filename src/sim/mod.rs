pub mod driver;
pub mod error;
pub mod event;
pub mod save;
pub mod session;
