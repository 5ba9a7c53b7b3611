//! Front-end skeleton for a console emulator: a worker thread steps the
//! machine at a fixed rate and publishes frames, and the UI loop presents
//! the latest one on its own schedule.

pub mod config;
pub mod display_sync;
pub mod emulator;
pub mod rom;
pub mod session;
