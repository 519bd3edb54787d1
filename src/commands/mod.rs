pub mod classify;
pub mod config;
pub mod diff;
pub mod history;
pub mod loader;
pub mod pack;
pub mod skeleton;
