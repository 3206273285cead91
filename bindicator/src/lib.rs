pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod hal;
pub mod svc;

#[cfg(test)]
mod testing;
