//! Synchronous TCP client to the local delta-mirroring daemon.

mod client;
mod wire;

pub use client::DeltaClient;
pub use wire::{Command, Message};
