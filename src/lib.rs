//! WFI32 provisioning library.
//!
//! Brings a Wi-Fi cloud device from power-on to a configured link: the
//! removable volume is mounted (or formatted) and exposed over USB, the
//! device certificate and default config files are written to it, and
//! the credentials a user dropped on the drive are parsed and applied to
//! the Wi-Fi driver.  Exposes every module for integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod files;
pub mod fsm;
pub mod link;
