//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements          | Connects to                 |
//! |------------------|---------------------|-----------------------------|
//! | `fs_storage`     | StoragePort         | Host directory as volume    |
//! | `mem_storage`    | StoragePort         | In-memory volume (tests)    |
//! | `usb_msd`        | MassStoragePort     | Simulated USB device layer  |
//! | `secure_element` | SecureElementPort   | Simulated secure element    |
//! | `wifi`           | WifiDriverPort      | Simulated station driver    |
//! | `log_sink`       | EventSink           | Console log output          |
//! | `board`          | Platform            | Bundles one adapter per port|

pub mod board;
pub mod fs_storage;
pub mod log_sink;
pub mod mem_storage;
pub mod secure_element;
pub mod usb_msd;
pub mod wifi;
