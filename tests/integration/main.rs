//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the provisioning flow
//! end to end against the simulated board.  All tests run on the host
//! with no real hardware required.

mod mock_platform;
mod provisioning_flow_tests;
mod reconnect_tests;
mod usb_tests;
