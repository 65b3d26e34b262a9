//! Lambda Adapter Workspace - end-to-end tests for the event adapter.
//!
//! This is a virtual package that provides workspace-level integration tests.
//! The actual functionality is provided by the workspace member crates:
//!
//! - `lambda-adapter`: translates Lambda events into normalized HTTP requests
//!   and function responses back into the platform output envelope
//! - `lambda-adapter-example`: example "dump" function wired through the adapter
