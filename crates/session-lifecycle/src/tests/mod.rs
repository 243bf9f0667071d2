//! Integration tests for the session lifecycle.
//!
//! - `harness`    - scripted auth API server and manager builders
//! - `bootstrap`  - startup validation and config loading
//! - `auth_flows` - login, logout, refresh dedup, unauthorized teardown
//! - `locking`    - expiry locking, silent refresh, unlock
//! - `timers`     - heartbeat and inactivity scheduling

mod bootstrap;
