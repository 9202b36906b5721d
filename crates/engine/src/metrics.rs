// ==============
// crates/engine/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCESS: &str = "login.success";
pub const LOGIN_REJECTED: &str = "login.rejected";
