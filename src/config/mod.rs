// src/config/mod.rs
pub mod policy;

pub use policy::{load_policy_config_default, load_policy_config_from, PolicyConfig};
