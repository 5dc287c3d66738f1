//! Leaf helpers and network capabilities shared by the crawler, verifier and orchestrator.

pub mod dns;
pub(crate) mod domain;
pub mod patterns;
pub mod smtp;
pub mod whois;
