//! Visitor pass registration: bootstrap and developer CLI on top of the
//! `vp-core` / `vp-app` / `vp-infra` crates.

pub mod bootstrap;
pub mod cli;
