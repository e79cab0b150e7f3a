//! StorNet CLI library

pub mod commands;
