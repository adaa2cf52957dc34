// ABOUTME: Configuration constants shared across EscrowDesk packages

pub mod constants;
