//! API response envelope types

pub mod response;
