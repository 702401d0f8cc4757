pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod greet_utils;
pub mod outbound;

#[cfg(test)]
pub mod test_support;
