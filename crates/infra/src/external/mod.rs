//! External service clients/adapters.

#[cfg(feature = "http")]
pub mod http_oracle;

#[cfg(feature = "http")]
pub use http_oracle::HttpOracle;
