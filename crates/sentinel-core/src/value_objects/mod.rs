//! Value objects shared across the domain

mod snowflake;

pub use snowflake::{Snowflake, SnowflakeParseError};
