use std::convert::TryFrom;

use anyhow::{anyhow, Result};

use crate::models::Category;

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn parse_category(value: &str) -> Result<Category> {
    value
        .parse()
        .map_err(|err: anyhow::Error| err.context("facts.category"))
}
