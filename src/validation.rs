use thiserror::Error;
use crate::models::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("Invalid block {height}: {reason}")]
    InvalidBlock { height: i64, reason: String },
}

/// Canonical form of an address: trimmed and lower-cased. Empty is rejected.
pub fn validate_address(address: &str) -> Result<Address, ValidationError> {
    let canonical = address.trim().to_lowercase();
    if canonical.is_empty() {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(Address(canonical))
}

/// Checks a proposed watermark against the current one.
pub fn validate_block_height(height: i64, current: i64) -> Result<(), ValidationError> {
    if height < 0 {
        return Err(ValidationError::InvalidBlock {
            height,
            reason: "block number cannot be negative".to_string(),
        });
    }

    if height < current {
        return Err(ValidationError::InvalidBlock {
            height,
            reason: format!("below the current watermark {}", current),
        });
    }

    Ok(())
}

/// Parse a comma separated address list, dropping blank entries.
pub fn parse_address_list(raw: &str) -> Vec<Address> {
    raw.split(',')
        .filter_map(|part| validate_address(part).ok())
        .collect()
}
