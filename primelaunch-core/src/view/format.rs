//! Display formatting helpers.

use chrono::{Local, TimeZone};
use ethers::utils::to_checksum;

use crate::types::{Address, U256};

/// `10000000000` -> `10,000,000,000`.
pub fn format_amount(value: &U256) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// EIP-55 checksummed address.
pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

/// `0x1234...abcd`.
pub fn short_address(address: &Address) -> String {
    let full = checksum(address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Local time of a creation timestamp; zero means not yet mined.
pub fn format_created_at(timestamp: u64) -> String {
    if timestamp == 0 {
        return "Pending confirmation".to_string();
    }
    match i64::try_from(timestamp)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
    {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Pending confirmation".to_string(),
    }
}
