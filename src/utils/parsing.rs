//! Parsing utilities for CLI arguments and environment values.

use byte_unit::Byte;
use std::str::FromStr;

/// Parses a human-readable size ("1GB", "500MB", "1024KiB") into bytes.
pub fn parse_string_to_bytes_size(s: &str) -> Result<u64, String> {
	match Byte::from_str(s) {
		Ok(byte) => Ok(byte.as_u64()),
		Err(e) => Err(format!("Invalid size format: '{}'. Error: {}", s, e)),
	}
}

/// Trims whitespace and lowercases, for case-insensitive option values.
pub fn normalize_string(input: &str) -> String {
	input.trim().to_lowercase()
}

/// Parses a boolean flag value as used in environment variables.
///
/// Accepts `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitively.
pub fn parse_bool_flag(input: &str) -> Option<bool> {
	match normalize_string(input).as_str() {
		"true" | "1" | "yes" => Some(true),
		"false" | "0" | "no" => Some(false),
		_ => None,
	}
}
