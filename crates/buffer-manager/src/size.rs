// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Human-readable byte sizes.
//!
//! A [`ByteSize`] is how bucket sizes are written in configuration files
//! and on the command line (`"64K"`, `"1M"`).

use crate::BufferError;
use std::fmt;

const KB: usize = 1024;
const MB: usize = 1024 * 1024;
const GB: usize = 1024 * 1024 * 1024;

/// A non-zero byte count.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"64K"` or `"64KB"` → 64 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"4096"` or `"4096B"` → raw byte count
///
/// # Examples
/// ```
/// use buffer_manager::ByteSize;
///
/// let s = ByteSize::from_kb(64);
/// assert_eq!(s.as_bytes(), 65536);
///
/// let s = ByteSize::parse("1M").unwrap();
/// assert_eq!(s.as_bytes(), 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ByteSize {
    bytes: usize,
}

impl ByteSize {
    /// Creates a size from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a size from kilobytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KB }
    }

    /// Creates a size from megabytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MB }
    }

    /// Returns the size in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Parses a human-readable size string. Case-insensitive; surrounding
    /// whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, BufferError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BufferError::InvalidSize("empty size string".to_string()));
        }

        let upper = s.to_uppercase();
        let (digits, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB), ("B", 1)]
            .iter()
            .find(|(suffix, _)| upper.ends_with(suffix))
            .map(|(suffix, mult)| (&s[..s.len() - suffix.len()], *mult))
            .unwrap_or((s, 1));

        let value: usize = digits.trim().parse().map_err(|_| {
            BufferError::InvalidSize(format!(
                "'{s}' is not a number followed by an optional K, M or G suffix"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| BufferError::InvalidSize(format!("'{s}' overflows usize")))?;

        if bytes == 0 {
            return Err(BufferError::InvalidSize(format!("'{s}' is zero bytes")));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes {
            b if b >= GB && b % GB == 0 => write!(f, "{} GB", b / GB),
            b if b >= MB && b % MB == 0 => write!(f, "{} MB", b / MB),
            b if b >= KB && b % KB == 0 => write!(f, "{} KB", b / KB),
            b => write!(f, "{b} B"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(ByteSize::from_kb(4).as_bytes(), 4096);
        assert_eq!(ByteSize::from_mb(2).as_bytes(), 2 * 1024 * 1024);
        assert_eq!(ByteSize::from_bytes(30).as_bytes(), 30);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(ByteSize::parse("64K").unwrap().as_bytes(), 64 * 1024);
        assert_eq!(ByteSize::parse("64kb").unwrap().as_bytes(), 64 * 1024);
        assert_eq!(ByteSize::parse("1M").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(ByteSize::parse("1mb").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(ByteSize::parse("1G").unwrap().as_bytes(), 1024 * 1024 * 1024);
        assert_eq!(ByteSize::parse("512B").unwrap().as_bytes(), 512);
    }

    #[test]
    fn test_parse_raw_bytes() {
        assert_eq!(ByteSize::parse("4096").unwrap().as_bytes(), 4096);
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(ByteSize::parse("  16K ").unwrap().as_bytes(), 16 * 1024);
        assert_eq!(ByteSize::parse("16 K").unwrap().as_bytes(), 16 * 1024);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ByteSize::parse("").is_err());
        assert!(ByteSize::parse("abc").is_err());
        assert!(ByteSize::parse("0K").is_err());
        assert!(ByteSize::parse("-4K").is_err());
        assert!(matches!(
            ByteSize::parse("99999999999999999999G"),
            Err(BufferError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize::from_mb(1024).to_string(), "1 GB");
        assert_eq!(ByteSize::from_mb(3).to_string(), "3 MB");
        assert_eq!(ByteSize::from_kb(64).to_string(), "64 KB");
        assert_eq!(ByteSize::from_bytes(30).to_string(), "30 B");
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = ByteSize::from_kb(64);
        let json = serde_json::to_string(&s).unwrap();
        let back: ByteSize = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
