// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-partition memory budget and parsing.
//!
//! A [`MemoryBudget`] is the ceiling on bytes a single partition may hold
//! under a candidate plan. A zero budget means "unbounded": the designer
//! then ignores memory entirely. Human-readable parsing keeps TOML configs
//! and CLI flags short.

use crate::MemoryError;
use std::fmt;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Maximum bytes a single partition may hold.
///
/// # Parsing
/// Supports human-readable strings with SI-style suffixes:
/// - `"512M"` or `"512MB"` → 512 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"2048K"` or `"2048KB"` → 2048 × 1024 bytes
/// - `"1073741824"` → raw byte count
/// - `"unbounded"`, `"none"` or `"0"` → no limit
///
/// # Examples
/// ```
/// use memory_estimator::MemoryBudget;
///
/// let b = MemoryBudget::from_mb(512);
/// assert_eq!(b.as_mb(), 512);
///
/// let b = MemoryBudget::parse("1G").unwrap();
/// assert_eq!(b.as_mb(), 1024);
/// assert!(MemoryBudget::parse("unbounded").unwrap().is_unbounded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    /// Budget in bytes; zero means unbounded.
    bytes: u64,
}

impl MemoryBudget {
    /// A budget that never rejects a plan.
    pub fn unbounded() -> Self {
        Self { bytes: 0 }
    }

    /// Creates a budget from a byte count.
    pub fn from_bytes(bytes: u64) -> Self {
        Self { bytes }
    }

    /// Creates a budget from megabytes.
    pub fn from_mb(mb: u64) -> Self {
        Self { bytes: mb * MB }
    }

    /// Creates a budget from gigabytes.
    pub fn from_gb(gb: u64) -> Self {
        Self { bytes: gb * GB }
    }

    /// Returns the budget in bytes (zero when unbounded).
    pub fn as_bytes(&self) -> u64 {
        self.bytes
    }

    /// Returns the budget in megabytes (truncated).
    pub fn as_mb(&self) -> u64 {
        self.bytes / MB
    }

    /// Returns `true` if no limit applies.
    pub fn is_unbounded(&self) -> bool {
        self.bytes == 0
    }

    /// Fraction of the budget `bytes` would use; `0.0` when unbounded.
    pub fn ratio(&self, bytes: u64) -> f64 {
        if self.is_unbounded() {
            0.0
        } else {
            bytes as f64 / self.bytes as f64
        }
    }

    /// Returns `true` if `bytes` fits in the budget.
    pub fn admits(&self, bytes: u64) -> bool {
        self.is_unbounded() || bytes <= self.bytes
    }

    /// Parses a human-readable budget string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let s = s.trim();
        let invalid = |detail: &str| MemoryError::InvalidBudget {
            input: s.to_string(),
            detail: detail.to_string(),
        };
        if s.is_empty() {
            return Err(invalid("empty string"));
        }

        let s_upper = s.to_uppercase();
        if s_upper == "UNBOUNDED" || s_upper == "NONE" {
            return Ok(Self::unbounded());
        }

        // Split into numeric part and suffix.
        let (num_str, multiplier) = if s_upper.ends_with("GB") {
            (&s[..s.len() - 2], GB)
        } else if s_upper.ends_with('G') {
            (&s[..s.len() - 1], GB)
        } else if s_upper.ends_with("MB") {
            (&s[..s.len() - 2], MB)
        } else if s_upper.ends_with('M') {
            (&s[..s.len() - 1], MB)
        } else if s_upper.ends_with("KB") {
            (&s[..s.len() - 2], KB)
        } else if s_upper.ends_with('K') {
            (&s[..s.len() - 1], KB)
        } else if s_upper.ends_with('B') {
            (&s[..s.len() - 1], 1)
        } else {
            (s, 1)
        };

        let value: u64 = num_str
            .trim()
            .parse()
            .map_err(|_| invalid("expected a number followed by an optional suffix (K, M, G)"))?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| invalid("overflow"))?;

        Ok(Self { bytes })
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes == 0 {
            write!(f, "unbounded")
        } else if self.bytes >= GB && self.bytes % GB == 0 {
            write!(f, "{} GB", self.bytes / GB)
        } else if self.bytes >= MB && self.bytes % MB == 0 {
            write!(f, "{} MB", self.bytes / MB)
        } else if self.bytes >= KB && self.bytes % KB == 0 {
            write!(f, "{} KB", self.bytes / KB)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mb() {
        let b = MemoryBudget::from_mb(512);
        assert_eq!(b.as_bytes(), 512 * 1024 * 1024);
        assert_eq!(b.as_mb(), 512);
    }

    #[test]
    fn test_from_gb() {
        assert_eq!(MemoryBudget::from_gb(2).as_mb(), 2048);
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(MemoryBudget::parse("512M").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("512mb").unwrap().as_mb(), 512);
        assert_eq!(MemoryBudget::parse("1G").unwrap().as_mb(), 1024);
        assert_eq!(MemoryBudget::parse("1024K").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(MemoryBudget::parse("1048576").unwrap().as_mb(), 1);
        assert_eq!(MemoryBudget::parse("  64M  ").unwrap().as_mb(), 64);
    }

    #[test]
    fn test_parse_unbounded() {
        assert!(MemoryBudget::parse("unbounded").unwrap().is_unbounded());
        assert!(MemoryBudget::parse("NONE").unwrap().is_unbounded());
        assert!(MemoryBudget::parse("0").unwrap().is_unbounded());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(MemoryBudget::parse("").is_err());
        assert!(MemoryBudget::parse("abc").is_err());
        assert!(MemoryBudget::parse("99999999999999999999G").is_err());
    }

    #[test]
    fn test_ratio_and_admits() {
        let b = MemoryBudget::from_bytes(1000);
        assert!((b.ratio(250) - 0.25).abs() < 1e-12);
        assert!(b.admits(1000));
        assert!(!b.admits(1001));

        let u = MemoryBudget::unbounded();
        assert_eq!(u.ratio(1 << 40), 0.0);
        assert!(u.admits(u64::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::from_gb(1).to_string(), "1 GB");
        assert_eq!(MemoryBudget::from_mb(512).to_string(), "512 MB");
        assert_eq!(MemoryBudget::from_bytes(2048).to_string(), "2 KB");
        assert_eq!(MemoryBudget::from_bytes(100).to_string(), "100 B");
        assert_eq!(MemoryBudget::unbounded().to_string(), "unbounded");
    }

    #[test]
    fn test_serde_roundtrip() {
        let b = MemoryBudget::from_mb(256);
        let json = serde_json::to_string(&b).unwrap();
        let back: MemoryBudget = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
