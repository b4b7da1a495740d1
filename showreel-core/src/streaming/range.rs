//! HTTP Range request parsing for media streaming
//!
//! Handles the single-range form `bytes=<start>-[<end>]`. Only the first
//! range of a multi-range header is honoured; suffix ranges (`bytes=-N`)
//! are not supported.

use crate::config::RangePolicy;
use crate::streaming::MediaError;

/// Reasons a `Range` header value failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeParseError {
    /// Header has no `unit=` prefix
    #[error("missing range unit")]
    MissingUnit,

    /// Unit other than `bytes`
    #[error("unsupported range unit {unit:?}")]
    UnsupportedUnit {
        /// Unit found in the header
        unit: String,
    },

    /// First range has no `-`
    #[error("missing '-' separator")]
    MissingSeparator,

    /// First range has no start offset
    #[error("missing start offset")]
    MissingStart,

    /// Offset is not a plain decimal u64
    #[error("invalid offset {value:?}")]
    InvalidOffset {
        /// Text that failed to parse
        value: String,
    },
}

/// Parsed but not yet validated byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// First requested byte
    pub start: u64,
    /// Last requested byte, inclusive; `None` means through the end
    pub end: Option<u64>,
}

/// Validated inclusive byte range within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte served
    pub start: u64,
    /// Last byte served, inclusive
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a validated range holds at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` header value for a resource of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

impl RangeSpec {
    /// Parse a `Range` header value.
    ///
    /// # Examples
    /// ```
    /// use showreel_core::streaming::RangeSpec;
    ///
    /// let spec = RangeSpec::parse("bytes=200-499").unwrap();
    /// assert_eq!((spec.start, spec.end), (200, Some(499)));
    /// ```
    ///
    /// # Errors
    ///
    /// - `RangeParseError` - If the value does not match `bytes=<digits>-<digits>?`
    pub fn parse(header: &str) -> Result<Self, RangeParseError> {
        let (unit, ranges) = header
            .trim()
            .split_once('=')
            .ok_or(RangeParseError::MissingUnit)?;

        let unit = unit.trim();
        if !unit.eq_ignore_ascii_case("bytes") {
            return Err(RangeParseError::UnsupportedUnit {
                unit: unit.to_string(),
            });
        }

        // Multi-range requests are reduced to their first range
        let first = ranges.split(',').next().unwrap_or_default().trim();
        let (start_str, end_str) = first
            .split_once('-')
            .ok_or(RangeParseError::MissingSeparator)?;

        if start_str.trim().is_empty() {
            return Err(RangeParseError::MissingStart);
        }

        let start = parse_offset(start_str)?;
        let end = match end_str.trim() {
            "" => None,
            value => Some(parse_offset(value)?),
        };

        Ok(Self { start, end })
    }

    /// Resolve against a resource of `length` bytes.
    ///
    /// # Errors
    ///
    /// - `MediaError::RangeNotSatisfiable` - If `start >= length`,
    ///   `start > end`, or (strict policy) `end >= length`
    pub fn resolve(&self, length: u64, policy: RangePolicy) -> Result<ByteRange, MediaError> {
        let unsatisfiable = || MediaError::RangeNotSatisfiable {
            start: self.start,
            end: self.end,
            length,
        };

        if self.start >= length {
            return Err(unsatisfiable());
        }

        let last = length - 1;
        let end = match self.end {
            None => last,
            Some(end) if end > last => match policy {
                RangePolicy::Strict => return Err(unsatisfiable()),
                RangePolicy::Clamp => last,
            },
            Some(end) => end,
        };

        if self.start > end {
            return Err(unsatisfiable());
        }

        Ok(ByteRange {
            start: self.start,
            end,
        })
    }
}

fn parse_offset(value: &str) -> Result<u64, RangeParseError> {
    let value = value.trim();
    let invalid = || RangeParseError::InvalidOffset {
        value: value.to_string(),
    };

    // u64::from_str accepts a leading '+', the header grammar does not
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse::<u64>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_parse_closed_range() {
        let spec = RangeSpec::parse("bytes=200-499").unwrap();
        assert_eq!(
            spec,
            RangeSpec {
                start: 200,
                end: Some(499)
            }
        );
    }

    #[test]
    fn test_parse_open_range() {
        let spec = RangeSpec::parse("bytes=900-").unwrap();
        assert_eq!(spec.start, 900);
        assert_eq!(spec.end, None);
    }

    #[test]
    fn test_parse_multi_range_uses_first() {
        let spec = RangeSpec::parse("bytes=0-10, 20-30").unwrap();
        assert_eq!(
            spec,
            RangeSpec {
                start: 0,
                end: Some(10)
            }
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_unit_case() {
        let spec = RangeSpec::parse("  Bytes = 5 - 9 ").unwrap();
        assert_eq!(
            spec,
            RangeSpec {
                start: 5,
                end: Some(9)
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_headers() {
        assert_eq!(
            RangeSpec::parse("invalid"),
            Err(RangeParseError::MissingUnit)
        );
        assert!(matches!(
            RangeSpec::parse("items=0-10"),
            Err(RangeParseError::UnsupportedUnit { .. })
        ));
        assert_eq!(
            RangeSpec::parse("bytes=100"),
            Err(RangeParseError::MissingSeparator)
        );
        assert_eq!(
            RangeSpec::parse("bytes=-500"),
            Err(RangeParseError::MissingStart)
        );
        assert!(matches!(
            RangeSpec::parse("bytes=+1-5"),
            Err(RangeParseError::InvalidOffset { .. })
        ));
        assert!(matches!(
            RangeSpec::parse("bytes=abc-def"),
            Err(RangeParseError::InvalidOffset { .. })
        ));
        assert!(matches!(
            RangeSpec::parse("bytes=99999999999999999999-"),
            Err(RangeParseError::InvalidOffset { .. })
        ));
    }

    #[test]
    fn test_resolve_valid_ranges() {
        let range = RangeSpec::parse("bytes=200-499")
            .unwrap()
            .resolve(1000, RangePolicy::Strict)
            .unwrap();
        assert_eq!(range, ByteRange { start: 200, end: 499 });
        assert_eq!(range.len(), 300);
        assert_eq!(range.content_range(1000), "bytes 200-499/1000");

        let range = RangeSpec::parse("bytes=900-")
            .unwrap()
            .resolve(1000, RangePolicy::Strict)
            .unwrap();
        assert_eq!(range.content_range(1000), "bytes 900-999/1000");
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn test_resolve_single_byte_ranges() {
        let first = RangeSpec {
            start: 0,
            end: Some(0),
        };
        assert_eq!(first.resolve(1000, RangePolicy::Strict).unwrap().len(), 1);

        let last = RangeSpec {
            start: 999,
            end: None,
        };
        assert_eq!(
            last.resolve(1000, RangePolicy::Strict).unwrap(),
            ByteRange { start: 999, end: 999 }
        );
    }

    #[test]
    fn test_resolve_rejects_out_of_bounds() {
        let cases = [
            RangeSpec {
                start: 1000,
                end: None,
            },
            RangeSpec {
                start: 500,
                end: Some(100),
            },
            RangeSpec {
                start: 0,
                end: Some(1000),
            },
        ];
        for spec in cases {
            assert!(
                matches!(
                    spec.resolve(1000, RangePolicy::Strict),
                    Err(MediaError::RangeNotSatisfiable { length: 1000, .. })
                ),
                "{spec:?} should be unsatisfiable"
            );
        }
    }

    #[test]
    fn test_resolve_empty_resource() {
        let spec = RangeSpec {
            start: 0,
            end: None,
        };
        assert!(spec.resolve(0, RangePolicy::Strict).is_err());
        assert!(spec.resolve(0, RangePolicy::Clamp).is_err());
    }

    #[test]
    fn test_clamp_policy_trims_end_only() {
        let spec = RangeSpec {
            start: 100,
            end: Some(5000),
        };
        assert_eq!(
            spec.resolve(1000, RangePolicy::Clamp).unwrap(),
            ByteRange { start: 100, end: 999 }
        );

        let past_end = RangeSpec {
            start: 1000,
            end: Some(5000),
        };
        assert!(past_end.resolve(1000, RangePolicy::Clamp).is_err());

        let inverted = RangeSpec {
            start: 10,
            end: Some(5),
        };
        assert!(inverted.resolve(1000, RangePolicy::Clamp).is_err());
    }

    proptest! {
        #[test]
        fn prop_satisfiable_ranges_resolve_exactly(
            length in 1u64..1_000_000,
            a in any::<u64>(),
            b in any::<u64>(),
        ) {
            let (start, end) = {
                let x = a % length;
                let y = b % length;
                (x.min(y), x.max(y))
            };
            let header = format!("bytes={start}-{end}");
            let range = RangeSpec::parse(&header)
                .unwrap()
                .resolve(length, RangePolicy::Strict)
                .unwrap();

            prop_assert_eq!(range.start, start);
            prop_assert_eq!(range.end, end);
            prop_assert_eq!(range.len(), end - start + 1);
        }

        #[test]
        fn prop_resolved_ranges_stay_in_bounds(
            length in 0u64..10_000,
            start in 0u64..20_000,
            end in proptest::option::of(0u64..20_000),
            clamp in any::<bool>(),
        ) {
            let policy = if clamp { RangePolicy::Clamp } else { RangePolicy::Strict };
            let spec = RangeSpec { start, end };
            if let Ok(range) = spec.resolve(length, policy) {
                prop_assert!(range.start <= range.end);
                prop_assert!(range.end < length);
            }
        }
    }
}
