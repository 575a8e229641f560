//! Pagination requests and slicing.
//!
//! Query parameters are parsed leniently: garbage never fails a request, it
//! falls back to a default instead.

use crate::shuffle::seeded_shuffle;
use serde::Serialize;
use std::num::IntErrorKind;
use time::OffsetDateTime;

/// Default page size when the request doesn't ask for one.
pub const DEFAULT_LIMIT: usize = 120;
/// Largest page a single request may ask for.
pub const MAX_LIMIT: usize = 500;

/// Page size bounds applied when parsing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

/// Order in which files are paged through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Order {
    /// Lexicographic by file name.
    #[default]
    Stable,
    /// Deterministically shuffled by the seed.
    Random { seed: String },
}

impl Order {
    /// Only the exact string `"random"` shuffles; anything else is the stable
    /// order. A random order without a seed is seeded from the current time,
    /// so it is only stable for the one request.
    pub fn parse(order: Option<&str>, seed: Option<&str>) -> Self {
        match order {
            Some("random") => {
                let seed = match seed.filter(|seed| !seed.is_empty()) {
                    Some(seed) => seed.to_string(),
                    None => (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).to_string(),
                };
                Self::Random { seed }
            },
            _ => Self::Stable,
        }
    }

    /// Apply the order to an already name-sorted list.
    pub fn apply<T>(&self, items: &mut [T]) {
        if let Self::Random { seed } = self {
            seeded_shuffle(items, seed);
        }
    }
}

/// A parsed page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub limit: usize,
    pub order: Order,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            order: Order::Stable,
        }
    }
}

impl PageRequest {
    /// Build a request from raw query values.
    ///
    /// - `offset`: missing, unparseable or negative becomes `0`.
    /// - `limit`: missing, unparseable or `0` becomes the default; anything
    ///   else is clamped into `1..=max_limit`.
    ///
    /// Integers too large to represent saturate rather than count as garbage,
    /// so a huge offset is past the end and a huge limit is the maximum.
    pub fn parse(
        offset: Option<&str>,
        limit: Option<&str>,
        order: Option<&str>,
        seed: Option<&str>,
        limits: Limits,
    ) -> Self {
        let offset = match parse_int(offset) {
            Some(offset) if offset > 0 => usize::try_from(offset).unwrap_or(usize::MAX),
            _ => 0,
        };
        let limit = match parse_int(limit) {
            None | Some(0) => limits.default_limit,
            Some(limit) => clamp_limit(limit, limits.max_limit),
        };
        Self {
            offset,
            limit,
            order: Order::parse(order, seed),
        }
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    match raw?.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

fn clamp_limit(limit: i64, max_limit: usize) -> usize {
    let max_limit = max_limit.max(1);
    match usize::try_from(limit) {
        Ok(limit) => limit.clamp(1, max_limit),
        Err(_) => 1,
    }
}

/// One page of a longer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub next_offset: usize,
    pub has_more: bool,
}

/// Slice `[offset, offset + limit)` out of `items`.
///
/// An offset past the end yields an empty page with `next_offset == total`.
pub fn paginate<T: Clone>(items: &[T], offset: usize, limit: usize) -> Page<T> {
    let total = items.len();
    let start = offset.min(total);
    let end = start.saturating_add(limit).min(total);
    let page = items[start..end].to_vec();
    let next_offset = total.min(offset.saturating_add(page.len()));
    Page {
        has_more: next_offset < total,
        items: page,
        total,
        offset,
        limit,
        next_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 0)]
    #[case(Some(""), 0)]
    #[case(Some("abc"), 0)]
    #[case(Some("-5"), 0)]
    #[case(Some("7"), 7)]
    #[case(Some(" 12 "), 12)]
    #[case(Some("99999999999999999999"), usize::try_from(i64::MAX).unwrap_or(usize::MAX))]
    #[case(Some("-99999999999999999999"), 0)]
    fn test_offset_parsing(#[case] raw: Option<&str>, #[case] expected: usize) {
        let request = PageRequest::parse(raw, None, None, None, Limits::default());
        assert_eq!(request.offset, expected);
    }

    #[rstest]
    #[case(None, 120)]
    #[case(Some("x"), 120)]
    #[case(Some("0"), 120)]
    #[case(Some("-3"), 1)]
    #[case(Some("1"), 1)]
    #[case(Some("50"), 50)]
    #[case(Some("500"), 500)]
    #[case(Some("10000"), 500)]
    #[case(Some("99999999999999999999"), 500)]
    #[case(Some("-99999999999999999999"), 1)]
    fn test_limit_parsing(#[case] raw: Option<&str>, #[case] expected: usize) {
        let request = PageRequest::parse(None, raw, None, None, Limits::default());
        assert_eq!(request.limit, expected);
    }

    #[test]
    fn test_custom_limits() {
        let limits = Limits {
            default_limit: 10,
            max_limit: 20,
        };
        assert_eq!(PageRequest::parse(None, None, None, None, limits).limit, 10);
        assert_eq!(PageRequest::parse(None, Some("99"), None, None, limits).limit, 20);
    }

    #[rstest]
    #[case(None, Some("s1"), Order::Stable)]
    #[case(Some("name"), Some("s1"), Order::Stable)]
    #[case(Some("random"), Some("s1"), Order::Random { seed: "s1".to_string() })]
    #[case(Some("RANDOM"), Some("s1"), Order::Stable)]
    #[case(Some(" random"), Some("s1"), Order::Stable)]
    fn test_order_parsing(#[case] order: Option<&str>, #[case] seed: Option<&str>, #[case] expected: Order) {
        assert_eq!(Order::parse(order, seed), expected);
    }

    #[test]
    fn test_random_without_seed_uses_clock() {
        let Order::Random { seed } = Order::parse(Some("random"), Some("")) else {
            panic!("expected random order");
        };
        assert!(seed.parse::<i128>().unwrap() > 0);
    }

    #[test]
    fn test_paginate_example() {
        let items = vec!["a.png", "b.jpg", "c.gif"];
        let first = paginate(&items, 0, 2);
        assert_eq!(first.items, vec!["a.png", "b.jpg"]);
        assert_eq!(first.next_offset, 2);
        assert!(first.has_more);

        let second = paginate(&items, 2, 2);
        assert_eq!(second.items, vec!["c.gif"]);
        assert_eq!(second.next_offset, 3);
        assert!(!second.has_more);
    }

    #[test]
    fn test_paginate_past_end() {
        let items = vec![1, 2, 3];
        let page = paginate(&items, 10, 5);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.next_offset, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn test_overflowing_offset_is_past_end() {
        let huge = Some("99999999999999999999");
        let request = PageRequest::parse(huge, huge, None, None, Limits::default());
        let page = paginate(&[1, 2, 3], request.offset, request.limit);
        assert!(page.items.is_empty());
        assert_eq!(page.next_offset, 3);
        assert!(!page.has_more);
    }

    #[rstest]
    #[case(Order::Stable, 1)]
    #[case(Order::Stable, 7)]
    #[case(Order::Random { seed: "session".to_string() }, 3)]
    #[case(Order::Random { seed: "session".to_string() }, 100)]
    fn test_pages_reconstruct_list(#[case] order: Order, #[case] limit: usize) {
        let mut items: Vec<u32> = (0..23).collect();
        order.apply(&mut items);

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = paginate(&items, offset, limit);
            seen.extend(page.items);
            offset = page.next_offset;
            if !page.has_more {
                break;
            }
        }
        assert_eq!(seen, items);
    }
}
