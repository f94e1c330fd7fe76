//! Synthetic sample value generation.
//!
//! Each method produces a string that would satisfy the corresponding
//! comparator: `containing("whoami")` yields a random string with `whoami`
//! spliced in, `matching_regex(r"\d{2}")` yields two random digits, and so
//! on. Regex and CIDR parse failures degrade to an empty string with a
//! warning rather than failing the whole rule.

use ipnet::Ipv4Net;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex_syntax::hir::{Class, Hir, HirKind};
use std::net::Ipv4Addr;

const RANDOM_LEN: usize = 10;
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How many extra repetitions to draw for unbounded `*` / `+` / `{m,}`.
const UNBOUNDED_REP_SLACK: u32 = 9;

/// Generates synthetic sample values from a pseudo-random source.
#[derive(Debug)]
pub struct SyntheticDataGenerator {
    rng: StdRng,
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticDataGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with a fixed seed, for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A random string containing `value` as a substring: `value` is spliced
    /// into a 10-character random alphanumeric string at a uniform position.
    pub fn containing(&mut self, value: &str) -> String {
        let filler = self.random_string(RANDOM_LEN);
        let index = self.rng.gen_range(0..=filler.len());
        format!("{}{}{}", &filler[..index], value, &filler[index..])
    }

    /// `value` followed by a 10-character random alphanumeric suffix.
    pub fn starting_with(&mut self, value: &str) -> String {
        format!("{}{}", value, self.random_string(RANDOM_LEN))
    }

    /// A 10-character random alphanumeric prefix followed by `value`.
    pub fn ending_with(&mut self, value: &str) -> String {
        format!("{}{}", self.random_string(RANDOM_LEN), value)
    }

    /// A string matching the given Perl-flavored regex pattern, or an empty
    /// string if the pattern fails to parse.
    pub fn matching_regex(&mut self, pattern: &str) -> String {
        let hir = match regex_syntax::Parser::new().parse(pattern) {
            Ok(hir) => hir,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "regex parsing error");
                return String::new();
            }
        };

        let mut out = String::new();
        self.write_regex_sample(&hir, &mut out);
        out
    }

    fn write_regex_sample(&mut self, hir: &Hir, out: &mut String) {
        match hir.kind() {
            HirKind::Empty => {}
            HirKind::Literal(lit) => {
                out.push_str(&String::from_utf8_lossy(&lit.0));
            }
            HirKind::Class(class) => {
                if let Some(c) = self.sample_class(class) {
                    out.push(c);
                }
            }
            HirKind::Repetition(rep) => {
                let max = rep.max.unwrap_or(rep.min + UNBOUNDED_REP_SLACK);
                let count = rep.min + self.rng.gen_range(0..=max.saturating_sub(rep.min));
                for _ in 0..count {
                    self.write_regex_sample(&rep.sub, out);
                }
            }
            HirKind::Capture(cap) => self.write_regex_sample(&cap.sub, out),
            HirKind::Concat(parts) => {
                for part in parts {
                    self.write_regex_sample(part, out);
                }
            }
            // Zero-width assertions contribute no characters
            HirKind::Look(_) => {}
            other => {
                tracing::warn!(?other, "unsupported regex node");
            }
        }
    }

    /// Pick a random character from a character class: uniform over ranges,
    /// then uniform within the chosen range.
    fn sample_class(&mut self, class: &Class) -> Option<char> {
        match class {
            Class::Unicode(cls) => {
                let ranges = cls.ranges();
                if ranges.is_empty() {
                    return None;
                }
                let range = ranges[self.rng.gen_range(0..ranges.len())];
                let code = self
                    .rng
                    .gen_range(u32::from(range.start())..=u32::from(range.end()));
                char::from_u32(code).or(Some(range.start()))
            }
            Class::Bytes(cls) => {
                let ranges = cls.ranges();
                if ranges.is_empty() {
                    return None;
                }
                let range = ranges[self.rng.gen_range(0..ranges.len())];
                let byte = self.rng.gen_range(range.start()..=range.end());
                Some(byte as char)
            }
        }
    }

    /// A random host address inside the given IPv4 CIDR block, excluding the
    /// network and broadcast addresses. Blocks with no usable host (`/31`,
    /// `/32`) and parse failures degrade to an empty string.
    pub fn inside_cidr(&mut self, cidr: &str) -> String {
        let net: Ipv4Net = match cidr.parse() {
            Ok(net) => net,
            Err(e) => {
                tracing::warn!(cidr, error = %e, "CIDR parsing error");
                return String::new();
            }
        };

        if net.prefix_len() >= 31 {
            tracing::warn!(cidr, "CIDR block has no usable host addresses");
            return String::new();
        }

        // block size minus network and broadcast; shift on the mask so a
        // /0 block stays in u32 range
        let host_count = (u32::MAX >> net.prefix_len()) - 1;
        let offset = self.rng.gen_range(1..=host_count);
        let addr = u32::from(net.network()) + offset;
        Ipv4Addr::from(addr).to_string()
    }

    /// A value strictly greater than `value`: numerically when it parses as
    /// an integer, otherwise by appending a character.
    pub fn greater_than(&mut self, value: &str) -> String {
        match value.parse::<i64>() {
            Ok(n) => n
                .saturating_add(1 + self.rng.gen_range(0..100))
                .to_string(),
            Err(_) => {
                let tail = CHARSET[self.rng.gen_range(0..CHARSET.len())] as char;
                format!("{value}{tail}")
            }
        }
    }

    /// A value strictly less than `value`: numerically when it parses as an
    /// integer, otherwise by dropping the final character. When dropping
    /// would leave nothing, the input is returned unchanged.
    pub fn less_than(&mut self, value: &str) -> String {
        match value.parse::<i64>() {
            Ok(n) => n
                .saturating_sub(1 + self.rng.gen_range(0..100))
                .to_string(),
            Err(_) => {
                let mut s = value.to_string();
                s.pop();
                if s.is_empty() {
                    value.to_string()
                } else {
                    s
                }
            }
        }
    }

    /// A value `>= value`. The input already satisfies the relation.
    pub fn at_least(&mut self, value: &str) -> String {
        value.to_string()
    }

    /// A value `<= value`. The input already satisfies the relation.
    pub fn at_most(&mut self, value: &str) -> String {
        value.to_string()
    }

    fn random_string(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| CHARSET[self.rng.gen_range(0..CHARSET.len())] as char)
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing() {
        let mut g = SyntheticDataGenerator::with_seed(1);
        let value = "test_value";
        let result = g.containing(value);
        assert!(result.contains(value), "got: {result}");
        assert_eq!(result.len(), RANDOM_LEN + value.len());
    }

    #[test]
    fn test_starting_with() {
        let mut g = SyntheticDataGenerator::with_seed(2);
        let result = g.starting_with("prefix_");
        assert!(result.starts_with("prefix_"), "got: {result}");
        assert_eq!(result.len(), RANDOM_LEN + "prefix_".len());
    }

    #[test]
    fn test_ending_with() {
        let mut g = SyntheticDataGenerator::with_seed(3);
        let result = g.ending_with("_suffix");
        assert!(result.ends_with("_suffix"), "got: {result}");
    }

    #[test]
    fn test_random_part_is_alphanumeric() {
        let mut g = SyntheticDataGenerator::with_seed(4);
        let result = g.starting_with("");
        assert!(result.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_matching_regex() {
        let mut g = SyntheticDataGenerator::with_seed(5);
        let pattern = r"\d{2}-BC\S{4}";
        let checker = regex::Regex::new(pattern).unwrap();
        for _ in 0..20 {
            let result = g.matching_regex(pattern);
            assert!(checker.is_match(&result), "'{result}' does not match {pattern}");
        }
    }

    #[test]
    fn test_matching_regex_literal_and_class() {
        let mut g = SyntheticDataGenerator::with_seed(6);
        let result = g.matching_regex("abc[0-9]");
        assert!(regex::Regex::new("^abc[0-9]$").unwrap().is_match(&result));
    }

    #[test]
    fn test_matching_regex_unbounded_repetition_is_capped() {
        let mut g = SyntheticDataGenerator::with_seed(7);
        for _ in 0..20 {
            let result = g.matching_regex("a+");
            assert!(!result.is_empty());
            assert!(result.len() <= 1 + UNBOUNDED_REP_SLACK as usize);
            assert!(result.bytes().all(|b| b == b'a'));
        }
    }

    #[test]
    fn test_invalid_regex_degrades_to_empty() {
        let mut g = SyntheticDataGenerator::with_seed(8);
        assert_eq!(g.matching_regex("[unclosed"), "");
    }

    #[test]
    fn test_inside_cidr() {
        let mut g = SyntheticDataGenerator::with_seed(9);
        let net: Ipv4Net = "192.168.1.0/24".parse().unwrap();
        for _ in 0..50 {
            let result = g.inside_cidr("192.168.1.0/24");
            let ip: Ipv4Addr = result.parse().unwrap();
            assert!(net.contains(&ip), "{ip} not in {net}");
            assert_ne!(ip, net.network());
            assert_ne!(ip, net.broadcast());
        }
    }

    #[test]
    fn test_cidr_without_hosts_degrades_to_empty() {
        let mut g = SyntheticDataGenerator::with_seed(10);
        assert_eq!(g.inside_cidr("10.0.0.0/32"), "");
        assert_eq!(g.inside_cidr("10.0.0.0/31"), "");
        assert_eq!(g.inside_cidr("not-a-cidr"), "");
    }

    #[test]
    fn test_cidr_zero_prefix_excludes_network_and_broadcast() {
        let mut g = SyntheticDataGenerator::with_seed(14);
        for _ in 0..50 {
            let result = g.inside_cidr("0.0.0.0/0");
            let ip: Ipv4Addr = result.parse().unwrap();
            assert_ne!(ip, Ipv4Addr::new(0, 0, 0, 0));
            assert_ne!(ip, Ipv4Addr::new(255, 255, 255, 255));
        }
    }

    #[test]
    fn test_greater_than() {
        let mut g = SyntheticDataGenerator::with_seed(11);
        let n: i64 = g.greater_than("100").parse().unwrap();
        assert!(n > 100);

        let s = g.greater_than("test");
        assert!(s.as_str() > "test");
    }

    #[test]
    fn test_less_than() {
        let mut g = SyntheticDataGenerator::with_seed(12);
        let n: i64 = g.less_than("100").parse().unwrap();
        assert!(n < 100);

        let s = g.less_than("test");
        assert!(s.as_str() < "test");
    }

    #[test]
    fn test_less_than_never_empties_the_value() {
        let mut g = SyntheticDataGenerator::with_seed(15);
        assert_eq!(g.less_than("a"), "a");
        assert_eq!(g.less_than(""), "");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut g = SyntheticDataGenerator::with_seed(13);
        assert_eq!(g.at_least("100"), "100");
        assert_eq!(g.at_most("test"), "test");
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let a = SyntheticDataGenerator::with_seed(42).containing("x");
        let b = SyntheticDataGenerator::with_seed(42).containing("x");
        assert_eq!(a, b);
    }
}
