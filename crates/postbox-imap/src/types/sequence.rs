//! Sequence sets for message ranges.

use crate::error::{Error, Result};

/// Most numbers [`SequenceSet::to_vec`] will produce. `1:4294967295` is
/// legal on the wire but would need 16 GiB once expanded.
pub const MAX_EXPANDED: u64 = 1 << 20;

/// Sequence set for specifying message ranges.
///
/// The same type serves message sequence numbers and UIDs; the command
/// decides which one is meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single number.
    Single(u32),
    /// Inclusive range.
    Range(u32, u32),
    /// Range from start to the end of the mailbox (`n:*`).
    RangeFrom(u32),
    /// The last message (`*`).
    Last,
    /// Multiple sequence specifications.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a sequence set from a single number.
    ///
    /// Returns `None` for 0, which is not a valid sequence number.
    #[must_use]
    pub const fn single(n: u32) -> Option<Self> {
        if n == 0 { None } else { Some(Self::Single(n)) }
    }

    /// Creates a range sequence set.
    #[must_use]
    pub const fn range(start: u32, end: u32) -> Option<Self> {
        if start == 0 || end == 0 {
            None
        } else {
            Some(Self::Range(start, end))
        }
    }

    /// Creates a set from a list of numbers.
    ///
    /// Returns `None` when the list is empty or contains 0.
    #[must_use]
    pub fn from_numbers(numbers: &[u32]) -> Option<Self> {
        match numbers {
            [] => None,
            [n] => Self::single(*n),
            _ => numbers
                .iter()
                .map(|&n| Self::single(n))
                .collect::<Option<Vec<_>>>()
                .map(Self::Set),
        }
    }

    /// Parses the `sequence-set` grammar, e.g. `1,3:5,7:*`.
    pub fn parse(input: &str) -> Result<Self> {
        let mut items = Vec::new();
        for part in input.split(',') {
            items.push(Self::parse_item(part)?);
        }
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Self::Set(items))
        }
    }

    fn parse_item(part: &str) -> Result<Self> {
        let number = |s: &str| -> Result<Option<u32>> {
            if s == "*" {
                return Ok(None);
            }
            match s.parse::<u32>() {
                Ok(0) | Err(_) => Err(Error::malformed(format!("invalid sequence number '{s}'"))),
                Ok(n) => Ok(Some(n)),
            }
        };

        match part.split_once(':') {
            None => Ok(number(part)?.map_or(Self::Last, Self::Single)),
            Some((start, end)) => match (number(start)?, number(end)?) {
                (Some(start), Some(end)) => Ok(Self::Range(start, end)),
                (Some(n), None) | (None, Some(n)) => Ok(Self::RangeFrom(n)),
                (None, None) => Ok(Self::Last),
            },
        }
    }

    /// How many numbers the set names, counting overlaps twice.
    ///
    /// Returns `None` if the set contains `*`.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Single(_) => Some(1),
            Self::Range(a, b) => Some(u64::from(a.abs_diff(*b)) + 1),
            Self::RangeFrom(_) | Self::Last => None,
            Self::Set(items) => items.iter().map(Self::count).sum(),
        }
    }

    /// Expands the set into individual numbers in written order.
    ///
    /// Ranges are expanded low to high regardless of how they were written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedData`] if the set contains `*` or names
    /// more than [`MAX_EXPANDED`] numbers.
    pub fn to_vec(&self) -> Result<Vec<u32>> {
        let count = self.count().ok_or_else(|| {
            Error::malformed(format!("cannot expand '{self}' without the mailbox size"))
        })?;
        if count > MAX_EXPANDED {
            return Err(Error::malformed(format!(
                "sequence set '{self}' names {count} numbers"
            )));
        }
        let mut out = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        self.expand_into(&mut out);
        Ok(out)
    }

    fn expand_into(&self, out: &mut Vec<u32>) {
        match self {
            Self::Single(n) => out.push(*n),
            Self::Range(a, b) => out.extend((*a).min(*b)..=(*a).max(*b)),
            Self::RangeFrom(_) | Self::Last => {}
            Self::Set(items) => {
                for item in items {
                    item.expand_into(out);
                }
            }
        }
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::Last => write!(f, "*"),
            Self::Set(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod constructor_tests {
        use super::*;

        #[test]
        fn zero_is_rejected() {
            assert!(SequenceSet::single(0).is_none());
            assert!(SequenceSet::range(0, 4).is_none());
            assert!(SequenceSet::from_numbers(&[1, 0]).is_none());
            assert!(SequenceSet::from_numbers(&[]).is_none());
        }

        #[test]
        fn from_numbers() {
            assert_eq!(SequenceSet::from_numbers(&[4]).unwrap().to_string(), "4");
            assert_eq!(
                SequenceSet::from_numbers(&[4, 9, 2]).unwrap().to_string(),
                "4,9,2"
            );
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn parse_compound() {
            let set = SequenceSet::parse("1,3:5,7:*").unwrap();
            assert_eq!(
                set,
                SequenceSet::Set(vec![
                    SequenceSet::Single(1),
                    SequenceSet::Range(3, 5),
                    SequenceSet::RangeFrom(7),
                ])
            );
            assert_eq!(set.to_string(), "1,3:5,7:*");
        }

        #[test]
        fn parse_star() {
            assert_eq!(SequenceSet::parse("*").unwrap(), SequenceSet::Last);
            assert_eq!(SequenceSet::parse("*:4").unwrap(), SequenceSet::RangeFrom(4));
        }

        #[test]
        fn parse_rejects_garbage() {
            assert!(SequenceSet::parse("").is_err());
            assert!(SequenceSet::parse("1,,2").is_err());
            assert!(SequenceSet::parse("0").is_err());
            assert!(SequenceSet::parse("a:b").is_err());
        }
    }

    mod expand_tests {
        use super::*;

        #[test]
        fn expands_in_written_order() {
            let set = SequenceSet::parse("304,319:320,10").unwrap();
            assert_eq!(set.to_vec().unwrap(), vec![304, 319, 320, 10]);
        }

        #[test]
        fn reversed_range_expands_ascending() {
            assert_eq!(SequenceSet::Range(5, 3).to_vec().unwrap(), vec![3, 4, 5]);
        }

        #[test]
        fn star_cannot_expand() {
            let err = SequenceSet::parse("1:*").unwrap().to_vec().unwrap_err();
            assert!(matches!(err, Error::MalformedData(_)));
            assert_eq!(SequenceSet::Last.count(), None);
        }

        #[test]
        fn huge_range_is_counted_not_expanded() {
            let set = SequenceSet::parse("1:4294967295").unwrap();
            assert_eq!(set.count(), Some(4_294_967_295));
            assert!(matches!(set.to_vec(), Err(Error::MalformedData(_))));

            let at_limit = SequenceSet::Range(1, 1 << 20);
            assert_eq!(at_limit.to_vec().unwrap().len(), 1 << 20);
        }

        #[test]
        fn count_sums_set_members() {
            let set = SequenceSet::parse("4,10:1,20").unwrap();
            assert_eq!(set.count(), Some(12));
        }
    }
}
