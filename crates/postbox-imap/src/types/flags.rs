//! Message flags as they appear in FLAGS, PERMANENTFLAGS and STORE.
//!
//! System flags are recognised case-insensitively and always rendered in
//! their canonical spelling. Anything else is kept verbatim as a keyword;
//! keywords compare case-insensitively inside a [`Flags`] set, matching how
//! servers treat them.

use std::fmt;

/// One message flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `\Seen`
    Seen,
    /// `\Answered`
    Answered,
    /// `\Flagged`
    Flagged,
    /// `\Deleted`
    Deleted,
    /// `\Draft`
    Draft,
    /// `\Recent`, server-maintained and never settable.
    Recent,
    /// `\*` in PERMANENTFLAGS: new keywords may be created.
    Wildcard,
    /// `$Forwarded`, `NonJunk` or an unrecognised backslash flag.
    Keyword(String),
}

/// Canonical spellings of every non-keyword flag.
const SYSTEM: [(Flag, &str); 7] = [
    (Flag::Seen, "\\Seen"),
    (Flag::Answered, "\\Answered"),
    (Flag::Flagged, "\\Flagged"),
    (Flag::Deleted, "\\Deleted"),
    (Flag::Draft, "\\Draft"),
    (Flag::Recent, "\\Recent"),
    (Flag::Wildcard, "\\*"),
];

impl Flag {
    /// Interprets one flag token from the server.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.starts_with('\\') {
            if let Some((flag, _)) = SYSTEM.iter().find(|(_, name)| name.eq_ignore_ascii_case(s)) {
                return flag.clone();
            }
        }
        Self::Keyword(s.to_string())
    }

    /// Wire spelling of the flag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Keyword(keyword) => keyword,
            system => SYSTEM
                .iter()
                .find(|(flag, _)| flag == system)
                .map_or("", |(_, name)| *name),
        }
    }

    /// True for the flags defined by the base protocol.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        !matches!(self, Self::Keyword(_))
    }

    /// True when a client may ask the server to set this flag.
    #[must_use]
    pub const fn is_settable(&self) -> bool {
        !matches!(self, Self::Recent | Self::Wildcard)
    }

    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Keyword(a), Self::Keyword(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of flags in server order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(Vec<Flag>);

impl Flags {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `flag` unless an equivalent one is present; returns whether it
    /// was added.
    pub fn insert(&mut self, flag: Flag) -> bool {
        if self.contains(&flag) {
            return false;
        }
        self.0.push(flag);
        true
    }

    /// Drops `flag`; returns whether it was present.
    pub fn remove(&mut self, flag: &Flag) -> bool {
        let before = self.0.len();
        self.0.retain(|held| !held.same_as(flag));
        self.0.len() != before
    }

    /// Membership, with keywords matched case-insensitively.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.0.iter().any(|held| held.same_as(flag))
    }

    /// `\Seen` is set.
    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.contains(&Flag::Seen)
    }

    /// `\Deleted` is set.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.contains(&Flag::Deleted)
    }

    /// Whether PERMANENTFLAGS carried `\*`.
    #[must_use]
    pub fn allows_new_keywords(&self) -> bool {
        self.contains(&Flag::Wildcard)
    }

    /// Keywords only, in server order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|flag| match flag {
            Flag::Keyword(keyword) => Some(keyword.as_str()),
            _ => None,
        })
    }

    /// All flags, in server order.
    pub fn iter(&self) -> std::slice::Iter<'_, Flag> {
        self.0.iter()
    }

    /// Number of distinct flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No flags at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<Flag> for Flags {
    fn extend<I: IntoIterator<Item = Flag>>(&mut self, iter: I) {
        for flag in iter {
            self.insert(flag);
        }
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Self::new();
        flags.extend(iter);
        flags
    }
}

impl IntoIterator for Flags {
    type Item = Flag;
    type IntoIter = std::vec::IntoIter<Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Flags {
    type Item = &'a Flag;
    type IntoIter = std::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_flags_ignore_case() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\FLAGGED"), Flag::Flagged);
        assert_eq!(Flag::parse("\\deleted"), Flag::Deleted);
        assert_eq!(Flag::parse("\\*"), Flag::Wildcard);
        assert_eq!(Flag::parse("\\recent").to_string(), "\\Recent");
    }

    #[test]
    fn unknown_flags_are_kept_verbatim() {
        assert_eq!(Flag::parse("$Forwarded").as_str(), "$Forwarded");
        assert_eq!(
            Flag::parse("\\Important"),
            Flag::Keyword("\\Important".to_string())
        );
        assert!(!Flag::parse("Seen").is_system());
    }

    #[test]
    fn recent_and_wildcard_are_not_settable() {
        assert!(Flag::Seen.is_settable());
        assert!(Flag::Keyword("$Junk".to_string()).is_settable());
        assert!(!Flag::Recent.is_settable());
        assert!(!Flag::Wildcard.is_settable());
    }

    #[test]
    fn keywords_dedupe_case_insensitively() {
        let mut flags = Flags::new();
        assert!(flags.insert(Flag::Keyword("$Junk".to_string())));
        assert!(!flags.insert(Flag::Keyword("$JUNK".to_string())));
        assert!(flags.insert(Flag::Seen));
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.keywords().collect::<Vec<_>>(), ["$Junk"]);

        assert!(flags.remove(&Flag::Keyword("$junk".to_string())));
        assert!(!flags.remove(&Flag::Draft));
        assert!(flags.is_seen());
    }

    #[test]
    fn permanent_flags_wildcard() {
        let flags: Flags = [Flag::Deleted, Flag::Wildcard, Flag::Deleted]
            .into_iter()
            .collect();
        assert_eq!(flags.len(), 2);
        assert!(flags.allows_new_keywords());
        assert!(flags.is_deleted());
    }
}
