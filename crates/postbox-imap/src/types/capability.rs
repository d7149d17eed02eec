//! Server capabilities and status conditions.

/// Condition word of a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Condition {
    /// Parses a condition word, case-insensitively.
    #[must_use]
    pub fn parse(word: &[u8]) -> Option<Self> {
        if word.eq_ignore_ascii_case(b"OK") {
            Some(Self::Ok)
        } else if word.eq_ignore_ascii_case(b"NO") {
            Some(Self::No)
        } else if word.eq_ignore_ascii_case(b"BAD") {
            Some(Self::Bad)
        } else if word.eq_ignore_ascii_case(b"PREAUTH") {
            Some(Self::PreAuth)
        } else if word.eq_ignore_ascii_case(b"BYE") {
            Some(Self::Bye)
        } else {
            None
        }
    }

    /// Returns true if this condition may appear in a tagged response.
    #[must_use]
    pub const fn is_tagged_condition(self) -> bool {
        matches!(self, Self::Ok | Self::No | Self::Bad)
    }

    /// Returns the wire form of the condition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// IDLE command support (RFC 2177)
    Idle,
    /// NAMESPACE command support (RFC 2342)
    Namespace,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// MULTIAPPEND extension (RFC 3502)
    MultiAppend,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// BINARY extension (RFC 3516)
    Binary,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// SASL initial response (RFC 4959)
    SaslIr,
    /// AUTH mechanism
    Auth(String),
    /// COMPRESS mechanism (RFC 4978)
    Compress(String),
    /// ENABLE command (RFC 5161)
    Enable,
    /// CONDSTORE (RFC 4551)
    CondStore,
    /// QUOTA extension (RFC 2087)
    Quota,
    /// ID extension (RFC 2971)
    Id,
    /// UNSELECT command (RFC 3691)
    Unselect,
    /// ESEARCH extension (RFC 4731)
    ESearch,
    /// SORT extension (RFC 5256)
    Sort,
    /// ESORT, SORT with RETURN options (RFC 5267)
    ESort,
    /// THREAD algorithm (RFC 5256)
    Thread(String),
    /// LIST-EXTENDED (RFC 5258)
    ListExtended,
    /// XLIST (Gmail)
    XList,
    /// CREATE-SPECIAL-USE (RFC 6154)
    CreateSpecialUse,
    /// LANGUAGE command (RFC 5255)
    Language,
    /// I18NLEVEL (RFC 5255)
    I18nLevel(u8),
    /// METADATA (RFC 5464)
    Metadata,
    /// METADATA-SERVER (RFC 5464)
    MetadataServer,
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IDLE" => Self::Idle,
            "NAMESPACE" => Self::Namespace,
            "UIDPLUS" => Self::UidPlus,
            "MULTIAPPEND" => Self::MultiAppend,
            "LITERAL+" => Self::LiteralPlus,
            "BINARY" => Self::Binary,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "SASL-IR" => Self::SaslIr,
            "ENABLE" => Self::Enable,
            "CONDSTORE" => Self::CondStore,
            "QUOTA" => Self::Quota,
            "ID" => Self::Id,
            "UNSELECT" => Self::Unselect,
            "ESEARCH" => Self::ESearch,
            "SORT" => Self::Sort,
            "ESORT" => Self::ESort,
            "LIST-EXTENDED" => Self::ListExtended,
            "XLIST" => Self::XList,
            "CREATE-SPECIAL-USE" => Self::CreateSpecialUse,
            "LANGUAGE" => Self::Language,
            "METADATA" => Self::Metadata,
            "METADATA-SERVER" => Self::MetadataServer,
            _ if upper.starts_with("AUTH=") => Self::Auth(upper[5..].to_string()),
            _ if upper.starts_with("COMPRESS=") => Self::Compress(upper[9..].to_string()),
            _ if upper.starts_with("THREAD=") => Self::Thread(upper[7..].to_string()),
            _ if upper.starts_with("I18NLEVEL=") => upper[10..]
                .parse()
                .map_or_else(|_| Self::Unknown(s.to_string()), Self::I18nLevel),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Idle => write!(f, "IDLE"),
            Self::Namespace => write!(f, "NAMESPACE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::MultiAppend => write!(f, "MULTIAPPEND"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::Binary => write!(f, "BINARY"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::SaslIr => write!(f, "SASL-IR"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Compress(mech) => write!(f, "COMPRESS={mech}"),
            Self::Enable => write!(f, "ENABLE"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::Quota => write!(f, "QUOTA"),
            Self::Id => write!(f, "ID"),
            Self::Unselect => write!(f, "UNSELECT"),
            Self::ESearch => write!(f, "ESEARCH"),
            Self::Sort => write!(f, "SORT"),
            Self::ESort => write!(f, "ESORT"),
            Self::Thread(alg) => write!(f, "THREAD={alg}"),
            Self::ListExtended => write!(f, "LIST-EXTENDED"),
            Self::XList => write!(f, "XLIST"),
            Self::CreateSpecialUse => write!(f, "CREATE-SPECIAL-USE"),
            Self::Language => write!(f, "LANGUAGE"),
            Self::I18nLevel(level) => write!(f, "I18NLEVEL={level}"),
            Self::Metadata => write!(f, "METADATA"),
            Self::MetadataServer => write!(f, "METADATA-SERVER"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// An unordered set of capabilities.
///
/// Insertion order is kept for display; duplicates are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    items: Vec<Capability>,
}

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Adds a capability.
    pub fn insert(&mut self, capability: Capability) {
        if !self.items.contains(&capability) {
            self.items.push(capability);
        }
    }

    /// Returns a set with the capability added.
    #[must_use]
    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    /// Adds every capability of `other`.
    pub fn extend(&mut self, other: &Self) {
        for capability in &other.items {
            self.insert(capability.clone());
        }
    }

    /// Returns true if the capability is present.
    #[must_use]
    pub fn contains(&self, capability: &Capability) -> bool {
        self.items.contains(capability)
    }

    /// Returns true if every capability of `other` is present.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other.items.iter().all(|c| self.contains(c))
    }

    /// Returns the capabilities of `other` missing from this set.
    #[must_use]
    pub fn missing(&self, other: &Self) -> Self {
        other
            .items
            .iter()
            .filter(|c| !self.contains(c))
            .cloned()
            .collect()
    }

    /// Returns true if the server supports the given SASL mechanism.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.contains(&Capability::Auth(mechanism.to_ascii_uppercase()))
    }

    /// Returns an iterator over the capabilities.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.items.iter()
    }

    /// Returns the number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::new();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CapabilitySet {
    type Item = &'a Capability;
    type IntoIter = std::slice::Iter<'a, Capability>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl std::fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, capability) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{capability}")?;
        }
        Ok(())
    }
}
