//! Message data carried by FETCH responses.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use super::Flags;

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete).
    pub adl: Option<String>,
    /// Mailbox name (local part), or group name when `host` is `None`.
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }

    /// Returns true for the start or end marker of an address group.
    #[must_use]
    pub const fn is_group_marker(&self) -> bool {
        self.host.is_none()
    }
}

/// The `body-fields` shared by every single-part body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyFields {
    /// Content-Type parameters, names upper-cased by most servers.
    pub params: Vec<(String, String)>,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding; empty when the server sent NIL.
    pub encoding: String,
    /// Encoded size in octets.
    pub size: u32,
}

impl BodyFields {
    /// Case-insensitive parameter lookup, e.g. `charset` or `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What distinguishes one single-part body from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// Anything that is neither `TEXT/*` nor `MESSAGE/RFC822`.
    Basic,
    /// `TEXT/*`, with its size in lines.
    Text {
        /// Line count.
        lines: u32,
    },
    /// `MESSAGE/RFC822` with the encapsulated message's own structure.
    Message {
        /// Envelope of the inner message.
        envelope: Box<Envelope>,
        /// Structure of the inner message.
        body: Box<BodyStructure>,
        /// Line count of the encapsulated message.
        lines: u32,
    },
}

/// Parsed BODY or BODYSTRUCTURE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// One MIME part.
    Single {
        /// Media type, upper-cased.
        media_type: String,
        /// Media subtype, upper-cased.
        media_subtype: String,
        /// Common fields.
        fields: BodyFields,
        /// Type-specific data.
        kind: PartKind,
    },
    /// `MULTIPART/*` and its children in order.
    Multipart {
        /// Child parts.
        parts: Vec<Self>,
        /// Subtype, upper-cased.
        subtype: String,
        /// Parameters such as `BOUNDARY`, present only with extension data.
        params: Vec<(String, String)>,
    },
}

impl BodyStructure {
    /// `type/subtype` in lower case.
    #[must_use]
    pub fn mime_type(&self) -> String {
        match self {
            Self::Single {
                media_type,
                media_subtype,
                ..
            } => format!("{media_type}/{media_subtype}"),
            Self::Multipart { subtype, .. } => format!("multipart/{subtype}"),
        }
        .to_ascii_lowercase()
    }

    /// Every non-multipart part with the section number that addresses it
    /// in `BODY[...]`, depth first. Parts inside an encapsulated message are
    /// listed after the `MESSAGE/RFC822` part that carries them.
    #[must_use]
    pub fn sections(&self) -> Vec<(String, &Self)> {
        let mut out = Vec::new();
        match self {
            Self::Multipart { .. } => self.number_children(None, &mut out),
            Self::Single { .. } => self.number("1".to_string(), &mut out),
        }
        out
    }

    fn number<'a>(&'a self, section: String, out: &mut Vec<(String, &'a Self)>) {
        match self {
            Self::Multipart { .. } => self.number_children(Some(&section), out),
            Self::Single { kind, .. } => {
                out.push((section.clone(), self));
                if let PartKind::Message { body, .. } = kind {
                    match &**body {
                        inner @ Self::Multipart { .. } => {
                            inner.number_children(Some(&section), out);
                        }
                        inner => inner.number(format!("{section}.1"), out),
                    }
                }
            }
        }
    }

    fn number_children<'a>(&'a self, prefix: Option<&str>, out: &mut Vec<(String, &'a Self)>) {
        if let Self::Multipart { parts, .. } = self {
            for (index, part) in parts.iter().enumerate() {
                let section = match prefix {
                    Some(prefix) => format!("{prefix}.{}", index + 1),
                    None => (index + 1).to_string(),
                };
                part.number(section, out);
            }
        }
    }
}

/// Accumulated attributes of one message.
///
/// A server may deliver attributes for the same message over several FETCH
/// responses; [`FetchAttributes::merge`] folds them together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchAttributes {
    /// FLAGS.
    pub flags: Option<Flags>,
    /// MODSEQ (CONDSTORE).
    pub modseq: Option<u64>,
    /// ENVELOPE.
    pub envelope: Option<Envelope>,
    /// INTERNALDATE.
    pub internal_date: Option<DateTime<FixedOffset>>,
    /// RFC822.SIZE.
    pub size: Option<u32>,
    /// BODY or BODYSTRUCTURE.
    pub body_structure: Option<BodyStructure>,
    /// UID.
    pub uid: Option<u32>,
    /// BINARY.SIZE[section], keyed by section.
    pub binary_sizes: BTreeMap<String, u32>,
    /// Section contents keyed by item name without the partial origin,
    /// e.g. `BODY[HEADER]` or `RFC822.TEXT`.
    pub sections: BTreeMap<String, Option<Vec<u8>>>,
    /// Origin octet of partial sections, e.g. 0 for `BODY[]<0>`.
    pub origins: BTreeMap<String, u32>,
}

impl FetchAttributes {
    /// Folds a later delivery for the same message into this one.
    ///
    /// Attributes present in `later` replace the current value; absent ones
    /// leave it untouched.
    pub fn merge(&mut self, later: Self) {
        if later.flags.is_some() {
            self.flags = later.flags;
        }
        if later.modseq.is_some() {
            self.modseq = later.modseq;
        }
        if later.envelope.is_some() {
            self.envelope = later.envelope;
        }
        if later.internal_date.is_some() {
            self.internal_date = later.internal_date;
        }
        if later.size.is_some() {
            self.size = later.size;
        }
        if later.body_structure.is_some() {
            self.body_structure = later.body_structure;
        }
        if later.uid.is_some() {
            self.uid = later.uid;
        }
        self.binary_sizes.extend(later.binary_sizes);
        self.sections.extend(later.sections);
        self.origins.extend(later.origins);
    }

    /// Looks up a section by item name, ignoring ASCII case. A partial
    /// fetch is found under its name without `<origin>`.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&[u8]> {
        self.sections
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_deref())
    }

    /// Returns true if no attribute was delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
