//! FETCH attribute converters.

use chrono::{DateTime, FixedOffset};

use crate::parser::ImapData;
use crate::types::{Address, BodyFields, BodyStructure, Envelope, FetchAttributes, PartKind};
use crate::{Error, Result};

use super::data::flag_list;
use super::{item, pairs};

/// Interprets the attribute list of a FETCH response.
///
/// Attributes this library does not know are skipped.
///
/// # Errors
///
/// Returns [`Error::MalformedData`] if the list is not made of name/value
/// pairs or a known attribute has the wrong shape.
pub fn attributes(list: &ImapData) -> Result<FetchAttributes> {
    let mut attrs = FetchAttributes::default();

    for (name, value) in pairs(list.as_list()?)? {
        let name = name.as_str()?.to_ascii_uppercase();
        match name.as_str() {
            "FLAGS" => attrs.flags = Some(flag_list(value)?),
            "MODSEQ" => {
                let modseq = value.as_list()?;
                attrs.modseq = Some(item(modseq, 0)?.as_number()?);
            }
            "ENVELOPE" => attrs.envelope = Some(envelope(value)?),
            "INTERNALDATE" => attrs.internal_date = Some(internal_date(value)?),
            "RFC822.SIZE" => attrs.size = Some(value.as_number()?),
            "BODY" | "BODYSTRUCTURE" => attrs.body_structure = Some(body_structure(value)?),
            "UID" => attrs.uid = Some(value.as_number()?),
            "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                attrs.sections.insert(name, value.as_nstring()?.map(<[u8]>::to_vec));
            }
            _ if name.starts_with("BINARY.SIZE[") => {
                attrs
                    .binary_sizes
                    .insert(section_of(&name).to_string(), value.as_number()?);
            }
            _ if name.starts_with("BODY[") || name.starts_with("BINARY[") => {
                let bytes = value.as_nstring()?.map(<[u8]>::to_vec);
                let (key, origin) = split_origin(&name)?;
                if let Some(origin) = origin {
                    attrs.origins.insert(key.to_string(), origin);
                }
                attrs.sections.insert(key.to_string(), bytes);
            }
            _ => {}
        }
    }

    Ok(attrs)
}

/// Text between the first `[` and the matching `]`.
/// Splits `BODY[1]<512>` into `BODY[1]` and the partial origin 512.
fn split_origin(name: &str) -> Result<(&str, Option<u32>)> {
    let Some(close) = name.rfind(']') else {
        return Ok((name, None));
    };
    let (key, rest) = name.split_at(close + 1);
    if rest.is_empty() {
        return Ok((key, None));
    }
    rest.strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .and_then(|digits| digits.parse().ok())
        .map(|origin| (key, Some(origin)))
        .ok_or_else(|| Error::MalformedData(format!("invalid partial origin in '{name}'")))
}

fn section_of(name: &str) -> &str {
    let start = name.find('[').map_or(0, |i| i + 1);
    let end = name.rfind(']').unwrap_or(name.len()).max(start);
    &name[start..end]
}

/// `"17-Jul-1996 02:44:25 -0700"`; the day may be space padded.
///
/// # Errors
///
/// Returns [`Error::MalformedData`] if the value is not a date-time.
pub fn internal_date(value: &ImapData) -> Result<DateTime<FixedOffset>> {
    let text = value.as_str()?;
    DateTime::parse_from_str(text.trim(), "%d-%b-%Y %H:%M:%S %z")
        .map_err(|e| Error::MalformedData(format!("invalid INTERNALDATE '{text}': {e}")))
}

/// Interprets an ENVELOPE structure.
///
/// # Errors
///
/// Returns [`Error::MalformedData`] if the structure has fewer than ten
/// fields or a field has the wrong shape.
pub fn envelope(value: &ImapData) -> Result<Envelope> {
    let fields = value.as_list()?;
    if fields.len() < 10 {
        return Err(Error::MalformedData(format!(
            "envelope needs 10 fields but has {}",
            fields.len()
        )));
    }

    Ok(Envelope {
        date: fields[0].to_nstring_lossy()?,
        subject: fields[1].to_nstring_lossy()?,
        from: address_list(&fields[2])?,
        sender: address_list(&fields[3])?,
        reply_to: address_list(&fields[4])?,
        to: address_list(&fields[5])?,
        cc: address_list(&fields[6])?,
        bcc: address_list(&fields[7])?,
        in_reply_to: fields[8].to_nstring_lossy()?,
        message_id: fields[9].to_nstring_lossy()?,
    })
}

fn address_list(value: &ImapData) -> Result<Vec<Address>> {
    value
        .as_list_or_nil()?
        .iter()
        .map(|address| {
            let parts = address.as_list()?;
            if parts.len() < 4 {
                return Err(Error::MalformedData(format!(
                    "address needs 4 fields but has {}",
                    parts.len()
                )));
            }
            Ok(Address {
                name: parts[0].to_nstring_lossy()?,
                adl: parts[1].to_nstring_lossy()?,
                mailbox: parts[2].to_nstring_lossy()?,
                host: parts[3].to_nstring_lossy()?,
            })
        })
        .collect()
}

/// `NIL` or `("name" "value" ...)`.
fn body_params(value: &ImapData) -> Result<Vec<(String, String)>> {
    pairs(value.as_list_or_nil()?)?
        .map(|(key, value)| {
            Ok((
                key.to_string_lossy()?,
                value.to_nstring_lossy()?.unwrap_or_default(),
            ))
        })
        .collect()
}

fn upper(value: &ImapData) -> Result<String> {
    Ok(value
        .to_nstring_lossy()?
        .unwrap_or_default()
        .to_ascii_uppercase())
}

/// Interprets a BODY or BODYSTRUCTURE value, recursing into multiparts and
/// nested messages. Media types and subtypes are upper-cased.
///
/// # Errors
///
/// Returns [`Error::MalformedData`] if a part has too few fields or a field
/// has the wrong shape.
pub fn body_structure(value: &ImapData) -> Result<BodyStructure> {
    let fields = value.as_list()?;

    let part_count = fields.iter().take_while(|f| f.is_list()).count();
    if part_count > 0 {
        let parts = fields[..part_count]
            .iter()
            .map(body_structure)
            .collect::<Result<Vec<_>>>()?;
        let subtype = upper(item(fields, part_count)?)?;
        let params = match fields.get(part_count + 1) {
            Some(params) => body_params(params)?,
            None => Vec::new(),
        };
        return Ok(BodyStructure::Multipart {
            parts,
            subtype,
            params,
        });
    }

    if fields.len() < 7 {
        return Err(Error::MalformedData(format!(
            "body part needs 7 fields but has {}",
            fields.len()
        )));
    }
    let media_type = upper(&fields[0])?;
    let media_subtype = upper(&fields[1])?;
    let common = BodyFields {
        params: body_params(&fields[2])?,
        id: fields[3].to_nstring_lossy()?,
        description: fields[4].to_nstring_lossy()?,
        encoding: fields[5].to_nstring_lossy()?.unwrap_or_default(),
        size: fields[6].as_number()?,
    };

    let kind = match (media_type.as_str(), media_subtype.as_str()) {
        ("TEXT", _) => PartKind::Text {
            lines: fields.get(7).map(ImapData::as_number).transpose()?.unwrap_or(0),
        },
        ("MESSAGE", "RFC822") if fields.len() >= 10 => PartKind::Message {
            envelope: Box::new(envelope(&fields[7])?),
            body: Box::new(body_structure(&fields[8])?),
            lines: fields[9].as_number()?,
        },
        _ => PartKind::Basic,
    };
    Ok(BodyStructure::Single {
        media_type,
        media_subtype,
        fields: common,
        kind,
    })
}
