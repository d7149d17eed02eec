//! Response code converters.

use crate::parser::{ImapData, RawCode, ResponseText};
use crate::types::{AppendUid, CopyUid, ResponseCode, SequenceSet};
use crate::{Error, Result};

use super::data::{capabilities, flag_list};

/// Response codes from RFC 5530 that carry no arguments.
const CONDITIONS: &[&str] = &[
    "UNAVAILABLE",
    "AUTHENTICATIONFAILED",
    "AUTHORIZATIONFAILED",
    "EXPIRED",
    "PRIVACYREQUIRED",
    "CONTACTADMIN",
    "NOPERM",
    "INUSE",
    "EXPUNGEISSUED",
    "CORRUPTION",
    "SERVERBUG",
    "CANNOT",
    "LIMIT",
    "OVERQUOTA",
    "ALREADYEXISTS",
    "NONEXISTENT",
];

fn require(code: &RawCode, min: usize) -> Result<()> {
    if code.args.len() < min {
        return Err(Error::MalformedData(format!(
            "too few arguments for {}; expected is {min} but was {}",
            code.name,
            code.args.len()
        )));
    }
    Ok(())
}

fn sequence_set(value: &ImapData) -> Result<SequenceSet> {
    SequenceSet::parse(value.as_str()?)
}

/// Interprets a response code by name.
///
/// Unrecognised names become [`ResponseCode::Unknown`].
///
/// # Errors
///
/// Returns [`Error::MalformedData`] if a known code has missing or
/// ill-formed arguments.
pub fn parse(code: &RawCode) -> Result<ResponseCode> {
    let args = code.args.as_slice();
    let parsed = match code.name.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "UIDNOTSTICKY" => ResponseCode::UidNotSticky,
        "NOMODSEQ" => ResponseCode::NoModSeq,
        "COMPRESSIONACTIVE" => ResponseCode::CompressionActive,
        "CLIENTBUG" => ResponseCode::ClientBug,
        "BADCHARSET" => {
            let charsets = match args.first() {
                Some(list) => list
                    .as_list()?
                    .iter()
                    .map(ImapData::to_string_lossy)
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            ResponseCode::BadCharset(charsets)
        }
        "CAPABILITY" => ResponseCode::Capability(capabilities(args)),
        "PERMANENTFLAGS" => {
            require(code, 1)?;
            ResponseCode::PermanentFlags(flag_list(&args[0])?)
        }
        "UIDNEXT" => {
            require(code, 1)?;
            ResponseCode::UidNext(args[0].as_number()?)
        }
        "UIDVALIDITY" => {
            require(code, 1)?;
            ResponseCode::UidValidity(args[0].as_number()?)
        }
        "UNSEEN" => {
            require(code, 1)?;
            ResponseCode::Unseen(args[0].as_number()?)
        }
        "HIGHESTMODSEQ" => {
            require(code, 1)?;
            ResponseCode::HighestModSeq(args[0].as_number()?)
        }
        "REFERRAL" => {
            require(code, 1)?;
            ResponseCode::Referral(args[0].to_string_lossy()?)
        }
        "UNDEFINED-FILTER" => {
            require(code, 1)?;
            ResponseCode::UndefinedFilter(args[0].to_string_lossy()?)
        }
        "MODIFIED" => {
            require(code, 1)?;
            ResponseCode::Modified(sequence_set(&args[0])?)
        }
        "APPENDUID" => {
            require(code, 2)?;
            ResponseCode::AppendUid(AppendUid {
                uid_validity: args[0].as_number()?,
                uids: sequence_set(&args[1])?,
            })
        }
        "COPYUID" => {
            require(code, 3)?;
            ResponseCode::CopyUid(CopyUid {
                uid_validity: args[0].as_number()?,
                source: sequence_set(&args[1])?,
                destination: sequence_set(&args[2])?,
            })
        }
        "METADATA" => {
            require(code, 1)?;
            match args[0].keyword().as_deref() {
                Some("LONGENTRIES") => {
                    require(code, 2)?;
                    ResponseCode::MetadataLongEntries(args[1].as_number()?)
                }
                Some("MAXSIZE") => {
                    require(code, 2)?;
                    ResponseCode::MetadataMaxSize(args[1].as_number()?)
                }
                Some("TOOMANY") => ResponseCode::MetadataTooMany,
                Some("NOPRIVATE") => ResponseCode::MetadataNoPrivate,
                _ => ResponseCode::Unknown(format!("METADATA {}", args[0])),
            }
        }
        name if CONDITIONS.contains(&name) => ResponseCode::Condition(name.to_string()),
        name => ResponseCode::Unknown(name.to_string()),
    };
    Ok(parsed)
}

/// Interprets the code of a status text, if it has one.
///
/// # Errors
///
/// See [`parse`].
pub fn response_code(text: &ResponseText) -> Result<Option<ResponseCode>> {
    text.code.as_ref().map(parse).transpose()
}
