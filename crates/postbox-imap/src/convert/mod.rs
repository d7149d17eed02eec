//! Typed views of parsed responses.
//!
//! Converters are pure functions over [`DataResponse`], [`RawCode`] and
//! [`ImapData`]. Each checks the shape of its input before interpreting
//! values and reports mismatches as [`Error::MalformedData`].
//!
//! [`RawCode`]: crate::parser::RawCode

pub mod code;
pub mod data;
pub mod fetch;

use crate::parser::{DataResponse, DataResponseType, ImapData};
use crate::{Error, Result};

/// Checks the kind and minimum item count of a data response.
///
/// # Errors
///
/// Returns [`Error::MalformedData`] naming the expected and actual kind or
/// item count.
pub fn reject_malformed(
    resp: &DataResponse,
    expected: DataResponseType,
    min_len: usize,
) -> Result<()> {
    if resp.kind != expected {
        return Err(Error::MalformedData(format!(
            "expected data type is {expected}, but was {}",
            resp.keyword
        )));
    }
    if resp.data.len() < min_len {
        return Err(Error::MalformedData(format!(
            "too few data counts; expected is {min_len} but was {}",
            resp.data.len()
        )));
    }
    Ok(())
}

/// Returns `items[index]` or a shape error.
pub(crate) fn item(items: &[ImapData], index: usize) -> Result<&ImapData> {
    items.get(index).ok_or_else(|| {
        Error::MalformedData(format!(
            "too few data counts; expected is {} but was {}",
            index + 1,
            items.len()
        ))
    })
}

/// Splits a list of `name value` pairs.
pub(crate) fn pairs(items: &[ImapData]) -> Result<impl Iterator<Item = (&ImapData, &ImapData)>> {
    if items.len() % 2 != 0 {
        return Err(Error::MalformedData(format!(
            "expected name/value pairs but got {} items",
            items.len()
        )));
    }
    Ok(items.chunks_exact(2).map(|pair| (&pair[0], &pair[1])))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resp(kind: DataResponseType, data: Vec<ImapData>) -> DataResponse {
        DataResponse {
            kind,
            keyword: kind.as_str().to_string(),
            data,
        }
    }

    #[test]
    fn test_wrong_kind_message() {
        let r = resp(DataResponseType::Search, vec![]);
        let err = reject_malformed(&r, DataResponseType::Status, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed data: expected data type is STATUS, but was SEARCH"
        );
    }

    #[test]
    fn test_too_few_items_message() {
        let r = resp(DataResponseType::Status, vec![ImapData::text("INBOX")]);
        let err = reject_malformed(&r, DataResponseType::Status, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed data: too few data counts; expected is 2 but was 1"
        );
    }

    #[test]
    fn test_pairs_rejects_odd_length() {
        assert!(pairs(&[ImapData::text("UID")]).is_err());
        assert_eq!(pairs(&[ImapData::text("UID"), ImapData::text("4")]).unwrap().count(), 1);
    }
}
