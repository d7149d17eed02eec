//! IMAP response parser.
//!
//! The parser is sans-I/O. [`ResponseReceiver`] takes one line at a time
//! and yields typed [`Response`] values; untagged data is kept generic as
//! [`ImapData`] items and interpreted later by [`crate::convert`].
//!
//! # Example
//!
//! ```
//! use postbox_imap::parser::{DataResponseType, Response, ResponseReceiver};
//!
//! let mut receiver = ResponseReceiver::new();
//! let response = receiver.receive_line(b"* 23 EXISTS\r\n").unwrap();
//!
//! match response {
//!     Some(Response::Data(data)) => {
//!         assert_eq!(data.kind, DataResponseType::Exists);
//!         assert_eq!(data.data[0].as_number::<u32>().unwrap(), 23);
//!     }
//!     _ => panic!("Expected EXISTS"),
//! }
//! ```

mod data;
pub mod lexer;
mod receiver;
mod response;

pub use data::ImapData;
pub use lexer::{Lexer, Token};
pub use receiver::ResponseReceiver;
pub use response::{
    ContinuationRequest, DataResponse, DataResponseType, RawCode, Response, ResponseText,
    TaggedStatus, UntaggedStatus,
};
