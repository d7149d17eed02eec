//! # postbox-imap
//!
//! An IMAP4rev1 (RFC 3501) client protocol engine: command encoding,
//! response parsing, typed conversion of server data and a per-command
//! transaction state machine over an upgradeable byte stream.
//!
//! ## Features
//!
//! - **One driver for every command**: each command is an
//!   [`Exchange`](transaction::Exchange) run by
//!   [`Transaction`](transaction::Transaction); every outcome becomes a
//!   [`CommandResult`](transaction::CommandResult) with a numeric
//!   [`ResultCode`](transaction::ResultCode)
//! - **Literals both ways**: synchronizing literals wait for `+`,
//!   LITERAL+ and BINARY `~{n}` literals are supported
//! - **In-band upgrades**: STARTTLS via rustls and COMPRESS=DEFLATE via
//!   flate2 keep bytes already read from the socket
//! - **IDLE**: a cloneable [`IdleHandle`](transaction::catalog::IdleHandle)
//!   ends IDLE from any task; DONE is written exactly once
//! - **Extensions**: MULTIAPPEND, UIDPLUS, NAMESPACE, QUOTA, ENABLE, ID,
//!   LANGUAGE, COMPARATOR, METADATA, SORT, THREAD, ESEARCH, LIST-EXTENDED,
//!   CONDSTORE, SASL-IR
//!
//! ## Quick Start
//!
//! ```no_run
//! use postbox_imap::connection::{Config, Connection};
//! use postbox_imap::transaction::{self, catalog};
//! use postbox_imap::types::Mailbox;
//!
//! #[tokio::main]
//! async fn main() -> postbox_imap::Result<()> {
//!     let mut conn = Connection::connect(&Config::new("imap.example.com")).await?;
//!     conn.receive_greeting().await?;
//!
//!     transaction::run(&mut conn, catalog::Login::new("user@example.com", "password"))
//!         .await
//!         .into_result()?;
//!
//!     let inbox = transaction::run(&mut conn, catalog::Select::new(Mailbox::inbox()))
//!         .await
//!         .into_result()?;
//!     println!("{} messages", inbox.exists);
//!
//!     transaction::run(&mut conn, catalog::Logout).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command arguments and wire encoding
//! - [`parser`]: sans-I/O lexer and response receiver
//! - [`convert`]: typed views of parsed responses
//! - [`connection`]: stream, framing, upgrades and timeouts
//! - [`transaction`]: the command state machine and catalog
//! - [`sasl`]: AUTHENTICATE mechanisms
//! - [`types`]: core IMAP types (flags, mailboxes, sequences, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod convert;
mod error;
pub mod parser;
pub mod sasl;
pub mod time;
pub mod transaction;
pub mod types;

pub use command::{Command, ImapString, TagGenerator};
pub use connection::{
    Config, ConfigBuilder, Connection, ImapStream, Security, Timeouts, TlsConfig,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseReceiver};
pub use transaction::{CommandKind, CommandResult, Exchange, ResultCode, Transaction};
pub use types::{Capability, CapabilitySet, Flag, Flags, Mailbox, ResponseCode, SequenceSet, Tag};

/// IMAP protocol version spoken.
pub const IMAP_VERSION: &str = "IMAP4rev1";
