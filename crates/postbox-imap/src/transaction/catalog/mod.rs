//! Typed commands.
//!
//! Each type here is an [`Exchange`](super::Exchange): build it with its
//! arguments, hand it to [`run`](super::run) and read the typed value from
//! the [`CommandResult`](super::CommandResult).

mod any_state;
mod auth;
pub mod idle;
mod i18n;
mod mailbox;
mod message;
mod metadata;
mod quota;
mod search;

pub use any_state::{Capability, Compress, Enable, Id, Logout, Noop, StartTls};
pub use auth::{Authenticate, Login};
pub use i18n::{Comparator, Language};
pub use idle::{Idle, IdleHandle, IdleState};
pub use mailbox::{
    Check, Close, Expunge, List, ListVariant, MailboxOp, MailboxOperation, Namespace, Rename,
    Select, Status, Unselect,
};
pub use message::{Append, AppendMessage, Copy, Fetch, Store, StoreOutcome};
pub use metadata::{Depth, GetMetadata, SetMetadata};
pub use quota::{GetQuota, GetQuotaRoot, SetQuota};
pub use search::{Search, Sort, Thread};
