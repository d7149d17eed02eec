//! QUOTA extension (RFC 2087).

use crate::command::ImapString;
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::{Mailbox, Quota, QuotaRoots};
use crate::{Error, Result};

/// GETQUOTA command.
#[derive(Debug)]
pub struct GetQuota {
    root: String,
    quota: Option<Quota>,
}

impl GetQuota {
    /// Reads the limits of quota `root`; the empty root is valid.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            quota: None,
        }
    }
}

impl Exchange for GetQuota {
    type Output = Quota;

    fn kind(&self) -> CommandKind {
        CommandKind::GetQuota
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(vec![ImapString::astring(&self.root)])
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Quota {
            self.quota = Some(convert::data::quota(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Quota> {
        Ok(self.quota.take().unwrap_or_else(|| Quota {
            root: self.root.clone(),
            resources: Vec::new(),
        }))
    }
}

/// SETQUOTA command.
///
/// The output is the QUOTA response the server may send back with the new
/// limits.
#[derive(Debug)]
pub struct SetQuota {
    root: String,
    limits: Vec<(String, u64)>,
    quota: Option<Quota>,
}

impl SetQuota {
    /// Sets `limits` (resource name, limit) on quota `root`. An empty list
    /// removes every limit.
    pub fn new(root: impl Into<String>, limits: Vec<(String, u64)>) -> Self {
        Self {
            root: root.into(),
            limits,
            quota: None,
        }
    }
}

impl Exchange for SetQuota {
    type Output = Option<Quota>;

    fn kind(&self) -> CommandKind {
        CommandKind::SetQuota
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        let mut limits = Vec::with_capacity(self.limits.len() * 2);
        for (resource, limit) in &self.limits {
            if resource.is_empty() {
                return Err(Error::request("SETQUOTA resource name is empty"));
            }
            limits.push(ImapString::atom(resource.to_ascii_uppercase()));
            limits.push(ImapString::number(*limit));
        }
        Ok(vec![
            ImapString::astring(&self.root),
            ImapString::List(limits),
        ])
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Quota {
            self.quota = Some(convert::data::quota(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Self::Output> {
        Ok(self.quota.take())
    }
}

/// GETQUOTAROOT command.
#[derive(Debug)]
pub struct GetQuotaRoot {
    mailbox: Mailbox,
    roots: QuotaRoots,
}

impl GetQuotaRoot {
    /// Lists the quota roots of `mailbox` and their limits.
    #[must_use]
    pub fn new(mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            roots: QuotaRoots::default(),
        }
    }
}

impl Exchange for GetQuotaRoot {
    type Output = QuotaRoots;

    fn kind(&self) -> CommandKind {
        CommandKind::GetQuotaRoot
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        if self.mailbox.as_str().is_empty() {
            return Err(Error::request("GETQUOTAROOT needs a mailbox name"));
        }
        Ok(vec![ImapString::mailbox(&self.mailbox)])
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        match data.kind {
            DataResponseType::QuotaRoot => {
                let (mailbox, roots) = convert::data::quota_root(data)?;
                self.roots.mailbox = Some(mailbox);
                self.roots.roots.extend(roots);
            }
            DataResponseType::Quota => self.roots.quotas.push(convert::data::quota(data)?),
            _ => {}
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<QuotaRoots> {
        Ok(std::mem::take(&mut self.roots))
    }
}
