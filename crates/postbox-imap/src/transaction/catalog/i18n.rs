//! Internationalization commands (RFC 5255).

use crate::command::ImapString;
use crate::convert;
use crate::parser::{DataResponse, DataResponseType, TaggedStatus};
use crate::transaction::{CommandKind, Exchange};
use crate::types::ComparatorOutcome;
use crate::Result;

/// LANGUAGE command.
///
/// Without tags the server lists the languages it supports; with tags it
/// switches to the first one it accepts and reports it.
#[derive(Debug, Default)]
pub struct Language {
    tags: Vec<String>,
    languages: Vec<String>,
}

impl Language {
    /// Requests the given language tags in order of preference.
    #[must_use]
    pub const fn new(tags: Vec<String>) -> Self {
        Self {
            tags,
            languages: Vec::new(),
        }
    }
}

impl Exchange for Language {
    type Output = Vec<String>;

    fn kind(&self) -> CommandKind {
        CommandKind::Language
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(self.tags.iter().map(|tag| ImapString::astring(tag)).collect())
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Language {
            self.languages.extend(convert::data::language(data)?);
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<Vec<String>> {
        Ok(std::mem::take(&mut self.languages))
    }
}

/// COMPARATOR command.
///
/// Without arguments the server reports the active comparator; with
/// arguments it activates the first one it supports.
#[derive(Debug, Default)]
pub struct Comparator {
    comparators: Vec<String>,
    outcome: ComparatorOutcome,
}

impl Comparator {
    /// Requests the given comparators in order of preference.
    #[must_use]
    pub fn new(comparators: Vec<String>) -> Self {
        Self {
            comparators,
            outcome: ComparatorOutcome::default(),
        }
    }
}

impl Exchange for Comparator {
    type Output = ComparatorOutcome;

    fn kind(&self) -> CommandKind {
        CommandKind::Comparator
    }

    fn prepare(&mut self) -> Result<Vec<ImapString>> {
        Ok(self
            .comparators
            .iter()
            .map(|name| ImapString::astring(name))
            .collect())
    }

    fn on_data(&mut self, data: &DataResponse) -> Result<()> {
        if data.kind == DataResponseType::Comparator {
            self.outcome = convert::data::comparator(data)?;
        }
        Ok(())
    }

    fn finish_ok(&mut self, _tagged: &TaggedStatus) -> Result<ComparatorOutcome> {
        Ok(std::mem::take(&mut self.outcome))
    }
}
