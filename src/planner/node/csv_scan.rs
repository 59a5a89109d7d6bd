//! CSV file scan
//!
//! Reads tuples from an external delimited file. Only the file name is
//! required; the format characters default to RFC 4180 style (`,` as the
//! delimiter, `"` for both quote and escape) and NULL is the empty string.

use serde::{Deserialize, Serialize};

use super::{required, BuilderBase, PlanBody, PlanNode, PlanNodeBuilder, PlanNodeType};
use crate::planner::error::PlannerResult;

pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_QUOTE: char = '"';
pub const DEFAULT_ESCAPE: char = '"';

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_quote() -> char {
    DEFAULT_QUOTE
}

fn default_escape() -> char {
    DEFAULT_ESCAPE
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CsvScanPlan {
    file_name: String,
    #[serde(default = "default_delimiter")]
    delimiter: char,
    #[serde(default = "default_quote")]
    quote: char,
    #[serde(default = "default_escape")]
    escape: char,
    #[serde(default)]
    null_string: String,
}

impl CsvScanPlan {
    pub fn builder() -> CsvScanBuilder {
        CsvScanBuilder::default()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    pub fn escape(&self) -> char {
        self.escape
    }

    /// Text that reads back as NULL
    pub fn null_string(&self) -> &str {
        &self.null_string
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.file_name.is_empty() {
            return Err(format!("{} requires a non-empty file name", PlanNodeType::CsvScan));
        }
        if self.delimiter == self.quote {
            return Err(format!(
                "{} delimiter and quote must differ, both are {:?}",
                PlanNodeType::CsvScan,
                self.delimiter
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct CsvScanBuilder {
    base: BuilderBase,
    file_name: Option<String>,
    delimiter: char,
    quote: char,
    escape: char,
    null_string: String,
}

impl Default for CsvScanBuilder {
    fn default() -> Self {
        Self {
            base: BuilderBase::default(),
            file_name: None,
            delimiter: DEFAULT_DELIMITER,
            quote: DEFAULT_QUOTE,
            escape: DEFAULT_ESCAPE,
            null_string: String::new(),
        }
    }
}

impl CsvScanBuilder {
    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    #[must_use]
    pub fn null_string(mut self, null_string: impl Into<String>) -> Self {
        self.null_string = null_string.into();
        self
    }
}

impl PlanNodeBuilder for CsvScanBuilder {
    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> PlannerResult<PlanNode> {
        let file_name = required(self.file_name, PlanNodeType::CsvScan, "file_name")?;
        let body = CsvScanPlan {
            file_name,
            delimiter: self.delimiter,
            quote: self.quote,
            escape: self.escape,
            null_string: self.null_string,
        };
        self.base.finish(PlanBody::CsvScan(body))
    }
}
