//! Path context for the file operations of the company tree pipeline

use std::fmt;
use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// File operations performed while building a company tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    ReadTravels,
    ReadCompanies,
    CreateOutputDir,
    WriteCompanyTree,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            FileOp::ReadTravels => "read travels",
            FileOp::ReadCompanies => "read companies",
            FileOp::CreateOutputDir => "create output directory",
            FileOp::WriteCompanyTree => "write company tree",
        };
        f.write_str(action)
    }
}

/// Attach the failed operation and its path to an I/O error.
pub trait IoResultExt<T> {
    fn during(self, op: FileOp, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn during(self, op: FileOp, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{op}: {}", path.display()),
            source: Box::new(e),
        })
    }
}
