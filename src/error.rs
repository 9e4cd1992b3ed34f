//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use colored::Colorize;
use std::fmt::Display;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("design name cannot be empty")]
    EmptyDesignName,
    #[error("design name {0:?} contains invalid character {1:?}; only alphanumeric characters and underscores are valid in design names")]
    InvalidDesignName(String, char),
    #[error("missing required option {name:?} (at {origin}{})", Line(.line))]
    MissingOption {
        name: String,
        origin: String,
        line: Option<usize>,
    },
    #[error("{message} (at {origin}:{line})")]
    TemplateSyntax {
        message: String,
        origin: String,
        line: usize,
    },
    #[error("failed to render template (at {origin}{}): {message}", Line(.line))]
    TemplateRender {
        message: String,
        origin: String,
        line: Option<usize>,
    },
    #[error("platform {0:?} defined default clock but no matching resource was requested{1}")]
    DefaultClockNotRequested(String, Hint),
    #[error("platform {0:?} does not define a default clock")]
    NoDefaultClock(String),
    #[error("resource {0:?} does not define a clock")]
    ClockNotConstrained(String),
    #[error("no resource named {0:?} with number {1}")]
    ResourceNotFound(String, u32),
    #[error("resource {0}#{1} has already been requested")]
    ResourceAlreadyRequested(String, u32),
    #[error("resource {0}#{1} has no input pin")]
    PinHasNoInput(String, u32),
    #[error("signal {0:?} is already constrained to {1} Hz")]
    ClockAlreadyConstrained(String, f64),
    #[error("cannot create a default reset: a port named {0:?} already exists")]
    ResetNameTaken(String),
    #[error("domain {0:?} is used but not defined")]
    DomainNotDefined(String),
    #[error("signal {0:?} (id {1}) has no entry in the name map")]
    SignalNotInNameMap(String, u64),
    #[error("build plan already contains a file named {0:?}")]
    DuplicateFile(String),
    #[error("file path {0:?} must be relative and stay inside the build directory")]
    InvalidFilePath(String),
    #[error("unknown script syntax {0:?}; expected \"sh\" or \"bat\"")]
    UnknownSyntax(String),
    #[error("unknown cell library {0:?}{1}")]
    UnknownCellLibrary(String, Hint),
    #[error("failed to elaborate design: {0}")]
    ElaborationFailed(LastError),
    #[error("failed to convert design to a netlist: {0}")]
    NetlistFailed(LastError),
    #[error("failed to detect the current user identity: {0}")]
    UserIdentity(LastError),
    #[error("failed to write build plan: {0}")]
    Io(LastError),
    #[error("failed to archive build plan: {0}")]
    Archive(LastError),
    #[error("failed to read platform configuration: {0}")]
    BadConfig(LastError),
}

/// Formats an optional template line number as a `:line` suffix.
struct Line<'a>(&'a Option<usize>);

impl<'a> Display for Line<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(n) => write!(f, ":{}", n),
            None => Ok(()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct LastError(pub String);

impl Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Error::lowerize(self.0.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(LastError(value.to_string()))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(value: zip::result::ZipError) -> Self {
        Self::Archive(LastError(value.to_string()))
    }
}

impl Error {
    pub fn lowerize(s: String) -> String {
        // get the first word
        let first_word = match s.split_whitespace().next() {
            Some(w) => w,
            None => return s,
        };
        // retain punctuation if the first word is all-caps and longer than 1 character
        if first_word.len() > 1 && first_word.chars().any(|c| c.is_ascii_lowercase()) == false {
            s
        } else {
            s.char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect()
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    CellLibraryList,
    RequestDefaultClock,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::CellLibraryList => {
                "supported cell libraries are sky130_fd_sc_hd, sky130_fd_sc_hs, sky130_fd_sc_ms, sky130_fd_sc_ls and sky130_fd_sc_hdll"
            }
            Self::RequestDefaultClock => {
                "request the default clock resource in the design or let the platform create the \"sync\" domain"
            }
        };
        write!(
            f,
            "\n\n{}: {}",
            "hint".green(),
            Error::lowerize(message.to_string())
        )
    }
}
