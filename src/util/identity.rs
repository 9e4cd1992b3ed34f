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

//! Identity of the user running the generator.
//!
//! Container invocations map the invoking user into the container so files
//! written to the mounted design directory keep their owner.

use crate::error::Error;
#[cfg(not(unix))]
use crate::error::LastError;

/// Returns the real user id of this process.
#[cfg(unix)]
pub fn getuid() -> Result<u32, Error> {
    // SAFETY: getuid has no preconditions and cannot fail
    Ok(unsafe { libc::getuid() })
}

/// Returns the real group id of this process.
#[cfg(unix)]
pub fn getgid() -> Result<u32, Error> {
    // SAFETY: getgid has no preconditions and cannot fail
    Ok(unsafe { libc::getgid() })
}

#[cfg(not(unix))]
fn unsupported() -> Error {
    Error::UserIdentity(LastError(
        "user and group ids are only available on unix hosts".to_string(),
    ))
}

#[cfg(not(unix))]
pub fn getuid() -> Result<u32, Error> {
    Err(unsupported())
}

#[cfg(not(unix))]
pub fn getgid() -> Result<u32, Error> {
    Err(unsupported())
}

#[cfg(all(test, unix))]
mod test {
    use super::*;
    use std::os::unix::fs::MetadataExt;

    #[test]
    fn ids_are_stable() {
        assert_eq!(getuid().unwrap(), getuid().unwrap());
        assert_eq!(getgid().unwrap(), getgid().unwrap());
    }

    #[test]
    fn uid_owns_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("owned");
        std::fs::write(&path, "").unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(getuid().unwrap(), meta.uid());
    }
}
