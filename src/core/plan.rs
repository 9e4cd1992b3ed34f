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

//! The files produced for one design along with the script that runs them.

use crate::core::commands::Syntax;
use crate::error::Error;
use sha2::{Digest, Sha256};
use std::io::{Seek, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::FileOptions;
use zip::CompressionMethod;

/// Declare the type of compression algorithm to use.
const COMPRESSION_METHOD: CompressionMethod = CompressionMethod::Deflated;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    script: String,
    files: Vec<(String, Vec<u8>)>,
}

impl BuildPlan {
    /// Creates an empty plan whose entry script is named `script` (without extension).
    pub fn new(script: &str) -> Self {
        Self {
            script: script.to_string(),
            files: Vec::new(),
        }
    }

    /// Adds a file to the plan.
    ///
    /// The filename must be a relative path that stays within the plan root and
    /// must not already be part of the plan.
    pub fn add_file(&mut self, filename: &str, content: impl Into<Vec<u8>>) -> Result<(), Error> {
        if is_safe_path(filename) == false {
            return Err(Error::InvalidFilePath(filename.to_string()));
        }
        if self.get(filename).is_some() {
            return Err(Error::DuplicateFile(filename.to_string()));
        }
        self.files.push((filename.to_string(), content.into()));
        Ok(())
    }

    /// Iterates over the files in the order they were added.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(n, _)| n == filename)
            .map(|(_, c)| c.as_slice())
    }

    /// Returns the contents of `filename` if it is valid UTF-8.
    pub fn text(&self, filename: &str) -> Option<&str> {
        self.get(filename)
            .and_then(|c| std::str::from_utf8(c).ok())
    }

    /// The base name of the entry script.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// The filename of the entry script in the given syntax.
    pub fn script_file(&self, syntax: Syntax) -> String {
        format!("{}{}", self.script, syntax.extension())
    }

    /// Computes a hex-encoded SHA-256 digest over the names and contents of
    /// every file, independent of insertion order.
    pub fn digest(&self) -> String {
        let mut files: Vec<&(String, Vec<u8>)> = self.files.iter().collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut total = Sha256::new();
        let mut names = Sha256::new();
        for (name, content) in files {
            total.update(Sha256::digest(content));
            // names are terminated so adjacent names cannot run together
            names.update(name.as_bytes());
            names.update([0u8]);
        }
        total.update(names.finalize());
        total
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// Writes every file of the plan into a zip archive.
    pub fn archive<W: Write + Seek>(&self, writer: W) -> Result<W, Error> {
        let mut zip = zip::ZipWriter::new(writer);
        for (name, content) in &self.files {
            let mode = match name.ends_with(Syntax::Sh.extension()) {
                true => 0o755,
                false => 0o644,
            };
            let options = FileOptions::default()
                .compression_method(COMPRESSION_METHOD)
                .unix_permissions(mode);
            zip.start_file(name.as_str(), options)?;
            zip.write_all(content)?;
        }
        Ok(zip.finish()?)
    }

    /// Writes every file of the plan below `root`, creating directories as needed.
    pub fn extract(&self, root: &Path) -> Result<Vec<PathBuf>, Error> {
        let mut written = Vec::with_capacity(self.files.len());
        for (name, content) in &self.files {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
            tracing::trace!("wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }
}

/// Checks that `filename` is relative and never steps above its root.
fn is_safe_path(filename: &str) -> bool {
    if filename.is_empty() == true || filename.starts_with(['/', '\\']) == true {
        return false;
    }
    Path::new(filename).components().all(|c| match c {
        Component::Normal(_) | Component::CurDir => true,
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => false,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{Cursor, Read};

    fn plan() -> BuildPlan {
        let mut plan = BuildPlan::new("build_top");
        plan.add_file("build_top.sh", "echo hi\n").unwrap();
        plan.add_file("top.v", "module top; endmodule\n").unwrap();
        plan.add_file("data/blob.bin", vec![0u8, 159, 146, 150]).unwrap();
        plan
    }

    #[test]
    fn files_and_lookups() {
        let p = plan();
        assert_eq!(p.len(), 3);
        let names: Vec<&str> = p.files().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["build_top.sh", "top.v", "data/blob.bin"]);
        assert_eq!(p.text("top.v"), Some("module top; endmodule\n"));
        assert_eq!(p.text("data/blob.bin"), None);
        assert_eq!(p.get("data/blob.bin").unwrap().len(), 4);
        assert_eq!(p.get("missing"), None);
        assert_eq!(p.script(), "build_top");
        assert_eq!(p.script_file(Syntax::Sh), "build_top.sh");
        assert_eq!(p.script_file(Syntax::Bat), "build_top.bat");
    }

    #[test]
    fn rejects_duplicates() {
        let mut p = plan();
        assert_eq!(
            p.add_file("top.v", "again").unwrap_err(),
            Error::DuplicateFile("top.v".to_string())
        );
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn rejects_unsafe_paths() {
        let mut p = plan();
        for bad in ["", "/etc/passwd", "../up.txt", "a/../../b", "\\share"] {
            assert_eq!(
                p.add_file(bad, "x").unwrap_err(),
                Error::InvalidFilePath(bad.to_string())
            );
        }
        assert!(p.add_file("./nested/ok.txt", "x").is_ok());
    }

    #[test]
    fn digest_ignores_order() {
        let a = plan();
        let mut b = BuildPlan::new("build_top");
        b.add_file("data/blob.bin", vec![0u8, 159, 146, 150]).unwrap();
        b.add_file("top.v", "module top; endmodule\n").unwrap();
        b.add_file("build_top.sh", "echo hi\n").unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        let mut c = BuildPlan::new("build_top");
        c.add_file("build_top.sh", "echo hi\n").unwrap();
        assert_ne!(a.digest(), c.digest());
        // same contents under other names
        let mut d = BuildPlan::new("build_top");
        d.add_file("build_top2.sh", "echo hi\n").unwrap();
        assert_ne!(c.digest(), d.digest());
    }

    #[test]
    fn archive_contains_files() {
        let p = plan();
        let cursor = p.archive(Cursor::new(Vec::new())).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(zip.len(), 3);
        let mut contents = String::new();
        zip.by_name("top.v")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "module top; endmodule\n");
        assert_eq!(
            zip.by_name("build_top.sh").unwrap().unix_mode().map(|m| m & 0o777),
            Some(0o755)
        );
    }

    #[test]
    fn extract_writes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let p = plan();
        let written = p.extract(dir.path()).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("top.v")).unwrap(),
            "module top; endmodule\n"
        );
        assert_eq!(
            std::fs::read(dir.path().join("data").join("blob.bin")).unwrap(),
            vec![0u8, 159, 146, 150]
        );
    }
}
