// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Database
//!
//! Lookup interface over the schema catalog plus the loaders that populate
//! it from JSON definition files. The database is immutable after load, so
//! implementations require no locking; the processor holds a shared
//! read-only reference.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::catalog::event_def::EventDef;
use crate::error::EventError;
use crate::value_objects::EventCode;

/// Lookup interface for event databases.
pub trait EventDatabase: Send + Sync {
    /// Finds the definition for an event code
    fn find_by_code(&self, code: EventCode) -> Option<EventDef>;
}

/// In-memory event database keyed by code.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    defs: HashMap<EventCode, EventDef>,
}

impl MemoryDatabase {
    /// Builds a database from a list of definitions.
    ///
    /// Duplicate codes resolve to the last definition given; a warning is
    /// logged for each override.
    pub fn new(defs: Vec<EventDef>) -> Self {
        let mut map = HashMap::with_capacity(defs.len());
        for def in defs {
            let code = def.code;
            if map.insert(code, def).is_some() {
                warn!(%code, "duplicate event definition, last one wins");
            }
        }
        Self { defs: map }
    }

    /// Number of definitions loaded
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True when no definitions are loaded
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl EventDatabase for MemoryDatabase {
    fn find_by_code(&self, code: EventCode) -> Option<EventDef> {
        self.defs.get(&code).cloned()
    }
}

/// Reads event definitions from a JSON array file.
pub fn defs_from_file(path: impl AsRef<Path>) -> Result<Vec<EventDef>, EventError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|err| EventError::io_error(format!("opening file '{}': {}", path.display(), err)))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        EventError::SerializationError(format!(
            "unmarshalling event definitions from json file '{}': {}",
            path.display(),
            err
        ))
    })
}

/// Reads event definitions from every `*.json` file in a directory.
///
/// Files are visited in lexical order so that later files deterministically
/// override earlier ones.
pub fn defs_from_dir(path: impl AsRef<Path>) -> Result<Vec<EventDef>, EventError> {
    let path = path.as_ref();
    let entries = fs::read_dir(path)
        .map_err(|err| EventError::io_error(format!("reading dir '{}': {}", path.display(), err)))?;
    let mut files: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut defs = Vec::new();
    for file in files {
        defs.extend(defs_from_file(&file)?);
    }
    Ok(defs)
}

/// Loads a [`MemoryDatabase`] from explicit files plus directory scans.
pub fn load_database(
    files: &[impl AsRef<Path>],
    dirs: &[impl AsRef<Path>],
) -> Result<MemoryDatabase, EventError> {
    let mut defs = Vec::new();
    for file in files {
        defs.extend(defs_from_file(file)?);
    }
    for dir in dirs {
        defs.extend(defs_from_dir(dir)?);
    }
    Ok(MemoryDatabase::new(defs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn def_json(code: u32, codename: &str) -> String {
        format!(
            r#"{{"code":{},"type":"security","codename":"{}"}}"#,
            code, codename
        )
    }

    #[test]
    fn test_find_by_code() {
        let defs = defs_from_reader(&format!("[{}]", def_json(1000, "probe")));
        let db = MemoryDatabase::new(defs);
        assert!(db.find_by_code(EventCode::new(1000)).is_some());
        assert!(db.find_by_code(EventCode::new(9999)).is_none());
    }

    #[test]
    fn test_last_definition_wins() {
        let defs = defs_from_reader(&format!("[{},{}]", def_json(1000, "first"), def_json(1000, "second")));
        let db = MemoryDatabase::new(defs);
        assert_eq!(db.len(), 1);
        assert_eq!(db.find_by_code(EventCode::new(1000)).unwrap().codename, "second");
    }

    #[test]
    fn test_defs_from_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file_a = dir.path().join("a.json");
        let file_b = dir.path().join("b.json");
        let other = dir.path().join("notes.txt");
        std::fs::File::create(&file_a)
            .unwrap()
            .write_all(format!("[{}]", def_json(1, "a")).as_bytes())
            .unwrap();
        std::fs::File::create(&file_b)
            .unwrap()
            .write_all(format!("[{}]", def_json(2, "b")).as_bytes())
            .unwrap();
        std::fs::File::create(&other).unwrap().write_all(b"ignored").unwrap();

        let defs = defs_from_dir(dir.path()).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].codename, "a");

        let db = load_database(&[&file_a], &[dir.path().to_path_buf()]).unwrap();
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(defs_from_file("/definitely/not/here.json").is_err());
    }

    fn defs_from_reader(json: &str) -> Vec<EventDef> {
        serde_json::from_str(json).unwrap()
    }
}
