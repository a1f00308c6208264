// src/repomd/sqlite.rs

//! SQLite-encoded filelists metadata
//!
//! Some repositories publish `filelists_db` instead of filelists XML. The
//! payload is written to a private temp file, opened relationally, and walked
//! through one of two observed schema variants for the files table:
//! `(dirname, filename[s])` pairs joined via `pkgKey`, or a single
//! full-path column. `pkgKey -> (name, arch)` comes from the `packages`
//! table either way. The temp file is removed when the call returns,
//! success or not.

use super::filelists::PkgLocator;
use super::index::PkgMeta;
use crate::error::{Error, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

/// Apply a SQLite filelists payload to the packages parsed from primary
pub fn apply_filelists_db(data: &[u8], packages: &mut [PkgMeta]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new()?;
    tmp.write_all(data)?;
    tmp.flush()?;

    let conn = Connection::open(tmp.path())?;
    apply_from_connection(&conn, packages)
}

fn apply_from_connection(conn: &Connection, packages: &mut [PkgMeta]) -> Result<()> {
    let locator = PkgLocator::new(packages);
    let keys = load_package_keys(conn)?;

    let table = ["filelist", "files"]
        .into_iter()
        .find(|t| table_exists(conn, t))
        .ok_or_else(|| {
            Error::MetadataError("no filelist table in SQLite metadata".to_string())
        })?;

    let columns = table_columns(conn, table)?;
    let mut applied = 0usize;

    if columns.iter().any(|c| c == "dirname") {
        // (dirname, filename[s]) variant; "filenames" packs several names
        // separated by '/'
        let file_col = if columns.iter().any(|c| c == "filenames") {
            "filenames"
        } else {
            "filename"
        };
        let split_names = file_col == "filenames";

        let mut stmt = conn.prepare(&format!(
            "SELECT pkgKey, dirname, {file_col} FROM {table}"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (key, dirname, names) = row?;
            let dir = dirname.trim_end_matches('/');
            let names = if split_names {
                names.split('/').map(str::to_string).collect::<Vec<_>>()
            } else {
                vec![names]
            };
            for name in names {
                if name.is_empty() {
                    continue;
                }
                applied += apply_path(&keys, &locator, packages, key, format!("{dir}/{name}"));
            }
        }
    } else {
        let path_col = ["path", "file", "filepath", "filename"]
            .into_iter()
            .find(|c| columns.iter().any(|col| col == c))
            .ok_or_else(|| {
                Error::MetadataError(format!("unrecognized {table} schema in SQLite metadata"))
            })?;

        let mut stmt = conn.prepare(&format!("SELECT pkgKey, {path_col} FROM {table}"))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, path) = row?;
            applied += apply_path(&keys, &locator, packages, key, path);
        }
    }

    debug!("SQLite filelists contributed {applied} file paths");
    Ok(())
}

/// Attach one path to the package owning `pkgKey`; returns 1 when applied
fn apply_path(
    keys: &HashMap<i64, (String, String)>,
    locator: &PkgLocator,
    packages: &mut [PkgMeta],
    key: i64,
    path: String,
) -> usize {
    let Some((name, arch)) = keys.get(&key) else {
        return 0;
    };
    let Some(idx) = locator.find(name, arch) else {
        return 0;
    };
    packages[idx].files.insert(path);
    1
}

/// pkgKey -> (name, arch) from the packages table
fn load_package_keys(conn: &Connection) -> Result<HashMap<i64, (String, String)>> {
    let mut stmt = conn.prepare("SELECT pkgKey, name, arch FROM packages")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;

    let mut keys = HashMap::new();
    for row in rows {
        let (key, name, arch) = row?;
        keys.insert(key, (name, arch));
    }
    Ok(keys)
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
    )
    .is_ok()
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut columns = Vec::new();
    for row in rows {
        columns.push(row?);
    }
    Ok(columns)
}
