//! Test fixture creation for archives and the user database

use super::constants::*;
use anyhow::Result;
use cd_catalog_server::user::{SqliteUserStore, UserManager};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds a ZIP archive in memory from `(path, bytes)` pairs.
pub fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        writer
            .start_file(*name, options)
            .expect("Failed to start zip entry");
        writer.write_all(data).expect("Failed to write zip entry");
    }
    writer
        .finish()
        .expect("Failed to finish zip")
        .into_inner()
}

/// Three tracks plus a cover, with a resource fork that must be ignored.
pub fn album_archive() -> Vec<u8> {
    build_archive(&[
        ("album/01-opening.mp3", MP3_BYTES),
        ("album/02-middle.mp3", MP3_BYTES),
        ("album/03-closing.mp3", MP3_BYTES),
        ("album/cover.png", PNG_BYTES),
        ("__MACOSX/album/._01-opening.mp3", b"fork"),
    ])
}

/// Creates a temporary directory with a user db holding the admin user.
/// Returns (temp_dir, db_dir)
pub fn create_test_db_with_users() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let db_dir = dir.path().to_path_buf();

    let user_store = SqliteUserStore::new(db_dir.join("user.db"))?;
    let user_manager = UserManager::new(Box::new(user_store));
    user_manager.add_user(ADMIN_USER)?;
    user_manager.set_password(ADMIN_USER, ADMIN_PASS)?;

    Ok((dir, db_dir))
}
