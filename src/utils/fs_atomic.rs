use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DOCUMENT_FILE_MODE: u32 = 0o644;

pub fn ensure_parent_dir(path: impl AsRef<Path>) -> io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Hidden temp file next to `path`, so the final rename stays on one filesystem.
pub fn temp_sibling_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    parent.join(format!(".{}.{}.tmp", file_name, token))
}

/// Writes `content` to `path` so readers observe either the old or the new
/// bytes, never a prefix of the new ones.
pub fn atomic_write_file(path: impl AsRef<Path>, content: &[u8], mode: u32) -> io::Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let tmp = temp_sibling_path(path);
    let written = write_synced(&tmp, content, mode).and_then(|_| fs::rename(&tmp, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn write_synced(tmp: &Path, content: &[u8], mode: u32) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("courier-fs-atomic-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = tmp_dir();
        let path = dir.join("doc.json");
        atomic_write_file(&path, b"{\"a\":1}", DOCUMENT_FILE_MODE).expect("first write");
        atomic_write_file(&path, b"{\"a\":2}", DOCUMENT_FILE_MODE).expect("second write");
        assert_eq!(fs::read(&path).expect("read"), b"{\"a\":2}");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn atomic_write_leaves_no_temp_files_behind() {
        let dir = tmp_dir();
        let path = dir.join("nested").join("doc.json");
        atomic_write_file(&path, b"[]", DOCUMENT_FILE_MODE).expect("write");
        let entries: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["doc.json".to_string()]);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn failed_rename_keeps_previous_content() {
        let dir = tmp_dir();
        let target = dir.join("occupied");
        fs::create_dir_all(target.join("child")).expect("dir target");
        let result = atomic_write_file(&target, b"payload", DOCUMENT_FILE_MODE);
        assert!(result.is_err(), "renaming over a non-empty dir must fail");
        assert!(target.join("child").is_dir());
        let leftovers = fs::read_dir(&dir)
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        let _ = fs::remove_dir_all(dir);
    }
}
