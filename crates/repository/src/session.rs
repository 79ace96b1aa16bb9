//! Persistent session id (SUID)
//!
//! Each launch takes the next session number from `session.id` in the books
//! directory. Uids minted in this session therefore never collide with uids
//! restored from records written by earlier sessions.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

pub const SESSION_FILE: &str = "session.id";

/// Returns the next session id and records it in `dir`
///
/// Falls back to a time-derived id if the file cannot be read or written.
pub fn next_session_id(dir: &Path) -> u64 {
    match bump(dir) {
        Ok(session) => session,
        Err(e) => {
            let fallback = fallback_session_id();
            log::warn!(
                "Could not persist session id in {}: {}. Using {}",
                dir.display(),
                e,
                fallback
            );
            fallback
        }
    }
}

fn bump(dir: &Path) -> std::io::Result<u64> {
    fs::create_dir_all(dir)?;
    let path = dir.join(SESSION_FILE);

    let previous = match fs::read_to_string(&path) {
        Ok(contents) => contents.trim().parse::<u64>().unwrap_or_else(|_| {
            log::warn!("Ignoring unreadable session file {}", path.display());
            fallback_session_id()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e),
    };
    let next = previous.saturating_add(1);

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(next.to_string().as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(&path).map_err(|e| e.error)?;

    log::debug!("Session id {}", next);
    Ok(next)
}

fn fallback_session_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sessions_increase() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let first = next_session_id(temp.path());
        let second = next_session_id(temp.path());
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(fs::read_to_string(temp.path().join(SESSION_FILE))?, "2");
        Ok(())
    }

    #[test]
    fn test_garbage_session_file_moves_forward() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join(SESSION_FILE), "garbage")?;
        let session = next_session_id(temp.path());
        assert!(session > 1);
        Ok(())
    }
}
