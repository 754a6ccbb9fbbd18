//! The `.env.local` feature-flag flip.
//!
//! The only on-disk artifact the pipeline writes: a flat `KEY=VALUE`
//! file, rewritten wholesale with the `NEXT_PUBLIC_USE_SUPABASE` line
//! replaced or appended.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

/// The feature flag that routes the application at the destination.
pub const SUPABASE_FLAG_KEY: &str = "NEXT_PUBLIC_USE_SUPABASE";

lazy_static! {
    static ref FLAG_LINE: Regex = Regex::new(r"(?m)^NEXT_PUBLIC_USE_SUPABASE=.*$").unwrap();
}

/// Set `NEXT_PUBLIC_USE_SUPABASE=true` in the given env file.
///
/// An existing flag line is replaced in place, never duplicated; a file
/// without the line gets it appended; a missing file is created with the
/// single line.
pub fn enable_supabase_flag(path: &Path) -> Result<()> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(read_error) if read_error.kind() == ErrorKind::NotFound => String::new(),
        Err(read_error) => {
            return Err(read_error).with_context(|| format!("failed to read {}", path.display()))
        }
    };

    let updated = set_flag_true(&contents);
    fs::write(path, updated).with_context(|| format!("failed to write {}", path.display()))?;

    info!(file = %path.display(), "✓ Enabled {}", SUPABASE_FLAG_KEY);
    Ok(())
}

fn set_flag_true(contents: &str) -> String {
    let line = format!("{}=true", SUPABASE_FLAG_KEY);

    if FLAG_LINE.is_match(contents) {
        return FLAG_LINE.replace_all(contents, line.as_str()).into_owned();
    }

    let mut updated = contents.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&line);
    updated.push('\n');
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_env_file() -> PathBuf {
        std::env::temp_dir().join(format!("migrator-env-{}.local", Uuid::new_v4()))
    }

    #[test]
    fn replaces_an_existing_flag_line() {
        let contents = "NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co\nNEXT_PUBLIC_USE_SUPABASE=false\nOTHER=1\n";
        let updated = set_flag_true(contents);

        assert_eq!(updated.matches("NEXT_PUBLIC_USE_SUPABASE=").count(), 1);
        assert!(updated.contains("NEXT_PUBLIC_USE_SUPABASE=true"));
        assert!(!updated.contains("NEXT_PUBLIC_USE_SUPABASE=false"));
        assert!(updated.contains("NEXT_PUBLIC_SUPABASE_URL=https://proj.supabase.co"));
        assert!(updated.contains("OTHER=1"));
    }

    #[test]
    fn appends_when_the_flag_is_absent() {
        let updated = set_flag_true("OTHER=1\n");
        assert_eq!(updated, "OTHER=1\nNEXT_PUBLIC_USE_SUPABASE=true\n");
    }

    #[test]
    fn appends_a_newline_to_unterminated_files() {
        let updated = set_flag_true("OTHER=1");
        assert_eq!(updated, "OTHER=1\nNEXT_PUBLIC_USE_SUPABASE=true\n");
    }

    #[test]
    fn handles_an_empty_file() {
        assert_eq!(set_flag_true(""), "NEXT_PUBLIC_USE_SUPABASE=true\n");
    }

    #[test]
    fn does_not_touch_similarly_prefixed_keys() {
        let contents = "NEXT_PUBLIC_USE_SUPABASE_STORAGE=false\n";
        let updated = set_flag_true(contents);
        assert!(updated.contains("NEXT_PUBLIC_USE_SUPABASE_STORAGE=false"));
        assert!(updated.ends_with("NEXT_PUBLIC_USE_SUPABASE=true\n"));
    }

    #[test]
    fn creates_a_missing_file() {
        let path = temp_env_file();

        enable_supabase_flag(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "NEXT_PUBLIC_USE_SUPABASE=true\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn rewrites_an_existing_file_in_place() {
        let path = temp_env_file();
        fs::write(&path, "NEXT_PUBLIC_USE_SUPABASE=false\nOTHER=1\n").unwrap();

        enable_supabase_flag(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("NEXT_PUBLIC_USE_SUPABASE=").count(), 1);
        assert!(written.contains("NEXT_PUBLIC_USE_SUPABASE=true"));
        assert!(written.contains("OTHER=1"));
        fs::remove_file(&path).unwrap();
    }
}
