use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// The persisted "longest snake so far" record.
///
/// On disk this is a JSON object of the form `{"max_length": 12}`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct BestLength {
    max_length: u32,
}

impl BestLength {
    /// Value used when no usable record exists
    pub(crate) const DEFAULT: u32 = 1;

    /// Read the best length stored at `path`.  A missing file yields
    /// [`BestLength::DEFAULT`]; any other failure is logged and also yields
    /// the default.  Stored values below the default are raised to it.
    pub(crate) fn load(path: &Path) -> u32 {
        match BestLength::read(path) {
            Ok(Some(best)) => {
                log::debug!("Loaded best length {} from {}", best.max_length, path.display());
                best.max_length.max(BestLength::DEFAULT)
            }
            Ok(None) => BestLength::DEFAULT,
            Err(e) => {
                log::warn!("{e}: {}", error_chain(&e));
                BestLength::DEFAULT
            }
        }
    }

    fn read(path: &Path) -> Result<Option<BestLength>, LoadError> {
        let src = match fs_err::read(path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LoadError::read(e)),
        };
        serde_json::from_slice(&src)
            .map(Some)
            .map_err(LoadError::deserialize)
    }

    /// Write `max_length` to `path`, creating parent directories as needed
    pub(crate) fn save(path: &Path, max_length: u32) -> Result<(), SaveError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(SaveError::mkdir)?;
        }
        let mut src =
            serde_json::to_string(&BestLength { max_length }).map_err(SaveError::serialize)?;
        src.push('\n');
        fs_err::write(path, &src).map_err(SaveError::write)?;
        log::debug!("Saved best length {max_length} to {}", path.display());
        Ok(())
    }
}

/// Render the sources of `e` as a single `a: b: c` string
pub(crate) fn error_chain(e: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut source = e.source();
    while let Some(src) = source {
        parts.push(src.to_string());
        source = src.source();
    }
    parts.join(": ")
}

#[derive(Debug, Error)]
#[error("Failed to save best length to disk")]
pub(crate) struct SaveError(#[source] SaveErrorSource);

impl SaveError {
    pub(crate) fn no_path() -> Self {
        SaveError(SaveErrorSource::NoPath)
    }

    fn mkdir(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Mkdir(e))
    }

    fn serialize(e: serde_json::Error) -> Self {
        SaveError(SaveErrorSource::Serialize(e))
    }

    fn write(e: std::io::Error) -> Self {
        SaveError(SaveErrorSource::Write(e))
    }
}

#[derive(Debug, Error)]
enum SaveErrorSource {
    #[error("failed to determine path to local data directory")]
    NoPath,
    #[error("failed to create parent directories")]
    Mkdir(#[source] std::io::Error),
    #[error("failed to serialize best length")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write best length to disk")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Error)]
#[error("Failed to read best length from disk")]
pub(crate) struct LoadError(#[source] LoadErrorSource);

impl LoadError {
    fn read(e: std::io::Error) -> Self {
        LoadError(LoadErrorSource::Read(e))
    }

    fn deserialize(e: serde_json::Error) -> Self {
        LoadError(LoadErrorSource::Deserialize(e))
    }
}

#[derive(Debug, Error)]
enum LoadErrorSource {
    #[error("failed to read best-length file")]
    Read(#[source] std::io::Error),
    #[error("failed to deserialize best length")]
    Deserialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(42)]
    #[case(u32::MAX)]
    fn round_trip(#[case] n: u32) {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("best.json");
        BestLength::save(&path, n).unwrap();
        assert_eq!(BestLength::load(&path), n);
    }

    #[test]
    fn missing_file() {
        let tmpdir = tempfile::tempdir().unwrap();
        assert_eq!(BestLength::load(&tmpdir.path().join("nope.json")), 1);
    }

    #[rstest]
    #[case("")]
    #[case("not json")]
    #[case("{}")]
    #[case("{\"max_length\": \"ten\"}")]
    #[case("{\"max_length\": -4}")]
    #[case("[]")]
    fn corrupt_file(#[case] content: &str) {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("best.json");
        fs_err::write(&path, content).unwrap();
        assert_eq!(BestLength::load(&path), 1);
    }

    #[test]
    fn zero_raised_to_default() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("best.json");
        fs_err::write(&path, "{\"max_length\": 0}\n").unwrap();
        assert_eq!(BestLength::load(&path), 1);
    }

    #[test]
    fn file_format() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("sub").join("best.json");
        BestLength::save(&path, 9).unwrap();
        assert_eq!(
            fs_err::read_to_string(&path).unwrap(),
            "{\"max_length\":9}\n"
        );
    }

    #[test]
    fn unwritable_path() {
        let tmpdir = tempfile::tempdir().unwrap();
        let blocker = tmpdir.path().join("file");
        fs_err::write(&blocker, "").unwrap();
        assert!(BestLength::save(&blocker.join("best.json"), 5).is_err());
    }
}
