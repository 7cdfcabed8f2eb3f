use crate::archive::entry_filter::{entry_basename, EntryFilter};
use crate::error::{Result, UpdaterError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use zip::ZipArchive;

/// One file written into the target directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFile {
    pub file_name: String,
    pub archive_path: String,
    pub bytes: u64,
    pub mode: Option<u32>,
}

/// Copies the filter files selected by an [`EntryFilter`] out of a release
/// archive, flattening them into a single destination directory.
pub struct FilterExtractor {
    filter: EntryFilter,
    buffer_size: usize,
}

impl FilterExtractor {
    pub fn new(filter: EntryFilter) -> Self {
        Self {
            filter,
            buffer_size: 64 * 1024, // 64KB buffer
        }
    }

    pub fn extract_archive(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
        progress_callback: Option<&dyn Fn(&ExtractedFile)>,
    ) -> Result<Vec<ExtractedFile>> {
        let file = File::open(archive_path)?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| invalid_archive(archive_path, e))?;

        self.extract_from(&mut archive, dest_dir, progress_callback)
            .map_err(|e| match e {
                UpdaterError::InvalidArchive { message, .. } => UpdaterError::InvalidArchive {
                    path: archive_path.display().to_string(),
                    message,
                },
                other => other,
            })
    }

    /// Extract every accepted entry, in archive order. Existing files at the
    /// destination are overwritten. The returned list is empty when nothing
    /// matched.
    pub fn extract_from<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        dest_dir: &Path,
        progress_callback: Option<&dyn Fn(&ExtractedFile)>,
    ) -> Result<Vec<ExtractedFile>> {
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;

            if entry.is_dir() {
                continue;
            }

            let archive_path = entry.name().to_string();
            if !self.filter.should_extract(&archive_path) {
                continue;
            }

            let Some(file_name) = entry_basename(&archive_path) else {
                log::warn!("skipping archive entry with unusable name: {}", archive_path);
                continue;
            };
            let file_name = file_name.to_string();

            let mode = entry.unix_mode().map(|m| m & 0o7777);
            let dest_path = dest_dir.join(&file_name);
            let bytes = self.write_entry(&mut entry, &dest_path, mode)?;

            log::debug!(
                "extracted {} -> {} ({} bytes)",
                archive_path,
                dest_path.display(),
                bytes
            );

            let record = ExtractedFile {
                file_name,
                archive_path,
                bytes,
                mode,
            };

            if let Some(callback) = progress_callback {
                callback(&record);
            }

            extracted.push(record);
        }

        Ok(extracted)
    }

    fn write_entry<R: Read>(&self, reader: &mut R, dest: &Path, mode: Option<u32>) -> Result<u64> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        let file = options.open(dest).map_err(|e| write_failure(dest, e))?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        let bytes = io::copy(reader, &mut writer).map_err(|e| write_failure(dest, e))?;
        writer.flush().map_err(|e| write_failure(dest, e))?;

        // `mode` on open only applies to newly created files.
        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dest, fs::Permissions::from_mode(mode))
                .map_err(|e| write_failure(dest, e))?;
        }

        #[cfg(not(unix))]
        let _ = mode;

        Ok(bytes)
    }
}

impl Default for FilterExtractor {
    fn default() -> Self {
        Self::new(EntryFilter::default())
    }
}

fn write_failure(path: &Path, source: io::Error) -> UpdaterError {
    log::error!("failed to write {}: {}", path.display(), source);
    UpdaterError::file_write(path, source)
}

fn invalid_archive(path: &Path, error: zip::result::ZipError) -> UpdaterError {
    match error {
        zip::result::ZipError::Io(io) => UpdaterError::Io(io),
        other => UpdaterError::InvalidArchive {
            path: path.display().to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::entry_filter::FilterCriterion;
    use std::io::Cursor;
    use tempfile::{NamedTempFile, TempDir};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const ROOT: &str = "NeverSinkDev-NeverSink-Filter-1a2b3c4/";

    fn build_archive(entries: &[(&str, &str, u32)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for (name, content, mode) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
                continue;
            }

            let options = SimpleFileOptions::default().unix_permissions(*mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }

    fn sample_archive() -> Vec<u8> {
        let soft = format!("{ROOT}NeverSink's filter - 0-SOFT.filter");
        let strict = format!("{ROOT}NeverSink's filter - 3-STRICT.filter");
        let readme = format!("{ROOT}README.md");
        let blue_dir = format!("{ROOT}(STYLE) BLUE/");
        let blue = format!("{ROOT}(STYLE) BLUE/NeverSink's filter - 0-SOFT.filter");
        let purple = format!("{ROOT}(STYLE) PURPLE/NeverSink's filter - 0-SOFT.filter");

        build_archive(&[
            (ROOT, "", 0o755),
            (soft.as_str(), "Show # soft", 0o644),
            (strict.as_str(), "Show # strict", 0o600),
            (readme.as_str(), "# NeverSink", 0o644),
            (blue_dir.as_str(), "", 0o755),
            (blue.as_str(), "Show # blue soft", 0o640),
            (purple.as_str(), "Show # purple soft", 0o644),
        ])
    }

    fn open(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_top_level_extraction() {
        let dest = TempDir::new().unwrap();
        let extractor = FilterExtractor::default();

        let files = extractor
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "NeverSink's filter - 0-SOFT.filter",
                "NeverSink's filter - 3-STRICT.filter"
            ]
        );
        assert_eq!(
            fs::read(dest.path().join("NeverSink's filter - 0-SOFT.filter")).unwrap(),
            b"Show # soft"
        );
        assert_eq!(files[1].bytes, b"Show # strict".len() as u64);
        assert!(!dest.path().join("README.md").exists());
    }

    #[test]
    fn test_style_extraction_flattens_folder() {
        let dest = TempDir::new().unwrap();
        let filter = EntryFilter::new(FilterCriterion::from_style(Some("blue")));
        let extractor = FilterExtractor::new(filter);

        let files = extractor
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "NeverSink's filter - 0-SOFT.filter");
        assert!(files[0].archive_path.contains("(STYLE) BLUE"));
        assert_eq!(dir_listing(dest.path()), vec!["NeverSink's filter - 0-SOFT.filter"]);
        assert_eq!(
            fs::read(dest.path().join("NeverSink's filter - 0-SOFT.filter")).unwrap(),
            b"Show # blue soft"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dest = TempDir::new().unwrap();
        let files = FilterExtractor::default()
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();

        let strict = dest.path().join("NeverSink's filter - 3-STRICT.filter");
        let mode = fs::metadata(&strict).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(files[1].mode.map(|m| m & 0o777), Some(0o600));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_applied_to_existing_files() {
        use std::os::unix::fs::PermissionsExt;

        let dest = TempDir::new().unwrap();
        let existing = dest.path().join("NeverSink's filter - 0-SOFT.filter");
        fs::write(&existing, "stale").unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o666)).unwrap();

        let filter = EntryFilter::new(FilterCriterion::from_style(Some("blue")));
        FilterExtractor::new(filter)
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();

        let mode = fs::metadata(&existing).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_repeated_extraction_is_idempotent() {
        let dest = TempDir::new().unwrap();
        let extractor = FilterExtractor::default();
        let target = dest.path().join("NeverSink's filter - 0-SOFT.filter");

        extractor
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();
        let first = fs::read(&target).unwrap();

        fs::write(&target, "locally edited and much longer than the original").unwrap();

        extractor
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();
        let second = fs::read(&target).unwrap();

        assert_eq!(first, second);
        assert_eq!(dir_listing(dest.path()).len(), 2);
    }

    #[test]
    fn test_unknown_style_leaves_destination_untouched() {
        let dest = TempDir::new().unwrap();
        fs::write(dest.path().join("custom.filter"), "mine").unwrap();

        let filter = EntryFilter::new(FilterCriterion::from_style(Some("bleu")));
        let files = FilterExtractor::new(filter)
            .extract_from(&mut open(sample_archive()), dest.path(), None)
            .unwrap();

        assert!(files.is_empty());
        assert_eq!(dir_listing(dest.path()), vec!["custom.filter"]);
        assert_eq!(fs::read(dest.path().join("custom.filter")).unwrap(), b"mine");
    }

    #[test]
    fn test_empty_archive_extracts_nothing() {
        let dest = TempDir::new().unwrap();
        let files = FilterExtractor::default()
            .extract_from(&mut open(build_archive(&[])), dest.path(), None)
            .unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn test_progress_callback_sees_every_file() {
        use std::cell::RefCell;

        let dest = TempDir::new().unwrap();
        let seen = RefCell::new(Vec::new());
        let callback = |file: &ExtractedFile| seen.borrow_mut().push(file.file_name.clone());

        FilterExtractor::default()
            .extract_from(&mut open(sample_archive()), dest.path(), Some(&callback))
            .unwrap();

        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_extract_archive_from_disk() {
        let dest = TempDir::new().unwrap();
        let archive = NamedTempFile::new().unwrap();
        fs::write(archive.path(), sample_archive()).unwrap();

        let files = FilterExtractor::default()
            .extract_archive(archive.path(), dest.path(), None)
            .unwrap();

        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_corrupt_archive_is_reported() {
        let dest = TempDir::new().unwrap();
        let archive = NamedTempFile::new().unwrap();
        fs::write(archive.path(), "<html>rate limited</html>\n".repeat(64)).unwrap();

        let result = FilterExtractor::default().extract_archive(archive.path(), dest.path(), None);

        match result {
            Err(UpdaterError::InvalidArchive { path, .. }) => {
                assert_eq!(path, archive.path().display().to_string());
            }
            other => panic!("expected InvalidArchive, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_missing_destination_fails_with_path() {
        let dest = TempDir::new().unwrap();
        let missing = dest.path().join("missing");

        let result =
            FilterExtractor::default().extract_from(&mut open(sample_archive()), &missing, None);

        match result {
            Err(UpdaterError::FileWrite { path, .. }) => assert!(path.contains("missing")),
            other => panic!("expected FileWrite, got {:?}", other.map(|f| f.len())),
        }
    }
}
