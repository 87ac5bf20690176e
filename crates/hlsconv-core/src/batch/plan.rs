//! Non-colliding output names for a batch: `<root>/<base>/<base>_<n>.<ext>`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::job::JobSpec;
use crate::url_model::sanitize_filename_for_linux;

use super::BatchError;

/// Specs for one batch plus the folder they write into.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub output_dir: PathBuf,
    pub specs: Vec<JobSpec>,
}

impl BatchPlan {
    /// Number sources from 1 in order. Fails on an empty base name or no sources.
    pub fn numbered<I, S>(
        sources: I,
        output_root: &Path,
        base_name: &str,
        extension: &str,
    ) -> Result<Self, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base = sanitize_filename_for_linux(base_name.trim());
        if base.is_empty() {
            return Err(BatchError::InvalidBaseName(base_name.to_string()));
        }
        let output_dir = output_root.join(&base);
        let extension = extension.trim_start_matches('.');
        let specs: Vec<JobSpec> = sources
            .into_iter()
            .enumerate()
            .map(|(i, source)| {
                let file = format!("{}_{}.{}", base, i + 1, extension);
                JobSpec::new(source, output_dir.join(file))
            })
            .collect();
        if specs.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        Ok(Self { output_dir, specs })
    }
}

/// Delete a batch output folder and everything in it. A missing folder is not an error.
pub fn remove_output_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            tracing::info!(path = %dir.display(), "removed output folder");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_from_one_in_order() {
        let plan = BatchPlan::numbered(
            ["https://a/x.m3u8", "https://b/y.m3u8", "https://c/z.m3u8"],
            Path::new("/home/u/Downloads"),
            "lecture",
            "mp4",
        )
        .unwrap();
        assert_eq!(plan.output_dir, PathBuf::from("/home/u/Downloads/lecture"));
        let dests: Vec<_> = plan.specs.iter().map(|s| s.destination.clone()).collect();
        assert_eq!(
            dests,
            [
                PathBuf::from("/home/u/Downloads/lecture/lecture_1.mp4"),
                PathBuf::from("/home/u/Downloads/lecture/lecture_2.mp4"),
                PathBuf::from("/home/u/Downloads/lecture/lecture_3.mp4"),
            ]
        );
        assert_eq!(plan.specs[1].source, "https://b/y.m3u8");
    }

    #[test]
    fn base_name_is_sanitized() {
        let plan = BatchPlan::numbered(["s"], Path::new("/out"), "../my show", ".mkv").unwrap();
        assert_eq!(plan.specs[0].destination, PathBuf::from("/out/my_show/my_show_1.mkv"));
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(matches!(
            BatchPlan::numbered(["s"], Path::new("/out"), "  ", "mp4"),
            Err(BatchError::InvalidBaseName(_))
        ));
        assert!(matches!(
            BatchPlan::numbered(Vec::<String>::new(), Path::new("/out"), "x", "mp4"),
            Err(BatchError::EmptyBatch)
        ));
    }

    #[test]
    fn remove_output_dir_deletes_tree() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("show");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("show_1.mp4"), b"x").unwrap();
        remove_output_dir(&dir).unwrap();
        assert!(!dir.exists());
        remove_output_dir(&dir).unwrap();
    }
}
