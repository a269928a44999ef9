//! Finding image files and category folders on disk.
//!
//! Everything returned here is sorted by path so reference loading, local
//! classification and evaluation all see the same order on every platform.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files and category directories.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, recursively finds all supported files.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.walk(path, usize::MAX)
    }

    /// Supported image files directly inside `dir` (no recursion).
    pub fn images_in(&self, dir: &Path) -> Vec<DiscoveredFile> {
        self.walk(dir, 1)
    }

    /// Immediate subdirectories of `root`, sorted by name.
    ///
    /// Each one is a category; its directory name is the category label.
    pub fn category_dirs(root: &Path) -> Vec<(String, PathBuf)> {
        let mut dirs: Vec<(String, PathBuf)> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| {
                let name = e.file_name().to_str()?.to_string();
                Some((name, e.into_path()))
            })
            .collect();
        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        dirs
    }

    fn walk(&self, path: &Path, max_depth: usize) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                if let Ok(meta) = std::fs::metadata(path) {
                    return vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(path)
            .max_depth(max_depth)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file() && self.is_supported(entry_path) {
                if let Ok(meta) = entry.metadata() {
                    files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    });
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        let discovery = FileDiscovery::new(ProcessingConfig::default());

        assert!(discovery.is_supported(Path::new("test.jpg")));
        assert!(discovery.is_supported(Path::new("test.JPG")));
        assert!(discovery.is_supported(Path::new("test.jpeg")));
        assert!(discovery.is_supported(Path::new("test.png")));
        assert!(!discovery.is_supported(Path::new("test.txt")));
        assert!(!discovery.is_supported(Path::new("notes")));
    }

    #[test]
    fn test_category_dirs_sorted_and_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Saree")).unwrap();
        std::fs::create_dir(dir.path().join("Anarkali_Suit")).unwrap();
        std::fs::create_dir(dir.path().join("Kurti")).unwrap();
        std::fs::write(dir.path().join("README.txt"), b"x").unwrap();

        let names: Vec<String> = FileDiscovery::category_dirs(dir.path())
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["Anarkali_Suit", "Kurti", "Saree"]);
    }

    #[test]
    fn test_images_in_does_not_recurse() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.png"), b"x").unwrap();

        let discovery = FileDiscovery::new(ProcessingConfig::default());
        let flat = discovery.images_in(dir.path());
        let names: Vec<_> = flat
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);

        assert_eq!(discovery.discover(dir.path()).len(), 3);
    }
}
