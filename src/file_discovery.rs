use crate::error::{Result, VoeventError};
use globset::{GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Finds candidate VOEvent files below the paths given on the command line
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// File extensions to include, lowercase and without the dot
    extensions: Vec<String>,
    /// Include patterns set
    include_set: Option<GlobSet>,
    /// Exclude patterns set
    exclude_set: Option<GlobSet>,
}

fn build_glob_set(patterns: &[String], kind: &str) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                VoeventError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
        builder.add(glob);
    }

    let set = builder.build().map_err(|e| {
        VoeventError::Config(format!("Failed to build {} glob set: {}", kind, e))
    })?;
    Ok(Some(set))
}

impl FileDiscovery {
    /// Discover `.xml` files with no pattern filtering
    pub fn new() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_set: None,
            exclude_set: None,
        }
    }

    /// Set file extensions to discover
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Only keep files matching at least one of these globs
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns, "include")?;
        Ok(self)
    }

    /// Drop files matching any of these globs
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns, "exclude")?;
        Ok(self)
    }

    /// Discover files in the given path (file or directory), sorted by path.
    ///
    /// A missing root is an error; unreadable entries below it are logged and
    /// skipped.
    pub fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path)?;

        if metadata.is_file() {
            return Ok(if self.should_process(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let walker = WalkBuilder::new(path)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                    if is_file && self.should_process(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(err) => {
                    warn!(root = %path.display(), error = %err, "Skipping unreadable entry");
                }
            }
        }

        files.sort();
        debug!(root = %path.display(), found = files.len(), "Discovered files");
        Ok(files)
    }

    /// Discover files under every root, keeping the first occurrence of each path
    pub fn discover_all(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = Vec::new();
        for path in paths {
            for file in self.discover_files(path).map_err(|err| match err {
                VoeventError::Io(io) => VoeventError::FileSystemTraversal {
                    path: path.clone(),
                    reason: io.to_string(),
                },
                other => other,
            })? {
                if !files.contains(&file) {
                    files.push(file);
                }
            }
        }
        Ok(files)
    }

    /// Check if a file should be processed based on extensions and patterns
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        // When include patterns are given, at least one must match
        if let Some(include_set) = &self.include_set {
            return include_set.is_match(path);
        }

        true
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("subdir1")).unwrap();
        fs::create_dir_all(root.join("subdir2/nested")).unwrap();

        fs::write(root.join("file1.xml"), "<?xml version=\"1.0\"?>").unwrap();
        fs::write(root.join("file2.XML"), "<?xml version=\"1.0\"?>").unwrap();
        fs::write(root.join("file3.txt"), "text file").unwrap();
        fs::write(root.join("subdir1/nested.xml"), "<?xml version=\"1.0\"?>").unwrap();
        fs::write(root.join("subdir2/nested/deep.xml"), "<?xml version=\"1.0\"?>").unwrap();
        fs::write(root.join("subdir2/nested/other.voe"), "packet").unwrap();

        temp_dir
    }

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_discover_xml_files() {
        let temp_dir = create_test_directory();
        let files = FileDiscovery::new().discover_files(temp_dir.path()).unwrap();

        assert_eq!(files.len(), 4);
        let file_names = names(&files);
        assert!(file_names.contains("file1.xml"));
        assert!(file_names.contains("file2.XML"));
        assert!(file_names.contains("nested.xml"));
        assert!(file_names.contains("deep.xml"));

        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_discover_multiple_extensions() {
        let temp_dir = create_test_directory();
        let discovery =
            FileDiscovery::new().with_extensions(vec!["xml".to_string(), ".voe".to_string()]);

        let files = discovery.discover_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 5);
        assert!(names(&files).contains("other.voe"));
    }

    #[test]
    fn test_include_patterns() {
        let temp_dir = create_test_directory();
        let discovery = FileDiscovery::new()
            .with_include_patterns(vec!["**/nested*".to_string()])
            .unwrap();

        let files = discovery.discover_files(temp_dir.path()).unwrap();

        // `*` does not cross separators, so deep.xml under nested/ is not matched
        assert_eq!(names(&files), HashSet::from(["nested.xml".to_string()]));
    }

    #[test]
    fn test_exclude_patterns() {
        let temp_dir = create_test_directory();
        let discovery = FileDiscovery::new()
            .with_exclude_patterns(vec!["**/subdir2/**".to_string()])
            .unwrap();

        let files = discovery.discover_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 3);
        assert!(!names(&files).contains("deep.xml"));
    }

    #[test]
    fn test_invalid_glob_pattern() {
        let result = FileDiscovery::new().with_include_patterns(vec!["a[".to_string()]);
        assert!(matches!(result, Err(VoeventError::Config(_))));
    }

    #[test]
    fn test_should_process() {
        let discovery = FileDiscovery::new();

        assert!(discovery.should_process(Path::new("alert.xml")));
        assert!(discovery.should_process(Path::new("ALERT.XML")));
        assert!(!discovery.should_process(Path::new("alert.txt")));
        assert!(!discovery.should_process(Path::new("alert")));
    }

    #[test]
    fn test_single_file_root() {
        let temp_dir = create_test_directory();
        let discovery = FileDiscovery::new();

        let file = temp_dir.path().join("file1.xml");
        assert_eq!(discovery.discover_files(&file).unwrap(), vec![file]);

        let text = temp_dir.path().join("file3.txt");
        assert!(discovery.discover_files(&text).unwrap().is_empty());
    }

    #[test]
    fn test_discover_all_deduplicates() {
        let temp_dir = create_test_directory();
        let discovery = FileDiscovery::new();
        let root = temp_dir.path().to_path_buf();

        let files = discovery
            .discover_all(&[root.clone(), root.join("file1.xml")])
            .unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_nonexistent_directory() {
        let discovery = FileDiscovery::new();

        let result = discovery.discover_files(Path::new("/nonexistent/path"));
        assert!(matches!(result, Err(VoeventError::Io(_))));

        let result = discovery.discover_all(&[PathBuf::from("/nonexistent/path")]);
        assert!(matches!(
            result,
            Err(VoeventError::FileSystemTraversal { .. })
        ));
    }
}
