//! Include/exclude filtering for compression source trees.

use std::path::Path;

use globset::{Glob, GlobMatcher};

/// A compiled include/exclude pattern set.
///
/// A pattern matches an entry when any of these hold:
/// - it glob-matches the entry's base name,
/// - its text occurs anywhere in the entry's full path,
/// - it ends in `/*` and the full path contains the part before `/*`.
///
/// Exclusion always wins. With a non-empty include list an entry must match one include
/// pattern; with an empty one everything not excluded is included.
#[derive(Clone, Debug, Default)]
pub struct PathFilter {
    exclude: Vec<Pattern>,
    include: Vec<Pattern>,
}

#[derive(Clone, Debug)]
struct Pattern {
    text: String,
    // malformed globs never match by name; the substring tests still apply
    glob: Option<GlobMatcher>,
}

impl Pattern {
    fn new(text: &str) -> Self {
        let glob = Glob::new(text).ok().map(|g| g.compile_matcher());
        Self {
            text: text.to_string(),
            glob,
        }
    }

    fn matches(&self, path: &Path, full: &str) -> bool {
        let by_name = match (&self.glob, path.file_name()) {
            (Some(glob), Some(name)) => glob.is_match(name),
            _ => false,
        };
        if by_name || full.contains(self.text.as_str()) {
            return true;
        }
        self.text
            .strip_suffix("/*")
            .is_some_and(|dir| full.contains(dir))
    }
}

impl PathFilter {
    pub fn new<E, I>(exclude: E, include: I) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            exclude: exclude.into_iter().map(|p| Pattern::new(p.as_ref())).collect(),
            include: include.into_iter().map(|p| Pattern::new(p.as_ref())).collect(),
        }
    }

    /// Decide whether `path` belongs in the archive.
    pub fn should_include(&self, path: &Path) -> bool {
        if self.is_excluded(path) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        let full = path.to_string_lossy();
        self.include.iter().any(|p| p.matches(path, &full))
    }

    /// Whether any exclude pattern matches `path`.
    ///
    /// Tree walks prune a directory on this test alone, so include patterns written for files
    /// do not hide the directories that contain them.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let full = path.to_string_lossy();
        self.exclude.iter().any(|p| p.matches(path, &full))
    }
}

/// One-shot form of [`PathFilter::should_include`].
pub fn should_include<S: AsRef<str>>(path: &Path, exclude: &[S], include: &[S]) -> bool {
    PathFilter::new(exclude, include).should_include(path)
}
