use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

use crate::config::Pattern;

/// Runtime ignore filter compiled from the configured pattern list.
///
/// Patterns are matched case-insensitively against the full reported path
/// (not just the basename), anchored at both ends: `*` matches any run of
/// characters including separators, `?` matches exactly one. Separators are
/// normalized to `/` on both sides first, so `*/tmp/*` hits a `tmp` segment
/// in Windows-style paths too.
#[derive(Debug, Clone)]
pub struct PathFilter {
    ignore: GlobSet,
}

impl PathFilter {
    /// Build a filter from a pattern list. Empty list means "ignore nothing".
    pub fn new(patterns: &[Pattern]) -> Self {
        let mut builder = GlobSetBuilder::new();
        // compile patterns, ignore compile errors individually
        for pat in patterns {
            let normalized = pat.0.replace('\\', "/");
            if let Ok(g) = GlobBuilder::new(&normalized)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
            {
                builder.add(g);
            }
        }
        Self {
            ignore: builder
                .build()
                .unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap()),
        }
    }

    /// True when any pattern matches and the event must be dropped.
    pub fn ignores<P: AsRef<Path>>(&self, path: P) -> bool {
        let normalized = path.as_ref().to_string_lossy().replace('\\', "/");
        self.ignore.is_match(&normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pats: &[&str]) -> PathFilter {
        let pats: Vec<Pattern> = pats.iter().map(|p| Pattern(p.to_string())).collect();
        PathFilter::new(&pats)
    }

    #[test]
    fn segment_pattern_matches_anywhere() {
        let f = filter(&["*/tmp/*"]);
        assert!(f.ignores("/x/tmp/y.txt"));
        assert!(f.ignores(r"C:\x\tmp\y.txt"));
        assert!(!f.ignores("/x/y.txt"));
        assert!(!f.ignores(r"C:\x\y.txt"));
    }

    #[test]
    fn extension_pattern_matches_whole_tree() {
        let f = filter(&["*.exe"]);
        assert!(f.ignores("/deep/nested/dir/tool.exe"));
        assert!(!f.ignores("/deep/nested/dir/tool.exe.txt"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let f = filter(&["*.TMP"]);
        assert!(f.ignores("/out/scratch.tmp"));
        assert!(f.ignores("/out/SCRATCH.TMP"));
    }

    #[test]
    fn question_mark_is_single_character() {
        let f = filter(&["*/file?.txt"]);
        assert!(f.ignores("/d/file1.txt"));
        assert!(!f.ignores("/d/file12.txt"));
    }

    #[test]
    fn empty_set_ignores_nothing() {
        let f = filter(&[]);
        assert!(!f.ignores("/anything/at/all"));
    }
}
