use crate::config::InstallConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix carried by every filter file in a release archive.
pub const FILTER_FILE_SUFFIX: &str = ".filter";

/// Which archive entries a run installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCriterion {
    /// Only files sitting directly under the archive root folder.
    TopLevel,
    /// Only files inside the `(STYLE) <NAME>` folder for one style.
    Style { name: String, folder: String },
}

impl FilterCriterion {
    /// Build a criterion from an optional user-supplied style name. A blank
    /// style behaves like no style at all.
    pub fn from_style(style: Option<&str>) -> Self {
        match style.map(str::trim) {
            Some(name) if !name.is_empty() => FilterCriterion::Style {
                name: name.to_string(),
                folder: style_folder_name(name),
            },
            _ => FilterCriterion::TopLevel,
        }
    }

    pub fn style_name(&self) -> Option<&str> {
        match self {
            FilterCriterion::TopLevel => None,
            FilterCriterion::Style { name, .. } => Some(name),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            FilterCriterion::TopLevel => path.split('/').count() == 2,
            FilterCriterion::Style { folder, .. } => path.split('/').nth(1) == Some(folder.as_str()),
        }
    }
}

/// Archive folder name for a style: `blue` becomes `(STYLE) BLUE`.
pub fn style_folder_name(style: &str) -> String {
    format!("(STYLE) {}", style.to_uppercase())
}

/// Style names are restricted to characters that can appear in a single
/// archive folder segment.
pub fn is_valid_style_name(style: &str) -> bool {
    STYLE_NAME.is_match(style)
}

static STYLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 _-]*$").expect("style name pattern is valid"));

/// Decides which archive entries get extracted.
///
/// Paths are the raw, `/`-separated entry names from the archive, whose first
/// segment is the archive's root folder.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    suffix: String,
    criterion: FilterCriterion,
}

impl EntryFilter {
    pub fn new(criterion: FilterCriterion) -> Self {
        Self {
            suffix: FILTER_FILE_SUFFIX.to_string(),
            criterion,
        }
    }

    pub fn from_config(config: &InstallConfig) -> Self {
        Self::new(FilterCriterion::from_style(config.style.as_deref()))
            .with_suffix(config.filter_suffix.clone())
    }

    pub fn with_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn should_extract(&self, path: &str) -> bool {
        if !path.ends_with(&self.suffix) {
            return false;
        }

        // Malformed names (no root folder) have no segment at index 1 and
        // simply fail to match.
        self.criterion.matches(path)
    }

    pub fn criterion(&self) -> &FilterCriterion {
        &self.criterion
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new(FilterCriterion::TopLevel)
    }
}

/// Final `/`-segment of an entry path, or `None` when it cannot name a flat
/// file in the destination directory.
pub fn entry_basename(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;

    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return None;
    }

    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filter_for(style: &str) -> EntryFilter {
        EntryFilter::new(FilterCriterion::from_style(Some(style)))
    }

    #[rstest]
    #[case("")]
    #[case("blue")]
    #[case("purple")]
    fn test_non_filter_files_are_rejected(#[case] style: &str) {
        let filter = filter_for(style);

        assert!(!filter.should_extract("root/README.md"));
        assert!(!filter.should_extract("root/(STYLE) BLUE/README.md"));
        assert!(!filter.should_extract("root/(STYLE) PURPLE/"));
        assert!(!filter.should_extract("root/NeverSink.filter.bak"));
    }

    #[rstest]
    #[case("root/file.filter", true)]
    #[case("root/sub/file.filter", false)]
    #[case("root/(STYLE) BLUE/file.filter", false)]
    #[case("file.filter", false)]
    #[case("root/a/b/file.filter", false)]
    fn test_top_level_selection(#[case] path: &str, #[case] expected: bool) {
        let filter = EntryFilter::default();
        assert_eq!(filter.should_extract(path), expected, "path: {path}");
    }

    #[rstest]
    #[case("blue", "root/(STYLE) BLUE/file.filter", true)]
    #[case("blue", "root/(STYLE) PURPLE/file.filter", false)]
    #[case("BLUE", "root/(STYLE) BLUE/file.filter", true)]
    #[case("Blue", "root/(STYLE) BLUE/file.filter", true)]
    #[case("blue", "root/(style) blue/file.filter", false)]
    #[case("blue", "root/file.filter", false)]
    #[case("blue", "file.filter", false)]
    #[case("streamsound", "root/(STYLE) STREAMSOUND/x.filter", true)]
    fn test_style_selection(#[case] style: &str, #[case] path: &str, #[case] expected: bool) {
        let filter = filter_for(style);
        assert_eq!(filter.should_extract(path), expected, "style: {style}, path: {path}");
    }

    #[test]
    fn test_blank_style_means_top_level() {
        assert_eq!(FilterCriterion::from_style(Some("  ")), FilterCriterion::TopLevel);
        assert_eq!(FilterCriterion::from_style(None), FilterCriterion::TopLevel);
        assert_eq!(FilterCriterion::TopLevel.style_name(), None);
    }

    #[test]
    fn test_style_folder_name() {
        assert_eq!(style_folder_name("blue"), "(STYLE) BLUE");
        assert_eq!(style_folder_name("Slick"), "(STYLE) SLICK");
        assert_eq!(
            FilterCriterion::from_style(Some("purple")).style_name(),
            Some("purple")
        );
    }

    #[rstest]
    #[case("blue", true)]
    #[case("Stream Sound", true)]
    #[case("dark_mode-2", true)]
    #[case("", true)]
    #[case("../blue", false)]
    #[case("blue/purple", false)]
    #[case("blue\\purple", false)]
    fn test_style_name_validation(#[case] style: &str, #[case] expected: bool) {
        assert_eq!(is_valid_style_name(style), expected, "style: {style}");
    }

    #[test]
    fn test_custom_suffix() {
        let filter = EntryFilter::default().with_suffix(".ruthless");
        assert!(filter.should_extract("root/a.ruthless"));
        assert!(!filter.should_extract("root/a.filter"));
    }

    #[test]
    fn test_entry_basename() {
        assert_eq!(entry_basename("root/(STYLE) BLUE/b.filter"), Some("b.filter"));
        assert_eq!(entry_basename("root/a.filter"), Some("a.filter"));
        assert_eq!(entry_basename("a.filter"), Some("a.filter"));
        assert_eq!(entry_basename("root/dir/"), None);
        assert_eq!(entry_basename("root/..\\evil.filter"), None);
    }
}
