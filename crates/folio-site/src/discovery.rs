//! Meeting discovery.
//!
//! Meetings live in a flat directory as `meeting0.md`, `meeting1.md`, ... and
//! are appended after the manifest in numeric order, so `meeting10` follows
//! `meeting9` rather than `meeting1`.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::builder::BuildError;
use crate::unit::{output_path_for, ConversionUnit};

static MEETING_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^meeting(\d+)\.md$").expect("valid meeting pattern"));

/// Prefix of the tab identifier given to discovered meetings.
pub const MEETING_TAB_PREFIX: &str = "meeting-";

/// Source of directory listings.
///
/// Discovery only needs entry names, so tests can substitute a fixed list.
pub trait DirectoryLister: Send + Sync {
    /// Names of the files directly inside `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// Lists directories on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLister;

impl DirectoryLister for FsLister {
    fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }
}

/// A file name that matched the meeting pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingFile {
    /// File name, e.g. `meeting2.md`
    pub file_name: String,

    /// Digits as written, e.g. `2`
    pub number: String,
}

impl MeetingFile {
    /// Parse a file name, returning `None` unless it is `meeting<digits>.md`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = MEETING_FILE.captures(file_name)?;

        Some(Self {
            file_name: file_name.to_string(),
            number: captures[1].to_string(),
        })
    }

    pub fn tab_id(&self) -> String {
        format!("{MEETING_TAB_PREFIX}{}", self.number)
    }
}

impl Ord for MeetingFile {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_numeric(&self.number, &other.number)
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

impl PartialOrd for MeetingFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two digit strings by value without parsing them.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');

    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Keep the meeting files among `names`, sorted by meeting number.
pub fn select_meetings<I, S>(names: I) -> Vec<MeetingFile>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut meetings: Vec<MeetingFile> = names
        .into_iter()
        .filter_map(|name| MeetingFile::parse(name.as_ref()))
        .collect();

    meetings.sort();
    meetings
}

/// Discover meeting documents in `meetings_dir`.
///
/// A missing directory yields no meetings.
pub fn discover_meetings(
    lister: &dyn DirectoryLister,
    meetings_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<ConversionUnit>, BuildError> {
    let names = match lister.list(meetings_dir) {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(
                "Meetings directory not found: {}",
                meetings_dir.display()
            );
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(BuildError::Discovery {
                dir: meetings_dir.to_path_buf(),
                source: e,
            })
        }
    };

    let units: Vec<ConversionUnit> = select_meetings(names)
        .into_iter()
        .map(|meeting| {
            let source_path = meetings_dir.join(&meeting.file_name);

            ConversionUnit {
                output_path: output_path_for(&source_path, output_dir),
                source_path,
                tab_id: meeting.tab_id(),
                label: None,
            }
        })
        .collect();

    tracing::debug!(
        "Discovered {} meetings in {}",
        units.len(),
        meetings_dir.display()
    );

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    struct StubLister(io::Result<Vec<&'static str>>);

    impl DirectoryLister for StubLister {
        fn list(&self, _dir: &Path) -> io::Result<Vec<String>> {
            match &self.0 {
                Ok(names) => Ok(names.iter().map(|n| n.to_string()).collect()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn discover(lister: StubLister) -> Result<Vec<ConversionUnit>, BuildError> {
        discover_meetings(&lister, Path::new("meetings"), Path::new("docs"))
    }

    #[test]
    fn sorts_numerically() {
        let units = discover(StubLister(Ok(vec![
            "meeting10.md",
            "meeting2.md",
            "meeting0.md",
        ])))
        .unwrap();

        let tabs: Vec<_> = units.iter().map(|u| u.tab_id.as_str()).collect();
        assert_eq!(tabs, vec!["meeting-0", "meeting-2", "meeting-10"]);
    }

    #[test]
    fn maps_paths() {
        let units = discover(StubLister(Ok(vec!["meeting3.md"]))).unwrap();

        assert_eq!(
            units,
            vec![ConversionUnit {
                source_path: PathBuf::from("meetings/meeting3.md"),
                output_path: PathBuf::from("docs/meeting3.html"),
                tab_id: "meeting-3".to_string(),
                label: None,
            }]
        );
        assert_eq!(units[0].display_label(), "Meeting 3");
    }

    #[test]
    fn ignores_non_matching_names() {
        let meetings = select_meetings([
            "meeting.md",
            "meeting1.markdown",
            "Meeting2.md",
            "meeting3.md.bak",
            "notes.md",
            "meeting4a.md",
            "meeting5.md",
        ]);

        assert_eq!(meetings.len(), 1);
        assert_eq!(meetings[0].number, "5");
    }

    #[test]
    fn leading_zeros_keep_distinct_tabs() {
        let meetings = select_meetings(["meeting01.md", "meeting1.md", "meeting002.md"]);

        let tabs: Vec<_> = meetings.iter().map(MeetingFile::tab_id).collect();
        assert_eq!(tabs, vec!["meeting-01", "meeting-1", "meeting-002"]);
    }

    #[test]
    fn handles_numbers_beyond_u64() {
        let meetings = select_meetings(["meeting99999999999999999999999.md", "meeting7.md"]);

        assert_eq!(meetings[0].number, "7");
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let units = discover(StubLister(Ok(vec![]))).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let units = discover(StubLister(Err(io::Error::from(io::ErrorKind::NotFound)))).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn other_listing_errors_propagate() {
        let err = discover(StubLister(Err(io::Error::from(
            io::ErrorKind::PermissionDenied,
        ))))
        .unwrap_err();

        assert!(matches!(err, BuildError::Discovery { .. }));
    }

    #[test]
    fn fs_lister_skips_directories() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("meeting1.md"), "# One").unwrap();
        fs::create_dir(temp.path().join("meeting2.md")).unwrap();

        let mut names = FsLister.list(temp.path()).unwrap();
        names.sort();

        assert_eq!(names, vec!["meeting1.md".to_string()]);
    }
}
