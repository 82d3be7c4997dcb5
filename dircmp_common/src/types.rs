use crate::InspectionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Default chunk size used when digesting file content
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Type of a filesystem node, as reported by its metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Directory,
    File,
    Symlink,
    /// FIFO, socket, block or character device
    Other,
}

impl NodeKind {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let file_type = meta.file_type();
        if file_type.is_dir() {
            NodeKind::Directory
        } else if file_type.is_file() {
            NodeKind::File
        } else if file_type.is_symlink() {
            NodeKind::Symlink
        } else {
            NodeKind::Other
        }
    }
}

/// Modification time split into whole seconds and the nanosecond remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// Equality at the requested precision
    pub fn matches(&self, other: &Timestamp, precision: MtimePrecision) -> bool {
        match precision {
            MtimePrecision::Seconds => self.secs == other.secs,
            MtimePrecision::Nanoseconds => self == other,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.secs, self.nanos) {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}.{:09}", self.secs, self.nanos),
        }
    }
}

/// The attributes of a path that take part in an equivalence check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub uid: u32,
    pub gid: u32,
    /// Permission and file-type bits (st_mode)
    pub mode: u32,
    pub modified: Timestamp,
    pub size: u64,
    pub kind: NodeKind,
}

impl MetadataSnapshot {
    #[cfg(unix)]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            uid: meta.uid(),
            gid: meta.gid(),
            mode: meta.mode(),
            modified: Timestamp::new(meta.mtime(), meta.mtime_nsec() as u32),
            size: meta.size(),
            kind: NodeKind::from_metadata(meta),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(meta: &Metadata) -> Self {
        use std::time::UNIX_EPOCH;

        let kind = NodeKind::from_metadata(meta);
        // Synthesize st_mode style bits so type mismatches still fail the mode gate
        let type_bits = match kind {
            NodeKind::Directory => 0o040000,
            NodeKind::File => 0o100000,
            NodeKind::Symlink => 0o120000,
            NodeKind::Other => 0,
        };
        let perm_bits = if meta.permissions().readonly() { 0o444 } else { 0o644 };
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| Timestamp::new(d.as_secs() as i64, d.subsec_nanos()))
            .unwrap_or(Timestamp::new(0, 0));

        Self {
            uid: 0,
            gid: 0,
            mode: type_bits | perm_bits,
            modified,
            size: meta.len(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// How metadata is read for one side of the tree pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadMode {
    /// Dereference symbolic links (stat)
    Follow,
    /// Report the link itself (lstat)
    #[default]
    NoFollow,
}

/// Link-follow policy for the whole run.
///
/// The left and right read modes are independent fields. The classic
/// behaviour, built by [`LinkPolicy::from_follow_flag`], makes only the left
/// side configurable and always dereferences links on the right side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPolicy {
    pub left: ReadMode,
    pub right: ReadMode,
}

impl LinkPolicy {
    pub fn from_follow_flag(follow: bool) -> Self {
        Self {
            left: if follow { ReadMode::Follow } else { ReadMode::NoFollow },
            right: ReadMode::Follow,
        }
    }

    pub fn symmetric(mode: ReadMode) -> Self {
        Self { left: mode, right: mode }
    }
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self::from_follow_flag(false)
    }
}

/// How a directory pair's listings are checked against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryCheck {
    /// Only the number of entries has to match
    #[default]
    Count,
    /// The sorted sets of entry names have to match
    Names,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MtimePrecision {
    #[default]
    Seconds,
    Nanoseconds,
}

/// Options fixed for one comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    pub links: LinkPolicy,
    pub entry_check: EntryCheck,
    pub mtime_precision: MtimePrecision,
    pub read_buffer_size: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            links: LinkPolicy::default(),
            entry_check: EntryCheck::default(),
            mtime_precision: MtimePrecision::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl From<&AppConfig> for CompareOptions {
    fn from(config: &AppConfig) -> Self {
        let follow = LinkPolicy::from_follow_flag(config.follow_symlinks);
        let links = if config.symmetric_links {
            LinkPolicy::symmetric(follow.left)
        } else {
            follow
        };

        Self {
            links,
            entry_check: if config.strict_names { EntryCheck::Names } else { EntryCheck::Count },
            mtime_precision: if config.exact_mtime {
                MtimePrecision::Nanoseconds
            } else {
                MtimePrecision::Seconds
            },
            read_buffer_size: config
                .read_buffer_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_READ_BUFFER_SIZE),
        }
    }
}

/// One side of the tree pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// Which check found the difference, with both sides' values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum MismatchKind {
    Owner { left: u32, right: u32 },
    Group { left: u32, right: u32 },
    Mode { left: u32, right: u32 },
    Modified { left: Timestamp, right: Timestamp },
    Size { left: u64, right: u64 },
    Content {
        #[serde(serialize_with = "serialize_hex")]
        left: Blake3Hash,
        #[serde(serialize_with = "serialize_hex")]
        right: Blake3Hash,
    },
    LinkTarget { left: PathBuf, right: PathBuf },
    EntryCount { left: usize, right: usize },
    EntryNames { name: String, only_in: Side },
}

fn serialize_hex<S>(hash: &Blake3Hash, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hash.to_hex())
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::Owner { left, right } => write!(f, "owner differs ({} != {})", left, right),
            MismatchKind::Group { left, right } => write!(f, "group differs ({} != {})", left, right),
            MismatchKind::Mode { left, right } => write!(f, "mode differs ({:o} != {:o})", left, right),
            MismatchKind::Modified { left, right } => {
                write!(f, "modification time differs ({} != {})", left, right)
            }
            MismatchKind::Size { left, right } => write!(f, "size differs ({} != {})", left, right),
            MismatchKind::Content { left, right } => write!(
                f,
                "content differs ({} != {})",
                left.to_hex(),
                right.to_hex()
            ),
            MismatchKind::LinkTarget { left, right } => write!(
                f,
                "link target differs ({} != {})",
                left.display(),
                right.display()
            ),
            MismatchKind::EntryCount { left, right } => {
                write!(f, "entry count differs ({} != {})", left, right)
            }
            MismatchKind::EntryNames { name, only_in } => {
                write!(f, "entry {:?} only present on the {} side", name, only_in)
            }
        }
    }
}

/// A completed comparison that found a difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub left: PathBuf,
    pub right: PathBuf,
    pub kind: MismatchKind,
}

impl Mismatch {
    pub fn new(left: &Path, right: &Path, kind: MismatchKind) -> Self {
        Self {
            left: left.to_path_buf(),
            right: right.to_path_buf(),
            kind,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {}: {}",
            self.left.display(),
            self.right.display(),
            self.kind
        )
    }
}

/// Result of a comparison that could inspect everything it needed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Equivalent,
    NotEquivalent(Mismatch),
}

impl Verdict {
    pub fn mismatch(left: &Path, right: &Path, kind: MismatchKind) -> Self {
        Verdict::NotEquivalent(Mismatch::new(left, right, kind))
    }

    pub fn is_equivalent(&self) -> bool {
        matches!(self, Verdict::Equivalent)
    }
}

/// Final outcome of comparing a tree pair
#[derive(Debug)]
pub enum Outcome {
    Equivalent,
    NotEquivalent(Mismatch),
    InspectionError(InspectionError),
}

impl Outcome {
    /// Process exit status: 0 equivalent, 1 not equivalent, 2 inspection error
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Equivalent => 0,
            Outcome::NotEquivalent(_) => 1,
            Outcome::InspectionError(_) => 2,
        }
    }

    pub fn is_equivalent(&self) -> bool {
        matches!(self, Outcome::Equivalent)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Equivalent => "equivalent",
            Outcome::NotEquivalent(_) => "not_equivalent",
            Outcome::InspectionError(_) => "inspection_error",
        }
    }
}

impl From<std::result::Result<Verdict, InspectionError>> for Outcome {
    fn from(result: std::result::Result<Verdict, InspectionError>) -> Self {
        match result {
            Ok(Verdict::Equivalent) => Outcome::Equivalent,
            Ok(Verdict::NotEquivalent(mismatch)) => Outcome::NotEquivalent(mismatch),
            Err(err) => Outcome::InspectionError(err),
        }
    }
}

/// BLAKE3 hash value (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blake3Hash(pub [u8; 32]);

impl Blake3Hash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for Blake3Hash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Dereference symbolic links on the left side
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Use the left side's read mode for the right side as well
    #[serde(default)]
    pub symmetric_links: bool,

    /// Require matching entry names, not only matching entry counts
    #[serde(default)]
    pub strict_names: bool,

    /// Compare modification times to the nanosecond
    #[serde(default)]
    pub exact_mtime: bool,

    /// Chunk size for content digests
    #[serde(default)]
    pub read_buffer_size: Option<usize>,
}
