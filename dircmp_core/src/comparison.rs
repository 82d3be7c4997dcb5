use crate::digest::{Blake3Digester, ContentDigester};
use crate::entries::{check_entries, open_listing};
use crate::snapshot::read_snapshot;
use dircmp_common::{
    CompareOptions, InspectOp, InspectionError, MetadataSnapshot, MismatchKind, NodeKind,
    Outcome, Verdict,
};
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Comparison engine for deciding whether two directory trees are equivalent
pub struct ComparisonEngine<D = Blake3Digester> {
    options: CompareOptions,
    digester: D,
}

impl ComparisonEngine<Blake3Digester> {
    pub fn new(options: CompareOptions) -> Self {
        let digester = Blake3Digester::new(options.read_buffer_size);
        Self { options, digester }
    }
}

impl<D: ContentDigester> ComparisonEngine<D> {
    pub fn with_digester(options: CompareOptions, digester: D) -> Self {
        Self { options, digester }
    }

    pub fn digester(&self) -> &D {
        &self.digester
    }

    /// Compare two tree roots.
    ///
    /// The roots' listings are checked against each other first, then every
    /// entry below them is walked. The roots' own metadata is not compared.
    pub fn compare_trees(&self, left_root: &Path, right_root: &Path) -> Outcome {
        info!("Comparing {} with {}", left_root.display(), right_root.display());

        let result = check_entries(left_root, right_root, self.options.entry_check).and_then(
            |verdict| match verdict {
                Verdict::Equivalent => self.walk(left_root, right_root),
                mismatch => Ok(mismatch),
            },
        );
        let outcome = Outcome::from(result);

        match &outcome {
            Outcome::Equivalent => info!("Result: equivalent"),
            Outcome::NotEquivalent(mismatch) => warn!("Result: not equivalent: {}", mismatch),
            Outcome::InspectionError(err) => warn!("Result: inspection error: {}", err),
        }
        outcome
    }

    /// Compare every entry of the left directory with its counterpart on the right.
    ///
    /// Descends depth-first in listing order and stops at the first entry that
    /// is not equivalent. Open listings live on an explicit stack, one per
    /// level of the current path, so the call stack does not grow with depth.
    pub fn walk(&self, left: &Path, right: &Path) -> Result<Verdict, InspectionError> {
        debug!("Walk: {} {}", left.display(), right.display());

        let mut stack = vec![Level::open(left.to_path_buf(), right.to_path_buf())?];

        while let Some(level) = stack.last_mut() {
            let entry = match level.listing.next() {
                Some(entry) => {
                    entry.map_err(|e| InspectionError::new(&level.left, InspectOp::ListDir, e))?
                }
                None => {
                    stack.pop();
                    continue;
                }
            };

            let name = entry.file_name();
            let left_child = level.left.join(&name);
            let right_child = level.right.join(&name);

            let left_meta = read_snapshot(&left_child, self.options.links.left)?;
            match self.compare_with_left(&left_child, &right_child, &left_meta)? {
                Verdict::Equivalent => {}
                mismatch => return Ok(mismatch),
            }

            if left_meta.is_dir() {
                debug!("Walk: {} {}", left_child.display(), right_child.display());
                stack.push(Level::open(left_child, right_child)?);
            }
        }

        Ok(Verdict::Equivalent)
    }

    /// Compare one path pair: metadata first, then listings or content.
    ///
    /// A directory pair is only checked at the listing level here; its
    /// children are the walker's job.
    pub fn compare_node(&self, left: &Path, right: &Path) -> Result<Verdict, InspectionError> {
        let left_meta = read_snapshot(left, self.options.links.left)?;
        self.compare_with_left(left, right, &left_meta)
    }

    fn compare_with_left(
        &self,
        left: &Path,
        right: &Path,
        left_meta: &MetadataSnapshot,
    ) -> Result<Verdict, InspectionError> {
        debug!("Compare: {} {}", left.display(), right.display());

        let right_meta = read_snapshot(right, self.options.links.right)?;

        if let Some(kind) = self.metadata_mismatch(left_meta, &right_meta) {
            debug!("Metadata test fail: {}", kind);
            return Ok(Verdict::mismatch(left, right, kind));
        }

        match right_meta.kind {
            NodeKind::Directory => check_entries(left, right, self.options.entry_check),
            kind => {
                if left_meta.size != right_meta.size {
                    debug!("Size test fail: {} != {}", left_meta.size, right_meta.size);
                    return Ok(Verdict::mismatch(
                        left,
                        right,
                        MismatchKind::Size {
                            left: left_meta.size,
                            right: right_meta.size,
                        },
                    ));
                }

                match kind {
                    NodeKind::File => self.compare_content(left, right),
                    NodeKind::Symlink => compare_link_targets(left, right),
                    // Devices, FIFOs and sockets have no content to read
                    _ => Ok(Verdict::Equivalent),
                }
            }
        }
    }

    /// Owner, group, mode and mtime, in that order
    fn metadata_mismatch(
        &self,
        left: &MetadataSnapshot,
        right: &MetadataSnapshot,
    ) -> Option<MismatchKind> {
        if left.uid != right.uid {
            return Some(MismatchKind::Owner {
                left: left.uid,
                right: right.uid,
            });
        }
        if left.gid != right.gid {
            return Some(MismatchKind::Group {
                left: left.gid,
                right: right.gid,
            });
        }
        if left.mode != right.mode {
            return Some(MismatchKind::Mode {
                left: left.mode,
                right: right.mode,
            });
        }
        if !left
            .modified
            .matches(&right.modified, self.options.mtime_precision)
        {
            return Some(MismatchKind::Modified {
                left: left.modified,
                right: right.modified,
            });
        }
        None
    }

    /// Compare two files of equal size by content digest
    pub fn compare_content(&self, left: &Path, right: &Path) -> Result<Verdict, InspectionError> {
        let left_hash = self.digester.digest(left)?;
        let right_hash = self.digester.digest(right)?;

        if left_hash != right_hash {
            debug!(
                "Content test fail: {} != {}",
                left_hash.to_hex(),
                right_hash.to_hex()
            );
            return Ok(Verdict::mismatch(
                left,
                right,
                MismatchKind::Content {
                    left: left_hash,
                    right: right_hash,
                },
            ));
        }

        Ok(Verdict::Equivalent)
    }
}

fn compare_link_targets(left: &Path, right: &Path) -> Result<Verdict, InspectionError> {
    let left_target =
        fs::read_link(left).map_err(|e| InspectionError::new(left, InspectOp::ReadLink, e))?;
    let right_target =
        fs::read_link(right).map_err(|e| InspectionError::new(right, InspectOp::ReadLink, e))?;

    if left_target != right_target {
        debug!(
            "Link target test fail: {} != {}",
            left_target.display(),
            right_target.display()
        );
        return Ok(Verdict::mismatch(
            left,
            right,
            MismatchKind::LinkTarget {
                left: left_target,
                right: right_target,
            },
        ));
    }

    Ok(Verdict::Equivalent)
}

/// One directory pair being walked, with its open left-side listing
struct Level {
    left: PathBuf,
    right: PathBuf,
    listing: ReadDir,
}

impl Level {
    fn open(left: PathBuf, right: PathBuf) -> Result<Self, InspectionError> {
        let listing = open_listing(&left)?;
        Ok(Self {
            left,
            right,
            listing,
        })
    }
}
