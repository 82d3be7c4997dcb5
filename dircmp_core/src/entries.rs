use dircmp_common::{EntryCheck, InspectOp, InspectionError, MismatchKind, Side, Verdict};
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs::{self, ReadDir};
use std::path::Path;
use tracing::debug;

/// Check that two directories have matching listings.
///
/// Both listings are opened before either is consumed, so an unreadable
/// directory on either side is reported as an inspection error. `read_dir`
/// never yields `.` and `..`; both raw listings contain them, so leaving
/// them out does not change the outcome of a count comparison.
pub fn check_entries(
    left: &Path,
    right: &Path,
    check: EntryCheck,
) -> Result<Verdict, InspectionError> {
    debug!("Check entries: {} {}", left.display(), right.display());

    let left_listing = open_listing(left)?;
    let right_listing = open_listing(right)?;

    match check {
        EntryCheck::Count => {
            let left_count = count_entries(left, left_listing)?;
            let right_count = count_entries(right, right_listing)?;
            if left_count != right_count {
                debug!("Entry count differs: {} != {}", left_count, right_count);
                return Ok(Verdict::mismatch(
                    left,
                    right,
                    MismatchKind::EntryCount {
                        left: left_count,
                        right: right_count,
                    },
                ));
            }
            Ok(Verdict::Equivalent)
        }
        EntryCheck::Names => {
            let left_names = sorted_names(left, left_listing)?;
            let right_names = sorted_names(right, right_listing)?;
            match first_unmatched(&left_names, &right_names) {
                Some((name, only_in)) => {
                    let name = name.to_string_lossy().into_owned();
                    debug!("Entry {:?} only present on the {} side", name, only_in);
                    Ok(Verdict::mismatch(
                        left,
                        right,
                        MismatchKind::EntryNames { name, only_in },
                    ))
                }
                None => Ok(Verdict::Equivalent),
            }
        }
    }
}

pub(crate) fn open_listing(dir: &Path) -> Result<ReadDir, InspectionError> {
    fs::read_dir(dir).map_err(|e| InspectionError::new(dir, InspectOp::ListDir, e))
}

fn count_entries(dir: &Path, listing: ReadDir) -> Result<usize, InspectionError> {
    let mut count = 0;
    for entry in listing {
        entry.map_err(|e| InspectionError::new(dir, InspectOp::ListDir, e))?;
        count += 1;
    }
    Ok(count)
}

fn sorted_names(dir: &Path, listing: ReadDir) -> Result<Vec<OsString>, InspectionError> {
    let mut names = listing
        .map(|entry| {
            entry
                .map(|e| e.file_name())
                .map_err(|e| InspectionError::new(dir, InspectOp::ListDir, e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}

/// First name, in sorted order, that appears in only one of two sorted lists
fn first_unmatched<'a>(left: &'a [OsString], right: &'a [OsString]) -> Option<(&'a OsString, Side)> {
    let (mut i, mut j) = (0, 0);
    loop {
        match (left.get(i), right.get(j)) {
            (Some(l), Some(r)) => match l.cmp(r) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Less => return Some((l, Side::Left)),
                Ordering::Greater => return Some((r, Side::Right)),
            },
            (Some(l), None) => return Some((l, Side::Left)),
            (None, Some(r)) => return Some((r, Side::Right)),
            (None, None) => return None,
        }
    }
}
