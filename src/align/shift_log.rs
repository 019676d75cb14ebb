use super::SliceShift;
use crate::error::{ReconError, ReconResult};
use crate::io::ensure_parent_dir;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one tab-separated line per transition:
/// `reference moving dx dy cumulativeDx cumulativeDy [extras...]`.
pub(crate) fn write_shift_log(path: &Path, transitions: &[SliceShift]) -> ReconResult<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| ReconError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for t in transitions {
        write!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            t.reference, t.moving, t.dx, t.dy, t.cumulative_dx, t.cumulative_dy
        )
        .map_err(|e| ReconError::io(path, e))?;
        for extra in &t.extras {
            write!(out, "\t{extra}").map_err(|e| ReconError::io(path, e))?;
        }
        writeln!(out).map_err(|e| ReconError::io(path, e))?;
    }
    out.flush().map_err(|e| ReconError::io(path, e))
}
