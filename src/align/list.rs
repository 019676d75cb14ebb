use super::options::{ShiftFileFormat, ShiftValues};
use crate::error::{ReconError, ReconResult};
use std::fs;
use std::path::Path;

/// Reads the first `transitions` entries of a shift file and returns the
/// cumulative shift table (`transitions + 1` entries, the first `(0, 0)`).
///
/// Blank lines and lines starting with `#` are skipped; surplus lines are
/// ignored.
pub(crate) fn read_shift_file(
    path: &Path,
    format: ShiftFileFormat,
    values: ShiftValues,
    transitions: usize,
) -> ReconResult<Vec<[i64; 2]>> {
    let text = fs::read_to_string(path).map_err(|e| ReconError::io(path, e))?;
    parse_shift_file(&text, path, format, values, transitions)
}

pub(crate) fn parse_shift_file(
    text: &str,
    path: &Path,
    format: ShiftFileFormat,
    values: ShiftValues,
    transitions: usize,
) -> ReconResult<Vec<[i64; 2]>> {
    let (cx, cy, min_cols) = match (format, values) {
        (ShiftFileFormat::Plain, _) => (1, 2, 3),
        (ShiftFileFormat::Dream3d, ShiftValues::Incremental) => (2, 3, 4),
        (ShiftFileFormat::Dream3d, ShiftValues::Cumulative) => (4, 5, 6),
    };

    let mut entries = Vec::with_capacity(transitions);
    for (lineno, line) in text.lines().enumerate() {
        if entries.len() == transitions {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < min_cols {
            return Err(ReconError::ShiftFileParse {
                path: path.to_path_buf(),
                line: lineno + 1,
                reason: format!("expected at least {min_cols} columns, found {}", fields.len()),
            });
        }
        let parse = |col: usize| -> ReconResult<i64> {
            let field = fields[col];
            field
                .parse::<i64>()
                .or_else(|_| field.parse::<f64>().map(|v| v.round() as i64))
                .map_err(|_| ReconError::ShiftFileParse {
                    path: path.to_path_buf(),
                    line: lineno + 1,
                    reason: format!("'{field}' is not a number"),
                })
        };
        entries.push([parse(cx)?, parse(cy)?]);
    }

    if entries.len() < transitions {
        return Err(ReconError::ShiftFileTooShort {
            path: path.to_path_buf(),
            expected: transitions,
            found: entries.len(),
        });
    }

    let mut shifts = Vec::with_capacity(transitions + 1);
    shifts.push([0, 0]);
    for entry in entries {
        let next = match values {
            ShiftValues::Incremental => {
                let prev = shifts[shifts.len() - 1];
                [prev[0] + entry[0], prev[1] + entry[1]]
            }
            ShiftValues::Cumulative => entry,
        };
        shifts.push(next);
    }
    Ok(shifts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, format: ShiftFileFormat, values: ShiftValues, n: usize) -> ReconResult<Vec<[i64; 2]>> {
        parse_shift_file(text, Path::new("shifts.txt"), format, values, n)
    }

    #[test]
    fn incremental_entries_are_summed() {
        let text = "# slice dx dy\n1 2 -1\n\n2 -2 4\n3 9 9\n";
        let shifts = parse(text, ShiftFileFormat::Plain, ShiftValues::Incremental, 2).unwrap();
        assert_eq!(shifts, vec![[0, 0], [2, -1], [0, 3]]);
        for i in 1..shifts.len() {
            let inc = [shifts[i][0] - shifts[i - 1][0], shifts[i][1] - shifts[i - 1][1]];
            assert_eq!([shifts[i - 1][0] + inc[0], shifts[i - 1][1] + inc[1]], shifts[i]);
        }
    }

    #[test]
    fn log_format_reads_cumulative_columns() {
        let text = "0\t1\t2\t-1\t2\t-1\n1\t2\t-2\t4\t0.4\t3.0\n";
        let shifts = parse(text, ShiftFileFormat::Dream3d, ShiftValues::Cumulative, 2).unwrap();
        assert_eq!(shifts, vec![[0, 0], [2, -1], [0, 3]]);
        let inc = parse(text, ShiftFileFormat::Dream3d, ShiftValues::Incremental, 2).unwrap();
        assert_eq!(inc, vec![[0, 0], [2, -1], [0, 3]]);
    }

    #[test]
    fn short_or_malformed_files_are_errors() {
        let err = parse("1 2 3\n", ShiftFileFormat::Plain, ShiftValues::Incremental, 2).unwrap_err();
        assert!(matches!(err, ReconError::ShiftFileTooShort { expected: 2, found: 1, .. }));
        let err = parse("1 x 3\n", ShiftFileFormat::Plain, ShiftValues::Incremental, 1).unwrap_err();
        assert!(matches!(err, ReconError::ShiftFileParse { line: 1, .. }));
        let err = parse("1 2\n", ShiftFileFormat::Plain, ShiftValues::Incremental, 1).unwrap_err();
        assert_eq!(err.code(), -3);
    }
}
