//! Whitespace-delimited numeric text tables.
//!
//! Design matrices and motion traces are plain text: one row per line,
//! values separated by spaces or tabs. Blank lines and lines starting
//! with `#` are ignored. A single column file still reads as a 2-D table.

use crate::error::{GlmError, Result};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// How values are printed when writing a table.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NumberFormat {
    /// Rounded to the nearest integer.
    Integer,
    /// Fixed point with the given number of decimals.
    Fixed(usize),
}

impl NumberFormat {
    fn format(self, value: f64) -> String {
        match self {
            NumberFormat::Integer => format!("{}", value.round() as i64),
            NumberFormat::Fixed(decimals) => format!("{:.*}", decimals, value),
        }
    }
}

/// Read a numeric table from a text file.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let invalid = |line: usize, reason: String| GlmError::InvalidTable(path.to_owned(), line, reason);

    let mut values = Vec::new();
    let mut ncols = None;
    let mut nrows = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }
        let mut count = 0;
        for token in content.split_whitespace() {
            let v: f64 = token
                .parse()
                .map_err(|_| invalid(i + 1, format!("not a number: `{}`", token)))?;
            values.push(v);
            count += 1;
        }
        match ncols {
            None => ncols = Some(count),
            Some(n) if n != count => {
                return Err(invalid(
                    i + 1,
                    format!("expected {} columns but found {}", n, count),
                ))
            }
            _ => {}
        }
        nrows += 1;
    }

    let ncols = ncols.unwrap_or(0);
    Array2::from_shape_vec((nrows, ncols), values)
        .map_err(|e| invalid(0, e.to_string()))
}

/// Write a table, one row per line with values separated by a space.
pub fn write_table<P, S>(path: P, table: &ArrayBase<S, Ix2>, format: NumberFormat) -> Result<()>
where
    P: AsRef<Path>,
    S: Data<Elem = f64>,
{
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for row in table.outer_iter() {
        let line: Vec<String> = row.iter().map(|v| format.format(*v)).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}

/// Write a sequence of values as a single column.
pub fn write_column<P: AsRef<Path>>(path: P, values: &[f64], format: NumberFormat) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    for v in values {
        writeln!(out, "{}", format.format(*v))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_with_comments_and_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("design.txt");
        fs::write(&path, "# header\n1 2\t3\n\n  4 5 6  \n").unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table, arr2(&[[1., 2., 3.], [4., 5., 6.]]));
    }

    #[test]
    fn single_column_is_two_dimensional() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ev.txt");
        fs::write(&path, "1\n2\n3\n").unwrap();
        assert_eq!(read_table(&path).unwrap().dim(), (3, 1));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "1 2\n3\n").unwrap();
        match read_table(&path) {
            Err(GlmError::InvalidTable(_, line, _)) => assert_eq!(line, 2),
            other => panic!("unexpected result {:?}", other),
        }

        fs::write(&path, "1 x\n").unwrap();
        assert!(read_table(&path).is_err());
    }

    #[test]
    fn formats() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_table(&path, &arr2(&[[1., -0.5], [2.25, 3.]]), NumberFormat::Fixed(8)).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "1.00000000 -0.50000000\n2.25000000 3.00000000\n"
        );

        write_column(&path, &[1., 0., 1.], NumberFormat::Integer).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n0\n1\n");
    }
}
