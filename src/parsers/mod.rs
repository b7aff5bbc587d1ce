//Landscape_opt
//Copyright (C) 2022-2023 A. Dubray
//
//This program is free software: you can redistribute it and/or modify
//it under the terms of the GNU Affero General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//This program is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU Affero General Public License for more details.
//
//You should have received a copy of the GNU Affero General Public License
//along with this program.  If not, see <http://www.gnu.org/licenses/>.


//! Readers and writers of the instance files.
//!
//! A landscape is described by three CSV files: an index file naming the two others, a file with
//! one patch per line and a file with one corridor per line (see `landscape`). A restoration plan
//! is a text file listing the options and their elements (see `plan`).

pub mod landscape;
pub mod plan;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

pub use landscape::StdLandscapeParser;
pub use plan::StdRestorationPlanParser;

pub trait Parser<T> {
    fn parse(&self, path: &Path) -> Result<T>;
}

pub(crate) fn parse_error(path: &Path, line: usize, message: String) -> Error {
    Error::Parse { file: path.to_path_buf(), line, message }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io { path: path.to_path_buf(), source }
}

/// Returns the lines of the file with their number (starting at 1)
pub(crate) fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let file = File::open(path).map_err(io_error(path))?;
    let reader = BufReader::new(file);
    let mut lines = vec![];
    for (i, line) in reader.lines().enumerate() {
        lines.push((i + 1, line.map_err(io_error(path))?));
    }
    Ok(lines)
}

/// Parses a token as a number, or fails with a message naming what was expected
pub(crate) fn parse_number<T: std::str::FromStr>(path: &Path, line: usize, token: &str, what: &str) -> Result<T> {
    token.trim().parse::<T>().map_err(|_| parse_error(path, line, format!("Expected {} but got '{}'", what, token.trim())))
}

/// A CSV file with a header, in which the columns are looked up by name. Extra columns are
/// ignored.
pub(crate) struct CsvFile {
    rows: Vec<(usize, Vec<String>)>,
}

impl CsvFile {

    pub fn read(path: &Path, expected: &[&str]) -> Result<Self> {
        let mut lines = read_lines(path)?.into_iter().filter(|(_, l)| !l.trim().is_empty());
        let header = match lines.next() {
            Some((_, header)) => header.split(',').map(|c| c.trim().to_string()).collect::<Vec<String>>(),
            None => return Err(parse_error(path, 1, "Empty file, expected a header".to_string())),
        };
        let mut columns = vec![];
        for name in expected.iter() {
            match header.iter().position(|c| c == name) {
                Some(i) => columns.push(i),
                None => return Err(parse_error(path, 1, format!("Missing column '{}' in header", name))),
            }
        }
        let mut rows = vec![];
        for (number, line) in lines {
            let fields = line.split(',').map(|f| f.trim().to_string()).collect::<Vec<String>>();
            if let Some(max) = columns.iter().max() {
                if fields.len() <= *max {
                    return Err(parse_error(path, number, format!("Expected {} fields but got {}", header.len(), fields.len())));
                }
            }
            rows.push((number, columns.iter().map(|c| fields[*c].clone()).collect()));
        }
        Ok(Self { rows })
    }

    /// Rows with their line number, restricted to the expected columns (in the expected order)
    pub fn rows(&self) -> &[(usize, Vec<String>)] {
        &self.rows
    }
}

#[cfg(test)]
mod test_parsers_utils {
    use std::io::Write;

    use crate::error::Error;
    use crate::parsers::*;

    #[test]
    pub fn csv_columns_by_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "y,id,extra,x").unwrap();
        writeln!(file, "1.5, 3 ,foo,2").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "0,4,bar,1").unwrap();
        let csv = CsvFile::read(file.path(), &["id", "x", "y"]).unwrap();
        assert!(csv.rows().iter().all(|(_, fields)| fields.len() == 3));
        assert_eq!(2, csv.rows().len());
        assert_eq!(vec!["3".to_string(), "2".to_string(), "1.5".to_string()], csv.rows()[0].1);
        assert_eq!(4, csv.rows()[1].0);
    }

    #[test]
    pub fn csv_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,x").unwrap();
        match CsvFile::read(file.path(), &["id", "y"]) {
            Err(Error::Parse { line, message, .. }) => {
                assert_eq!(1, line);
                assert!(message.contains("'y'"));
            },
            _ => panic!("Expected a parse error"),
        }
    }

    #[test]
    pub fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_lines(&dir.path().join("nope.csv")), Err(Error::Io { .. })));
    }
}
