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

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::solution::Solution;

/// Log of the trials of the randomized rounding. When B is true and an output folder is given,
/// each trial is written as a line of a CSV file `rounding_<timestamp>.csv` in that folder.
pub struct Logger<const B: bool> {
    number_trials: usize,
    number_improvements: usize,
    number_empty_trials: usize,
    best_eca: f64,
    global_timestamp: chrono::DateTime<chrono::Local>,
    outpath: Option<PathBuf>,
    outfile: Option<File>,
}

impl<const B: bool> Logger<B> {

    pub fn new(outfolder: Option<&Path>) -> Result<Self> {
        let global_timestamp = chrono::Local::now();
        let mut outpath = None;
        let mut outfile = None;
        if B {
            if let Some(folder) = outfolder {
                let path = folder.join(format!("rounding_{}.csv", global_timestamp.format("%Y%m%d-%H%M%S")));
                let mut file = File::create(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
                writeln!(file, "trial,cost,eca,options").map_err(|source| Error::Io { path: path.clone(), source })?;
                outpath = Some(path);
                outfile = Some(file);
            }
        }
        Ok(Self {
            number_trials: 0,
            number_improvements: 0,
            number_empty_trials: 0,
            best_eca: 0.0,
            global_timestamp,
            outpath,
            outfile,
        })
    }

    /// Records the solution of a trial. The trials must be given in order.
    pub fn log_trial(&mut self, trial: u64, solution: &Solution) -> Result<()> {
        if B {
            self.number_trials += 1;
            if solution.selected().is_empty() {
                self.number_empty_trials += 1;
            }
            if self.number_trials == 1 || solution.eca() > self.best_eca {
                self.number_improvements += 1;
                self.best_eca = solution.eca();
            }
            if let (Some(file), Some(path)) = (self.outfile.as_mut(), self.outpath.as_ref()) {
                writeln!(file, "{},{}", trial, solution.to_csv_row()).map_err(|source| Error::Io { path: path.clone(), source })?;
            }
        }
        Ok(())
    }

    pub fn outpath(&self) -> Option<&Path> {
        self.outpath.as_deref()
    }

    pub fn print(&self) {
        if B {
            println!("{}", self);
        }
    }
}

impl<const B: bool> fmt::Display for Logger<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if B {
            let duration = (chrono::Local::now() - self.global_timestamp).num_milliseconds();
            writeln!(f,
                "trials {} | improvements {} | empty trials {} | best ECA {:.6} | {} ms",
                self.number_trials,
                self.number_improvements,
                self.number_empty_trials,
                self.best_eca,
                duration)
        } else {
            write!(f, "")
        }
    }
}

#[cfg(test)]
mod test_logger {
    use crate::core::landscape::Landscape;
    use crate::core::restoration_plan::RestorationPlan;
    use crate::logger::Logger;
    use crate::solution::Solution;

    #[test]
    pub fn trials_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut landscape = Landscape::new();
        landscape.add_patch(2.0, 0.0, 0.0);
        let plan = RestorationPlan::new();
        let solution = Solution::from_selection(&landscape, &plan, &[], "test");
        let mut logger = Logger::<true>::new(Some(dir.path())).unwrap();
        logger.log_trial(0, &solution).unwrap();
        logger.log_trial(1, &solution).unwrap();
        let path = logger.outpath().unwrap().to_path_buf();
        drop(logger);
        let content = std::fs::read_to_string(path).unwrap();
        let lines = content.lines().collect::<Vec<&str>>();
        assert_eq!(3, lines.len());
        assert_eq!("trial,cost,eca,options", lines[0]);
        assert!(lines[1].starts_with("0,0,2.0000000000"));
    }

    #[test]
    pub fn quiet_logger_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::<false>::new(Some(dir.path())).unwrap();
        assert!(logger.outpath().is_none());
        assert_eq!(0, std::fs::read_dir(dir.path()).unwrap().count());
    }
}
