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


//! Restoration plan files. Each option starts with its cost and its number of elements, followed
//! by the elements. An element is either a quality gain on a patch (`n <patch_id> <gain>`) or the
//! restored probability of an existing corridor (`a <source_id> <target_id> <probability>`). The
//! tokens may be spread over lines freely; lines starting with `#` are comments.
//!
//! # option 0
//! 5 2
//!     n 3 1.5
//!     a 0 1 0.8
//! # option 1
//! 10 1
//!     a 1 2 0.9

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::core::landscape::{Landscape, NodeIndex};
use crate::core::restoration_plan::RestorationPlan;
use crate::error::Result;
use crate::parsers::{io_error, parse_error, parse_number, read_lines, Parser};

pub struct StdRestorationPlanParser<'a> {
    landscape: &'a Landscape,
}

/// Tokens of the file, with the line on which they appear
struct Tokens<'p> {
    path: &'p Path,
    tokens: Vec<(usize, String)>,
    position: usize,
}

impl<'p> Tokens<'p> {

    fn read(path: &'p Path) -> Result<Self> {
        let mut tokens = vec![];
        for (line, content) in read_lines(path)? {
            if content.trim_start().starts_with('#') {
                continue;
            }
            for token in content.split_whitespace() {
                tokens.push((line, token.to_string()));
            }
        }
        Ok(Self { path, tokens, position: 0 })
    }

    fn is_empty(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn line(&self) -> usize {
        match self.tokens.get(self.position) {
            Some((line, _)) => *line,
            None => self.tokens.last().map(|(l, _)| *l).unwrap_or(1),
        }
    }

    fn next(&mut self) -> Result<(usize, &str)> {
        match self.tokens.get(self.position) {
            Some((line, token)) => {
                self.position += 1;
                Ok((*line, token.as_str()))
            },
            None => Err(parse_error(self.path, self.line(), "Unexpected end of file".to_string())),
        }
    }

    fn number<T: std::str::FromStr>(&mut self, what: &str) -> Result<T> {
        let path = self.path;
        let (line, token) = self.next()?;
        parse_number(path, line, token, what)
    }
}

impl<'a> StdRestorationPlanParser<'a> {

    pub fn new(landscape: &'a Landscape) -> Self {
        Self { landscape }
    }

    fn node(&self, path: &Path, line: usize, id: usize) -> Result<NodeIndex> {
        if id < self.landscape.nb_nodes() {
            Ok(NodeIndex(id))
        } else {
            Err(parse_error(path, line, format!("Invalid patch {}", id)))
        }
    }

    /// Writes the plan in the format read by the parser
    pub fn write(plan: &RestorationPlan, landscape: &Landscape, path: &Path) -> Result<()> {
        let mut file = BufWriter::new(File::create(path).map_err(io_error(path))?);
        for option in plan.options() {
            let content = &plan[option];
            writeln!(file, "{} {}", content.cost(), content.nb_elements()).map_err(io_error(path))?;
            for (node, gain) in content.nodes() {
                writeln!(file, "\tn {} {}", node.0, gain).map_err(io_error(path))?;
            }
            for (arc, probability) in content.arcs() {
                writeln!(file, "\ta {} {} {}", landscape.source(*arc).0, landscape.target(*arc).0, probability).map_err(io_error(path))?;
            }
        }
        file.flush().map_err(io_error(path))
    }
}

impl Parser<RestorationPlan> for StdRestorationPlanParser<'_> {

    fn parse(&self, path: &Path) -> Result<RestorationPlan> {
        let mut tokens = Tokens::read(path)?;
        let mut plan = RestorationPlan::new();
        while !tokens.is_empty() {
            let line = tokens.line();
            let cost = tokens.number::<f64>("an option cost")?;
            if !cost.is_finite() || cost < 0.0 {
                return Err(parse_error(path, line, format!("Invalid option cost {}", cost)));
            }
            let nb_elements = tokens.number::<usize>("a number of elements")?;
            let option = plan.add_option(cost);
            for _ in 0..nb_elements {
                let (line, kind) = tokens.next().map(|(l, k)| (l, k.to_string()))?;
                match kind.as_str() {
                    "n" => {
                        let id = tokens.number::<usize>("a patch id")?;
                        let gain = tokens.number::<f64>("a quality gain")?;
                        let node = self.node(path, line, id)?;
                        if !gain.is_finite() || gain < 0.0 {
                            return Err(parse_error(path, line, format!("Invalid quality gain {}", gain)));
                        }
                        plan.add_patch(option, node, gain);
                    },
                    "a" => {
                        let source = tokens.number::<usize>("a patch id")?;
                        let target = tokens.number::<usize>("a patch id")?;
                        let probability = tokens.number::<f64>("a probability")?;
                        let source = self.node(path, line, source)?;
                        let target = self.node(path, line, target)?;
                        let arc = match self.landscape.find_corridor(source, target) {
                            Some(arc) => arc,
                            None => return Err(parse_error(path, line, format!("Invalid corridor ({},{})", source.0, target.0))),
                        };
                        if !(0.0..=1.0).contains(&probability) {
                            return Err(parse_error(path, line, format!("Probability {} is not in [0, 1]", probability)));
                        }
                        plan.add_corridor(option, arc, probability);
                    },
                    other => return Err(parse_error(path, line, format!("Unknown element type '{}', expected 'n' or 'a'", other))),
                }
            }
        }
        plan.validate(self.landscape)?;
        debug!(options = plan.nb_options(), "restoration plan parsed");
        Ok(plan)
    }
}
