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


//! Landscape files. The index file is a CSV with the header `patches_file,links_file` and one
//! row giving the two other files, relative to the folder of the index file:
//!
//! patches_file,links_file
//! aude.patches,aude.links
//!
//! The patches file lists the patches, whose ids must be 0, 1, ... in the order of the file. The
//! weight of a patch is its quality.
//!
//! id,weight,x,y
//! 0,12.5,645000.0,6225000.0
//! 1,3.0,645100.0,6225300.0
//!
//! The links file lists the corridors, with their probability in [0, 1].
//!
//! source_id,target_id,probability
//! 0,1,0.35
//! 1,0,0.35

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::landscape::{Landscape, NodeIndex};
use crate::error::Result;
use crate::parsers::{io_error, parse_error, parse_number, CsvFile, Parser};

#[derive(Debug, Default, Clone, Copy)]
pub struct StdLandscapeParser;

impl StdLandscapeParser {

    fn resolve(index: &Path, file: &str) -> PathBuf {
        let path = PathBuf::from(file);
        if path.is_absolute() {
            path
        } else {
            index.parent().map(|p| p.join(&path)).unwrap_or(path)
        }
    }

    fn read_patches(path: &Path, landscape: &mut Landscape) -> Result<()> {
        let csv = CsvFile::read(path, &["id", "weight", "x", "y"])?;
        for (line, fields) in csv.rows() {
            let id = parse_number::<usize>(path, *line, &fields[0], "a patch id")?;
            let weight = parse_number::<f64>(path, *line, &fields[1], "a patch weight")?;
            let x = parse_number::<f64>(path, *line, &fields[2], "a coordinate")?;
            let y = parse_number::<f64>(path, *line, &fields[3], "a coordinate")?;
            if id != landscape.nb_nodes() {
                return Err(parse_error(path, *line, format!("Expected patch id {} but got {}", landscape.nb_nodes(), id)));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(parse_error(path, *line, format!("Invalid patch weight {}", weight)));
            }
            landscape.add_patch(weight, x, y);
        }
        Ok(())
    }

    fn read_links(path: &Path, landscape: &mut Landscape) -> Result<()> {
        let csv = CsvFile::read(path, &["source_id", "target_id", "probability"])?;
        for (line, fields) in csv.rows() {
            let source = parse_number::<usize>(path, *line, &fields[0], "a patch id")?;
            let target = parse_number::<usize>(path, *line, &fields[1], "a patch id")?;
            let probability = parse_number::<f64>(path, *line, &fields[2], "a probability")?;
            for id in [source, target] {
                if id >= landscape.nb_nodes() {
                    return Err(parse_error(path, *line, format!("Invalid patch id {}", id)));
                }
            }
            if !(0.0..=1.0).contains(&probability) {
                return Err(parse_error(path, *line, format!("Probability {} is not in [0, 1]", probability)));
            }
            landscape.add_corridor(NodeIndex(source), NodeIndex(target), probability);
        }
        Ok(())
    }

    /// Writes the landscape in `<folder>/<name>.index`, `<name>.patches` and `<name>.links`, and
    /// returns the path of the index file. Removed corridors are not written.
    pub fn write(landscape: &Landscape, folder: &Path, name: &str) -> Result<PathBuf> {
        let index_path = folder.join(format!("{}.index", name));
        let patches_name = format!("{}.patches", name);
        let links_name = format!("{}.links", name);

        let mut index = File::create(&index_path).map_err(io_error(&index_path))?;
        writeln!(index, "patches_file,links_file\n{},{}", patches_name, links_name).map_err(io_error(&index_path))?;

        let patches_path = folder.join(&patches_name);
        let mut patches = BufWriter::new(File::create(&patches_path).map_err(io_error(&patches_path))?);
        writeln!(patches, "id,weight,x,y").map_err(io_error(&patches_path))?;
        for node in landscape.nodes() {
            let patch = &landscape[node];
            writeln!(patches, "{},{},{},{}", node.0, patch.quality, patch.x, patch.y).map_err(io_error(&patches_path))?;
        }
        patches.flush().map_err(io_error(&patches_path))?;

        let links_path = folder.join(&links_name);
        let mut links = BufWriter::new(File::create(&links_path).map_err(io_error(&links_path))?);
        writeln!(links, "source_id,target_id,probability").map_err(io_error(&links_path))?;
        for arc in landscape.arcs() {
            writeln!(links, "{},{},{}", landscape.source(arc).0, landscape.target(arc).0, landscape.probability(arc)).map_err(io_error(&links_path))?;
        }
        links.flush().map_err(io_error(&links_path))?;
        Ok(index_path)
    }
}

impl Parser<Landscape> for StdLandscapeParser {

    fn parse(&self, path: &Path) -> Result<Landscape> {
        let index = CsvFile::read(path, &["patches_file", "links_file"])?;
        let (patches_file, links_file) = match index.rows().first() {
            Some((_, fields)) => (Self::resolve(path, &fields[0]), Self::resolve(path, &fields[1])),
            None => return Err(parse_error(path, 2, "Missing the row naming the patches and links files".to_string())),
        };
        let mut landscape = Landscape::new();
        Self::read_patches(&patches_file, &mut landscape)?;
        Self::read_links(&links_file, &mut landscape)?;
        debug!(patches = landscape.nb_nodes(), corridors = landscape.nb_arcs(), "landscape parsed");
        Ok(landscape)
    }
}
