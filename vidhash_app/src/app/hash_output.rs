use std::{
    io::BufWriter,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::Serialize;
use serde_json::json;
use vidhash::{HashOptions, MatchOptions, VideoHash};

use super::OutputFormat;

#[derive(Debug, Clone)]
pub struct HashOutput {
    hashes: Vec<(PathBuf, VideoHash)>,
}

impl HashOutput {
    pub fn new(hashes: Vec<(PathBuf, VideoHash)>) -> Self {
        Self { hashes }
    }

    #[allow(clippy::print_stdout)]
    pub fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Normal => {
                for (path, hash) in &self.hashes {
                    println!("{}", path.display());
                    println!(
                        "    duration: {:.2}s, frames: {}, distinct frames: {}, blank: {}",
                        hash.duration(),
                        hash.len(),
                        hash.hash_set().len(),
                        hash.has_blank_frame()
                    );
                    if !hash.frame_hashes().is_empty() {
                        println!("    {}", hash.frame_hashes().iter().join(" "));
                    }
                    println!();
                }
            }

            OutputFormat::Json => {
                //Struct only exists to be serialized.
                #[derive(Serialize)]
                struct JsonStruct<'a> {
                    path: &'a Path,
                    duration: f64,
                    hash_options: &'a HashOptions,
                    frame_hashes: Vec<String>,
                }

                let output_vec = self
                    .hashes
                    .iter()
                    .map(|(path, hash)| JsonStruct {
                        path,
                        duration: hash.duration(),
                        hash_options: hash.hash_options(),
                        frame_hashes: hash.frame_hashes().iter().map(ToString::to_string).collect(),
                    })
                    .collect::<Vec<_>>();

                let stdout = BufWriter::new(std::io::stdout());
                serde_json::to_writer_pretty(stdout, &json!(output_vec)).unwrap_or_default();
                println!();
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutput {
    path_a: PathBuf,
    path_b: PathBuf,
    policy: MatchOptions,
    is_match: bool,
}

impl MatchOutput {
    pub fn new(path_a: &Path, path_b: &Path, policy: MatchOptions, is_match: bool) -> Self {
        Self {
            path_a: path_a.to_path_buf(),
            path_b: path_b.to_path_buf(),
            policy,
            is_match,
        }
    }

    #[allow(clippy::print_stdout)]
    pub fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Normal => {
                let verdict = if self.is_match { "match" } else { "no match" };
                println!("{verdict}");
            }
            OutputFormat::Json => {
                let stdout = BufWriter::new(std::io::stdout());
                serde_json::to_writer_pretty(stdout, &json!(self)).unwrap_or_default();
                println!();
            }
        }
    }
}
