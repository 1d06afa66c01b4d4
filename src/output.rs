use std::io::{self, Write};

use serde::Serialize;

use crate::domain::{Experiment, PluginInfo};

#[derive(Debug, Clone, Serialize)]
pub struct DataUriResult {
    pub name: String,
    pub format: String,
    pub uri: String,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_experiment(experiment: &Experiment) -> io::Result<()> {
        Self::print_json(experiment)
    }

    pub fn print_data_uri(result: &DataUriResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_plugin(info: &PluginInfo) -> io::Result<()> {
        Self::print_json(info)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
