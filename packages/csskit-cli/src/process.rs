//! File processing
//!
//! Every input is parsed and printed on its own rayon task. Trees are not
//! `Send`, so tasks only share plain settings and return plain strings.

use crate::args::{Cli, MapMode};
use anyhow::{bail, Context, Result};
use csskit::{Annotation, MapOptions, MapSetting, PrevMap, ProcessOptions};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by all inputs
#[derive(Debug, Clone)]
pub struct Settings {
    /// Parsed `--config` file
    pub config: Option<serde_json::Value>,
    pub map: Option<MapMode>,
    pub annotation: bool,
    pub sources_content: bool,
    pub prev_map: Option<PathBuf>,
    pub ignore_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            config: None,
            map: None,
            annotation: true,
            sources_content: true,
            prev_map: None,
            ignore_errors: false,
        }
    }
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        if cli.map == Some(MapMode::File) && cli.output.is_none() {
            bail!("--map file needs --output");
        }
        let config = match &cli.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?;
                Some(value)
            }
            None => None,
        };
        Ok(Settings {
            config,
            map: cli.map,
            annotation: !cli.no_annotation,
            sources_content: !cli.no_sources_content,
            prev_map: cli.prev_map.clone(),
            ignore_errors: cli.ignore_errors,
        })
    }

    /// Options for one input. Command line flags win over the config file.
    pub fn options(&self, input: &Path, output: Option<&Path>) -> Result<ProcessOptions> {
        let mut options: ProcessOptions = match &self.config {
            Some(config) => serde_json::from_value(config.clone()).context("Invalid config")?,
            None => ProcessOptions::default(),
        };
        options.from = Some(input.to_string_lossy().into_owned());
        if let Some(output) = output {
            options.to = Some(output.to_string_lossy().into_owned());
        }
        options.ignore_errors |= self.ignore_errors;

        match self.map {
            Some(MapMode::None) => {
                options.map = MapSetting::Disabled;
                return Ok(options);
            }
            Some(mode) => {
                let mut map_options = options.map_options().cloned().unwrap_or_default();
                map_options.inline = Some(mode == MapMode::Inline);
                options.map = MapSetting::Enabled(map_options);
            }
            None => {}
        }

        let tweaked = !self.annotation || !self.sources_content || self.prev_map.is_some();
        if tweaked && matches!(options.map, MapSetting::Auto) {
            options.map = MapSetting::Enabled(MapOptions::default());
        }
        if let MapSetting::Enabled(map_options) = &mut options.map {
            if !self.annotation {
                map_options.annotation = Some(Annotation::Enabled(false));
            }
            if !self.sources_content {
                map_options.sources_content = Some(false);
            }
            if let Some(path) = &self.prev_map {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read source map {}", path.display()))?;
                map_options.prev = Some(PrevMap::Text(text));
            }
        }
        Ok(options)
    }
}

/// Printed output of one input
#[derive(Debug)]
pub struct Processed {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub css: String,
    /// Map JSON when the map is not inlined
    pub map: Option<String>,
    pub warnings: Vec<String>,
}

impl Processed {
    pub fn map_path(&self) -> Option<PathBuf> {
        self.output
            .as_ref()
            .map(|output| PathBuf::from(format!("{}.map", output.display())))
    }

    /// Write the CSS and its map. Without an output path nothing is written.
    pub fn write(&self) -> Result<()> {
        let Some(output) = &self.output else {
            if self.map.is_some() {
                tracing::warn!(file = %self.input.display(), "source map dropped, no output path");
            }
            return Ok(());
        };
        if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(output, &self.css)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        if let (Some(map), Some(map_path)) = (&self.map, self.map_path()) {
            fs::write(&map_path, map)
                .with_context(|| format!("Failed to write {}", map_path.display()))?;
        }
        tracing::debug!(file = %output.display(), "written");
        Ok(())
    }
}

pub fn process_file(settings: &Settings, input: &Path, output: Option<&Path>) -> Result<Processed> {
    let css = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let options = settings.options(input, output)?;
    let root = csskit::parse(&css, &options)?;
    let result = root.to_result(&options)?;
    let map = result.map.as_ref().map(|map| map.to_json()).transpose()?;

    Ok(Processed {
        input: input.to_path_buf(),
        output: output.map(Path::to_path_buf),
        css: result.css.clone(),
        map,
        warnings: result.warnings().iter().map(ToString::to_string).collect(),
    })
}

/// Expand glob patterns. A pattern without matches is an error.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        let before = inputs.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern {}", pattern))? {
            inputs.push(entry?);
        }
        if inputs.len() == before {
            bail!("No input matches {}", pattern);
        }
    }
    Ok(inputs)
}

/// Output path of `input`. With several inputs `output` is a directory.
pub fn output_path(output: Option<&Path>, input: &Path, several: bool) -> Option<PathBuf> {
    let output = output?;
    if several || output.is_dir() {
        let name = input.file_name()?;
        Some(output.join(name))
    } else {
        Some(output.to_path_buf())
    }
}

/// Process every input. Returns `false` when any of them failed.
pub fn run(cli: &Cli) -> Result<bool> {
    let settings = Settings::from_cli(cli)?;
    let inputs = expand_inputs(&cli.inputs)?;
    let several = inputs.len() > 1;
    tracing::debug!(inputs = inputs.len(), "processing");

    let results: Vec<Result<Processed>> = inputs
        .par_iter()
        .map(|input| {
            let output = output_path(cli.output.as_deref(), input, several);
            let processed = process_file(&settings, input, output.as_deref())?;
            processed.write()?;
            Ok(processed)
        })
        .collect();

    let mut success = true;
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(processed) => {
                for warning in &processed.warnings {
                    tracing::warn!(file = %input.display(), "{}", warning);
                }
                if processed.output.is_none() {
                    print!("{}", processed.css);
                }
            }
            Err(error) => {
                success = false;
                tracing::warn!(file = %input.display(), "failed to process");
                eprintln!("{:#}", error);
            }
        }
    }
    Ok(success)
}
