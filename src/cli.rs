//! Minimal CLI: config objects → (schema | check)
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use cfgspec::lower::{BoolListCoercion, BuildOptions};
use cfgspec::path_de::from_str_at_pointer;
use cfgspec::schema::{build_many, emit_schema, ConfigSpec};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build typed parameter descriptors from spec strings like `integer(0, 10, default=5)`
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build and print the JSON view of each schema
    Schema(SchemaOut),
    /// build each schema and report which inputs fail
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to the config object in each document (e.g. /steps/resample)
    #[arg(long)]
    json_pointer: Option<String>,

    /// coerce `bool_list` defaults as floats, like older configs expect
    #[arg(long, default_value_t = false)]
    legacy_bool_list: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn build_options(&self) -> BuildOptions {
        let bool_list = if self.legacy_bool_list {
            BoolListCoercion::LegacyFloat
        } else {
            BoolListCoercion::Boolean
        };
        BuildOptions { bool_list }
    }

    fn load(&self) -> Result<Vec<(PathBuf, ConfigSpec)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        source_paths
            .into_iter()
            .map(|source_path| -> Result<(PathBuf, ConfigSpec)> {
                let source = std::fs::read_to_string(&source_path)
                    .with_context(|| format!("failed to read {}", source_path.display()))?;
                let config = from_str_at_pointer::<ConfigSpec>(&source, self.json_pointer.as_deref())
                    .with_context(|| format!("failed to load config object from {}", source_path.display()))?;
                Ok((source_path, config))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                let inputs = target.input_settings.load()?;
                let (paths, configs): (Vec<_>, Vec<_>) = inputs.into_iter().unzip();
                let results = build_many(&configs, &target.input_settings.build_options());

                let mut out = serde_json::Map::new();
                for (path, result) in paths.iter().zip(results) {
                    let schema = result
                        .with_context(|| format!("failed to build schema for {}", path.display()))?;
                    out.insert(path.display().to_string(), emit_schema(&schema));
                }
                let schema_src = serde_json::to_string_pretty(&serde_json::Value::Object(out))?;

                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &schema_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{schema_src}");
                }
                Ok(())
            }
            Command::Check(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                let inputs = target.input_settings.load()?;
                let (paths, configs): (Vec<_>, Vec<_>) = inputs.into_iter().unzip();
                let results = build_many(&configs, &target.input_settings.build_options());

                let mut failed = 0usize;
                for (path, result) in paths.iter().zip(&results) {
                    match result {
                        Ok(schema) => {
                            println!("{} {} ({} parameters)", "ok".green(), path.display(), schema.len());
                        }
                        Err(error) => {
                            failed += 1;
                            println!("{} {}: {error}", "FAILED".red().bold(), path.display());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} config objects failed", results.len());
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
