use std::collections::HashMap;
use anyhow::{bail, Result};

/// Options collected from the command line. Repeated options keep every value
/// in order of appearance.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliOptions {
    values: HashMap<String, Vec<String>>,
    flags: Vec<String>,
}

impl CliOptions {
    /// Last value given for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.last())
            .map(|v| v.as_str())
    }

    /// Every value given for `key`, in order
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.flags.is_empty()
    }
}

fn process_option(
    prefix: &str,
    args: &[String],
    i: usize,
    flag_names: &[&str],
    options: &mut CliOptions,
) -> Result<usize> {
    let arg = &args[i];
    let body = arg.trim_start_matches(prefix);

    if body.is_empty() {
        bail!("Invalid option: {}", arg);
    }

    if let Some((key, value)) = body.split_once('=') {
        if key.is_empty() {
            bail!("Invalid option: {}", arg);
        }
        options
            .values
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        return Ok(i + 1);
    }

    if flag_names.contains(&body) {
        options.flags.push(body.to_string());
        return Ok(i + 1);
    }

    if i + 1 < args.len() && !args[i + 1].starts_with('-') {
        options
            .values
            .entry(body.to_string())
            .or_default()
            .push(args[i + 1].clone());
        Ok(i + 2)
    } else {
        bail!("Option {} requires a value", arg);
    }
}

/// Parse `args` into options. Names listed in `flag_names` take no value.
pub fn parse_args(args: &[String], flag_names: &[&str]) -> Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        if arg == "--" {
            break;
        }

        // "-" is positional (stdin/stdout convention)
        if arg == "-" {
            i += 1;
            continue;
        }

        if arg.starts_with("--") {
            i = process_option("--", args, i, flag_names, &mut options)?;
        } else if arg.starts_with('-') && arg.len() > 1 {
            i = process_option("-", args, i, flag_names, &mut options)?;
        } else {
            i += 1;
        }
    }

    Ok(options)
}
