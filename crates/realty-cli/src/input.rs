use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Deserialise from `--input <file>` or, failing that, piped stdin.
/// `None` when neither was supplied.
pub fn read_input<T: DeserializeOwned>(path: Option<&str>, what: &str) -> CliResult<Option<T>> {
    let (source, text) = match path {
        Some(path) => {
            let file = resolve_file(path)?;
            let text = fs::read_to_string(&file)
                .map_err(|e| format!("Failed to read '{}': {e}", file.display()))?;
            (file.display().to_string(), text)
        }
        None => match read_piped_stdin()? {
            Some(text) => ("stdin".to_string(), text),
            None => return Ok(None),
        },
    };

    let value = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse {what} from {source}: {e}"))?;
    Ok(Some(value))
}

/// Like [`read_input`], but the input is mandatory.
pub fn require_input<T: DeserializeOwned>(path: Option<&str>, what: &str) -> CliResult<T> {
    read_input(path, what)?
        .ok_or_else(|| format!("--input <file.json> or stdin required for {what}").into())
}

fn resolve_file(path: &str) -> CliResult<PathBuf> {
    let p = PathBuf::from(path);
    let full = if p.is_absolute() {
        p
    } else {
        std::env::current_dir()?.join(p)
    };
    if !full.is_file() {
        return Err(format!("Not a readable file: {}", full.display()).into());
    }
    Ok(full)
}

/// Piped stdin contents; `None` on an interactive terminal or empty pipe.
fn read_piped_stdin() -> CliResult<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}
