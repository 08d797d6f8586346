// ABOUTME: Shell-style expansion of template paths written in a spec file.
// ABOUTME: Expands a leading `~` and `$VAR` / `${VAR}` references from the environment.

use std::path::{Path, PathBuf};

/// Expand `~` and environment variables, then anchor relative paths at `base_dir`.
///
/// Unset variables are left as written.
pub fn expand_template_path(raw: &Path, base_dir: Option<&Path>) -> PathBuf {
    let expanded = PathBuf::from(expand(&raw.to_string_lossy()));
    match base_dir {
        Some(dir) if expanded.is_relative() => dir.join(expanded),
        _ => expanded,
    }
}

pub fn expand(raw: &str) -> String {
    let home_expanded = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match std::env::var("HOME") {
            Ok(home) => format!("{home}{rest}"),
            Err(_) => raw.to_string(),
        },
        _ => raw.to_string(),
    };
    expand_vars(&home_expanded)
}

fn expand_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            },
            None => {
                let end = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..end], end)
            }
        };

        let value = if name.is_empty() {
            None
        } else {
            std::env::var(name).ok()
        };
        match value {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}
