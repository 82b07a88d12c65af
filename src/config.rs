use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::engine::EngineOptions;
use crate::loader::ResourceLocations;

/// Fetch timeout used when neither the rc files nor the CLI set one.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub read_only: bool,
    pub script_url: Option<String>,
    pub style_url: Option<String>,
    pub fetch_timeout_ms: Option<u64>,
    /// Raw `key=value` engine option pairs, in the order they were given.
    pub engine_options: Vec<String>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            read_only: self.read_only || other.read_only,
            script_url: other.script_url.clone().or_else(|| self.script_url.clone()),
            style_url: other.style_url.clone().or_else(|| self.style_url.clone()),
            fetch_timeout_ms: other.fetch_timeout_ms.or(self.fetch_timeout_ms),
            engine_options: self
                .engine_options
                .iter()
                .chain(&other.engine_options)
                .cloned()
                .collect(),
        }
    }

    /// Resource locations with the configured overrides applied.
    pub fn locations(&self) -> ResourceLocations {
        let defaults = ResourceLocations::default();
        ResourceLocations {
            script: self.script_url.clone().unwrap_or(defaults.script),
            style: self.style_url.clone().unwrap_or(defaults.style),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms.unwrap_or(DEFAULT_FETCH_TIMEOUT_MS))
    }

    /// Engine options built from the configured pairs. Later pairs win.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions::from_pairs(&self.engine_options)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("markpad").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("markpad")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("markpad").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("markpad")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markpadrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# markpad defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.read_only {
        lines.push("--read-only".to_string());
    }
    if let Some(url) = &flags.script_url {
        lines.push(format!("--script-url {url}"));
    }
    if let Some(url) = &flags.style_url {
        lines.push(format!("--style-url {url}"));
    }
    if let Some(ms) = flags.fetch_timeout_ms {
        lines.push(format!("--timeout-ms {ms}"));
    }
    for pair in &flags.engine_options {
        lines.push(format!("--engine-option {pair}"));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from a token stream. Unknown tokens are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--script-url" | "--style-url" | "--timeout-ms" | "--engine-option"
        );
        let value = if takes_value {
            inline.map(ToOwned::to_owned).or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        } else {
            None
        };

        match (name, value) {
            ("--watch", _) => flags.watch = true,
            ("--read-only", _) => flags.read_only = true,
            ("--script-url", Some(url)) => flags.script_url = Some(url),
            ("--style-url", Some(url)) => flags.style_url = Some(url),
            ("--timeout-ms", Some(ms)) => {
                if let Ok(ms) = ms.parse() {
                    flags.fetch_timeout_ms = Some(ms);
                }
            }
            ("--engine-option", Some(pair)) => flags.engine_options.push(pair),
            _ => {}
        }
        i += 1;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "markpad",
            "--watch",
            "--read-only",
            "--script-url",
            "https://cdn.test/engine.json",
            "--timeout-ms=2500",
            "--engine-option",
            "status=true",
            "--engine-option=placeholder=Write here",
            "README.md",
        ]));
        assert!(flags.watch);
        assert!(flags.read_only);
        assert_eq!(flags.script_url.as_deref(), Some("https://cdn.test/engine.json"));
        assert_eq!(flags.fetch_timeout_ms, Some(2500));
        assert_eq!(
            flags.engine_options,
            vec!["status=true".to_string(), "placeholder=Write here".to_string()]
        );
    }

    #[test]
    fn test_bad_timeout_is_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--timeout-ms", "soon"]));
        assert_eq!(flags.fetch_timeout_ms, None);
        assert_eq!(flags.fetch_timeout(), Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS));
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            watch: true,
            style_url: Some("https://file.test/a.css".to_string()),
            fetch_timeout_ms: Some(100),
            engine_options: vec!["status=false".to_string()],
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            read_only: true,
            fetch_timeout_ms: Some(200),
            engine_options: vec!["status=true".to_string()],
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.watch);
        assert!(merged.read_only);
        assert_eq!(merged.fetch_timeout_ms, Some(200));
        assert_eq!(merged.locations().style, "https://file.test/a.css");
        assert_eq!(merged.engine_options().get("status"), Some(&json!(true)));
    }

    #[test]
    fn test_locations_default_when_unset() {
        assert_eq!(ConfigFlags::default().locations(), ResourceLocations::default());
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".markpadrc");
        let flags = ConfigFlags {
            watch: true,
            read_only: true,
            script_url: Some("https://cdn.test/engine.json".to_string()),
            style_url: Some("https://cdn.test/engine.css".to_string()),
            fetch_timeout_ms: Some(750),
            engine_options: vec!["status=true".to_string(), "toolbar=false".to_string()],
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }
}
