use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::common::collections::HashSet;
use crate::layout_engine::{Fraction, LayoutAlgorithm};

const MAX_ALIGNMENT_DEPTH: usize = 32;

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap_or_default().join(".rift-frames") }
pub fn restore_file() -> PathBuf { data_dir().join("layout.ron") }
pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(data_dir)
        .join("rift-frames")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: LayoutSettings,
    #[serde(default)]
    pub tags: TagSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default)]
    pub tabbed_max: bool,
    #[serde(default = "yes")]
    pub gapless_grid: bool,
    #[serde(default)]
    pub default_frame_layout: LayoutAlgorithm,
    /// Nesting limit for splits of one alignment along a leaf-to-root path.
    #[serde(default = "default_max_alignment_depth")]
    pub max_alignment_depth: usize,
    #[serde(default = "default_split_fraction")]
    pub default_split_fraction: f64,
    #[serde(default = "default_resize_step")]
    pub resize_step: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            tabbed_max: false,
            gapless_grid: true,
            default_frame_layout: LayoutAlgorithm::default(),
            max_alignment_depth: default_max_alignment_depth(),
            default_split_fraction: default_split_fraction(),
            resize_step: default_resize_step(),
        }
    }
}

impl LayoutSettings {
    pub fn split_fraction(&self) -> Fraction { Fraction::from_f64(self.default_split_fraction).clamped() }

    pub fn resize_fraction(&self) -> Fraction { Fraction::from_f64(self.resize_step) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.max_alignment_depth == 0 {
            issues.push("max_alignment_depth must be at least 1".to_string());
        }
        if self.max_alignment_depth > MAX_ALIGNMENT_DEPTH {
            issues.push(format!(
                "max_alignment_depth should not exceed {MAX_ALIGNMENT_DEPTH}"
            ));
        }
        if !(0.1..=0.9).contains(&self.default_split_fraction) {
            issues.push(format!(
                "default_split_fraction must be between 0.1 and 0.9, got {}",
                self.default_split_fraction
            ));
        }
        if !(self.resize_step > 0.0 && self.resize_step <= 0.5) {
            issues.push(format!(
                "resize_step must be in (0, 0.5], got {}",
                self.resize_step
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.max_alignment_depth == 0 || self.max_alignment_depth > MAX_ALIGNMENT_DEPTH {
            self.max_alignment_depth = default_max_alignment_depth();
            fixes += 1;
        }
        if !(0.1..=0.9).contains(&self.default_split_fraction) {
            self.default_split_fraction = default_split_fraction();
            fixes += 1;
        }
        if !(self.resize_step > 0.0 && self.resize_step <= 0.5) {
            self.resize_step = default_resize_step();
            fixes += 1;
        }

        fixes
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TagSettings {
    /// Tags created at startup, in order. The first one is focused.
    #[serde(default = "default_tag_names")]
    pub names: Vec<String>,
}

impl Default for TagSettings {
    fn default() -> Self { Self { names: default_tag_names() } }
}

impl TagSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.names.is_empty() {
            issues.push("at least one tag name is required".to_string());
        }
        let mut seen = HashSet::default();
        for (index, name) in self.names.iter().enumerate() {
            if !is_valid_tag_name(name) {
                issues.push(format!("tag name {index} ({name:?}) is empty or contains whitespace"));
            } else if !seen.insert(name.as_str()) {
                issues.push(format!("duplicate tag name {name:?}"));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let before = self.names.len();
        let mut seen = HashSet::default();
        self.names.retain(|name| is_valid_tag_name(name) && seen.insert(name.clone()));
        let mut fixes = before - self.names.len();

        if self.names.is_empty() {
            self.names = default_tag_names();
            fixes += 1;
        }

        fixes
    }
}

pub fn is_valid_tag_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

fn yes() -> bool { true }

fn default_max_alignment_depth() -> usize { 4 }

fn default_split_fraction() -> f64 { 0.5 }

fn default_resize_step() -> f64 { 0.02 }

fn default_tag_names() -> Vec<String> { ["1", "2", "3", "4"].map(String::from).to_vec() }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, falling back to the built-in defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.settings.validate());
        issues.extend(self.tags.validate());
        issues
    }

    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        self.settings.auto_fix_values() + self.tags.auto_fix_values()
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        if config.tags.names.is_empty() {
            bail!("config must name at least one tag");
        }
        Ok(config)
    }
}
