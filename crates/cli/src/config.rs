use anyhow::{Context, Result};
use clap::ValueEnum;
use psexport_filter::{FilterKind, NameFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType { Prefix, Suffix, Regex }

impl From<FilterType> for FilterKind {
    fn from(t: FilterType) -> Self {
        match t {
            FilterType::Prefix => FilterKind::Prefix,
            FilterType::Suffix => FilterKind::Suffix,
            FilterType::Regex => FilterKind::Regex,
        }
    }
}

/// Optional YAML defaults; any flag given on the command line wins.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)] pub out: Option<PathBuf>,
    #[serde(default)] pub region: Option<String>,
    #[serde(default)] pub profile: Option<String>,
    #[serde(default)] pub filter_type: Option<FilterType>,
    #[serde(default)] pub pattern: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        serde_yaml::from_slice(&raw).with_context(|| format!("parse config {}", path.display()))
    }
}

/// Everything a run needs, resolved before any network or file operation.
#[derive(Debug)]
pub struct Settings {
    pub out: PathBuf,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub filter: NameFilter,
}

pub struct Overrides {
    pub out: Option<PathBuf>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub filter_type: Option<FilterType>,
    pub pattern: Option<String>,
}

impl Settings {
    pub fn resolve(cli: Overrides, file: FileConfig) -> Result<Self> {
        let kind = cli.filter_type.or(file.filter_type).map(FilterKind::from);
        let pattern = cli.pattern.or(file.pattern);
        let filter = NameFilter::new(kind, pattern)?;
        Ok(Settings {
            out: cli.out.or(file.out).unwrap_or_else(|| PathBuf::from(psexport_output::DEFAULT_OUT_DIR)),
            region: cli.region.or(file.region),
            profile: cli.profile.or(file.profile),
            filter,
        })
    }
}
