//! # Zergling Configuration
//!
//! A configuration file lists the zerglings to provision, one entry each,
//! plus optional settings for the overlord itself. Two formats are accepted,
//! chosen by file extension:
//!
//! **INI** (default):
//!
//! ```ini
//! [overlord]
//! name = staging
//! install = make install
//!
//! [DEFAULT]
//! pause = false
//!
//! [web]
//! folder = git+https://git.example.com/web.git#v2.1.0
//! command = ./run.sh
//!
//! [worker]
//! folder = /srv/checkouts/worker
//! pause = yes
//! ```
//!
//! Values in `[DEFAULT]` apply to every entry that does not set them. The
//! `score.init` section and keys outside any section are ignored.
//!
//! **YAML** (`.yaml` / `.yml`):
//!
//! ```yaml
//! overlord:
//!   name: staging
//! zerglings:
//!   web:
//!     folder: git+https://git.example.com/web.git#v2.1.0
//!     pause: false
//! ```
//!
//! Entries keep the order in which they appear in the file, which is the
//! order they are provisioned in.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ini::Ini;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Section holding overlord settings instead of a zergling.
pub const SETTINGS_SECTION: &str = "overlord";

const IGNORED_SECTIONS: &[&str] = &["DEFAULT", "score.init"];

/// One configured zergling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Local directory or `hg+`/`git+`/`git:` URL with optional `#revision`
    pub folder: String,
    /// Provision only, do not run the start command. Defaults to true.
    pub pause: bool,
    /// Shell command that starts the zergling inside its folder
    pub command: Option<String>,
    /// Any other keys, kept for the start procedure
    pub extra: BTreeMap<String, String>,
}

impl Entry {
    pub fn new(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            pause: true,
            command: None,
            extra: BTreeMap::new(),
        }
    }

    fn from_values(name: &str, values: BTreeMap<String, String>) -> Result<Self> {
        let mut values = values;
        let folder = values.remove("folder").ok_or_else(|| Error::ConfigParse {
            message: format!("Zergling '{}' has no folder", name),
            hint: Some(format!("Add 'folder = <path or vcs url>' to [{}]", name)),
        })?;
        let pause = match values.remove("pause") {
            Some(value) => parse_bool(&value).map_err(|_| Error::ConfigParse {
                message: format!("Zergling '{}' has an invalid pause value '{}'", name, value),
                hint: Some("Use true/false, yes/no, on/off or 1/0".to_string()),
            })?,
            None => true,
        };
        let command = values.remove("command").filter(|c| !c.trim().is_empty());
        Ok(Self {
            name: name.to_string(),
            folder: folder.trim().to_string(),
            pause,
            command,
            extra: values,
        })
    }
}

/// Overlord settings that may come from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rootdir: Option<PathBuf>,
    /// Shell command run in a project folder after it is moved to a new revision
    #[serde(default)]
    pub install: Option<String>,
    /// Time limit in seconds for non-interactive VCS commands
    #[serde(default)]
    pub command_timeout: Option<u64>,
}

/// A parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub settings: FileSettings,
    pub entries: Vec<Entry>,
}

/// Parse a boolean the way INI files spell them.
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::ConfigParse {
            message: format!("Not a boolean: '{}'", other),
            hint: None,
        }),
    }
}

/// Load a configuration file, picking the parser by extension.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => parse_yaml(&content),
        _ => parse_ini(&content),
    }
}

pub fn parse_ini(content: &str) -> Result<ConfigFile> {
    let ini = Ini::load_from_str(content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: None,
    })?;

    let defaults: BTreeMap<String, String> = ini
        .section(Some("DEFAULT"))
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let mut config = ConfigFile::default();
    for (section, props) in ini.iter() {
        let Some(section) = section else { continue };
        if IGNORED_SECTIONS.contains(&section) {
            continue;
        }
        let values: BTreeMap<String, String> = props
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if section == SETTINGS_SECTION {
            config.settings = settings_from_values(&values)?;
            continue;
        }

        let mut merged = defaults.clone();
        merged.extend(values);
        config.entries.push(Entry::from_values(section, merged)?);
    }
    Ok(config)
}

fn settings_from_values(values: &BTreeMap<String, String>) -> Result<FileSettings> {
    let command_timeout = match values.get("command_timeout") {
        Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| Error::ConfigParse {
            message: format!("command_timeout must be a number of seconds, got '{}'", raw),
            hint: None,
        })?),
        None => None,
    };
    Ok(FileSettings {
        name: values.get("name").cloned(),
        rootdir: values.get("rootdir").map(PathBuf::from),
        install: values.get("install").cloned(),
        command_timeout,
    })
}

#[derive(Deserialize)]
struct YamlConfig {
    #[serde(default)]
    overlord: FileSettings,
    #[serde(default)]
    zerglings: serde_yaml::Mapping,
}

pub fn parse_yaml(content: &str) -> Result<ConfigFile> {
    let raw: YamlConfig = serde_yaml::from_str(content)?;
    let mut entries = Vec::new();
    for (name, body) in raw.zerglings {
        let name = scalar(&name).ok_or_else(|| Error::ConfigParse {
            message: "Zergling names must be strings".to_string(),
            hint: None,
        })?;
        let serde_yaml::Value::Mapping(body) = body else {
            return Err(Error::ConfigParse {
                message: format!("Zergling '{}' must be a mapping", name),
                hint: Some("e.g. `web: {folder: /srv/web}`".to_string()),
            });
        };
        let mut values = BTreeMap::new();
        for (key, value) in body {
            if let (Some(key), Some(value)) = (scalar(&key), scalar(&value)) {
                values.insert(key, value);
            }
        }
        entries.push(Entry::from_values(&name, values)?);
    }
    Ok(ConfigFile {
        settings: raw.overlord,
        entries,
    })
}

fn scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
