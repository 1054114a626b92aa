//! Language and runtime table
//!
//! Maps a logical language name (`cpp`, `c`, `python`, `java`, `javascript`,
//! plus aliases) to the `{language, version}` pair the execution backend expects.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Logical source language accepted by the judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    C,
    Python,
    Java,
    Javascript,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Cpp,
        Language::C,
        Language::Python,
        Language::Java,
        Language::Javascript,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Python => "python",
            Language::Java => "java",
            Language::Javascript => "javascript",
        }
    }

    fn from_canonical(name: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|lang| lang.name() == name)
    }

    /// Resolve a user-facing language name or alias
    pub fn resolve(name: &str) -> Option<Language> {
        let key = name.trim().to_lowercase();
        table().get(&key).map(|runtime| runtime.language)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Execution backend runtime for one language
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub language: Language,
    /// Backend language identifier (e.g. "c++")
    pub sandbox_language: String,
    /// Backend runtime version (e.g. "10.2.0")
    pub version: String,
    /// File name the source is uploaded as
    pub file_name: String,
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawRuntimeConfig {
    language: String,
    version: String,
    file_name: String,
    #[serde(default)]
    aliases: Vec<String>,
}

const EMBEDDED_LANGUAGES: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));

/// Global language configurations (canonical names and aliases)
static LANGUAGES: OnceLock<HashMap<String, RuntimeConfig>> = OnceLock::new();

fn parse_languages(content: &str) -> anyhow::Result<HashMap<String, RuntimeConfig>> {
    let raw_configs: HashMap<String, RawRuntimeConfig> =
        toml::from_str(content).context("Invalid language table")?;

    let mut languages = HashMap::new();
    for (name, raw) in raw_configs {
        let language = Language::from_canonical(&name.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Unknown logical language in table: {}", name))?;

        let config = RuntimeConfig {
            language,
            sandbox_language: raw.language,
            version: raw.version,
            file_name: raw.file_name,
        };

        for alias in raw.aliases {
            languages.insert(alias.to_lowercase(), config.clone());
        }
        languages.insert(name.to_lowercase(), config);
    }

    for language in Language::ALL {
        if !languages.contains_key(language.name()) {
            anyhow::bail!("Language table has no runtime for {}", language);
        }
    }

    Ok(languages)
}

fn table() -> &'static HashMap<String, RuntimeConfig> {
    LANGUAGES.get_or_init(|| {
        parse_languages(EMBEDDED_LANGUAGES).unwrap_or_else(|e| {
            error!("Failed to load embedded language table: {:#}", e);
            HashMap::new()
        })
    })
}

/// Validate and install the embedded language table, failing fast on errors
pub fn init_languages() -> anyhow::Result<()> {
    let languages = parse_languages(EMBEDDED_LANGUAGES)?;
    // A concurrent lazy init parsed the same embedded table
    let _ = LANGUAGES.set(languages);
    Ok(())
}

/// Get runtime configuration for a logical language
pub fn get_runtime_config(language: Language) -> Option<RuntimeConfig> {
    table().get(language.name()).cloned()
}

/// Get all accepted language names, aliases included
pub fn get_supported_languages() -> Vec<String> {
    let mut names: Vec<String> = table().keys().cloned().collect();
    names.sort();
    names
}
