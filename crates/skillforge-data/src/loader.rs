//! Resolution pipeline: reads data files, resolves names, builds the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_catalog`] and [`load_engine_config`].

use crate::schema::*;
use serde::de::DeserializeOwned;
use skillforge_core::catalog::*;
use skillforge_core::config::{ConfigError, EngineConfig};
use skillforge_core::fixed::f64_to_fixed64;
use skillforge_core::id::{ActivityId, ResourceId, SkillId, UpgradeId};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Failures while reading content files into a catalog.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// `resources` or `skills` is missing from the data directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// Neither `.ron`, `.toml` nor `.json`.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in two formats.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// The file exists but does not decode.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A skill, resource or activity name that nothing defines.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// The resolved definitions failed catalog validation.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// The engine config failed validation.
    #[error("invalid engine config in {file}: {source}")]
    Config {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Content file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Format implied by the file extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron`, `.toml` or `.json` inside `dir`.
///
/// Two spellings of the same file (say `skills.ron` and `skills.json`) are
/// ambiguous and rejected.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// [`find_data_file`] for files the catalog cannot do without.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(origin: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize in-memory content. `origin` names the source in errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(origin, e)),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(origin, e)),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(origin, e)),
    }
}

/// Read and decode `path`, picking the decoder from its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list from in-memory content. For TOML, extracts the array at
/// `toml_key` from a top-level table. For RON and JSON, deserializes directly
/// as `Vec<T>`.
pub fn deserialize_list_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    toml_key: &str,
    origin: &Path,
) -> Result<Vec<T>, DataLoadError> {
    match format {
        Format::Ron | Format::Json => deserialize_str(content, format, origin),
        Format::Toml => {
            let table: toml::Value = toml::from_str(content).map_err(|e| parse_error(origin, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(origin, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(origin, e))
        }
    }
}

/// [`deserialize_list_str`] over a file.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_list_str(&content, format, toml_key, path)
}

// ===========================================================================
// Name resolution
// ===========================================================================

fn resolve_skill(name: &str, file: &Path) -> Result<SkillId, DataLoadError> {
    name.parse().map_err(|_| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind: "skill",
    })
}

fn amounts(lines: &[(String, u64)]) -> Vec<ResourceAmount> {
    lines
        .iter()
        .map(|(resource, quantity)| ResourceAmount::new(resource.as_str(), *quantity))
        .collect()
}

fn category(data: CategoryData) -> ItemCategory {
    match data {
        CategoryData::Wood => ItemCategory::Wood,
        CategoryData::Ore => ItemCategory::Ore,
        CategoryData::Fish => ItemCategory::Fish,
        CategoryData::Food => ItemCategory::Food,
        CategoryData::Bar => ItemCategory::Bar,
        CategoryData::Crafted => ItemCategory::Crafted,
        CategoryData::Other => ItemCategory::Other,
    }
}

fn effect(data: EffectData) -> UpgradeEffect {
    match data {
        EffectData::TimeReduction(fraction) => UpgradeEffect::TimeReduction(f64_to_fixed64(fraction)),
        EffectData::ProductionIncrease(units) => UpgradeEffect::ProductionIncrease(units),
    }
}

/// Where each list came from, for error messages.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub resources: &'a Path,
    pub skills: &'a Path,
    pub upgrades: &'a Path,
}

/// Resolve deserialized definitions into a validated [`Catalog`].
pub fn build_catalog(
    resources: Vec<ResourceData>,
    skills: Vec<SkillData>,
    upgrades: Vec<UpgradeData>,
    sources: Sources<'_>,
) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    for r in resources {
        builder.register_resource(ResourceDef {
            id: ResourceId::new(r.id),
            name: r.name,
            description: r.description,
            icon: r.icon,
            gold_value: r.gold_value,
            category: category(r.category),
        });
    }

    for s in skills {
        let id = resolve_skill(&s.id, sources.skills)?;
        let activities = s
            .activities
            .into_iter()
            .map(|a| ActivityDef {
                requirements: amounts(&a.requirements),
                products: amounts(&a.products),
                id: ActivityId::new(a.id),
                name: a.name,
                description: a.description,
                level_required: a.level_required,
                xp_gained: a.xp,
                duration_ms: a.duration_ms,
            })
            .collect();
        builder.register_skill(SkillDef {
            id,
            name: s.name,
            description: s.description,
            icon: s.icon,
            activities,
        });
    }

    for u in upgrades {
        let skill = resolve_skill(&u.skill, sources.upgrades)?;
        builder.register_upgrade(UpgradeDef {
            cost: amounts(&u.cost),
            id: UpgradeId::new(u.id),
            name: u.name,
            description: u.description,
            icon: u.icon,
            skill,
            level_required: u.level_required,
            effect: effect(u.effect),
            applies_to: u.applies_to.into_iter().map(ActivityId::new).collect(),
        });
    }

    let catalog = builder.build()?;
    tracing::info!(
        target: "skillforge::data",
        resources = catalog.resource_count(),
        activities = catalog.activity_count(),
        upgrades = catalog.upgrade_count(),
        "catalog.loaded"
    );
    Ok(catalog)
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// Load `resources`, `skills` and (optionally) `upgrades` from `dir`, in any
/// supported format, and build the catalog.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let resources_path = require_data_file(dir, "resources")?;
    let skills_path = require_data_file(dir, "skills")?;
    let upgrades_path = find_data_file(dir, "upgrades")?;

    let resources: Vec<ResourceData> = deserialize_list(&resources_path, "resources")?;
    let skills: Vec<SkillData> = deserialize_list(&skills_path, "skills")?;
    let upgrades: Vec<UpgradeData> = match &upgrades_path {
        Some(path) => deserialize_list(path, "upgrades")?,
        None => Vec::new(),
    };

    let fallback = dir.join("upgrades");
    build_catalog(
        resources,
        skills,
        upgrades,
        Sources {
            resources: &resources_path,
            skills: &skills_path,
            upgrades: upgrades_path.as_deref().unwrap_or(&fallback),
        },
    )
}

/// Load and validate an [`EngineConfig`]. Missing fields take their defaults.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, DataLoadError> {
    let config: EngineConfig = deserialize_file(path)?;
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
