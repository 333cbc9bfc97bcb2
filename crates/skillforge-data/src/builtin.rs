//! The game content shipped with the crate, embedded at compile time.

use crate::loader::{
    DataLoadError, Format, Sources, build_catalog, deserialize_list_str, deserialize_str,
};
use crate::schema::{ResourceData, SkillData, UpgradeData};
use skillforge_core::catalog::Catalog;
use skillforge_core::config::EngineConfig;
use std::path::Path;

const RESOURCES: &str = include_str!("../data/resources.ron");
const SKILLS: &str = include_str!("../data/skills.ron");
const UPGRADES: &str = include_str!("../data/upgrades.ron");
const ENGINE_CONFIG: &str = include_str!("../data/engine.toml");

const RESOURCES_PATH: &str = "builtin/resources.ron";
const SKILLS_PATH: &str = "builtin/skills.ron";
const UPGRADES_PATH: &str = "builtin/upgrades.ron";
const ENGINE_CONFIG_PATH: &str = "builtin/engine.toml";

/// The built-in catalog: six skills, their activities, every resource and
/// every upgrade.
pub fn builtin_catalog() -> Result<Catalog, DataLoadError> {
    let sources = Sources {
        resources: Path::new(RESOURCES_PATH),
        skills: Path::new(SKILLS_PATH),
        upgrades: Path::new(UPGRADES_PATH),
    };
    let resources: Vec<ResourceData> =
        deserialize_list_str(RESOURCES, Format::Ron, "resources", sources.resources)?;
    let skills: Vec<SkillData> =
        deserialize_list_str(SKILLS, Format::Ron, "skills", sources.skills)?;
    let upgrades: Vec<UpgradeData> =
        deserialize_list_str(UPGRADES, Format::Ron, "upgrades", sources.upgrades)?;
    build_catalog(resources, skills, upgrades, sources)
}

/// The default engine tunables shipped in `engine.toml`.
pub fn builtin_engine_config() -> Result<EngineConfig, DataLoadError> {
    let path = Path::new(ENGINE_CONFIG_PATH);
    let config: EngineConfig = deserialize_str(ENGINE_CONFIG, Format::Toml, path)?;
    config.validate().map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}
