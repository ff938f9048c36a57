use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{AnnotateError, Result};

use super::config::{AnnotateConfig, AnnotateConfigBuilder, CONFIG_KEYS};

/// Section consulted when the requested one is missing from the file.
pub const FALLBACK_SECTION: &str = "DEFAULT";

/// Reads `section` of a TOML configuration file on top of the defaults.
///
/// A missing file yields the defaults when `notfound_ok` is set. A missing
/// section falls back to `[DEFAULT]`, then to the defaults. Keys that are
/// not configuration options are rejected.
pub fn load_config_file(path: &Path, section: &str, notfound_ok: bool) -> Result<AnnotateConfig> {
    if !path.is_file() {
        if notfound_ok {
            debug!(path = %path.display(), "configuration file not found, using defaults");
            return AnnotateConfig::builder().build();
        }
        return Err(AnnotateError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("configuration file {} not found", path.display()),
        )));
    }

    let text = fs::read_to_string(path)?;
    let mut document: toml::Table = toml::from_str(&text)?;

    let table = match document.remove(section) {
        Some(toml::Value::Table(table)) => table,
        Some(_) => {
            return Err(AnnotateError::Config(format!(
                "[{section}] in {} is not a section",
                path.display()
            )))
        }
        None => match document.remove(FALLBACK_SECTION) {
            Some(toml::Value::Table(table)) => {
                info!(section, "section not found, using [{FALLBACK_SECTION}]");
                table
            }
            _ => toml::Table::new(),
        },
    };

    if let Some(key) = table.keys().find(|k| !CONFIG_KEYS.contains(&k.as_str())) {
        return Err(AnnotateError::UnknownConfigKey(key.clone()));
    }

    let config: AnnotateConfig = toml::Value::Table(table).try_into()?;
    AnnotateConfigBuilder::from_config(config).build()
}

/// Writes `config` as `[section]`. An existing file is only replaced when
/// `overwrite` is set; other sections of that file are kept.
pub fn save_config_file(
    config: &AnnotateConfig,
    path: &Path,
    section: &str,
    overwrite: bool,
) -> Result<()> {
    let mut document = if path.is_file() {
        if !overwrite {
            return Err(AnnotateError::IoError(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            )));
        }
        toml::from_str::<toml::Table>(&fs::read_to_string(path)?)?
    } else {
        toml::Table::new()
    };

    document.insert(section.to_string(), toml::Value::try_from(config)?);
    fs::write(path, toml::to_string_pretty(&document)?)?;
    info!(path = %path.display(), section, "configuration saved");
    Ok(())
}

pub fn write_default_config_file(path: &Path, section: &str) -> Result<()> {
    save_config_file(&AnnotateConfig::default(), path, section, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults_when_allowed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_config_file(&path, "annotation", true).unwrap();
        assert_eq!(config, AnnotateConfig::default());

        assert!(matches!(
            load_config_file(&path, "annotation", false),
            Err(AnnotateError::IoError(_))
        ));
    }

    #[test]
    fn saved_defaults_load_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        write_default_config_file(&path, "annotation").unwrap();
        let config = load_config_file(&path, "annotation", false).unwrap();
        assert_eq!(config, AnnotateConfig::default());

        // second write must not clobber the file
        assert!(write_default_config_file(&path, "annotation").is_err());
    }

    #[test]
    fn blank_optionals_survive_a_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let config = AnnotateConfig::builder()
            .n(None)
            .set("vmax", "")
            .unwrap()
            .build()
            .unwrap();

        save_config_file(&config, &path, "annotation", false).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("n = \"\""), "{text}");

        let loaded = load_config_file(&path, "annotation", false).unwrap();
        assert_eq!(loaded.n, None);
        assert_eq!(loaded.vmax, None);
        assert_eq!(loaded, config);
    }

    #[test]
    fn section_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[DEFAULT]\nn = 3\nlabels = [\"x\", \"y\"]\n").unwrap();

        let config = load_config_file(&path, "annotation", false).unwrap();
        assert_eq!(config.n, Some(3));
        assert_eq!(config.labels, vec!["x", "y"]);
        assert_eq!(config.col_img, "img");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[annotation]\nn = 3\nthreshold = 0.5\n").unwrap();

        let err = load_config_file(&path, "annotation", false).unwrap_err();
        assert!(matches!(err, AnnotateError::UnknownConfigKey(k) if k == "threshold"));
    }

    #[test]
    fn custom_colormaps_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[annotation]\ncmap = \"traffic\"\n\n[[annotation.custom_cmaps]]\nname = \"traffic\"\ncolors = [\"#00ff00\", \"#ffff00\", \"#ff0000\"]\n",
        )
        .unwrap();

        let config = load_config_file(&path, "annotation", false).unwrap();
        assert_eq!(config.cmap.as_deref(), Some("traffic"));
        assert_eq!(config.custom_cmaps.len(), 1);
        assert_eq!(config.custom_cmaps[0].colors.len(), 3);
    }

    #[test]
    fn other_sections_are_kept_on_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[other]\nkey = 1\n").unwrap();

        save_config_file(&AnnotateConfig::default(), &path, "annotation", true).unwrap();
        let document: toml::Table = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(document.contains_key("other"));
        assert!(document.contains_key("annotation"));
    }
}
