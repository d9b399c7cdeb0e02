use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolves the database location. `db_override` comes from `--db` or
    /// `KCAL_DB`; otherwise the platform data directory is created and used.
    pub fn load(db_override: Option<&Path>) -> Result<Self> {
        if let Some(path) = db_override {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            return Ok(Config {
                db_path: path.to_path_buf(),
            });
        }

        let proj_dirs =
            ProjectDirs::from("", "", "kcal").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("kcal.db"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("food.db");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.db_path, path);
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_override_bare_file_name() {
        let config = Config::load(Some(Path::new("food.db"))).unwrap();
        assert_eq!(config.db_path, PathBuf::from("food.db"));
    }
}
