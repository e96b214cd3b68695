use crate::error::DirectoryError;
use core_types::{Account, Investor};
use std::fs;
use std::path::{Path, PathBuf};

/// The persisted list of investors, in the order they were added.
#[derive(Debug, Clone)]
pub struct InvestorDirectory {
    path: PathBuf,
    pub(crate) investors: Vec<Investor>,
}

impl InvestorDirectory {
    /// Opens the directory file, creating an empty one if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DirectoryError> {
        let path = path.into();
        let io_error = |source| DirectoryError::Io {
            path: path.clone(),
            source,
        };

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
            fs::write(&path, "[]").map_err(io_error)?;
            tracing::info!(path = %path.display(), "Created empty investor directory.");
        }

        let text = fs::read_to_string(&path).map_err(io_error)?;
        let investors: Vec<Investor> = serde_json::from_str(&text)?;
        tracing::debug!(count = investors.len(), "Investor directory loaded.");

        Ok(Self { path, investors })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn investors(&self) -> &[Investor] {
        &self.investors
    }

    pub fn len(&self) -> usize {
        self.investors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.investors.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Investor> {
        self.investors.iter().find(|i| i.name == name)
    }

    /// Appends an investor. Names are trimmed and must be unique.
    pub fn add(&mut self, mut investor: Investor) -> Result<(), DirectoryError> {
        investor.name = investor.name.trim().to_string();
        if investor.name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }
        if self.get(&investor.name).is_some() {
            return Err(DirectoryError::DuplicateName(investor.name));
        }
        if let Account::Virtual(account) = &investor.account {
            if !(account.balance.is_finite() && account.balance >= 0.0) {
                return Err(DirectoryError::InvalidBalance(account.balance));
            }
        }

        tracing::info!(name = %investor.name, kind = %investor.kind(), "Investor added.");
        self.investors.push(investor);
        Ok(())
    }

    /// Removes the investor with this name and returns the record.
    pub fn remove(&mut self, name: &str) -> Result<Investor, DirectoryError> {
        let index = self
            .investors
            .iter()
            .position(|i| i.name == name)
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;

        let removed = self.investors.remove(index);
        tracing::info!(name = %removed.name, "Investor removed.");
        Ok(removed)
    }

    /// Writes the directory back as pretty-printed JSON via a temp file + rename.
    pub fn save(&self) -> Result<(), DirectoryError> {
        let io_error = |source| DirectoryError::Io {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(&self.investors)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(io_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Credentials;
    use tempfile::TempDir;

    #[test]
    fn open_creates_an_empty_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("investors.json");

        let directory = InvestorDirectory::open(&path).unwrap();

        assert!(directory.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn add_remove_and_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("investors.json");
        let mut directory = InvestorDirectory::open(&path).unwrap();

        directory.add(Investor::new_virtual("  Alice ", 5_000.0)).unwrap();
        directory
            .add(Investor::new_real("Bob", Credentials::new("k", "s")))
            .unwrap();
        directory.add(Investor::new_virtual("Carol", 3_000.0)).unwrap();
        directory.remove("Bob").unwrap();
        directory.save().unwrap();

        let reopened = InvestorDirectory::open(&path).unwrap();
        let names: Vec<&str> = reopened.investors().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Carol"]);
        assert!(!dir.path().join("investors.json.tmp").exists());
    }

    #[test]
    fn rejects_bad_additions() {
        let dir = TempDir::new().unwrap();
        let mut directory = InvestorDirectory::open(dir.path().join("investors.json")).unwrap();
        directory.add(Investor::new_virtual("Alice", 1.0)).unwrap();

        assert!(matches!(
            directory.add(Investor::new_virtual("Alice", 2.0)),
            Err(DirectoryError::DuplicateName(_))
        ));
        assert!(matches!(
            directory.add(Investor::new_virtual("   ", 2.0)),
            Err(DirectoryError::EmptyName)
        ));
        assert!(matches!(
            directory.add(Investor::new_virtual("Dan", -5.0)),
            Err(DirectoryError::InvalidBalance(_))
        ));
        assert!(matches!(directory.remove("Zed"), Err(DirectoryError::NotFound(_))));
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("investors.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(InvestorDirectory::open(&path), Err(DirectoryError::Json(_))));
    }
}
