use crate::model::TodoItem;
use crate::store::ItemStore;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::info;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_DIR: &str = ".todolist";
const DATA_FILE: &str = "items.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataScope {
    Explicit,
    Project,
    Global,
}

impl DataScope {
    pub fn label(&self) -> &'static str {
        match self {
            DataScope::Explicit => "file",
            DataScope::Project => "project",
            DataScope::Global => "global",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataLocation {
    pub path: PathBuf,
    pub scope: DataScope,
}

pub fn init_project_file() -> Result<DataLocation> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .todolist directory")?;
    let location = DataLocation {
        path: dir.join(DATA_FILE),
        scope: DataScope::Project,
    };
    if !location.path.exists() {
        save_items(&location, &ItemStore::new())?;
    }
    Ok(location)
}

/// Resolves where items live: an explicit path wins, then the nearest
/// project file above `start`, then the per-user data directory.
pub fn locate(start: &Path, explicit: Option<&Path>) -> Result<DataLocation> {
    if let Some(path) = explicit {
        return Ok(DataLocation {
            path: path.to_path_buf(),
            scope: DataScope::Explicit,
        });
    }
    if let Some(path) = find_project_file(start) {
        return Ok(DataLocation {
            path,
            scope: DataScope::Project,
        });
    }
    Ok(DataLocation {
        path: global_data_path()?,
        scope: DataScope::Global,
    })
}

/// Loads the items at `location` into a fresh store. A missing file is an
/// empty list.
pub fn load_items(location: &DataLocation) -> Result<ItemStore> {
    if !location.path.exists() {
        info!(
            "event=load status=missing path={}",
            location.path.display()
        );
        return Ok(ItemStore::new());
    }
    let data = fs::read_to_string(&location.path)
        .with_context(|| format!("reading {:?}", location.path))?;
    let items: Vec<TodoItem> = if data.trim().is_empty() {
        Vec::new()
    } else {
        serde_yaml::from_str(&data).context("parsing items file")?
    };
    for item in &items {
        item.validate()
            .with_context(|| format!("invalid item in {:?}", location.path))?;
    }
    info!(
        "event=load status=ok path={} items={}",
        location.path.display(),
        items.len()
    );
    Ok(ItemStore::with_items(items))
}

/// Writes the store back in insertion order.
pub fn save_items(location: &DataLocation, store: &ItemStore) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
    }
    let items: Vec<&TodoItem> = store.items().collect();
    let serialized = serde_yaml::to_string(&items).context("serializing items")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    info!(
        "event=save status=ok path={} items={}",
        location.path.display(),
        items.len()
    );
    Ok(())
}

fn find_project_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(DATA_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_data_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "todolist").context("locating data directory")?;
    Ok(dirs.data_dir().join(DATA_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item(name: &str, details: &str, y: i32, m: u32, d: u32) -> TodoItem {
        TodoItem::new(name, details, NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
    }

    fn explicit(path: PathBuf) -> DataLocation {
        DataLocation {
            path,
            scope: DataScope::Explicit,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = load_items(&explicit(dir.path().join("none.yml"))).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn saved_store_loads_back_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let location = explicit(dir.path().join("nested").join("items.yml"));
        let store = ItemStore::with_items([
            item("Mail birthday card", "Buy a 30th birthday card\nfor John", 2022, 4, 25),
            item("Buy water", "", 2022, 3, 10),
            item("Buy water", "", 2022, 3, 10),
        ]);
        save_items(&location, &store).unwrap();
        let loaded = load_items(&location).unwrap();
        let before: Vec<_> = store.items().cloned().collect();
        let after: Vec<_> = loaded.items().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn deadline_is_stored_as_iso_date() {
        let dir = tempfile::tempdir().unwrap();
        let location = explicit(dir.path().join("items.yml"));
        save_items(&location, &ItemStore::with_items([item("a", "", 2022, 4, 25)])).unwrap();
        let raw = fs::read_to_string(&location.path).unwrap();
        assert!(raw.contains("deadline:"), "{raw}");
        assert!(raw.contains("2022-04-25"), "{raw}");
    }

    #[test]
    fn details_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let location = explicit(dir.path().join("items.yml"));
        fs::write(
            &location.path,
            "- short_description: Buy water\n  deadline: 2022-03-10\n",
        )
        .unwrap();
        let store = load_items(&location).unwrap();
        let first = store.items().next().unwrap();
        assert_eq!(first.details, "");
    }

    #[test]
    fn blank_description_in_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let location = explicit(dir.path().join("items.yml"));
        fs::write(&location.path, "- short_description: ' '\n  deadline: 2022-03-10\n").unwrap();
        assert!(load_items(&location).is_err());
    }

    #[test]
    fn project_file_is_found_from_a_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join(PROJECT_DIR);
        fs::create_dir_all(&project).unwrap();
        fs::write(project.join(DATA_FILE), "[]\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let location = locate(&nested, None).unwrap();
        assert_eq!(location.scope, DataScope::Project);
        assert_eq!(location.path, project.join(DATA_FILE));
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mine.yml");
        let location = locate(dir.path(), Some(&path)).unwrap();
        assert_eq!(location.scope, DataScope::Explicit);
        assert_eq!(location.path, path);
    }
}
