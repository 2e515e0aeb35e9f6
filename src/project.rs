//! Project Descriptors
//!
//! Every adapter ships a small project descriptor next to its sources. The
//! registry only needs one thing from it: the project name, read once at
//! registration time. The name follows the same syntax as adapter names;
//! other keys are ignored.
//!
//! ```json
//! {"name": "adapterhub_postgres", "version": "1.0.0"}
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{AdapterError, Result};
use crate::identifier::is_valid_identifier;

/// File name of the descriptor inside an include path
pub const PROJECT_FILE: &str = "adapter_project.json";

/// Resolves the project name for an adapter's include path
pub trait ProjectLoader: Send + Sync {
    fn project_name(&self, include_path: &Path) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ProjectDescriptor {
    name: String,
}

/// Reads `adapter_project.json` from the include path
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProjectLoader;

impl ProjectLoader for FsProjectLoader {
    fn project_name(&self, include_path: &Path) -> Result<String> {
        let path = include_path.join(PROJECT_FILE);

        let contents = fs::read_to_string(&path).map_err(|e| {
            AdapterError::config(format!(
                "No loadable project descriptor at {}: {e}",
                path.display()
            ))
        })?;

        let descriptor: ProjectDescriptor = serde_json::from_str(&contents).map_err(|e| {
            AdapterError::config(format!("Invalid project descriptor {}: {e}", path.display()))
        })?;

        if !is_valid_identifier(&descriptor.name) {
            return Err(AdapterError::config(format!(
                "Project descriptor {} has an invalid name {:?}",
                path.display(),
                descriptor.name
            )));
        }

        Ok(descriptor.name)
    }
}
