use serde_json::Value;

use crate::{
    error::{FlowError, Result},
    model::Folder,
};

/// Validate a flow-folder creation payload. `parent` is carried only when
/// a non-blank string; otherwise the result has no parent at all.
pub fn sanitize(name: &Value, parent: &Value) -> Result<Folder> {
    let name = name
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FlowError::Structural {
            field: "name",
            message: "Folder name must be a non-empty string".to_string(),
        })?;

    let parent = parent
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(Folder {
        name: name.to_string(),
        parent,
    })
}
