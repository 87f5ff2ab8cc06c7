//! delete - Remove a single object by key

use r2img_core::{Error, ObjectStore};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Debug, Serialize)]
struct DeleteOutput<'a> {
    status: &'static str,
    deleted: &'a str,
}

/// Execute the delete action
pub async fn execute<S>(store: &S, key: &str, formatter: &Formatter) -> ExitCode
where
    S: ObjectStore + ?Sized,
{
    let key = key.trim_start_matches('/');
    if key.is_empty() || key.ends_with('/') {
        formatter.error(&format!(
            "Invalid key '{key}': expected an object key such as images/photo.jpg"
        ));
        return ExitCode::UsageError;
    }

    match store.delete_object(key).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&DeleteOutput {
                    status: "success",
                    deleted: key,
                });
            } else {
                formatter.success(&format!("Deleted: {key}"));
            }
            ExitCode::Success
        }
        Err(Error::NotFound(_)) => {
            formatter.error(&format!("Object not found: {key}"));
            ExitCode::NotFound
        }
        Err(e) => {
            formatter.error(&format!("Failed to delete {key}: {e}"));
            ExitCode::from(&e)
        }
    }
}
