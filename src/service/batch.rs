use std::path::{Path, PathBuf};

use clipforged_av::{BatchTemplate, ToolKind};
use clipforged_common::paths::is_media_file;
use clipforged_common::OperationResult;
use tracing::{info, warn};

use super::MediaService;

impl MediaService {
    /// Run `template` with ffmpeg once per input, one after another.
    ///
    /// Inputs are file names in the working directory or paths; a directory
    /// expands to the media files directly inside it, in name order. Returns
    /// one envelope per expanded input, in input order, with unusable inputs
    /// reported in place. Once the service's shutdown token is
    /// cancelled, remaining inputs are reported as skipped.
    pub async fn batch(&self, template: &BatchTemplate, inputs: &[String]) -> Vec<OperationResult> {
        // Items run inside the working directory, so relative inputs must not stay relative.
        let entries: Vec<Result<PathBuf, OperationResult>> = inputs
            .iter()
            .flat_map(|input| match self.expand_input(input) {
                Ok(files) => files
                    .into_iter()
                    .map(|p| Ok(std::fs::canonicalize(&p).unwrap_or(p)))
                    .collect(),
                Err(failed) => vec![Err(failed)],
            })
            .collect();

        info!(items = entries.len(), "batch started");
        let mut results = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let file = match entry {
                Ok(file) => file,
                Err(failed) => {
                    results.push(failed.clone());
                    continue;
                }
            };

            if self.shutdown.is_cancelled() {
                warn!(remaining = entries.len() - index, "batch cancelled");
                results.extend(entries[index..].iter().map(|entry| match entry {
                    Ok(skipped) => OperationResult::failed(
                        format!("Skipped {}", skipped.display()),
                        "Batch cancelled",
                    ),
                    Err(failed) => failed.clone(),
                }));
                break;
            }

            let item = template.render(file);
            info!(input = %file.display(), index, "batch item");

            let result = self
                .run_tool(ToolKind::Engine, item.args, item.output.as_deref())
                .await;
            let message = format!("{}: {}", file.display(), result.message);
            results.push(OperationResult { message, ..result });
        }

        results
    }

    fn expand_input(&self, input: &str) -> Result<Vec<PathBuf>, OperationResult> {
        let as_dir = Path::new(input);
        if as_dir.is_dir() {
            return media_files_in(as_dir).map_err(|e| {
                OperationResult::failed(format!("Skipped {input}"), e.to_string())
            });
        }

        self.store
            .resolve(input)
            .map(|path| vec![path])
            .map_err(|e| OperationResult::failed(format!("Skipped {input}"), e.to_string()))
    }
}

fn media_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_media_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_expansion_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mp4", "a.mov", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let files = media_files_in(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.mov", "b.mp4"]);
    }
}
