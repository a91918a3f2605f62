use std::collections::BTreeSet;
use std::path::Path;

use osm_changeset::{extract_tags, parse_changeset_file, read_changeset_records, EditRecord};

use crate::error::Result;
use crate::gateway::PersistenceGateway;

/// Which records of a changeset file are imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Only the last node, way or relation of the file.
    #[default]
    LastRecord,
    /// Every node, way and relation of the file.
    AllRecords,
}

/// Outcome of importing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Imported {
        changeset_id: i32,
        changes: usize,
        tags: usize,
    },
    /// Every changeset in the file was already stored.
    AlreadyImported { changeset_id: i32 },
    /// The file holds no node, way or relation.
    Empty,
}

/// Tally of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub files: usize,
    pub imported: usize,
    pub changes: usize,
    pub tags: usize,
    pub already_imported: usize,
    pub empty: usize,
    /// Files that could not be parsed or stored, with the reason.
    pub failed: Vec<(String, String)>,
}

impl ImportSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Imported { changes, tags, .. } => {
                self.imported += 1;
                self.changes += changes;
                self.tags += tags;
            }
            FileOutcome::AlreadyImported { .. } => self.already_imported += 1,
            FileOutcome::Empty => self.empty += 1,
        }
    }
}

/// Import one changeset file.
///
/// Existence is checked before anything is written; the change rows are then
/// inserted before their tags. The inserts are not wrapped in a transaction.
pub async fn import_file<G>(gateway: &G, path: &Path, mode: ImportMode) -> Result<FileOutcome>
where
    G: PersistenceGateway + Sync,
{
    let records: Vec<EditRecord> = match mode {
        ImportMode::LastRecord => parse_changeset_file(path)?.into_iter().collect(),
        ImportMode::AllRecords => read_changeset_records(path)?,
    };
    import_records(gateway, &records).await
}

/// Store parsed records, skipping changesets that are already present.
pub async fn import_records<G>(gateway: &G, records: &[EditRecord]) -> Result<FileOutcome>
where
    G: PersistenceGateway + Sync,
{
    let Some(first) = records.first() else {
        return Ok(FileOutcome::Empty);
    };

    let changeset_ids: BTreeSet<i32> = records.iter().map(|r| r.changeset_id).collect();
    let mut pending = BTreeSet::new();
    for changeset_id in changeset_ids {
        if gateway.exists(changeset_id).await? {
            tracing::info!(changeset_id, "changeset already imported, skipping");
        } else {
            pending.insert(changeset_id);
        }
    }

    if pending.is_empty() {
        return Ok(FileOutcome::AlreadyImported {
            changeset_id: first.changeset_id,
        });
    }

    let mut changes = 0;
    let mut tags = 0;
    for record in records.iter().filter(|r| pending.contains(&r.changeset_id)) {
        gateway.insert_change(&record.change()).await?;
        changes += 1;
        for tag in extract_tags(record) {
            gateway.insert_tag(&tag).await?;
            tags += 1;
        }
    }

    let changeset_id = pending.first().copied().unwrap_or(first.changeset_id);
    tracing::info!(changeset_id, changes, tags, "imported edits for changeset");

    Ok(FileOutcome::Imported {
        changeset_id,
        changes,
        tags,
    })
}

/// Import every `*.xml` file of `dir` in path order.
///
/// Files that fail to parse or store are recorded in the summary and the run
/// continues; connection-level database errors stop the run.
pub async fn import_directory<G, F>(
    gateway: &G,
    dir: &Path,
    mode: ImportMode,
    mut on_file: F,
) -> Result<ImportSummary>
where
    G: PersistenceGateway + Sync,
    F: FnMut(&Path),
{
    let mut summary = ImportSummary::default();

    for path in osm_changeset::list_changeset_files(dir)? {
        on_file(&path);
        summary.files += 1;
        tracing::debug!(path = %path.display(), "reading changeset file");

        match import_file(gateway, &path, mode).await {
            Ok(outcome) => summary.record(&outcome),
            Err(e) if e.is_connection_level() => return Err(e),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to import file");
                summary
                    .failed
                    .push((path.display().to_string(), e.to_string()));
            }
        }
    }

    Ok(summary)
}
