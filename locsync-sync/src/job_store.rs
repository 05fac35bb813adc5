//! Job store: one JSON record per job.
//!
//! Persists each [`Job`] at `<home>/.locsync/jobs/<id>.json`, rewritten on
//! every update with the same atomic `.tmp` + rename pattern as the catalog.

use std::path::{Path, PathBuf};

use chrono::Utc;

use locsync_core::{
    catalog::root_at,
    types::{Job, JobId, JobStatus, UserId},
};

use crate::error::{io_err, SyncError};
use crate::session::JobUpdate;

/// `<home>/.locsync/jobs`
pub fn jobs_dir_at(home: &Path) -> PathBuf {
    root_at(home).join("jobs")
}

/// `<home>/.locsync/jobs/<id>.json`
pub fn job_path_at(home: &Path, id: &JobId) -> PathBuf {
    jobs_dir_at(home).join(format!("{}.json", id.as_str()))
}

/// Create and persist a new `running` job.
pub fn create_at(home: &Path, description: &str, user: &UserId) -> Result<Job, SyncError> {
    let now = Utc::now();
    let job = Job {
        id: JobId::from(uuid::Uuid::new_v4().to_string()),
        description: description.to_string(),
        status: JobStatus::Running,
        user: user.clone(),
        created_at: now,
        updated_at: now,
    };
    save_at(home, &job)?;
    Ok(job)
}

pub fn load_at(home: &Path, id: &JobId) -> Result<Job, SyncError> {
    let path = job_path_at(home, id);
    if !path.exists() {
        return Err(SyncError::NotFound {
            kind: "job",
            id: id.0.clone(),
        });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Apply `update` to the stored record and persist it.
pub fn update_at(home: &Path, id: &JobId, update: JobUpdate) -> Result<Job, SyncError> {
    let mut job = load_at(home, id)?;
    update.apply(&mut job);
    job.updated_at = Utc::now();
    save_at(home, &job)?;
    Ok(job)
}

/// Every stored job, most recently updated first.
pub fn list_at(home: &Path) -> Result<Vec<Job>, SyncError> {
    let dir = jobs_dir_at(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut jobs = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
        let entry = entry.map_err(|e| io_err(&dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        jobs.push(serde_json::from_str::<Job>(&contents)?);
    }
    jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(jobs)
}

/// Save the job record atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, job: &Job) -> Result<(), SyncError> {
    let path = job_path_at(home, &job.id);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid job path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(job)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}
