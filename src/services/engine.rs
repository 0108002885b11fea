//! Status reconciliation engine.
//!
//! Zencoder reports one job through two endpoints: `details` carries the
//! per-track metadata and per-track states, `progress` carries the aggregate
//! job state and completion percentage. The engine fetches both, joins them,
//! and produces a single immutable [`Encode`] snapshot. Both responses are
//! required before any merge; neither side of the join is ever exposed alone.

use std::sync::Arc;

use crate::models::encode::{Encode, Input, InvalidSnapshotError, Output};
use crate::models::state::State;
use crate::services::client::{
    RawCreateResponse, RawDetailsResponse, RawMediaFile, RawProgressResponse, TransportError,
    ZencoderApi,
};
use crate::services::normalize;
use crate::services::state_map::{map_state, UnmappedStateError};

/// Any of these aborts the in-flight operation entirely; the caller's
/// previously-held snapshot is untouched on failure.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("provider call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("state mapping failed: {0}")]
    UnmappedState(#[from] UnmappedStateError),

    #[error("snapshot construction failed: {0}")]
    InvalidSnapshot(#[from] InvalidSnapshotError),
}

/// Orchestrates facade calls and merges their payloads into snapshots.
///
/// Holds nothing but the injected provider client, so it is cheap to clone
/// and safe to use from concurrent callers; every operation is self-contained.
#[derive(Clone)]
pub struct EncodeEngine {
    client: Arc<dyn ZencoderApi>,
}

impl EncodeEngine {
    pub fn new(client: Arc<dyn ZencoderApi>) -> Self {
        Self { client }
    }

    /// Submit a new transcoding job for `source_url`.
    ///
    /// The returned handle wraps a provisional snapshot built from the
    /// creation acknowledgment alone: no technical metadata, zero percent,
    /// empty operations and errors. Details and progress are not fetched
    /// until the first `reload`.
    pub async fn create(&self, source_url: &str) -> Result<EncodeHandle, EncodeError> {
        let raw = self.client.create_job(source_url).await?;
        let snapshot = provisional_snapshot(&raw)?;

        tracing::info!(job_id = %snapshot.id, state = %snapshot.state, "submitted transcoding job");

        Ok(EncodeHandle {
            engine: self.clone(),
            snapshot,
        })
    }

    /// Look up an existing job by its provider-assigned id.
    pub async fn find(&self, job_id: &str) -> Result<EncodeHandle, EncodeError> {
        let snapshot = self.fetch_snapshot(job_id).await?;

        Ok(EncodeHandle {
            engine: self.clone(),
            snapshot,
        })
    }

    /// Fetch details and progress (concurrently; both are required) and merge
    /// them into a fresh snapshot.
    async fn fetch_snapshot(&self, job_id: &str) -> Result<Encode, EncodeError> {
        let (details, progress) = tokio::try_join!(
            self.client.job_details(job_id),
            self.client.job_progress(job_id),
        )?;

        let snapshot = merge_snapshot(job_id, &details, &progress)?;

        tracing::debug!(
            job_id = %snapshot.id,
            state = %snapshot.state,
            percent_complete = snapshot.percent_complete,
            outputs = snapshot.output.len(),
            "merged job snapshot"
        );

        Ok(snapshot)
    }
}

/// Caller-facing wrapper around the latest snapshot of one job.
///
/// Each handle is independently owned; concurrent reloads of the *same*
/// handle are a caller-level race to avoid (single writer per handle).
pub struct EncodeHandle {
    engine: EncodeEngine,
    snapshot: Encode,
}

impl std::fmt::Debug for EncodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeHandle")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl EncodeHandle {
    pub fn id(&self) -> &str {
        &self.snapshot.id
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> &Encode {
        &self.snapshot
    }

    pub fn state(&self) -> State {
        self.snapshot.state
    }

    pub fn current_operations(&self) -> &[String] {
        &self.snapshot.current_operations
    }

    pub fn percent_complete(&self) -> f64 {
        self.snapshot.percent_complete
    }

    pub fn errors(&self) -> &[String] {
        &self.snapshot.errors
    }

    pub fn created_at(&self) -> Option<&str> {
        self.snapshot.created_at.as_deref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.snapshot.updated_at.as_deref()
    }

    pub fn input(&self) -> &Input {
        &self.snapshot.input
    }

    pub fn output(&self) -> &[Output] {
        &self.snapshot.output
    }

    pub fn is_created(&self) -> bool {
        self.snapshot.is_created()
    }

    pub fn is_running(&self) -> bool {
        self.snapshot.is_running()
    }

    pub fn is_completed(&self) -> bool {
        self.snapshot.is_completed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.snapshot.is_cancelled()
    }

    pub fn is_failed(&self) -> bool {
        self.snapshot.is_failed()
    }

    /// Re-derive the snapshot from the provider. On failure the handle keeps
    /// its previous snapshot; no half-merged state is ever observable.
    pub async fn reload(&mut self) -> Result<&Encode, EncodeError> {
        let id = self.snapshot.id.clone();
        let fresh = self.engine.fetch_snapshot(&id).await?;
        self.snapshot = fresh;
        Ok(&self.snapshot)
    }

    /// Ask the provider to cancel the job, then refresh.
    ///
    /// The refreshed snapshot reports whatever state the provider exposes
    /// after the cancel request; it is not forced to `cancelled` locally. If
    /// the provider has not transitioned yet the caller sees the pre-cancel
    /// state and can reload again later.
    pub async fn cancel(&mut self) -> Result<&Encode, EncodeError> {
        self.engine
            .client
            .cancel_job(&self.snapshot.id)
            .await
            .map_err(EncodeError::Transport)?;

        tracing::info!(job_id = %self.snapshot.id, "cancellation requested");

        self.reload().await
    }
}

/// Build the provisional snapshot from a creation acknowledgment.
///
/// The ack carries only identity and the input's initial state. Any outputs
/// it lists are ignored; they appear with their own states on the first
/// reload. The job's aggregate state is taken from the ack input's state,
/// the only state the ack carries.
fn provisional_snapshot(raw: &RawCreateResponse) -> Result<Encode, EncodeError> {
    let id = normalize::text(raw.id.as_ref())
        .ok_or_else(|| InvalidSnapshotError("creation response carries no job id".to_string()))?;

    let raw_input = raw
        .input
        .as_ref()
        .ok_or_else(|| InvalidSnapshotError("creation response carries no input".to_string()))?;

    let input_id = normalize::text(raw_input.id.as_ref())
        .ok_or_else(|| InvalidSnapshotError("creation response carries no input id".to_string()))?;

    let state = map_state(raw_input.state.as_deref().unwrap_or(""))?;

    let input = Input {
        id: input_id,
        url: normalize::blank_to_none(raw_input.url.as_deref()),
        state,
        created_at: None,
        updated_at: None,
        errors: Vec::new(),
        width: None,
        height: None,
        frame_rate: None,
        duration: None,
        file_size: None,
        checksum: None,
        audio_codec: None,
        video_codec: None,
        audio_bitrate: None,
        video_bitrate: None,
    };

    Ok(Encode {
        id,
        state,
        current_operations: Vec::new(),
        percent_complete: 0.0,
        errors: Vec::new(),
        created_at: normalize::blank_to_none(raw.created_at.as_deref()),
        updated_at: normalize::blank_to_none(raw.updated_at.as_deref()),
        input,
        output: Vec::new(),
    })
}

/// Pure merge of a details response and a progress response into one snapshot.
///
/// Track data comes strictly from details, aggregate data strictly from
/// progress; neither side is inferred from the other. Deterministic and
/// idempotent: the same pair of responses always yields the same snapshot.
fn merge_snapshot(
    job_id: &str,
    details: &RawDetailsResponse,
    progress: &RawProgressResponse,
) -> Result<Encode, EncodeError> {
    let job = &details.job;

    let raw_input = job.input_media_file.as_ref().ok_or_else(|| {
        InvalidSnapshotError(format!("job {}: details carry no input media file", job_id))
    })?;
    let input = merge_input(raw_input)?;

    let output = job
        .output_media_files
        .iter()
        .map(merge_output)
        .collect::<Result<Vec<_>, EncodeError>>()?;

    let state = map_state(progress.state.as_deref().unwrap_or(""))?;

    // Progress omits the percentage once a job is finished, and never reports
    // one for jobs that failed or were cancelled before transcoding started.
    let percent_complete = match normalize::float(progress.progress.as_ref()) {
        Some(percent) => percent,
        None if state == State::Completed => 100.0,
        None => 0.0,
    };

    let current_operations = progress
        .outputs
        .iter()
        .filter_map(|o| normalize::blank_to_none(o.current_event.as_deref()))
        .collect();

    Ok(Encode {
        id: normalize::text(job.id.as_ref()).unwrap_or_else(|| job_id.to_string()),
        state,
        current_operations,
        percent_complete,
        errors: progress.errors.clone(),
        created_at: normalize::blank_to_none(progress.created_at.as_deref())
            .or_else(|| normalize::blank_to_none(job.created_at.as_deref())),
        updated_at: normalize::blank_to_none(progress.updated_at.as_deref())
            .or_else(|| normalize::blank_to_none(job.updated_at.as_deref())),
        input,
        output,
    })
}

fn merge_input(file: &RawMediaFile) -> Result<Input, EncodeError> {
    Ok(Input {
        id: normalize::text(file.id.as_ref())
            .ok_or_else(|| InvalidSnapshotError("input media file carries no id".to_string()))?,
        url: normalize::blank_to_none(file.url.as_deref()),
        state: map_state(file.state.as_deref().unwrap_or(""))?,
        created_at: normalize::blank_to_none(file.created_at.as_deref()),
        updated_at: normalize::blank_to_none(file.updated_at.as_deref()),
        errors: normalize::blank_to_none(file.error_message.as_deref())
            .into_iter()
            .collect(),
        width: normalize::integer(file.width.as_ref()),
        height: normalize::integer(file.height.as_ref()),
        frame_rate: normalize::float(file.frame_rate.as_ref()),
        duration: normalize::integer(file.duration_in_ms.as_ref()),
        file_size: normalize::integer(file.file_size_bytes.as_ref()),
        checksum: normalize::text(file.md5_checksum.as_ref()),
        audio_codec: normalize::text(file.audio_codec.as_ref()),
        video_codec: normalize::text(file.video_codec.as_ref()),
        audio_bitrate: normalize::integer(file.audio_bitrate_in_kbps.as_ref()),
        video_bitrate: normalize::integer(file.video_bitrate_in_kbps.as_ref()),
    })
}

fn merge_output(file: &RawMediaFile) -> Result<Output, EncodeError> {
    Ok(Output {
        id: normalize::text(file.id.as_ref())
            .ok_or_else(|| InvalidSnapshotError("output media file carries no id".to_string()))?,
        url: normalize::blank_to_none(file.url.as_deref()),
        label: normalize::blank_to_none(file.label.as_deref()),
        state: map_state(file.state.as_deref().unwrap_or(""))?,
        created_at: normalize::blank_to_none(file.created_at.as_deref()),
        updated_at: normalize::blank_to_none(file.updated_at.as_deref()),
        errors: normalize::blank_to_none(file.error_message.as_deref())
            .into_iter()
            .collect(),
        width: normalize::integer(file.width.as_ref()),
        height: normalize::integer(file.height.as_ref()),
        frame_rate: normalize::float(file.frame_rate.as_ref()),
        duration: normalize::integer(file.duration_in_ms.as_ref()),
        file_size: normalize::integer(file.file_size_bytes.as_ref()),
        checksum: normalize::text(file.md5_checksum.as_ref()),
        audio_codec: normalize::text(file.audio_codec.as_ref()),
        video_codec: normalize::text(file.video_codec.as_ref()),
        audio_bitrate: normalize::integer(file.audio_bitrate_in_kbps.as_ref()),
        video_bitrate: normalize::integer(file.video_bitrate_in_kbps.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(body: serde_json::Value) -> RawDetailsResponse {
        serde_json::from_value(body).unwrap()
    }

    fn progress(body: serde_json::Value) -> RawProgressResponse {
        serde_json::from_value(body).unwrap()
    }

    fn running_details() -> RawDetailsResponse {
        details(json!({
            "job": {
                "id": 166019107,
                "created_at": "2015-06-09T16:18:26Z",
                "updated_at": "2015-06-09T16:18:28Z",
                "state": "processing",
                "input_media_file": {
                    "id": 165990056,
                    "url": "https://archive.org/download/LuckyStr1948_2/LuckyStr1948_2_512kb.mp4",
                    "state": "finished",
                    "width": 320,
                    "height": 240,
                    "frame_rate": 29.97,
                    "duration_in_ms": 57992,
                    "audio_codec": "aac",
                    "video_codec": "h264",
                    "audio_bitrate_in_kbps": 52,
                    "video_bitrate_in_kbps": 535,
                    "created_at": "2015-06-09T16:18:26Z",
                    "updated_at": "2015-06-09T16:18:32Z"
                },
                "output_media_files": [{
                    "id": 510582971,
                    "url": "https://example.com/out.mp4",
                    "state": "processing"
                }]
            }
        }))
    }

    #[test]
    fn test_merge_is_deterministic() {
        let d = running_details();
        let p = progress(json!({ "state": "processing", "progress": 30.0 }));
        let a = merge_snapshot("166019107", &d, &p).unwrap();
        let b = merge_snapshot("166019107", &d, &p).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_job_and_track_states_come_from_their_own_sources() {
        let d = running_details();
        let p = progress(json!({ "state": "processing", "progress": 30.0 }));
        let snapshot = merge_snapshot("166019107", &d, &p).unwrap();

        // Input track already finished while the job as a whole still runs.
        assert_eq!(snapshot.state, State::Running);
        assert_eq!(snapshot.input.state, State::Completed);
        assert_eq!(snapshot.output[0].state, State::Running);
        assert_eq!(snapshot.percent_complete, 30.0);
    }

    #[test]
    fn test_percent_defaults_to_100_for_completed_jobs() {
        let d = running_details();
        let p = progress(json!({ "state": "finished" }));
        let snapshot = merge_snapshot("166019107", &d, &p).unwrap();
        assert_eq!(snapshot.percent_complete, 100.0);
    }

    #[test]
    fn test_percent_defaults_to_0_otherwise() {
        let d = running_details();
        let p = progress(json!({ "state": "cancelled" }));
        let snapshot = merge_snapshot("166019107", &d, &p).unwrap();
        assert_eq!(snapshot.percent_complete, 0.0);
    }

    #[test]
    fn test_missing_input_media_file_is_invalid() {
        let d = details(json!({ "job": { "id": 1, "output_media_files": [] } }));
        let p = progress(json!({ "state": "processing" }));
        let err = merge_snapshot("1", &d, &p).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidSnapshot(_)));
    }

    #[test]
    fn test_unknown_progress_state_is_unmapped() {
        let d = running_details();
        let p = progress(json!({ "state": "transmogrifying" }));
        let err = merge_snapshot("166019107", &d, &p).unwrap_err();
        assert!(matches!(err, EncodeError::UnmappedState(_)));
    }

    #[test]
    fn test_current_operations_skip_blank_events() {
        let d = running_details();
        let p = progress(json!({
            "state": "processing",
            "progress": 12.5,
            "outputs": [
                { "current_event": "Transcoding" },
                { "current_event": null },
                { "current_event": "" }
            ]
        }));
        let snapshot = merge_snapshot("166019107", &d, &p).unwrap();
        assert_eq!(snapshot.current_operations, vec!["Transcoding".to_string()]);
    }

    #[test]
    fn test_provisional_snapshot_from_creation_ack() {
        let raw: RawCreateResponse = serde_json::from_value(json!({
            "id": 511404522,
            "input": {
                "id": 166179248,
                "url": "https://archive.org/download/LuckyStr1948_2/LuckyStr1948_2_512kb.mp4",
                "state": "running"
            }
        }))
        .unwrap();

        let snapshot = provisional_snapshot(&raw).unwrap();
        assert_eq!(snapshot.id, "511404522");
        assert_eq!(snapshot.state, State::Running);
        assert_eq!(snapshot.percent_complete, 0.0);
        assert!(snapshot.current_operations.is_empty());
        assert!(snapshot.errors.is_empty());
        assert!(snapshot.output.is_empty());
        assert_eq!(snapshot.input.id, "166179248");
        assert_eq!(snapshot.input.width, None);
        assert_eq!(snapshot.input.frame_rate, None);
    }

    #[test]
    fn test_provisional_snapshot_requires_an_input() {
        let raw: RawCreateResponse =
            serde_json::from_value(json!({ "id": 511404522 })).unwrap();
        let err = provisional_snapshot(&raw).unwrap_err();
        assert!(matches!(err, EncodeError::InvalidSnapshot(_)));
    }
}
