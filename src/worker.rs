//! Per-file compression: submit, evaluate, fetch, write.

use crate::batch::{InFlight, Operation};
use crate::constants::STAGING_PREFIX;
use crate::digest::digest_file;
use crate::error::{CamlibError, Result};
use crate::service::{ByteStream, CompressionService, ResizeDirective, Savings, ShrinkOutcome};
use futures::StreamExt;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Why a unit ended without writing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The file could not be read for upload.
    Unreadable(String),
    NoResponse(String),
    InvalidResponse,
    QuotaExceeded,
    Unauthorized,
    Remote { status: u16, code: Option<String> },
    /// The result could not be downloaded or written; the original is untouched.
    Download(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Unreadable(reason) => write!(f, "file could not be read ({})", reason),
            Failure::NoResponse(reason) => write!(f, "got no response ({})", reason),
            Failure::InvalidResponse => write!(f, "not a valid JSON response"),
            Failure::QuotaExceeded => write!(f, "your monthly limit has been exceeded"),
            Failure::Unauthorized => write!(f, "your credentials are invalid"),
            Failure::Remote {
                status,
                code: Some(code),
            } => write!(f, "service answered {} ({})", status, code),
            Failure::Remote { status, code: None } => write!(f, "service answered {}", status),
            Failure::Download(reason) => write!(f, "result could not be saved ({})", reason),
        }
    }
}

/// Terminal state of one work unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// New bytes are on disk. `digest` is their fingerprint, taken after the
    /// write completed; `None` when the file could not be re-read.
    Compressed {
        savings: Savings,
        digest: Option<String>,
    },
    /// The service could not make the file any smaller.
    NoBenefit { savings: Savings },
    Failed(Failure),
}

enum UnitState<'a> {
    Submitting,
    AwaitingResponse(ShrinkOutcome),
    Fetching { url: String, savings: Savings },
    /// Holds the download's operation until the bytes are on disk.
    Writing {
        body: ByteStream,
        savings: Savings,
        operation: Operation<'a>,
    },
    Done(UnitOutcome),
}

impl UnitState<'_> {
    fn name(&self) -> &'static str {
        match self {
            UnitState::Submitting => "submitting",
            UnitState::AwaitingResponse(_) => "evaluating response",
            UnitState::Fetching { .. } => "fetching",
            UnitState::Writing { .. } => "writing",
            UnitState::Done(_) => "done",
        }
    }
}

fn evaluate<'a>(outcome: ShrinkOutcome) -> UnitState<'a> {
    match outcome {
        ShrinkOutcome::Success { savings, url } if savings.is_beneficial() => {
            UnitState::Fetching { url, savings }
        }
        ShrinkOutcome::Success { savings, .. } => {
            UnitState::Done(UnitOutcome::NoBenefit { savings })
        }
        ShrinkOutcome::QuotaExceeded => UnitState::Done(UnitOutcome::Failed(Failure::QuotaExceeded)),
        ShrinkOutcome::Unauthorized => UnitState::Done(UnitOutcome::Failed(Failure::Unauthorized)),
        ShrinkOutcome::OtherError { status, code } => {
            UnitState::Done(UnitOutcome::Failed(Failure::Remote { status, code }))
        }
        ShrinkOutcome::Unparsable => UnitState::Done(UnitOutcome::Failed(Failure::InvalidResponse)),
    }
}

/// Streams `body` into a staging file next to `dest`, then moves it over
/// `dest`. Returns once the bytes are flushed and in place.
///
/// A symlinked `dest` is resolved first so the new bytes land in the link's
/// target and the link itself survives.
async fn write_stream(dest: &Path, mut body: ByteStream) -> Result<()> {
    let target = match tokio::fs::canonicalize(dest).await {
        Ok(resolved) => resolved,
        Err(_) => dest.to_path_buf(),
    };
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)?
        .into_temp_path();

    let mut sink = tokio::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(&staging)
        .await?;
    while let Some(chunk) = body.next().await {
        sink.write_all(&chunk?).await?;
    }
    sink.flush().await?;
    sink.sync_all().await?;
    drop(sink);

    if let Ok(metadata) = tokio::fs::metadata(&target).await {
        tokio::fs::set_permissions(&staging, metadata.permissions()).await?;
    }
    staging.persist(&target).map_err(|e| CamlibError::Io(e.error))?;
    Ok(())
}

pub struct CompressionWorker<'a, S: ?Sized> {
    service: &'a S,
    resize: Option<ResizeDirective>,
    in_flight: &'a InFlight,
}

impl<'a, S: CompressionService + ?Sized> CompressionWorker<'a, S> {
    /// Every upload and every download plus write is counted on `in_flight`
    /// while it is outstanding.
    pub fn new(service: &'a S, resize: Option<ResizeDirective>, in_flight: &'a InFlight) -> Self {
        Self {
            service,
            resize,
            in_flight,
        }
    }

    /// Runs one file through the service. Every error is folded into the
    /// returned outcome; nothing here aborts the batch.
    pub async fn process(&self, path: &Path) -> UnitOutcome {
        let mut state = UnitState::Submitting;
        loop {
            crate::verbose!("{:?}: {}", path, state.name());
            state = match state {
                UnitState::Submitting => match self.submit(path).await {
                    Ok(outcome) => UnitState::AwaitingResponse(outcome),
                    Err(CamlibError::Io(e)) => {
                        UnitState::Done(UnitOutcome::Failed(Failure::Unreadable(e.to_string())))
                    }
                    Err(e) => UnitState::Done(UnitOutcome::Failed(Failure::NoResponse(e.to_string()))),
                },
                UnitState::AwaitingResponse(outcome) => evaluate(outcome),
                UnitState::Fetching { url, savings } => {
                    let operation = self.in_flight.begin();
                    match self.service.fetch(&url, self.resize.as_ref()).await {
                        Ok(body) => UnitState::Writing {
                            body,
                            savings,
                            operation,
                        },
                        Err(e) => UnitState::Done(UnitOutcome::Failed(Failure::Download(e.to_string()))),
                    }
                }
                UnitState::Writing {
                    body,
                    savings,
                    operation,
                } => {
                    let next = match write_stream(path, body).await {
                        Ok(()) => {
                            let digest = match digest_file(path) {
                                Ok(digest) => Some(digest),
                                Err(e) => {
                                    crate::warn!("Written {:?} but could not hash it: {}", path, e);
                                    None
                                }
                            };
                            UnitState::Done(UnitOutcome::Compressed { savings, digest })
                        }
                        Err(e) => UnitState::Done(UnitOutcome::Failed(Failure::Download(e.to_string()))),
                    };
                    drop(operation);
                    next
                }
                UnitState::Done(outcome) => return outcome,
            };
        }
    }

    async fn submit(&self, path: &Path) -> Result<ShrinkOutcome> {
        let _operation = self.in_flight.begin();
        self.service.shrink(path).await
    }
}
