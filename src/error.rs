use std::path::PathBuf;

use thiserror::Error;

/// Failures while turning a chart document into a playable chart. All of
/// these abort before a session begins; none of them can surface mid-play.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read chart file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed chart document: {0}")]
    Malformed(String),
    #[error("chart document is missing the mandatory '{0}' section")]
    MissingField(&'static str),
    /// The old binary chart layout. Detection is supported so the failure is
    /// reported instead of producing garbage; parsing it is not.
    #[error("legacy binary chart layout is not supported")]
    LegacyBinary,
    #[error("chart archive contains no .mc or .mc.json member")]
    EmptyArchive,
}

/// A rejected tempo checkpoint. The timeline keeps its last valid state.
#[derive(Debug, Error, PartialEq)]
pub enum TempoError {
    #[error("tempo checkpoint rejected: bpm must be positive and finite, got {0}")]
    InvalidBpm(f64),
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The one fatal condition: with no valid checkpoints and no usable base
    /// tempo the beat/time mapping is undefined, so play cannot start.
    #[error("timeline has no valid tempo checkpoints and no usable base tempo")]
    UnusableTimeline,
}

/// Reported by an audio backend; see `audio::FallbackAudio` for the policy
/// of surfacing this once and then continuing silently.
#[derive(Debug, Error)]
#[error("audio backend unavailable: {0}")]
pub struct AudioError(pub String);
