//! Coordinator states.

use std::fmt;

/// `Idle → ResolvingPlaylist → Enumerating → Fetching → Assembling → Done`,
/// with `Failed` reachable from any non-terminal state. `Assembling` is
/// skipped when merging is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ResolvingPlaylist,
    Enumerating,
    Fetching,
    Assembling,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (s, Failed) => !s.is_terminal(),
            (Idle, ResolvingPlaylist)
            | (ResolvingPlaylist, Enumerating)
            | (Enumerating, Fetching)
            | (Fetching, Assembling)
            | (Fetching, Done)
            | (Assembling, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::ResolvingPlaylist => "resolving playlist",
            PipelineState::Enumerating => "enumerating segments",
            PipelineState::Fetching => "fetching segments",
            PipelineState::Assembling => "assembling",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}
