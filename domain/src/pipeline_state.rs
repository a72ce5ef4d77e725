use std::fmt;

/// Stage of a query run that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Expanding,
    Retrieving,
    PostProcessing,
    Synthesizing,
    Streaming,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Expanding => "expanding",
            Stage::Retrieving => "retrieving",
            Stage::PostProcessing => "post-processing",
            Stage::Synthesizing => "synthesizing",
            Stage::Streaming => "streaming",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Expanding,
    Retrieving,
    PostProcessing,
    Synthesizing,
    Streaming,
    Done,
    Failed { stage: Stage },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    /// The next state on success. Terminal states have none.
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Expanding),
            PipelineState::Expanding => Some(PipelineState::Retrieving),
            PipelineState::Retrieving => Some(PipelineState::PostProcessing),
            PipelineState::PostProcessing => Some(PipelineState::Synthesizing),
            PipelineState::Synthesizing => Some(PipelineState::Streaming),
            PipelineState::Streaming => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed { .. } => None,
        }
    }

    /// The stage this state runs, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Expanding => Some(Stage::Expanding),
            PipelineState::Retrieving => Some(Stage::Retrieving),
            PipelineState::PostProcessing => Some(Stage::PostProcessing),
            PipelineState::Synthesizing => Some(Stage::Synthesizing),
            PipelineState::Streaming => Some(Stage::Streaming),
            PipelineState::Idle | PipelineState::Done | PipelineState::Failed { .. } => None,
        }
    }
}
