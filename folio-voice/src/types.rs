/// Events from one recognition session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Best guess so far for the current utterance
    Interim(String),
    /// Settled transcript of the utterance
    Final(String),
    Error(String),
    /// The session is over (stopped, finished or failed)
    End,
}

/// Events from one utterance being spoken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    Started,
    Ended,
    Error(String),
}
