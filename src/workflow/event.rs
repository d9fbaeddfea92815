//! Events that drive a turn

use crate::remote::PreprocessVerdict;

/// Events that trigger turn transitions
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// User submitted text
    Submit { text: String },

    /// Start screening the recorded message
    Dispatch,

    /// Preprocess answered (failures arrive as `PreprocessVerdict::Error`)
    PreprocessComplete { verdict: PreprocessVerdict },

    /// Generate produced text
    GenerateComplete { response: String },

    /// Generate failed or produced nothing
    GenerateFailed { detail: String },
}
