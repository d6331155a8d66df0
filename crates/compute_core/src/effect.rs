use crate::ComputationPlan;

/// Side effects requested by [`crate::update`], executed by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand the plan to the background runner.
    ComputeBatch(ComputationPlan),
    /// Remove every stored result.
    ClearResults,
}
