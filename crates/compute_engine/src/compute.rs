use std::time::Duration;

use compute_core::ItemAddress;
use engine_logging::engine_info;

use crate::ComputeError;

#[derive(Debug, Clone)]
pub struct ComputeSettings {
    /// Simulated cost of one item.
    pub delay: Duration,
    /// Multiply the delay by the item's 1-based position in its batch.
    pub scale_by_index: bool,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2100),
            scale_by_index: false,
        }
    }
}

/// Produces the result for one address.
///
/// `index` is the position of the address in its batch.
#[async_trait::async_trait]
pub trait Computer: Send + Sync {
    async fn compute(&self, addr: &ItemAddress, index: usize) -> Result<String, ComputeError>;
}

/// Stand-in for an expensive computation: sleeps, then derives the result
/// from the address.
#[derive(Debug, Clone, Default)]
pub struct SimulatedComputer {
    settings: ComputeSettings,
}

impl SimulatedComputer {
    pub fn new(settings: ComputeSettings) -> Self {
        Self { settings }
    }

    pub fn delay_for(&self, index: usize) -> Duration {
        if self.settings.scale_by_index {
            self.settings.delay.saturating_mul(index as u32 + 1)
        } else {
            self.settings.delay
        }
    }
}

pub fn simulated_result(addr: &ItemAddress) -> String {
    format!("COMPUTED#{}_{}", addr.category(), addr.item_name())
}

#[async_trait::async_trait]
impl Computer for SimulatedComputer {
    async fn compute(&self, addr: &ItemAddress, index: usize) -> Result<String, ComputeError> {
        engine_info!("Calculating {}", addr);
        tokio::time::sleep(self.delay_for(index)).await;
        let result = simulated_result(addr);
        engine_info!("Calculated {} --> {}", addr, result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_delay_grows_with_position() {
        let computer = SimulatedComputer::new(ComputeSettings {
            delay: Duration::from_millis(10),
            scale_by_index: true,
        });
        assert_eq!(computer.delay_for(0), Duration::from_millis(10));
        assert_eq!(computer.delay_for(2), Duration::from_millis(30));
    }

    #[test]
    fn result_is_derived_from_address() {
        let addr = ItemAddress::new("cat_a", "item_1");
        assert_eq!(simulated_result(&addr), "COMPUTED#cat_a_item_1");
    }
}
