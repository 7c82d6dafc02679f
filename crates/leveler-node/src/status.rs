//! Node status flags

use serde::{Deserialize, Serialize};

/// Activation and halt flags of the node
///
/// The loop only runs while `active` is set. `halt_cmd` is an override
/// flag kept for the control surface; the control laws do not consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub active: bool,
    pub halt_cmd: bool,
}

impl NodeStatus {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            halt_cmd: false,
        }
    }

    /// Status flags as (name, value) pairs in a fixed order
    pub fn status_list(&self) -> Vec<(&'static str, bool)> {
        vec![("active", self.active), ("haltCmd", self.halt_cmd)]
    }
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_list_order() {
        let status = NodeStatus {
            active: false,
            halt_cmd: true,
        };

        assert_eq!(status.status_list(), vec![("active", false), ("haltCmd", true)]);
    }
}
