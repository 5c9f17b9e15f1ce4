use serde::{Deserialize, Serialize};

// ── Compilation options ──────────────────────────────────────────────

/// Backend options, readable from JSON (`{"optimize": true, "registerAllocation": 2}`).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Run constant propagation and folding on the tree before lowering.
    #[serde(default)]
    pub optimize: bool,
    /// Register budget for graph coloring; absent or non-positive disables it.
    #[serde(default)]
    pub register_allocation: Option<i32>,
}

impl CompilerConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The register budget, or 0 when allocation is disabled.
    pub fn register_budget(&self) -> usize {
        self.register_allocation
            .and_then(|k| usize::try_from(k).ok())
            .unwrap_or(0)
    }
}
