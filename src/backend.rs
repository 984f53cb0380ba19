//! Acceleration backend selection.
//!
//! The backend is chosen once when a pipeline is built and never re-queried,
//! so per-frame behavior only depends on the fixed configuration. What is
//! available comes from the inference capability itself (see
//! [`TrackingCapability::capabilities`](crate::TrackingCapability::capabilities)):
//! only the engine knows which devices it was built for and can open.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Backend an inference capability should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    /// NVIDIA GPU.
    Cuda,
    /// Apple GPU.
    Metal,
    /// Universal fallback, always available.
    Cpu,
}

impl BackendId {
    pub fn is_accelerated(self) -> bool {
        !matches!(self, BackendId::Cpu)
    }

    pub fn name(self) -> &'static str {
        match self {
            BackendId::Cuda => "cuda",
            BackendId::Metal => "metal",
            BackendId::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which backend the caller would like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Most specific accelerated backend available, else CPU.
    #[default]
    Auto,
    Cpu,
    Cuda,
    Metal,
}

/// Accelerators an inference engine can use in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub cuda: bool,
    pub metal: bool,
}

impl Capabilities {
    pub fn cpu_only() -> Self {
        Self::default()
    }

    fn has(&self, backend: BackendId) -> bool {
        match backend {
            BackendId::Cuda => self.cuda,
            BackendId::Metal => self.metal,
            BackendId::Cpu => true,
        }
    }
}

/// Fallback order for [`BackendPreference::Auto`].
const PRECEDENCE: [BackendId; 3] = [BackendId::Cuda, BackendId::Metal, BackendId::Cpu];

/// Pick a backend from the available capabilities.
///
/// Total: CPU always satisfies the contract, so an unavailable explicit
/// preference degrades to CPU instead of failing.
pub fn select_backend(caps: &Capabilities, preference: BackendPreference) -> BackendId {
    let requested = match preference {
        BackendPreference::Auto => {
            let chosen = PRECEDENCE
                .into_iter()
                .find(|b| caps.has(*b))
                .unwrap_or(BackendId::Cpu);
            info!(backend = %chosen, "selected inference backend");
            return chosen;
        }
        BackendPreference::Cpu => BackendId::Cpu,
        BackendPreference::Cuda => BackendId::Cuda,
        BackendPreference::Metal => BackendId::Metal,
    };

    if caps.has(requested) {
        info!(backend = %requested, "selected inference backend");
        requested
    } else {
        warn!(
            requested = %requested,
            "requested backend unavailable, falling back to cpu"
        );
        BackendId::Cpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_cuda() {
        let caps = Capabilities {
            cuda: true,
            metal: true,
        };
        assert_eq!(select_backend(&caps, BackendPreference::Auto), BackendId::Cuda);
    }

    #[test]
    fn test_auto_uses_metal_without_cuda() {
        let caps = Capabilities {
            cuda: false,
            metal: true,
        };
        assert_eq!(select_backend(&caps, BackendPreference::Auto), BackendId::Metal);
    }

    #[test]
    fn test_cpu_fallback() {
        let caps = Capabilities::cpu_only();
        assert_eq!(select_backend(&caps, BackendPreference::Auto), BackendId::Cpu);
        assert_eq!(select_backend(&caps, BackendPreference::Cuda), BackendId::Cpu);
        assert_eq!(select_backend(&caps, BackendPreference::Metal), BackendId::Cpu);
    }

    #[test]
    fn test_explicit_cpu_wins() {
        let caps = Capabilities {
            cuda: true,
            metal: false,
        };
        assert_eq!(select_backend(&caps, BackendPreference::Cpu), BackendId::Cpu);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let caps = Capabilities {
            cuda: false,
            metal: true,
        };
        for preference in [
            BackendPreference::Auto,
            BackendPreference::Cpu,
            BackendPreference::Cuda,
            BackendPreference::Metal,
        ] {
            let first = select_backend(&caps, preference);
            assert_eq!(first, select_backend(&caps, preference));
        }
    }
}
