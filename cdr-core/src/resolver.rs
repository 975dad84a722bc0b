//! Resolver - picks the candidate for a dependency under a context
//!
//! Selection rules:
//! 1. Walk the set path (`SetNotFound` on the first missing segment) and
//!    look up the dependency (`DependencyNotFound`).
//! 2. Evaluate every candidate's mask against the effective circumstances;
//!    a candidate without a mask always matches.
//! 3. No match: `NoCandidateFound`. One match: it wins.
//! 4. Several matches: keep those at the highest version. Exactly one left
//!    wins; otherwise `MultipleCandidatesFound`.
//!
//! Resolution reads the registry and the scope and nothing else, so the same
//! inputs always give the same answer.

use serde::Serialize;

use crate::context::{matcher, Scope};
use crate::error::{CDRError, ResolutionError};
use crate::registry::{Candidate, Registry, Version};

/// The outcome of a successful resolution
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub set_path: String,
    pub dependency: String,
    /// Identifier of the winning candidate
    pub identifier: String,
    /// Mask of the winning candidate, if any
    pub mask: Option<String>,
    pub version: Version,
    /// How many candidates matched before the version tie-break
    pub matched: usize,
}

impl Resolution {
    fn new(set_path: &str, dependency: &str, candidate: &Candidate, matched: usize) -> Self {
        Self {
            set_path: set_path.to_string(),
            dependency: dependency.to_string(),
            identifier: candidate.identifier().to_string(),
            mask: candidate.mask_name().map(str::to_string),
            version: candidate.version(),
            matched,
        }
    }
}

/// Read-only view of a registry that answers resolution queries
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r Registry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Resolve `set_path`/`dependency` against the effective circumstances
    pub fn resolve(&self, set_path: &str, dependency: &str, scope: &Scope) -> Result<Resolution, CDRError> {
        let candidates = self.registry.candidates(set_path, dependency)?;

        let mut matched = Vec::new();
        for candidate in candidates {
            if matcher::evaluate_mask(candidate.mask(), scope)? {
                matched.push(candidate);
            }
        }

        match matched.as_slice() {
            [] => Err(ResolutionError::NoCandidateFound {
                set_path: set_path.to_string(),
                dependency: dependency.to_string(),
            }
            .into()),
            [only] => Ok(Resolution::new(set_path, dependency, only, 1)),
            _ => {
                let winner = highest_version(&matched).map_err(|tied| {
                    ResolutionError::MultipleCandidatesFound {
                        set_path: set_path.to_string(),
                        dependency: dependency.to_string(),
                        version: tied.first().map(|c| c.version()).unwrap_or_default(),
                        candidates: tied.iter().map(|c| c.identifier().to_string()).collect(),
                    }
                })?;
                Ok(Resolution::new(set_path, dependency, winner, matched.len()))
            }
        }
    }
}

/// The single candidate at the maximum version, or every candidate tied there
fn highest_version<'a>(matched: &[&'a Candidate]) -> Result<&'a Candidate, Vec<&'a Candidate>> {
    let Some(max) = matched.iter().map(|c| c.version()).max() else {
        return Err(Vec::new());
    };
    let mut top: Vec<&Candidate> = matched.iter().copied().filter(|c| c.version() == max).collect();
    if top.len() == 1 {
        Ok(top.remove(0))
    } else {
        Err(top)
    }
}
