use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{AssignError, Result};
use crate::types::{AffinityGroup, ConflictPair, Employee, EmployeeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Dislike,
    Friend,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Dislike => write!(f, "dislike"),
            ReferenceKind::Friend => write!(f, "friend"),
        }
    }
}

/// A name that matched no employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub employee: EmployeeId,
    pub name: String,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub conflicts: Vec<ConflictPair>,
    pub affinities: Vec<AffinityGroup>,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Resolve every dislike and friend name against the employee list.
///
/// A name shared by several employees resolves to all of them. Names that
/// match nobody are dropped and listed in [`Resolution::unresolved`], unless
/// `strict` is set, in which case the first one is returned as an error.
pub fn resolve(employees: &[Employee], strict: bool) -> Result<Resolution> {
    let mut by_name: HashMap<&str, Vec<EmployeeId>> = HashMap::new();
    for employee in employees {
        by_name.entry(employee.name.as_str()).or_default().push(employee.id);
    }

    let mut resolution = Resolution::default();
    let mut unresolved = |employee: &Employee, name: &str, kind: ReferenceKind| -> Result<()> {
        if strict {
            return Err(AssignError::UnresolvedReference {
                employee: employee.id,
                name: name.to_string(),
            });
        }
        warn!(employee = %employee.name, %name, %kind, "dropping reference to unknown person");
        resolution.unresolved.push(UnresolvedReference {
            employee: employee.id,
            name: name.to_string(),
            kind,
        });
        Ok(())
    };

    let mut conflicts = Vec::new();
    let mut affinities = Vec::new();

    for employee in employees {
        for name in &employee.dislikes {
            match by_name.get(name.as_str()) {
                Some(ids) => {
                    conflicts.extend(ids.iter().map(|&other| ConflictPair(employee.id, other)))
                }
                None => unresolved(employee, name.as_str(), ReferenceKind::Dislike)?,
            }
        }

        let mut companions = Vec::new();
        for name in &employee.friends {
            match by_name.get(name.as_str()) {
                Some(ids) => companions.extend(ids.iter().copied()),
                None => unresolved(employee, name.as_str(), ReferenceKind::Friend)?,
            }
        }
        if !companions.is_empty() {
            affinities.push(AffinityGroup::new(employee.id, companions));
        }
    }

    resolution.conflicts = conflicts;
    resolution.affinities = affinities;

    debug!(
        conflicts = resolution.conflicts.len(),
        affinity_groups = resolution.affinities.len(),
        unresolved = resolution.unresolved.len(),
        "resolved references"
    );

    Ok(resolution)
}
