//! Matching domain - deciding whether two images share a person

use std::collections::HashSet;

use crate::domain::face::{FaceHandle, IdentificationCandidate, PersonId};

/// Faces and identified people for both images of a match request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub faces1: Vec<FaceHandle>,
    pub faces2: Vec<FaceHandle>,
    pub people1: HashSet<PersonId>,
    pub people2: HashSet<PersonId>,
}

impl MatchReport {
    /// Report for a request where identification was skipped
    pub fn without_identification(faces1: Vec<FaceHandle>, faces2: Vec<FaceHandle>) -> Self {
        Self {
            faces1,
            faces2,
            ..Default::default()
        }
    }

    /// Partition identification results by the image each face came from
    pub fn from_candidates(
        faces1: Vec<FaceHandle>,
        faces2: Vec<FaceHandle>,
        results: &[IdentificationCandidate],
    ) -> Self {
        let people1 = people_for(&faces1, results);
        let people2 = people_for(&faces2, results);

        Self {
            faces1,
            faces2,
            people1,
            people2,
        }
    }

    /// People identified in both images, sorted for stable output
    pub fn shared_people(&self) -> Vec<&PersonId> {
        let mut shared: Vec<&PersonId> = self.people1.intersection(&self.people2).collect();
        shared.sort();
        shared
    }

    pub fn is_match(&self) -> bool {
        !self.people1.is_disjoint(&self.people2)
    }
}

fn people_for(faces: &[FaceHandle], results: &[IdentificationCandidate]) -> HashSet<PersonId> {
    let faces: HashSet<&FaceHandle> = faces.iter().collect();

    results
        .iter()
        .filter(|result| faces.contains(&result.face_id))
        .flat_map(|result| result.person_ids().cloned())
        .collect()
}
