use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::database::models::StudyPartner;

const SHARED_COURSE_POINTS: u32 = 10;
const SAME_INSTITUTION_POINTS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct PartnerMatch {
    #[serde(flatten)]
    pub partner: StudyPartner,
    pub score: u32,
    pub shared_courses: Vec<Uuid>,
}

/// Rank other students' listings against `me`.
///
/// Each shared course is worth 10 points and a shared institution 5. Self,
/// listings that are not looking, and zero-score candidates are dropped.
/// Ties go to the newest listing.
pub fn rank_partners(me: &StudyPartner, candidates: Vec<StudyPartner>) -> Vec<PartnerMatch> {
    let mine: HashSet<Uuid> = me.course_ids.iter().copied().collect();

    let mut matches: Vec<PartnerMatch> = candidates
        .into_iter()
        .filter(|c| c.user_id != me.user_id && c.looking)
        .filter_map(|candidate| {
            let mut seen = HashSet::new();
            let shared_courses: Vec<Uuid> = candidate
                .course_ids
                .iter()
                .copied()
                .filter(|id| mine.contains(id) && seen.insert(*id))
                .collect();

            let same_institution = me.institution_id.is_some() && me.institution_id == candidate.institution_id;
            let score = shared_courses.len() as u32 * SHARED_COURSE_POINTS
                + if same_institution { SAME_INSTITUTION_POINTS } else { 0 };

            (score > 0).then(|| PartnerMatch {
                partner: candidate,
                score,
                shared_courses,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.partner.created_at.cmp(&a.partner.created_at))
    });
    matches
}
