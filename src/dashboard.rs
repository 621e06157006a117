use crate::models::{
    ContactRequest, DensityLevel, MunicipalityCount, MunicipalityDensity, RequestSummary,
};

/// How many recent requests the social-worker dashboard shows.
pub const RECENT_REQUESTS: usize = 5;

impl DensityLevel {
    /// Bucket for a municipality's approved-volunteer count.
    pub fn for_count(count: i64) -> Self {
        match count {
            i64::MIN..=0 => DensityLevel::None,
            1..=2 => DensityLevel::Low,
            3..=5 => DensityLevel::Medium,
            _ => DensityLevel::High,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DensityLevel::None => "#e5e7eb",
            DensityLevel::Low => "#fde68a",
            DensityLevel::Medium => "#f59e0b",
            DensityLevel::High => "#b45309",
        }
    }
}

/// density_map
///
/// Turns raw per-municipality counts into coloured map entries, sorted by name
/// (case-insensitive).
/// Rows for the same municipality (differing only in case or surrounding whitespace)
/// are merged.
pub fn density_map(counts: Vec<MunicipalityCount>) -> Vec<MunicipalityDensity> {
    let mut merged: Vec<MunicipalityCount> = Vec::with_capacity(counts.len());
    for row in counts {
        let name = row.municipality.trim();
        if name.is_empty() {
            continue;
        }
        match merged
            .iter_mut()
            .find(|m| m.municipality.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.volunteer_count += row.volunteer_count,
            None => merged.push(MunicipalityCount {
                municipality: name.to_string(),
                volunteer_count: row.volunteer_count,
            }),
        }
    }

    merged.sort_by_key(|m| m.municipality.to_lowercase());
    merged
        .into_iter()
        .map(|m| {
            let level = DensityLevel::for_count(m.volunteer_count);
            MunicipalityDensity {
                municipality: m.municipality,
                volunteer_count: m.volunteer_count,
                level,
                color: level.color().to_string(),
            }
        })
        .collect()
}

/// Per-status counts over `requests`. Unknown statuses count towards `total` only.
pub fn summarize_requests(requests: &[ContactRequest]) -> RequestSummary {
    requests
        .iter()
        .fold(RequestSummary::default(), |mut summary, request| {
            summary.total += 1;
            match request.status.as_str() {
                "pending" => summary.pending += 1,
                "accepted" => summary.accepted += 1,
                "declined" => summary.declined += 1,
                other => tracing::warn!(status = other, id = %request.id, "unknown request status"),
            }
            summary
        })
}

/// Newest-first slice of at most `limit` requests.
pub fn recent(mut requests: Vec<ContactRequest>, limit: usize) -> Vec<ContactRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests.truncate(limit);
    requests
}

pub fn pending_only(requests: Vec<ContactRequest>) -> Vec<ContactRequest> {
    requests
        .into_iter()
        .filter(|r| r.status == "pending")
        .collect()
}
