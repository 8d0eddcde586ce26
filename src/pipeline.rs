use tracing::{debug, warn};

use crate::fetch::{self, FetchError, ProfileSource};
use crate::models::{ProfileSummary, RawProfile};
use crate::session::Session;
use crate::{skills, timeline, xp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Runs the three aggregators over one fetched profile.
pub fn summarize(profile: &RawProfile) -> ProfileSummary {
    let total_xp_kb = xp::total_xp_kb(&profile.xps);
    let xp_over_time = timeline::bar_chart(timeline::bucket_by_day(&profile.transactions));
    let skills = skills::skill_shares(&profile.transactions);
    debug!(
        total_xp_kb,
        days = xp_over_time.buckets.len(),
        "summarized profile"
    );

    ProfileSummary {
        id: profile.id,
        login: profile.login.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        audit_count: profile.audits.len(),
        group_count: profile.groups.len(),
        audit_ratio: profile.audit_ratio,
        total_xp_kb,
        xp_over_time,
        skills,
    }
}

/// Fetches and summarizes the signed-in user's profile. On failure the
/// previous view and the credentials are left untouched.
pub async fn refresh<'a, S: ProfileSource>(
    session: &'a mut Session,
    source: &S,
) -> Result<&'a ProfileSummary, RefreshError> {
    let token = session.token().ok_or(RefreshError::NotSignedIn)?.to_string();

    match fetch::fetch_profile(source, &token).await {
        Ok(profile) => Ok(session.show(summarize(&profile))),
        Err(err) => {
            warn!(reason = err.reason(), error = %err, "failed to fetch user data");
            Err(err.into())
        }
    }
}
