//! Profile editing for the signed-in user. The id always comes from the
//! session, never from the submitted form.

use serde::Deserialize;
use tracing::info;

use crate::db::{Store, StoreError};
use crate::error::AppError;
use crate::models::{Artist, Fan, Role, SocialLinks};
use crate::session::Session;
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileDraft {
    pub display_name: String,
    pub bio: Option<String>,
    pub image_path: Option<String>,
    pub social: SocialLinks,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ProfileDraft {
    fn social(&self) -> Result<SocialLinks, ValidationError> {
        Ok(SocialLinks {
            instagram: validation::check_link("instagram", self.social.instagram.as_deref())?,
            twitter: validation::check_link("twitter", self.social.twitter.as_deref())?,
            youtube: validation::check_link("youtube", self.social.youtube.as_deref())?,
            website: validation::check_link("website", self.social.website.as_deref())?,
        })
    }

    pub fn to_artist(&self, id: &str) -> Result<Artist, ValidationError> {
        Ok(Artist {
            id: id.to_string(),
            display_name: validation::require("display name", &self.display_name)?.to_string(),
            bio: non_blank(&self.bio),
            image_path: non_blank(&self.image_path),
            social: self.social()?,
            follower_count: 0,
        })
    }

    pub fn to_fan(&self, id: &str) -> Result<Fan, ValidationError> {
        Ok(Fan {
            id: id.to_string(),
            display_name: validation::require("display name", &self.display_name)?.to_string(),
            bio: non_blank(&self.bio),
            image_path: non_blank(&self.image_path),
            social: self.social()?,
        })
    }
}

fn require_role(session: &Session, role: Role) -> Result<(), AppError> {
    if session.role == role {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "only {} accounts can edit this profile",
            match role {
                Role::Artist => "artist",
                Role::Fan => "fan",
            }
        )))
    }
}

/// Creates or replaces the session's artist profile. The stored follower
/// count is kept.
pub fn save_artist(store: &Store, session: &Session, draft: &ProfileDraft) -> Result<Artist, AppError> {
    require_role(session, Role::Artist)?;
    let artist = draft.to_artist(&session.user_id)?;
    store.upsert_artist(&artist)?;
    info!(artist_id = %artist.id, "artist profile saved");
    Ok(store.get_artist(&artist.id)?)
}

pub fn save_fan(store: &Store, session: &Session, draft: &ProfileDraft) -> Result<Fan, AppError> {
    require_role(session, Role::Fan)?;
    let fan = draft.to_fan(&session.user_id)?;
    store.upsert_fan(&fan)?;
    info!(fan_id = %fan.id, "fan profile saved");
    Ok(fan)
}

/// The session's own profile, if one was saved yet.
pub fn own_artist(store: &Store, session: &Session) -> Result<Option<Artist>, AppError> {
    require_role(session, Role::Artist)?;
    match store.get_artist(&session.user_id) {
        Ok(artist) => Ok(Some(artist)),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
