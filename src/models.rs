use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::Record;

/// Stored account. Only the admin flag decides access to write routes.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Identity resolved by the admin guard, without the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for AdminProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// JWT claims. `sub` is the user id, times are unix seconds.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthPayload {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub live_link: Option<String>,
    #[serde(default)]
    pub github_link: Option<String>,
    pub image: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Project {
    const TREE: &'static str = "projects";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub about_me_id: String,
    pub degree: String,
    pub institution: String,
    pub year: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Education {
    const TREE: &'static str = "education";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub about_me_id: String,
    pub position: String,
    pub company: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Record for Experience {
    const TREE: &'static str = "experience";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The singleton biography row as stored. Children live in their own trees
/// and are referenced here in display order.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AboutRecord {
    pub id: String,
    pub headline: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub profile_image: String,
    #[serde(default)]
    pub resume_file: Option<String>,
    pub education_ids: Vec<String>,
    pub experience_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AboutMe with its relations resolved, as returned by the API.
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AboutMe {
    pub id: String,
    pub headline: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub profile_image: String,
    #[serde(default)]
    pub resume_file: Option<String>,
    pub education: Vec<Education>,
    pub experience: Vec<Experience>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AboutMe {
    pub fn assemble(record: AboutRecord, education: Vec<Education>, experience: Vec<Experience>) -> Self {
        Self {
            id: record.id,
            headline: record.headline,
            bio: record.bio,
            skills: record.skills,
            interests: record.interests,
            profile_image: record.profile_image,
            resume_file: record.resume_file,
            education,
            experience,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    pub title: String,
    pub issuing_org: String,
    pub date: NaiveDate,
    pub image: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Certificate {
    const TREE: &'static str = "certificates";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image: String,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for GalleryItem {
    const TREE: &'static str = "gallery";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: String,
    pub score: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Rating {
    const TREE: &'static str = "ratings";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct RatingSummary {
    pub count: usize,
    pub average: f64,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let count = ratings.len();
        let average = if count == 0 {
            0.0
        } else {
            let total: u32 = ratings.iter().map(|r| u32::from(r.score)).sum();
            f64::from(total) / count as f64
        };
        Self { count, average }
    }
}

/// Body of `PUT /api/about`. Scalars left out keep their stored value; the
/// child lists always replace what is stored, and a missing list means empty.
#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AboutDraft {
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub profile_image: Option<String>,
    pub resume_file: Option<String>,
    pub education: Option<Vec<EducationDraft>>,
    pub experience: Option<Vec<ExperienceDraft>>,
}

impl AboutDraft {
    /// Merge the scalar fields over `existing`, or build a fresh record when
    /// there is none, in which case headline, bio and profile image are required.
    pub fn into_record(
        &self,
        existing: Option<AboutRecord>,
        id: String,
        education_ids: Vec<String>,
        experience_ids: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<AboutRecord, String> {
        let record = match existing {
            Some(current) => AboutRecord {
                id,
                headline: keep_or_replace(&self.headline, current.headline),
                bio: keep_or_replace(&self.bio, current.bio),
                skills: self.skills.clone().unwrap_or(current.skills),
                interests: self.interests.clone().unwrap_or(current.interests),
                profile_image: keep_or_replace(&self.profile_image, current.profile_image),
                resume_file: self.resume_file.clone().or(current.resume_file),
                education_ids,
                experience_ids,
                created_at: current.created_at,
                updated_at: now,
            },
            None => AboutRecord {
                id,
                headline: required(&self.headline, "headline")?,
                bio: required(&self.bio, "bio")?,
                skills: self.skills.clone().unwrap_or_default(),
                interests: self.interests.clone().unwrap_or_default(),
                profile_image: required(&self.profile_image, "profileImage")?,
                resume_file: self.resume_file.clone(),
                education_ids,
                experience_ids,
                created_at: now,
                updated_at: now,
            },
        };
        Ok(record)
    }
}

/// Child entry of an [`AboutDraft`]. Any `id`/`aboutMeId` sent by the client
/// is ignored; every replace mints fresh ids.
#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EducationDraft {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub year: Option<String>,
    pub description: Option<String>,
}

impl EducationDraft {
    pub fn into_education(&self, about_me_id: &str, now: DateTime<Utc>) -> Result<Education, String> {
        Ok(Education {
            id: uuid::Uuid::new_v4().to_string(),
            about_me_id: about_me_id.to_owned(),
            degree: required(&self.degree, "education.degree")?,
            institution: required(&self.institution, "education.institution")?,
            year: required(&self.year, "education.year")?,
            description: self.description.clone(),
            created_at: now,
        })
    }
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDraft {
    pub position: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

impl ExperienceDraft {
    pub fn into_experience(&self, about_me_id: &str, now: DateTime<Utc>) -> Result<Experience, String> {
        Ok(Experience {
            id: uuid::Uuid::new_v4().to_string(),
            about_me_id: about_me_id.to_owned(),
            position: required(&self.position, "experience.position")?,
            company: required(&self.company, "experience.company")?,
            start_date: required(&self.start_date, "experience.startDate")?,
            end_date: self.end_date.clone(),
            current: self.current.unwrap_or(false),
            description: self.description.clone().unwrap_or_default(),
            created_at: now,
        })
    }
}

/// A present, non-blank value or the name of the missing field.
pub fn required(value: &Option<String>, field: &str) -> Result<String, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_owned()),
        _ => Err(format!("Please provide {field}")),
    }
}

/// Partial-update rule: absent or blank input keeps the current value.
pub fn keep_or_replace(value: &Option<String>, current: String) -> String {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => current,
    }
}
