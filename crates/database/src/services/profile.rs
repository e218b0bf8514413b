use crate::{
    entities::profiles::{self, Role},
    error::ServiceError,
};
use chrono::Utc;
use models::policy::{Action, Resource, authorize};
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait, sea_query::OnConflict};
use uuid::Uuid;

/// Fields a subject may change on its own profile
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

pub struct ProfileService;

impl ProfileService {
    /// Any authenticated caller may read any profile
    pub async fn get(
        db: &DatabaseConnection,
        caller: Uuid,
        id: Uuid,
    ) -> Result<profiles::Model, ServiceError> {
        authorize(Some(caller), Resource::Profile { subject: id }, Action::Read)?;

        profiles::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("profile"))
    }

    /// Creates or updates the caller's own profile
    pub async fn upsert_own(
        db: &DatabaseConnection,
        caller: Uuid,
        update: ProfileUpdate,
    ) -> Result<profiles::Model, ServiceError> {
        authorize(
            Some(caller),
            Resource::Profile { subject: caller },
            Action::Write,
        )?;

        let display_name = update.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(ServiceError::Invalid("display name is empty".into()));
        }

        let now = Utc::now().naive_utc();
        let profile = profiles::ActiveModel {
            id: Set(caller),
            display_name: Set(display_name),
            role: Set(update.role),
            avatar_url: Set(update.avatar_url),
            created_at: Set(now),
            updated_at: Set(now),
        };

        profiles::Entity::insert(profile)
            .on_conflict(
                OnConflict::column(profiles::Column::Id)
                    .update_columns([
                        profiles::Column::DisplayName,
                        profiles::Column::Role,
                        profiles::Column::AvatarUrl,
                        profiles::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Self::get(db, caller, caller).await
    }
}
