use chrono::NaiveDateTime;
use database::{
    entities::profiles::{self, Role},
    services::profile::ProfileUpdate,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleDto {
    Teacher,
    Student,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        match role {
            Role::Teacher => RoleDto::Teacher,
            Role::Student => RoleDto::Student,
        }
    }
}

impl From<RoleDto> for Role {
    fn from(role: RoleDto) -> Self {
        match role {
            RoleDto::Teacher => Role::Teacher,
            RoleDto::Student => Role::Student,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub display_name: String,
    pub role: RoleDto,
    pub avatar_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<profiles::Model> for ProfileResponse {
    fn from(profile: profiles::Model) -> Self {
        ProfileResponse {
            id: profile.id,
            display_name: profile.display_name,
            role: profile.role.into(),
            avatar_url: profile.avatar_url,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: RoleDto,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn default_role() -> RoleDto {
    RoleDto::Student
}

impl From<ProfileUpdateRequest> for ProfileUpdate {
    fn from(request: ProfileUpdateRequest) -> Self {
        ProfileUpdate {
            display_name: request.display_name,
            role: request.role.into(),
            avatar_url: request.avatar_url,
        }
    }
}
