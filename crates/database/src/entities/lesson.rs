use models::media::MediaKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A lesson row. The four `content_*` columns are either all set or all
/// NULL (placeholder lesson).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub position: i32, // display order within the module
    #[sea_orm(column_type = "Text", nullable)]
    pub content_name: Option<String>,
    pub content_kind: Option<MediaKind>,
    #[sea_orm(column_type = "Text", nullable)]
    pub content_url: Option<String>,
    pub content_size: Option<i64>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_module::Entity",
        from = "Column::ModuleId",
        to = "super::course_module::Column::Id",
        on_delete = "Cascade"
    )]
    Module,
    #[sea_orm(has_many = "super::progress::Entity")]
    Progress,
}

impl Related<super::course_module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
