//! Permissions table and the closed `Permission` vocabulary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The capabilities a role can be granted.
///
/// The string forms are the names stored in the `permissions` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    EvaluateMath,
    EvaluateBoolean,
    ViewOwnHistory,
    ViewAllHistory,
    ManageUsers,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EvaluateMath => "calcular_matematicas",
            Self::EvaluateBoolean => "calcular_booleanas",
            Self::ViewOwnHistory => "ver_historial",
            Self::ViewAllHistory => "ver_historial_todos",
            Self::ManageUsers => "gestionar_usuarios",
        }
    }
}

impl TryFrom<&str> for Permission {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "calcular_matematicas" => Ok(Self::EvaluateMath),
            "calcular_booleanas" => Ok(Self::EvaluateBoolean),
            "ver_historial" => Ok(Self::ViewOwnHistory),
            "ver_historial_todos" => Ok(Self::ViewAllHistory),
            "gestionar_usuarios" => Ok(Self::ManageUsers),
            other => Err(EngineError::InvalidInput(format!(
                "invalid permission: {other}"
            ))),
        }
    }
}
