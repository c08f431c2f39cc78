//! Structured DDL inputs: column and alteration descriptors.
//!
//! Descriptors describe a schema change without raw SQL. They are validated
//! here, before any connection is acquired.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One column of a `create_table` call.
///
/// Fields are optional on the wire so that an incomplete descriptor is
/// reported as a validation error rather than rejected during decoding.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    /// Column name
    #[serde(default)]
    pub name: String,
    /// SQL type, e.g. "INT" or "VARCHAR(255)"
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
    /// Column constraints, e.g. "PRIMARY KEY AUTO_INCREMENT" or "NOT NULL DEFAULT 0"
    #[serde(default)]
    pub constraints: Option<String>,
}

impl ColumnDescriptor {
    /// Validate the descriptor and return its column type.
    pub fn checked_type(&self) -> DbResult<&str> {
        require_identifier("column name", &self.name)?;
        let data_type = self.data_type.as_deref().ok_or_else(|| {
            DbError::validation(format!("column '{}' is missing its type", self.name))
        })?;
        require_fragment("column type", data_type)?;
        if let Some(constraints) = &self.constraints {
            check_fragment("column constraints", constraints)?;
        }
        Ok(data_type)
    }
}

/// Wire form of one `alter_table` step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AlterationInput {
    /// One of ADD_COLUMN, MODIFY_COLUMN, DROP_COLUMN, RENAME_TO (spaces also accepted)
    #[serde(default)]
    pub action: String,
    /// Target column; required for ADD_COLUMN, MODIFY_COLUMN, DROP_COLUMN
    #[serde(default)]
    pub name: Option<String>,
    /// Column type; required for ADD_COLUMN and MODIFY_COLUMN
    #[serde(default, rename = "type")]
    pub data_type: Option<String>,
    /// Optional column constraints for ADD_COLUMN and MODIFY_COLUMN
    #[serde(default)]
    pub constraints: Option<String>,
    /// New table name; required for RENAME_TO
    #[serde(default)]
    pub new_name: Option<String>,
}

/// A validated alteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alteration {
    AddColumn {
        name: String,
        data_type: String,
        constraints: Option<String>,
    },
    ModifyColumn {
        name: String,
        data_type: String,
        constraints: Option<String>,
    },
    DropColumn {
        name: String,
    },
    RenameTo {
        new_name: String,
    },
}

impl Alteration {
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::AddColumn { .. } => "ADD COLUMN",
            Self::ModifyColumn { .. } => "MODIFY COLUMN",
            Self::DropColumn { .. } => "DROP COLUMN",
            Self::RenameTo { .. } => "RENAME TO",
        }
    }
}

/// Normalize an action keyword: case-insensitive, `_` and runs of whitespace
/// are equivalent.
fn normalize_action(action: &str) -> String {
    action
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

impl TryFrom<AlterationInput> for Alteration {
    type Error = DbError;

    fn try_from(input: AlterationInput) -> DbResult<Self> {
        let action = normalize_action(&input.action);

        let column_name = |input: &AlterationInput| -> DbResult<String> {
            let name = input.name.clone().unwrap_or_default();
            require_identifier(&format!("{} column name", action), &name)?;
            Ok(name)
        };
        let column_type = |input: &AlterationInput| -> DbResult<String> {
            let data_type = input.data_type.clone().unwrap_or_default();
            require_fragment(&format!("{} column type", action), &data_type)?;
            Ok(data_type)
        };
        let constraints = |input: &AlterationInput| -> DbResult<Option<String>> {
            if let Some(c) = &input.constraints {
                check_fragment("column constraints", c)?;
            }
            Ok(input.constraints.clone().filter(|c| !c.trim().is_empty()))
        };

        match action.as_str() {
            "ADD COLUMN" => Ok(Self::AddColumn {
                name: column_name(&input)?,
                data_type: column_type(&input)?,
                constraints: constraints(&input)?,
            }),
            "MODIFY COLUMN" => Ok(Self::ModifyColumn {
                name: column_name(&input)?,
                data_type: column_type(&input)?,
                constraints: constraints(&input)?,
            }),
            "DROP COLUMN" => Ok(Self::DropColumn {
                name: column_name(&input)?,
            }),
            "RENAME TO" => {
                let new_name = input.new_name.clone().unwrap_or_default();
                require_identifier("RENAME TO new_name", &new_name)?;
                Ok(Self::RenameTo { new_name })
            }
            _ => Err(DbError::validation(format!(
                "Unsupported alteration action '{}'. Use ADD_COLUMN, MODIFY_COLUMN, DROP_COLUMN or RENAME_TO",
                input.action
            ))),
        }
    }
}

/// Identifiers must be non-empty. Backticks are escaped at quoting time.
pub fn require_identifier(what: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::validation(format!("{} must not be empty", what)));
    }
    if value.contains('\0') {
        return Err(DbError::validation(format!(
            "{} must not contain NUL characters",
            what
        )));
    }
    Ok(())
}

fn require_fragment(what: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::validation(format!("{} must not be empty", what)));
    }
    check_fragment(what, value)
}

/// Raw type/constraint fragments are spliced into the statement, so they must
/// not terminate it.
fn check_fragment(what: &str, value: &str) -> DbResult<()> {
    if value.contains(';') {
        return Err(DbError::validation(format!(
            "{} must not contain ';': {}",
            what, value
        )));
    }
    Ok(())
}
