use serde::{Deserialize, Serialize};

use super::{EntityModel, Reference, Validate, ValidationError, Validator};
use crate::types::EntityType;

pub struct Teacher;

impl EntityModel for Teacher {
    const ENTITY: EntityType = EntityType::Teacher;
    type Create = CreateTeacher;
    type Update = UpdateTeacher;
}

/// Assignment of a Teacher-role user to a classroom
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTeacher {
    pub user: Reference,
    pub classroom: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

impl Validate for CreateTeacher {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        validate_subjects(&mut v, &self.subjects);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTeacher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

impl Validate for UpdateTeacher {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        if let Some(subjects) = &self.subjects {
            validate_subjects(&mut v, subjects);
        }
        v.finish()
    }
}

fn validate_subjects(v: &mut Validator, subjects: &[String]) {
    for (i, subject) in subjects.iter().enumerate() {
        v.non_empty(&format!("subjects[{}]", i), subject);
    }
}
