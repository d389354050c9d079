use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityModel, Reference, Validate, ValidationError, Validator};
use crate::types::EntityType;

pub struct Student;

impl EntityModel for Student {
    const ENTITY: EntityType = EntityType::Student;
    type Create = CreateStudent;
    type Update = UpdateStudent;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[default]
    Enrolled,
    Transferred,
    Graduated,
    Dropped,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "Enrolled",
            EnrollmentStatus::Transferred => "Transferred",
            EnrollmentStatus::Graduated => "Graduated",
            EnrollmentStatus::Dropped => "Dropped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Guardian {
    pub name: String,
    pub contact_info: ContactInfo,
    pub relationship: String,
}

/// `enrollmentHistory` is server-maintained and not accepted from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub classroom: Reference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
    #[serde(default)]
    pub enrollment_status: EnrollmentStatus,
    #[serde(default)]
    pub guardians: Vec<Guardian>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<DateTime<Utc>>,
}

impl Validate for CreateStudent {
    fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.non_empty("firstName", &self.first_name)
            .non_empty("lastName", &self.last_name)
            .email("email", &self.email)
            .optional(self.phone.as_deref(), |v, phone| {
                v.digits("phone", phone, 10, 15);
            });
        validate_guardians(&mut v, &self.guardians);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateStudent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_status: Option<EnrollmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardians: Option<Vec<Guardian>>,
}

impl Validate for UpdateStudent {
    fn normalize(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_lowercase();
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        v.optional(self.first_name.as_deref(), |v, name| {
            v.non_empty("firstName", name);
        })
        .optional(self.last_name.as_deref(), |v, name| {
            v.non_empty("lastName", name);
        })
        .optional(self.email.as_deref(), |v, email| {
            v.email("email", email);
        })
        .optional(self.phone.as_deref(), |v, phone| {
            v.digits("phone", phone, 10, 15);
        });
        if let Some(guardians) = &self.guardians {
            validate_guardians(&mut v, guardians);
        }
        v.finish()
    }
}

fn validate_guardians(v: &mut Validator, guardians: &[Guardian]) {
    for (i, guardian) in guardians.iter().enumerate() {
        v.non_empty(&format!("guardians[{}].name", i), &guardian.name)
            .non_empty(&format!("guardians[{}].relationship", i), &guardian.relationship)
            .digits(&format!("guardians[{}].contactInfo.phone", i), &guardian.contact_info.phone, 10, 15)
            .email(&format!("guardians[{}].contactInfo.email", i), &guardian.contact_info.email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{into_document, parse_payload};
    use serde_json::json;
    use uuid::Uuid;

    fn minimal() -> serde_json::Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ADA@North.edu",
            "classroom": Uuid::new_v4().to_string()
        })
    }

    #[test]
    fn defaults_and_normalisation() {
        let payload = parse_payload::<CreateStudent>(minimal()).unwrap();
        assert_eq!(payload.email, "ada@north.edu");
        assert_eq!(payload.enrollment_status, EnrollmentStatus::Enrolled);

        let doc = into_document(&payload).unwrap();
        assert_eq!(doc["enrollmentStatus"], json!("Enrolled"));
        assert_eq!(doc["guardians"], json!([]));
    }

    #[test]
    fn history_cannot_be_supplied() {
        let mut body = minimal();
        body["enrollmentHistory"] = json!([]);
        assert!(parse_payload::<CreateStudent>(body).is_err());
    }

    #[test]
    fn guardian_contact_is_checked() {
        let mut body = minimal();
        body["guardians"] = json!([{
            "name": "Byron",
            "relationship": "Father",
            "contactInfo": {"phone": "12", "email": "byron@example.com"}
        }]);
        let err = parse_payload::<CreateStudent>(body).unwrap_err();
        assert!(err.field_errors.contains_key("guardians[0].contactInfo.phone"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(parse_payload::<UpdateStudent>(json!({"enrollmentStatus": "Suspended"})).is_err());
        let update = parse_payload::<UpdateStudent>(json!({"enrollmentStatus": "Graduated"})).unwrap();
        assert_eq!(update.enrollment_status, Some(EnrollmentStatus::Graduated));
    }
}
