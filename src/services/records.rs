use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{hash_password, AuthError};
use crate::database::{document_id, DatabaseError, Document, DocumentStore};
use crate::filter::Filter;
use crate::models::ValidationError;
use crate::types::{EntityType, Role};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} not found")]
    MissingReference(EntityType),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Entity rules that run after access has been granted: required school,
/// uniqueness, referenced records, password hashing and enrollment history.
pub struct RecordService {
    store: Arc<dyn DocumentStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, entity: EntityType, filter: &Filter) -> Result<Vec<Document>, RecordError> {
        let docs = self.store.find(entity, filter).await?;
        Ok(docs.into_iter().map(present).collect())
    }

    pub async fn get(&self, entity: EntityType, id: Uuid) -> Result<Option<Document>, RecordError> {
        Ok(self.store.find_by_id(entity, id).await?.map(present))
    }

    pub async fn create(
        &self,
        entity: EntityType,
        mut doc: Document,
        created_by: Uuid,
    ) -> Result<Document, RecordError> {
        require_school(entity, &doc)?;
        self.ensure_unique(entity, &doc, None).await?;
        self.check_references(entity, &doc).await?;

        // A scoped School create carries the tenant id as its own id
        if let Ok(id) = document_id(&doc) {
            if self.store.find_by_id(entity, id).await?.is_some() {
                return Err(RecordError::Conflict(format!("{} already exists", entity)));
            }
        }

        match entity {
            EntityType::User => hash_password_field(&mut doc)?,
            EntityType::Student => {
                doc.entry("enrollmentDate")
                    .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
                doc.insert("enrollmentHistory".to_string(), Value::Array(Vec::new()));
            }
            _ => {}
        }
        doc.insert("createdBy".to_string(), Value::String(created_by.to_string()));

        let saved = self.store.insert(entity, doc).await?;
        let id = document_id(&saved).map(|id| id.to_string()).unwrap_or_default();
        tracing::info!("Created {} {}", entity, id);
        Ok(present(saved))
    }

    /// `None` when the record disappeared between authorization and update
    pub async fn update(
        &self,
        entity: EntityType,
        id: Uuid,
        mut changes: Document,
    ) -> Result<Option<Document>, RecordError> {
        let Some(existing) = self.store.find_by_id(entity, id).await? else {
            return Ok(None);
        };

        let mut merged = existing.clone();
        merged.extend(changes.clone());

        require_school(entity, &merged)?;
        self.ensure_unique(entity, &merged, Some(id)).await?;
        self.check_references(entity, &merged).await?;

        match entity {
            EntityType::User if changes.contains_key("password") => hash_password_field(&mut changes)?,
            EntityType::Student => record_transfer(&existing, &mut changes),
            _ => {}
        }

        let updated = self.store.update(entity, id, changes).await?;
        if updated.is_some() {
            tracing::info!("Updated {} {}", entity, id);
        }
        Ok(updated.map(present))
    }

    /// `false` when nothing was deleted
    pub async fn delete(&self, entity: EntityType, id: Uuid) -> Result<bool, RecordError> {
        if entity == EntityType::School {
            let filter = Filter::new().eq("school", id.to_string());
            for dependent in [EntityType::Classroom, EntityType::Student, EntityType::Teacher, EntityType::User] {
                if !self.store.find(dependent, &filter).await?.is_empty() {
                    return Err(RecordError::Conflict(format!(
                        "School is still referenced by {}",
                        dependent.collection()
                    )));
                }
            }
        }

        let deleted = self.store.delete(entity, id).await?;
        if deleted {
            tracing::info!("Deleted {} {}", entity, id);
        }
        Ok(deleted)
    }

    async fn ensure_unique(
        &self,
        entity: EntityType,
        doc: &Document,
        current: Option<Uuid>,
    ) -> Result<(), RecordError> {
        for field in unique_fields(entity) {
            let Some(value) = doc.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };

            let mut filter = Filter::new().eq(*field, value.clone());
            // classroom names only need to be unique within their school
            if entity == EntityType::Classroom {
                if let Some(school) = doc.get("school") {
                    filter.set("school", school.clone());
                }
            }

            let clash = self
                .store
                .find(entity, &filter)
                .await?
                .iter()
                .any(|other| document_id(other).ok() != current);
            if clash {
                return Err(RecordError::Conflict(format!(
                    "{} with this {} already exists",
                    entity, field
                )));
            }
        }
        Ok(())
    }

    /// Every reference besides `school` resolves only inside the record's
    /// school. A record from another school is reported exactly like a
    /// missing one.
    async fn check_references(&self, entity: EntityType, doc: &Document) -> Result<(), RecordError> {
        let school = self.referenced(doc, "school", EntityType::School, None).await?;
        let school_id = school.as_ref().and_then(|s| s.get("id").cloned());
        let within = school_id.as_ref();

        match entity {
            EntityType::Classroom => {
                if let Some(teacher) = self.referenced(doc, "teacher", EntityType::User, within).await? {
                    require_role(&teacher, Role::Teacher, "teacher")?;
                }
            }
            EntityType::Student => {
                self.referenced(doc, "classroom", EntityType::Classroom, within).await?;
            }
            EntityType::Teacher => {
                if let Some(user) = self.referenced(doc, "user", EntityType::User, within).await? {
                    require_role(&user, Role::Teacher, "user")?;
                }
                self.referenced(doc, "classroom", EntityType::Classroom, within).await?;
            }
            EntityType::School | EntityType::User => {}
        }
        Ok(())
    }

    /// Fetch the record a reference field points at. A missing target, or one
    /// outside `school` when given, is `MissingReference`.
    async fn referenced(
        &self,
        doc: &Document,
        field: &str,
        target: EntityType,
        school: Option<&Value>,
    ) -> Result<Option<Document>, RecordError> {
        let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let id = value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| ValidationError::field(field, "must be an id"))?;

        self.store
            .find_by_id(target, id)
            .await?
            .filter(|found| school.map_or(true, |school| found.get("school") == Some(school)))
            .map(Some)
            .ok_or(RecordError::MissingReference(target))
    }
}

fn unique_fields(entity: EntityType) -> &'static [&'static str] {
    match entity {
        EntityType::School | EntityType::Classroom => &["name"],
        EntityType::Student | EntityType::User => &["email"],
        EntityType::Teacher => &[],
    }
}

fn require_school(entity: EntityType, doc: &Document) -> Result<(), ValidationError> {
    let needs_school = match entity {
        EntityType::School => false,
        EntityType::User => doc.get("role").and_then(Value::as_str) != Some(Role::SuperAdmin.as_str()),
        EntityType::Classroom | EntityType::Student | EntityType::Teacher => true,
    };

    if needs_school && doc.get("school").map_or(true, Value::is_null) {
        return Err(ValidationError::field("school", "is required"));
    }
    Ok(())
}

fn require_role(user: &Document, role: Role, field: &str) -> Result<(), ValidationError> {
    if user.get("role").and_then(Value::as_str) != Some(role.as_str()) {
        return Err(ValidationError::field(field, format!("must reference a user with role {}", role)));
    }
    Ok(())
}

fn hash_password_field(doc: &mut Document) -> Result<(), RecordError> {
    if let Some(Value::String(password)) = doc.get("password") {
        let hash = hash_password(password)?;
        doc.insert("password".to_string(), Value::String(hash));
    }
    Ok(())
}

/// Append the previous placement when a student changes school or classroom
fn record_transfer(existing: &Document, changes: &mut Document) {
    let moved = ["school", "classroom"]
        .iter()
        .any(|field| changes.get(*field).is_some_and(|v| existing.get(*field) != Some(v)));
    if !moved {
        return;
    }

    let mut history = existing
        .get("enrollmentHistory")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    history.push(json!({
        "school": existing.get("school"),
        "classroom": existing.get("classroom"),
        "enrolledDate": existing.get("enrollmentDate"),
        "status": "Transferred",
    }));

    changes.insert("enrollmentHistory".to_string(), Value::Array(history));
    changes.insert("enrollmentDate".to_string(), Value::String(Utc::now().to_rfc3339()));
}

/// Strip fields that never leave the server
pub fn present(mut doc: Document) -> Document {
    doc.remove("password");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::database::MemoryStore;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    struct Fixture {
        service: RecordService,
        store: Arc<MemoryStore>,
        actor: Uuid,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            Self {
                service: RecordService::new(store.clone()),
                store,
                actor: Uuid::new_v4(),
            }
        }

        async fn create(&self, entity: EntityType, body: Value) -> Result<Document, RecordError> {
            self.service.create(entity, doc(body), self.actor).await
        }

        async fn school(&self, name: &str) -> String {
            let school = self
                .create(EntityType::School, json!({"name": name, "address": "1 Main", "contactNumber": "0123456789"}))
                .await
                .unwrap();
            school["id"].as_str().unwrap().to_string()
        }

        async fn classroom(&self, school: &str, name: &str) -> String {
            let classroom = self
                .create(EntityType::Classroom, json!({"name": name, "school": school}))
                .await
                .unwrap();
            classroom["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn duplicate_names_conflict() {
        let fx = Fixture::new();
        fx.school("North").await;
        let err = fx
            .create(EntityType::School, json!({"name": "North", "address": "2 Main", "contactNumber": "0123456789"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Conflict(_)));
    }

    #[tokio::test]
    async fn classroom_names_are_unique_per_school() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let south = fx.school("South").await;
        fx.classroom(&north, "7B").await;
        fx.classroom(&south, "7B").await;

        let err = fx
            .create(EntityType::Classroom, json!({"name": "7B", "school": north}))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_school_reference_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .create(EntityType::Classroom, json!({"name": "7B", "school": Uuid::new_v4().to_string()}))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingReference(EntityType::School)));

        let err = fx.create(EntityType::Classroom, json!({"name": "7B"})).await.unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[tokio::test]
    async fn student_classroom_resolves_only_within_school() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let south = fx.school("South").await;
        let south_room = fx.classroom(&south, "9A").await;

        let err = fx
            .create(
                EntityType::Student,
                json!({"firstName": "Ada", "lastName": "L", "email": "ada@x.io", "classroom": south_room, "school": north}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingReference(EntityType::Classroom)));
        assert_eq!(err.to_string(), "Classroom not found");
    }

    #[tokio::test]
    async fn classroom_teacher_resolves_only_within_school() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let south = fx.school("South").await;
        let south_teacher = fx
            .create(
                EntityType::User,
                json!({"name": "S", "email": "s@south.edu", "password": "pass", "role": "Teacher", "school": south}),
            )
            .await
            .unwrap();

        let err = fx
            .create(EntityType::Classroom, json!({"name": "7B", "school": north, "teacher": south_teacher["id"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::MissingReference(EntityType::User)));

        let classroom = fx
            .create(EntityType::Classroom, json!({"name": "9A", "school": south, "teacher": south_teacher["id"]}))
            .await
            .unwrap();
        assert_eq!(classroom["teacher"], south_teacher["id"]);
    }

    #[tokio::test]
    async fn teacher_must_reference_a_teacher_user() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let room = fx.classroom(&north, "7B").await;
        let admin = fx
            .create(
                EntityType::User,
                json!({"name": "A", "email": "a@north.edu", "password": "pass", "role": "SchoolAdmin", "school": north}),
            )
            .await
            .unwrap();

        let err = fx
            .create(EntityType::Teacher, json!({"user": admin["id"], "classroom": room, "school": north}))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));

        let teacher = fx
            .create(
                EntityType::User,
                json!({"name": "T", "email": "t@north.edu", "password": "pass", "role": "Teacher", "school": north}),
            )
            .await
            .unwrap();
        fx.create(EntityType::Teacher, json!({"user": teacher["id"], "classroom": room, "school": north}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn passwords_are_hashed_and_hidden() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let user = fx
            .create(
                EntityType::User,
                json!({"name": "T", "email": "t@north.edu", "password": "secret", "role": "Teacher", "school": north}),
            )
            .await
            .unwrap();
        assert!(!user.contains_key("password"));

        let id = document_id(&user).unwrap();
        let stored = fx.store.find_by_id(EntityType::User, id).await.unwrap().unwrap();
        let hash = stored["password"].as_str().unwrap();
        assert!(verify_password("secret", hash));
        assert_eq!(stored["createdBy"], json!(fx.actor.to_string()));
    }

    #[tokio::test]
    async fn super_admin_user_needs_no_school() {
        let fx = Fixture::new();
        fx.create(
            EntityType::User,
            json!({"name": "Root", "email": "root@x.io", "password": "pass", "role": "SuperAdmin"}),
        )
        .await
        .unwrap();

        let err = fx
            .create(
                EntityType::User,
                json!({"name": "T", "email": "t@x.io", "password": "pass", "role": "Teacher"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[tokio::test]
    async fn transfer_appends_history() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let room_a = fx.classroom(&north, "7A").await;
        let room_b = fx.classroom(&north, "7B").await;

        let student = fx
            .create(
                EntityType::Student,
                json!({"firstName": "Ada", "lastName": "L", "email": "ada@x.io", "classroom": room_a, "school": north}),
            )
            .await
            .unwrap();
        assert_eq!(student["enrollmentHistory"], json!([]));
        let id = document_id(&student).unwrap();

        let same = fx
            .service
            .update(EntityType::Student, id, doc(json!({"classroom": room_a, "phone": "0123456789"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same["enrollmentHistory"], json!([]));

        let moved = fx
            .service
            .update(EntityType::Student, id, doc(json!({"classroom": room_b})))
            .await
            .unwrap()
            .unwrap();
        let history = moved["enrollmentHistory"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["classroom"], json!(room_a));
        assert_eq!(history[0]["status"], json!("Transferred"));
    }

    #[tokio::test]
    async fn referenced_school_cannot_be_deleted() {
        let fx = Fixture::new();
        let north = fx.school("North").await;
        let room = fx.classroom(&north, "7B").await;
        let north_id = Uuid::parse_str(&north).unwrap();

        let err = fx.service.delete(EntityType::School, north_id).await.unwrap_err();
        assert!(matches!(err, RecordError::Conflict(_)));

        assert!(fx
            .service
            .delete(EntityType::Classroom, Uuid::parse_str(&room).unwrap())
            .await
            .unwrap());
        assert!(fx.service.delete(EntityType::School, north_id).await.unwrap());
        assert!(!fx.service.delete(EntityType::School, north_id).await.unwrap());
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_none() {
        let fx = Fixture::new();
        let result = fx
            .service
            .update(EntityType::School, Uuid::new_v4(), doc(json!({"name": "X"})))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
