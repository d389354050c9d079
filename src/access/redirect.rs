use super::actor::Actor;
use crate::types::Role;

/// One legacy route rewritten to the actor's own school
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectRule {
    pub prefix: &'static str,
    /// `{tenantId}` is replaced by the actor's school id
    pub template: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub location: String,
}

/// Maps school-wide collection routes onto the SchoolAdmin's own school.
/// Advisory only; the evaluator still enforces every request it forwards.
#[derive(Debug, Clone)]
pub struct RedirectAdvisor {
    rules: Vec<RedirectRule>,
}

impl Default for RedirectAdvisor {
    fn default() -> Self {
        Self::new(vec![
            RedirectRule {
                prefix: "/api/schools",
                template: "/api/schools/{tenantId}",
            },
            RedirectRule {
                prefix: "/api/classrooms/school",
                template: "/api/classrooms/school/{tenantId}",
            },
        ])
    }
}

impl RedirectAdvisor {
    pub fn new(rules: Vec<RedirectRule>) -> Self {
        Self { rules }
    }

    pub fn advise_redirect(&self, actor: &Actor, path: &str) -> Option<RedirectTarget> {
        if actor.role != Role::SchoolAdmin {
            return None;
        }
        let tenant = actor.tenant?;
        let path = path.trim_end_matches('/');

        // Exact prefix only: anything longer already names a resource
        self.rules.iter().find(|rule| rule.prefix == path).map(|rule| RedirectTarget {
            location: rule.template.replace("{tenantId}", &tenant.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TenantId;
    use uuid::Uuid;

    fn admin(tenant: Option<TenantId>) -> Actor {
        Actor::new(Uuid::new_v4(), "admin@north.edu", Role::SchoolAdmin, tenant)
    }

    #[test]
    fn school_admin_is_sent_to_own_school() {
        let tenant = TenantId::new(Uuid::new_v4());
        let advisor = RedirectAdvisor::default();
        let actor = admin(Some(tenant));

        assert_eq!(
            advisor.advise_redirect(&actor, "/api/schools").unwrap().location,
            format!("/api/schools/{}", tenant)
        );
        assert_eq!(
            advisor.advise_redirect(&actor, "/api/schools/").unwrap().location,
            format!("/api/schools/{}", tenant)
        );
        assert_eq!(
            advisor.advise_redirect(&actor, "/api/classrooms/school").unwrap().location,
            format!("/api/classrooms/school/{}", tenant)
        );
    }

    #[test]
    fn paths_with_an_id_are_left_alone() {
        let advisor = RedirectAdvisor::default();
        let actor = admin(Some(TenantId::new(Uuid::new_v4())));

        assert!(advisor.advise_redirect(&actor, &format!("/api/schools/{}", Uuid::new_v4())).is_none());
        assert!(advisor.advise_redirect(&actor, "/api/classrooms").is_none());
        assert!(advisor.advise_redirect(&actor, "/api/students").is_none());
    }

    #[test]
    fn other_roles_get_no_advice() {
        let advisor = RedirectAdvisor::default();
        let tenant = Some(TenantId::new(Uuid::new_v4()));

        for role in [Role::SuperAdmin, Role::Teacher, Role::Student] {
            let actor = Actor::new(Uuid::new_v4(), "x@y.z", role, tenant);
            assert!(advisor.advise_redirect(&actor, "/api/schools").is_none());
        }
        assert!(advisor.advise_redirect(&admin(None), "/api/schools").is_none());
    }
}
