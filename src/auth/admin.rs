/// Decides whether an account gets the admin dashboard.
///
/// An account is an admin when its email is on the configured allowlist or
/// its profile row carries the `admin` role.
#[derive(Debug, Clone, Default)]
pub struct AdminPolicy {
    allowlist: Vec<String>,
}

pub const ADMIN_ROLE: &str = "admin";

impl AdminPolicy {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowlist: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(&crate::config::config().security.admin_emails)
    }

    pub fn is_allowlisted(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        self.allowlist.iter().any(|e| *e == email)
    }

    pub fn is_admin(&self, email: &str, role: Option<&str>) -> bool {
        self.is_allowlisted(email) || role.map_or(false, |r| r.eq_ignore_ascii_case(ADMIN_ROLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_is_case_insensitive() {
        let policy = AdminPolicy::new(["Dean@Uni.edu "]);
        assert!(policy.is_admin("dean@uni.edu", None));
        assert!(policy.is_admin("DEAN@UNI.EDU", Some("student")));
    }

    #[test]
    fn role_column_grants_admin() {
        let policy = AdminPolicy::default();
        assert!(policy.is_admin("ops@uni.edu", Some("admin")));
        assert!(!policy.is_admin("ops@uni.edu", Some("tutor")));
        assert!(!policy.is_admin("ops@uni.edu", None));
    }
}
