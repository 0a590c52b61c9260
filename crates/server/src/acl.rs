//! Role based access control over API routes, enforced by casbin.
//!
//! The model comes from `ACL_AUTH_MODEL` or, when unset, [`DEFAULT_MODEL`].
//! The policy is a casbin CSV file:
//!
//! ```text
//! p, admin, /users/.*, (GET)|(POST)
//! p, *, /health, GET
//! g, alice, admin
//! ```
//!
//! With the default model, objects and actions are regular expressions
//! searched in the route and method, `*` matches anything, and the `*`
//! subject grants a route to everyone without authentication.

use std::path::PathBuf;

use casbin::{CoreApi, DefaultModel, Enforcer, FileAdapter, MgmtApi, RbacApi};
use common::{ConfigError, EnvReader, FromEnv};
use regex::Regex;
use thiserror::Error;
use tokio::sync::RwLock;

/// Subject granted to every caller, authenticated or not.
pub const ANY_SUBJECT: &str = "*";

/// RBAC model with regex objects and actions and a `*` wildcard.
pub const DEFAULT_MODEL: &str = r#"
[request_definition]
r = sub, obj, act

[policy_definition]
p = sub, obj, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = (g(r.sub, p.sub) || p.sub == "*") && (p.obj == "*" || regexMatch(r.obj, p.obj)) && (p.act == "*" || regexMatch(r.act, p.act))
"#;

#[derive(Error, Debug)]
pub enum AclError {
    #[error(transparent)]
    Casbin(#[from] casbin::Error),

    #[error("invalid acl pattern \"{pattern}\": {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("acl is enabled but no policy model is set")]
    MissingPolicy,

    #[error("acl is disabled")]
    Disabled,
}

#[derive(Debug, Clone, Default)]
pub struct AclConfig {
    pub enabled: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// casbin model file; [`DEFAULT_MODEL`] when unset
    pub auth_model: Option<PathBuf>,
    /// casbin CSV policy file
    pub policy_model: Option<PathBuf>,
}

impl FromEnv for AclConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("ACL_");
        Ok(Self {
            enabled: env.bool_or("ENABLED", false)?,
            username: env.take_secret("AUTH_USERNAME"),
            password: env.take_secret("AUTH_PASSWORD"),
            auth_model: env.string("AUTH_MODEL").map(PathBuf::from),
            policy_model: env.string("POLICY_MODEL").map(PathBuf::from),
        })
    }
}

/// A `p` rule of the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub subject: String,
    pub object: String,
    pub action: String,
}

impl Permission {
    fn from_rule(rule: Vec<String>) -> Option<Self> {
        let mut fields = rule.into_iter();
        Some(Self {
            subject: fields.next()?,
            object: fields.next()?,
            action: fields.next()?,
        })
    }
}

/// The enforcer. Policy edits are visible to every clone of the owning `Arc`.
pub struct Acl {
    config: AclConfig,
    enforcer: Option<RwLock<Enforcer>>,
}

impl Acl {
    /// Load the model and policy named by the config. A disabled ACL has no
    /// enforcer.
    pub async fn new(config: AclConfig) -> Result<Self, AclError> {
        if !config.enabled {
            return Ok(Self {
                config,
                enforcer: None,
            });
        }

        let policy = config.policy_model.clone().ok_or(AclError::MissingPolicy)?;
        let model = match &config.auth_model {
            Some(path) => DefaultModel::from_file(path).await?,
            None => DefaultModel::from_str(DEFAULT_MODEL).await?,
        };
        let enforcer = Enforcer::new(model, FileAdapter::new(policy)).await?;
        if config.auth_model.is_none() {
            check_patterns(&enforcer)?;
        }

        Ok(Self {
            config,
            enforcer: Some(RwLock::new(enforcer)),
        })
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Assign `roles` to `user`. Returns false when any of them was
    /// already assigned, in which case nothing is added.
    pub async fn add_user(&self, user: &str, roles: &[&str]) -> Result<bool, AclError> {
        let roles: Vec<String> = roles.iter().map(|role| role.to_string()).collect();
        let mut enforcer = self.enforcer()?.write().await;

        enforcer
            .add_roles_for_user(user, roles.clone(), None)
            .await
            .map_err(|e| {
                tracing::error!(roles = ?roles, error = %e, "failed to add user in acl policy");
                AclError::from(e)
            })
    }

    /// Remove `user` from every role and drop the permissions granted to it
    /// directly. Returns whether anything was removed.
    pub async fn delete_user(&self, user: &str) -> Result<bool, AclError> {
        let mut enforcer = self.enforcer()?.write().await;

        enforcer.delete_user(user).await.map_err(|e| {
            tracing::error!(error = %e, "failed to delete user in acl policy");
            AclError::from(e)
        })
    }

    /// Permissions of `user`, including those inherited through roles.
    pub async fn permissions_for_user(&self, user: &str) -> Result<Vec<Permission>, AclError> {
        let enforcer = self.enforcer().map_err(|e| {
            tracing::error!(error = %e, "failed to get acl permissions");
            e
        })?;
        let rules = enforcer.write().await.get_implicit_permissions_for_user(user, None);

        Ok(rules.into_iter().filter_map(Permission::from_rule).collect())
    }

    /// Every distinct object of the policy.
    pub async fn authorized_routes(&self) -> Result<Vec<String>, AclError> {
        Ok(self.enforcer()?.read().await.get_all_objects())
    }

    /// Whether `subject` may perform `action` on `object`.
    pub async fn enforce(&self, subject: &str, object: &str, action: &str) -> Result<bool, AclError> {
        let enforcer = self.enforcer()?.read().await;
        Ok(enforcer.enforce((subject, object, action))?)
    }

    /// Whether the route is open to everyone.
    pub async fn is_public(&self, object: &str, action: &str) -> Result<bool, AclError> {
        self.enforce(ANY_SUBJECT, object, action).await
    }

    fn enforcer(&self) -> Result<&RwLock<Enforcer>, AclError> {
        self.enforcer.as_ref().ok_or(AclError::Disabled)
    }
}

/// Reject policies whose object or action is not a valid expression for the
/// `regexMatch` calls of [`DEFAULT_MODEL`].
fn check_patterns(enforcer: &Enforcer) -> Result<(), AclError> {
    for rule in enforcer.get_policy() {
        for pattern in rule.iter().skip(1).filter(|p| p.as_str() != "*") {
            Regex::new(pattern).map_err(|source| AclError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    const POLICY: &str = "\
# public
p, *, /health, GET
p, admin, /examples.*, (GET)|(POST)
p, reader, /examples, GET
p, auditor, /audit/[0-9]+, *
p, alice, /notes#draft, GET

g, alice, admin
g, admin, auditor
g, bob, reader
";

    fn file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    fn config(policy: &NamedTempFile) -> AclConfig {
        AclConfig {
            enabled: true,
            policy_model: Some(policy.path().to_path_buf()),
            ..Default::default()
        }
    }

    async fn acl(policy: &NamedTempFile) -> Acl {
        Acl::new(config(policy)).await.unwrap()
    }

    #[tokio::test]
    async fn enforces_direct_and_inherited_permissions() {
        let policy = file(POLICY);
        let acl = acl(&policy).await;

        assert!(acl.enforce("alice", "/examples/create", "POST").await.unwrap());
        assert!(acl.enforce("alice", "/audit/42", "DELETE").await.unwrap());
        assert!(acl.enforce("bob", "/examples", "GET").await.unwrap());
        assert!(!acl.enforce("bob", "/examples", "POST").await.unwrap());
        assert!(!acl.enforce("bob", "/audit/42", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn patterns_are_searched_not_anchored() {
        let policy = file(POLICY);
        let acl = acl(&policy).await;

        assert!(acl.enforce("alice", "/v1/audit/42/x", "GET").await.unwrap());
        assert!(!acl.enforce("alice", "/audit/x", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn comments_are_skipped_and_hashes_kept_in_patterns() {
        let policy = file(POLICY);
        let acl = acl(&policy).await;

        assert!(acl.enforce("alice", "/notes#draft", "GET").await.unwrap());
        assert!(!acl.enforce("bob", "/notes#draft", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn wildcard_subject_is_open_to_anyone() {
        let policy = file(POLICY);
        let acl = acl(&policy).await;

        assert!(acl.is_public("/health", "GET").await.unwrap());
        assert!(acl.enforce("", "/health", "GET").await.unwrap());
        assert!(!acl.is_public("/examples", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn lists_permissions_and_routes() {
        let policy = file(POLICY);
        let acl = acl(&policy).await;

        let mut objects: Vec<String> = acl
            .permissions_for_user("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.object)
            .collect();
        objects.sort();
        assert_eq!(objects, vec!["/audit/[0-9]+", "/examples.*", "/notes#draft"]);

        let mut routes = acl.authorized_routes().await.unwrap();
        routes.sort();
        assert_eq!(
            routes,
            vec!["/audit/[0-9]+", "/examples", "/examples.*", "/health", "/notes#draft"]
        );
    }

    #[tokio::test]
    async fn adds_and_deletes_users() {
        let policy = file(POLICY);
        let acl = acl(&policy).await;

        assert!(acl.add_user("carol", &["reader"]).await.unwrap());
        assert!(!acl.add_user("carol", &["reader"]).await.unwrap());
        assert!(acl.enforce("carol", "/examples", "GET").await.unwrap());

        assert!(acl.delete_user("carol").await.unwrap());
        assert!(!acl.enforce("carol", "/examples", "GET").await.unwrap());
        assert!(!acl.delete_user("carol").await.unwrap());
    }

    #[tokio::test]
    async fn rejects_invalid_patterns() {
        let policy = file("p, admin, /x(, GET\n");

        let err = Acl::new(config(&policy)).await.err().unwrap();
        assert!(matches!(err, AclError::Pattern { pattern, .. } if pattern == "/x("));
    }

    #[tokio::test]
    async fn reads_the_model_file() {
        let model = file(
            "[request_definition]\nr = sub, obj, act\n\n\
             [policy_definition]\np = sub, obj, act\n\n\
             [policy_effect]\ne = some(where (p.eft == allow))\n\n\
             [matchers]\nm = r.sub == p.sub && r.obj == p.obj && r.act == p.act\n",
        );
        let policy = file("p, alice, /examples, GET\n");
        let acl = Acl::new(AclConfig {
            auth_model: Some(model.path().to_path_buf()),
            ..config(&policy)
        })
        .await
        .unwrap();

        assert!(acl.enforce("alice", "/examples", "GET").await.unwrap());
        assert!(!acl.enforce("alice", "/examples/1", "GET").await.unwrap());
    }

    #[tokio::test]
    async fn disabled_or_unconfigured() {
        let acl = Acl::new(AclConfig::default()).await.unwrap();
        assert!(!acl.enabled());
        assert!(matches!(acl.enforce("a", "/", "GET").await, Err(AclError::Disabled)));

        let missing = AclConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(matches!(Acl::new(missing).await, Err(AclError::MissingPolicy)));
    }

    #[test]
    fn reads_config_from_env() {
        let reader = EnvReader::from_map([
            ("ACL_ENABLED", "true"),
            ("ACL_AUTH_MODEL", "/etc/acl/model.conf"),
            ("ACL_POLICY_MODEL", "/etc/acl/policy.csv"),
        ]);
        let config = AclConfig::from_env_reader(&reader).unwrap();

        assert!(config.enabled);
        assert_eq!(config.auth_model, Some(PathBuf::from("/etc/acl/model.conf")));
        assert_eq!(config.policy_model, Some(PathBuf::from("/etc/acl/policy.csv")));
    }
}
