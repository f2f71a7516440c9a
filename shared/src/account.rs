//! 账户相关的载荷与用户资料

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Viewer,
    /// 后端返回的未知角色，按普通用户处理
    #[serde(other)]
    Other,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// 登录 / 注册共用的凭据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// `auth/login` 成功时的载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user_id: String,
    #[serde(default)]
    pub user_role: Option<UserRole>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// `auth/status` 的载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_role: Option<UserRole>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `tenants/{id}` 返回的租户资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
    pub role: UserRole,
}

/// 会话中保存的用户资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub role: UserRole,
}

impl UserProfile {
    pub fn from_token(token: &AuthToken) -> Self {
        Self {
            id: token.user_id.clone(),
            name: None,
            role: token.user_role.unwrap_or_default(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// 合并租户资料（名称与权威角色）
    pub fn with_tenant(mut self, tenant: Tenant) -> Self {
        self.name = Some(tenant.name);
        self.role = tenant.role;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryRequest {
    pub email: String,
}

/// 使用恢复流程令牌（不同于会话 Bearer 令牌）重设密码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordReset {
    pub access_token: String,
    pub refresh_token: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_roles_fall_back_to_other() {
        let tenant: Tenant =
            serde_json::from_value(json!({"name": "ana", "role": "editor"})).unwrap();
        assert_eq!(tenant.role, UserRole::Other);
        assert!(!tenant.role.is_admin());
    }

    #[test]
    fn token_defaults_to_bearer() {
        let token: AuthToken =
            serde_json::from_value(json!({"access_token": "t", "user_id": "u1"})).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(UserProfile::from_token(&token).role, UserRole::Viewer);
    }

    #[test]
    fn tenant_overrides_role() {
        let token: AuthToken = serde_json::from_value(
            json!({"access_token": "t", "user_id": "u1", "user_role": "viewer"}),
        )
        .unwrap();
        let profile = UserProfile::from_token(&token).with_tenant(Tenant {
            name: "ana".into(),
            role: UserRole::Admin,
        });
        assert!(profile.is_admin());
        assert_eq!(profile.name.as_deref(), Some("ana"));
    }
}
