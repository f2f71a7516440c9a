//! 身份提供方回调解析
//!
//! 注册确认与密码恢复邮件会带着 `#access_token=...&type=signup|recovery`
//! 跳回前端。这里把 URL 片段解析为带类型的回调结果，替代字符串匹配。

use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthCallback {
    /// 片段中没有可识别的回调
    #[default]
    None,
    /// 注册邮件确认
    SignupConfirmation { access_token: String },
    /// 密码恢复，令牌用于随后的重设密码请求
    PasswordRecovery {
        access_token: String,
        refresh_token: Option<String>,
    },
}

impl AuthCallback {
    /// 解析 `location.hash`（可带或不带前导 `#`）
    pub fn parse(fragment: &str) -> Self {
        let fragment = fragment.trim_start_matches('#');
        if fragment.is_empty() {
            return Self::None;
        }

        let mut access_token = None;
        let mut refresh_token = None;
        let mut kind = None;
        for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
            match key.as_ref() {
                "access_token" if !value.is_empty() => access_token = Some(value.into_owned()),
                "refresh_token" if !value.is_empty() => refresh_token = Some(value.into_owned()),
                "type" => kind = Some(value.into_owned()),
                _ => {}
            }
        }

        let Some(access_token) = access_token else {
            return Self::None;
        };

        match kind.as_deref() {
            Some("signup") => Self::SignupConfirmation { access_token },
            Some("recovery") => Self::PasswordRecovery {
                access_token,
                refresh_token,
            },
            _ => Self::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_fragment_carries_both_tokens() {
        let cb = AuthCallback::parse(
            "#access_token=abc&expires_in=3600&refresh_token=r1&token_type=bearer&type=recovery",
        );
        assert_eq!(
            cb,
            AuthCallback::PasswordRecovery {
                access_token: "abc".into(),
                refresh_token: Some("r1".into()),
            }
        );
    }

    #[test]
    fn signup_fragment_without_hash_prefix() {
        assert_eq!(
            AuthCallback::parse("access_token=xyz&type=signup"),
            AuthCallback::SignupConfirmation {
                access_token: "xyz".into()
            }
        );
    }

    #[test]
    fn marker_without_token_is_ignored() {
        assert!(AuthCallback::parse("#type=recovery").is_none());
        assert!(AuthCallback::parse("#access_token=&type=signup").is_none());
    }

    #[test]
    fn unrelated_fragments_are_ignored() {
        assert!(AuthCallback::parse("").is_none());
        assert!(AuthCallback::parse("#section-2").is_none());
        assert!(AuthCallback::parse("#access_token=abc&type=magiclink").is_none());
    }
}
