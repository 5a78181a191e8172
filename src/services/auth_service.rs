use crate::config::AdminConfig;
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest};
use crate::utils::{JwtService, verify_password};

/// 管理员登录
#[derive(Clone)]
pub struct AuthService {
    admin: AdminConfig,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(admin: AdminConfig, jwt_service: JwtService) -> Self {
        Self { admin, jwt_service }
    }

    pub fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse> {
        // 用户名或密码错误统一返回同一提示
        let username_ok = request.username.trim() == self.admin.username;
        let password_ok = verify_password(&request.password, &self.admin.password_hash)?;
        if !(username_ok && password_ok) {
            log::warn!("Admin login failed for {}", request.username.trim());
            return Err(AppError::AuthError("Invalid credentials".to_string()));
        }

        let access_token = self.jwt_service.generate_admin_token(&self.admin.username)?;
        log::info!("Admin {} logged in", self.admin.username);
        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}
