use bcrypt::verify;
use crate::error::{AppError, AppResult};

/// 验证密码
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))
}

/// 访客访问口令比较: 忽略首尾空白与大小写
pub fn access_password_matches(input: &str, expected: &str) -> bool {
    input.trim().to_lowercase() == expected.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Password123";
        let hashed = bcrypt::hash(password, 4).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("WrongPassword", &hashed).unwrap());
    }

    #[test]
    fn test_access_password_matches() {
        assert!(access_password_matches("  Sorteio ", "sorteio"));
        assert!(!access_password_matches("sorteio2", "sorteio"));
    }
}
