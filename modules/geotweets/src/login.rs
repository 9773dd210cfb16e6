/// Login and sign-up are only offered once both fields hold something.
pub fn credentials_complete(username: &str, password: &str) -> bool {
    !username.is_empty() && !password.is_empty()
}
