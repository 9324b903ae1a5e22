use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("window not found: {0}")]
    WindowNotFound(String),
    #[error("tauri error: {0}")]
    Tauri(#[from] tauri::Error),
}

// serialized as a plain message for the front end
impl serde::Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_message() {
        let err = CommandError::WindowNotFound("quick-chat".into());
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!("window not found: quick-chat")
        );
    }
}
