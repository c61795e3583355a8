//! Route tables loaded from configuration.

use serde::{Deserialize, Serialize};

/// One named route, as written in a route table.
///
/// ```json
/// [
///   { "name": "home", "path": "/" },
///   { "name": "user", "path": "/user/{id:int}" }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// Unique route name.
    pub name: String,
    /// Path template.
    pub path: String,
}

impl RouteDefinition {
    /// Create a route definition.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_table() {
        let table: Vec<RouteDefinition> = serde_json::from_str(
            r#"[{"name": "home", "path": "/"}, {"name": "user", "path": "/user/{id}"}]"#,
        )
        .unwrap();
        assert_eq!(
            table,
            vec![
                RouteDefinition::new("home", "/"),
                RouteDefinition::new("user", "/user/{id}"),
            ]
        );
    }
}
