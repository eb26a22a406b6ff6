use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthParam {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiKeyParam {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, rename = "in")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
}

impl ApiKeyParam {
    /// A missing `in` means header; any other value places the key nowhere.
    pub fn placement(&self) -> Option<ApiKeyLocation> {
        match self.location.as_deref().map(str::trim) {
            None | Some("") | Some("header") => Some(ApiKeyLocation::Header),
            Some("query") => Some(ApiKeyLocation::Query),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OAuth2Config {
    pub access_token_url: String,
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub redirect_uri: Option<String>,
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuth2Grant {
    ClientCredentials,
    Password,
    RefreshToken,
    Unsupported(String),
}

impl OAuth2Config {
    pub fn grant(&self) -> OAuth2Grant {
        match self.grant_type.trim() {
            "client_credentials" => OAuth2Grant::ClientCredentials,
            "password" => OAuth2Grant::Password,
            "refresh_token" => OAuth2Grant::RefreshToken,
            other => OAuth2Grant::Unsupported(other.to_string()),
        }
    }
}

/// Request authentication. `Unknown` keeps the unrecognized type name and
/// is applied exactly like `NoAuth`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "AuthWire")]
pub enum Authentication {
    NoAuth,
    Bearer(Vec<AuthParam>),
    Basic(Vec<AuthParam>),
    ApiKey(Vec<ApiKeyParam>),
    OAuth2(Box<OAuth2Config>),
    Unknown(String),
}

impl Authentication {
    pub fn type_name(&self) -> &str {
        match self {
            Authentication::NoAuth => "noauth",
            Authentication::Bearer(_) => "bearer",
            Authentication::Basic(_) => "basic",
            Authentication::ApiKey(_) => "apikey",
            Authentication::OAuth2(_) => "oauth2",
            Authentication::Unknown(name) => name,
        }
    }
}

/// Looks a credential up by key; position in the list does not matter.
pub fn find_param<'a>(params: &'a [AuthParam], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|param| param.key == key)
        .map(|param| param.value.as_str())
}

#[derive(Deserialize)]
struct AuthWire {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    bearer: Option<Vec<AuthParam>>,
    #[serde(default)]
    basic: Option<Vec<AuthParam>>,
    #[serde(default)]
    apikey: Option<Vec<ApiKeyParam>>,
    #[serde(default)]
    oauth2: Option<Value>,
}

impl From<AuthWire> for Authentication {
    fn from(wire: AuthWire) -> Self {
        let kind = wire.kind.unwrap_or_default().trim().to_lowercase();
        match kind.as_str() {
            "" | "noauth" | "none" => Authentication::NoAuth,
            "bearer" => Authentication::Bearer(wire.bearer.unwrap_or_default()),
            "basic" => Authentication::Basic(wire.basic.unwrap_or_default()),
            "apikey" => Authentication::ApiKey(wire.apikey.unwrap_or_default()),
            "oauth2" => Authentication::OAuth2(Box::new(oauth2_config(wire.oauth2))),
            _ => Authentication::Unknown(kind),
        }
    }
}

/// Accepts the editor's object shape as well as Postman's exported
/// `[{key, value}]` list.
fn oauth2_config(raw: Option<Value>) -> OAuth2Config {
    let object = match raw {
        Some(Value::Object(map)) => map,
        Some(Value::Array(entries)) => {
            let mut map = Map::new();
            for entry in entries {
                if let (Some(key), Some(value)) = (
                    entry.get("key").and_then(Value::as_str),
                    entry.get("value"),
                ) {
                    map.insert(key.to_string(), value.clone());
                }
            }
            map
        }
        _ => return OAuth2Config::default(),
    };
    serde_json::from_value(Value::Object(object)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: Value) -> Authentication {
        serde_json::from_value(value).expect("auth parses")
    }

    #[test]
    fn type_tag_is_case_insensitive() {
        let auth = parse(serde_json::json!({"type": "Bearer", "bearer": [{"key": "token", "value": "T"}]}));
        assert!(matches!(auth, Authentication::Bearer(ref params) if params[0].value == "T"));
    }

    #[test]
    fn unrecognized_type_is_kept_as_unknown() {
        let auth = parse(serde_json::json!({"type": "hawk"}));
        assert_eq!(auth, Authentication::Unknown("hawk".to_string()));
        assert_eq!(parse(serde_json::json!({"type": "noauth"})), Authentication::NoAuth);
    }

    #[test]
    fn basic_lookup_is_by_key() {
        let params = vec![
            AuthParam { key: "password".into(), value: "pw".into(), kind: None },
            AuthParam { key: "username".into(), value: "me".into(), kind: None },
        ];
        assert_eq!(find_param(&params, "username"), Some("me"));
        assert_eq!(find_param(&params, "password"), Some("pw"));
        assert_eq!(find_param(&params, "realm"), None);
    }

    #[test]
    fn oauth2_accepts_object_and_key_value_list() {
        let object = parse(serde_json::json!({
            "type": "oauth2",
            "oauth2": {"grantType": "client_credentials", "accessTokenUrl": "https://t", "clientId": "c"}
        }));
        let list = parse(serde_json::json!({
            "type": "oauth2",
            "oauth2": [
                {"key": "grantType", "value": "client_credentials"},
                {"key": "accessTokenUrl", "value": "https://t"},
                {"key": "clientId", "value": "c"}
            ]
        }));
        assert_eq!(object, list);
        let Authentication::OAuth2(config) = object else {
            panic!("expected oauth2");
        };
        assert_eq!(config.grant(), OAuth2Grant::ClientCredentials);
    }

    #[test]
    fn oauth2_without_config_is_unsupported() {
        let Authentication::OAuth2(config) = parse(serde_json::json!({"type": "oauth2"})) else {
            panic!("expected oauth2");
        };
        assert_eq!(config.grant(), OAuth2Grant::Unsupported(String::new()));
    }

    #[test]
    fn api_key_placement_defaults_to_header() {
        let mut param = ApiKeyParam { key: "k".into(), value: "v".into(), location: None };
        assert_eq!(param.placement(), Some(ApiKeyLocation::Header));
        param.location = Some("query".into());
        assert_eq!(param.placement(), Some(ApiKeyLocation::Query));
        param.location = Some("cookie".into());
        assert_eq!(param.placement(), None);
    }
}
