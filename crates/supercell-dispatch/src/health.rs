//! Health checks
//!
//! `/_system/check` is always served and only says the process is up.
//! Named checks added to the environment live under
//! `/_system/check/<name>` and report one of three codes:
//!
//! | code | status | body |
//! |---|---|---|
//! | `OK` | 200 | `{"code": "OK", "ok": true}` |
//! | `WARNING` | 500 | `{"code": "WARNING", "error": true}` |
//! | `ERROR` | 500 | `{"code": "ERROR", "error": true}` |

use crate::handler::{HandlerContext, RequestHandler};
use crate::result::{DomainResult, StatusResult};
use async_trait::async_trait;
use http::StatusCode;
use serde_json::{Value, json};
use supercell_core::Result;

/// Route of the built-in check
pub const SYSTEM_CHECK_PATH: &str = "/_system/check";

/// Path of a named check
pub fn check_path(name: &str) -> String {
	format!("{SYSTEM_CHECK_PATH}/{name}")
}

/// Results for health check handlers.
///
/// # Examples
///
/// ```
/// use http::StatusCode;
/// use serde_json::{Value, json};
/// use supercell_dispatch::HealthCheck;
///
/// let warning = HealthCheck::warning(json!({"lag": 12}));
/// assert_eq!(warning.code(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(
///     warning.to_json(),
///     Some(json!({"error": true, "code": "WARNING", "lag": 12}))
/// );
///
/// assert_eq!(
///     HealthCheck::ok(Value::Null).to_json(),
///     Some(json!({"ok": true, "code": "OK"}))
/// );
/// ```
pub struct HealthCheck;

impl HealthCheck {
	pub fn ok(additional: Value) -> StatusResult {
		StatusResult::ok(with_code("OK", additional))
	}

	pub fn warning(additional: Value) -> StatusResult {
		StatusResult::error(StatusCode::INTERNAL_SERVER_ERROR, with_code("WARNING", additional))
	}

	pub fn error(additional: Value) -> StatusResult {
		StatusResult::error(StatusCode::INTERNAL_SERVER_ERROR, with_code("ERROR", additional))
	}
}

fn with_code(code: &str, additional: Value) -> Value {
	let mut message = serde_json::Map::new();
	message.insert("code".to_string(), Value::String(code.to_string()));
	match additional {
		Value::Object(fields) => message.extend(fields),
		Value::Null => {}
		other => {
			message.insert("message".to_string(), other);
		}
	}
	Value::Object(message)
}

/// The check behind `/_system/check`
pub struct SystemHealthCheck;

#[async_trait]
impl RequestHandler for SystemHealthCheck {
	async fn get(&self, _ctx: &mut HandlerContext) -> Result<DomainResult> {
		Ok(HealthCheck::ok(json!({"message": "API running"})).into())
	}
}
