use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[inline]
fn default_limit() -> i64 {
	15
}

/// Limit/offset pagination, read from the query string.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The maximum number of items to return.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "default_limit")]
	pub limit: i64,
	/// The number of items to skip.
	#[validate(range(min = 0))]
	#[serde(default)]
	pub offset: i64,
}

/// A page of results along with the total number of items.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub count: i64,
	pub results: Vec<T>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::Paginate;

	#[test]
	fn test_paginate_defaults() {
		let paginate = serde_json::from_value::<Paginate>(serde_json::json!({})).unwrap();

		assert_eq!(paginate.limit, 15);
		assert_eq!(paginate.offset, 0);
	}

	#[test]
	fn test_paginate_bounds() {
		assert!(Paginate { limit: 0, offset: 0 }.validate().is_err());
		assert!(Paginate { limit: 101, offset: 0 }.validate().is_err());
		assert!(Paginate { limit: 10, offset: -1 }.validate().is_err());
		assert!(Paginate { limit: 100, offset: 40 }.validate().is_ok());
	}
}
