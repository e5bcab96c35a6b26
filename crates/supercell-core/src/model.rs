//! The model contract
//!
//! Any `Serialize + Validate` type is a [`Model`]. Consumers build models
//! from JSON mappings through a [`ModelType`], which deserializes and then
//! validates, reporting failures per field.

use crate::exception::{Error, Result, ValidationErrors};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId};
use std::fmt;
use validator::Validate;

/// A typed value that can be validated and serialized to a JSON mapping.
pub trait Model: Any + Send + Sync {
	/// Serializes the model to a JSON value.
	fn to_value(&self) -> Result<Value>;

	/// Serializes the model to JSON bytes, fields in declaration order.
	fn to_json_vec(&self) -> Result<Vec<u8>>;

	/// Runs the model's own validation rules.
	fn validate_model(&self) -> std::result::Result<(), ValidationErrors>;

	/// Type name, for logs.
	fn model_name(&self) -> &'static str;

	fn as_any(&self) -> &dyn Any;

	fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> Model for T
where
	T: Serialize + Validate + Send + Sync + 'static,
{
	fn to_value(&self) -> Result<Value> {
		Ok(serde_json::to_value(self)?)
	}

	fn to_json_vec(&self) -> Result<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}

	fn validate_model(&self) -> std::result::Result<(), ValidationErrors> {
		self.validate().map_err(ValidationErrors::from)
	}

	fn model_name(&self) -> &'static str {
		std::any::type_name::<T>()
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
		self
	}
}

impl dyn Model {
	pub fn is<T: Model>(&self) -> bool {
		self.as_any().is::<T>()
	}

	pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
		self.as_any().downcast_ref::<T>()
	}

	/// Recovers the concrete model, or `None` on a type mismatch.
	pub fn downcast<T: Model>(self: Box<Self>) -> Option<Box<T>> {
		self.into_any().downcast::<T>().ok()
	}
}

/// Descriptor used to construct a model of a type known at route setup.
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use supercell_core::{Error, ModelType};
/// use validator::Validate;
///
/// #[derive(Serialize, Deserialize, Validate)]
/// struct Note {
///     #[validate(length(min = 1))]
///     message: String,
///     number: i64,
/// }
///
/// let model_type = ModelType::of::<Note>();
/// let model = model_type.from_slice(br#"{"message": "hi", "number": 1}"#).unwrap();
/// assert_eq!(model.downcast_ref::<Note>().unwrap().number, 1);
///
/// let invalid = model_type.from_slice(br#"{"message": "", "number": 1}"#);
/// assert!(matches!(invalid, Err(Error::Validation(_))));
/// ```
#[derive(Clone, Copy)]
pub struct ModelType {
	name: &'static str,
	type_id: TypeId,
	build: fn(Value) -> Result<Box<dyn Model>>,
}

impl ModelType {
	pub fn of<T>() -> Self
	where
		T: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
	{
		Self {
			name: std::any::type_name::<T>(),
			type_id: TypeId::of::<T>(),
			build: build_model::<T>,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn is<T: 'static>(&self) -> bool {
		self.type_id == TypeId::of::<T>()
	}

	/// Builds and validates a model from a JSON mapping.
	pub fn from_value(&self, value: Value) -> Result<Box<dyn Model>> {
		(self.build)(value)
	}

	/// Parses a JSON document and builds the model from it.
	pub fn from_slice(&self, bytes: &[u8]) -> Result<Box<dyn Model>> {
		let value: Value =
			serde_json::from_slice(bytes).map_err(|e| Error::Validation(e.into()))?;
		self.from_value(value)
	}
}

impl PartialEq for ModelType {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}

impl Eq for ModelType {}

impl fmt::Debug for ModelType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ModelType").field(&self.name).finish()
	}
}

fn build_model<T>(value: Value) -> Result<Box<dyn Model>>
where
	T: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
{
	let model: T = serde_json::from_value(value).map_err(|e| Error::Validation(e.into()))?;
	model.validate_model()?;
	Ok(Box::new(model))
}
