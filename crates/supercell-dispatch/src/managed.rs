//! Named objects shared by every handler of an application

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use supercell_core::{Error, Result};

/// Objects registered on the environment, looked up by name and type.
///
/// # Examples
///
/// ```
/// use supercell_dispatch::ManagedObjects;
///
/// let mut managed = ManagedObjects::new();
/// managed.insert("greeting", String::from("hello")).unwrap();
///
/// assert_eq!(managed.get::<String>("greeting").as_deref().map(String::as_str), Some("hello"));
/// assert!(managed.get::<u32>("greeting").is_none());
/// assert!(managed.insert("greeting", 1u32).is_err());
/// ```
#[derive(Default, Clone)]
pub struct ManagedObjects {
	objects: IndexMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ManagedObjects {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `value` under `name`. Names are unique.
	pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) -> Result<()> {
		let name = name.into();
		if self.objects.contains_key(&name) {
			return Err(Error::DuplicateRegistration(format!("managed object `{name}`")));
		}
		self.objects.insert(name, Arc::new(value));
		Ok(())
	}

	/// The object under `name`, if it exists and is a `T`.
	pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
		self.objects.get(name)?.clone().downcast::<T>().ok()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.objects.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.objects.keys().map(String::as_str)
	}
}

impl fmt::Debug for ManagedObjects {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.objects.keys()).finish()
	}
}
