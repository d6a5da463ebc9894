use std::{collections::HashMap, str::FromStr};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{Error, TypeError};

pub type FormData = HashMap<String, Value>;

/// Loosely-typed access over a JSON form body. Front-ends post everything as
/// strings or nested JSON; values are coerced on read.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, Error>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    /// Numbers arrive either as JSON numbers or as stringly-typed form fields.
    pub fn get_number<T>(&self, key: &str) -> Result<T, Error>
    where
        T: FromStr + DeserializeOwned,
    {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => v
                    .parse()
                    .map_err(|_e| TypeError::new("Invalid type conversion").into()),
                None => serde_json::from_value(value.to_owned())
                    .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            },
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, Error> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Failed to parse value as string").into()),
            },
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_list<T>(&self, key: &str) -> Result<Vec<T>, Error>
    where
        T: DeserializeOwned,
    {
        match self.inner.get(key) {
            Some(value) => serde_json::from_value(value.to_owned())
                .map_err(|_e| TypeError::new("Failed to parse value as list").into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> Form {
        let mut data = FormData::new();
        data.insert("name".into(), json!("flour"));
        data.insert("amount".into(), json!("150"));
        data.insert("limit".into(), json!(3));
        data.insert("tags".into(), json!([1, 2, 3]));
        Form::from_data(data)
    }

    #[test]
    fn reads_strings_and_numbers() {
        let f = form();
        assert_eq!(f.get_str("name").unwrap(), "flour");
        assert_eq!(f.get_number::<i32>("amount").unwrap(), 150);
        assert_eq!(f.get_number::<i64>("limit").unwrap(), 3);
    }

    #[test]
    fn reads_lists() {
        let f = form();
        assert_eq!(f.get_list::<i32>("tags").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn missing_key_is_an_error() {
        let f = form();
        assert_eq!(f.get_str("missing").unwrap_err().code, 400);
        assert!(f.get_number::<i32>("name").is_err());
    }
}
