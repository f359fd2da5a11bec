use crate::models::user::User as UserModel;
use serde::{Deserialize, Serialize};

/// Response body of the identity service's "current user" endpoint.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserForm {
    pub user: User,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub email_confirmed: bool,
}

impl TryInto<UserModel> for UserForm {
    type Error = String;

    fn try_into(self) -> Result<UserModel, Self::Error> {
        if self.user.id.trim().is_empty() {
            return Err("identity response carries no user id".to_string());
        }

        Ok(UserModel {
            id: self.user.id,
            first_name: self.user.first_name,
            last_name: self.user.last_name,
            email: self.user.email,
            role: self.user.role,
            email_confirmed: self.user.email_confirmed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_but_id_is_required() {
        let form: UserForm =
            serde_json::from_str(r#"{"user":{"_id":"u-1","role":"group_admin"}}"#).unwrap();
        let user: UserModel = form.try_into().unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.role, "group_admin");

        let form: UserForm = serde_json::from_str(r#"{"user":{"email":"a@b.c"}}"#).unwrap();
        let result: Result<UserModel, String> = form.try_into();
        assert!(result.is_err());
    }
}
