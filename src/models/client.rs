//! Client model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::enums::ClientType;
use super::{collect_errors, finish, non_blank, parse_enum_field, reject_field};
use crate::error::{AppError, AppResult};

/// Client record: a person who can receive a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// National identity document number, unique regardless of case
    pub cin: String,
    #[serde(rename = "type")]
    pub client_type: ClientType,
    pub location: String,
    pub phone: String,
    /// Scan of the identity document (opaque, usually a data URL)
    pub cin_image: Option<String>,
    /// False while the client holds an active assignment
    pub available: bool,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive CIN comparison
    pub fn has_cin(&self, cin: &str) -> bool {
        cin_key(&self.cin) == cin_key(cin)
    }
}

/// Key under which CIN uniqueness is enforced
pub fn cin_key(cin: &str) -> String {
    cin.trim().to_lowercase()
}

/// Client with a description of the vehicle it currently holds
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientWithAssignment {
    #[serde(flatten)]
    pub client: Client,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_vehicle: Option<String>,
}

/// Client list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ClientQuery {
    /// Exact CIN match, case-insensitive
    pub cin: Option<String>,
}

fn require_text(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        reject_field(errors, field, "required", &format!("{} must not be blank", field));
    }
}

/// Create client request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClient {
    #[validate(length(max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(length(max = 32, message = "CIN must be at most 32 characters"))]
    pub cin: String,
    /// new or existing
    #[serde(rename = "type")]
    pub client_type: String,
    #[validate(length(max = 200))]
    pub location: String,
    #[validate(length(max = 32))]
    pub phone: String,
    pub cin_image: Option<String>,
}

impl CreateClient {
    fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            cin: self.cin.trim().to_string(),
            client_type: self.client_type,
            location: self.location.trim().to_string(),
            phone: self.phone.trim().to_string(),
            cin_image: self.cin_image,
        }
    }

    /// Validate the request and build a new, available client record
    pub fn into_client(self) -> AppResult<Client> {
        let data = self.trimmed();
        let mut errors = collect_errors(data.validate());
        require_text(&mut errors, "firstName", &data.first_name);
        require_text(&mut errors, "lastName", &data.last_name);
        require_text(&mut errors, "cin", &data.cin);
        require_text(&mut errors, "location", &data.location);
        require_text(&mut errors, "phone", &data.phone);
        let client_type = parse_enum_field::<ClientType>(&mut errors, "type", &data.client_type);
        finish(errors)?;

        let Some(client_type) = client_type else {
            return Err(AppError::Validation("Invalid client data".to_string()));
        };

        Ok(Client {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            cin: data.cin,
            client_type,
            location: data.location,
            phone: data.phone,
            cin_image: non_blank(data.cin_image),
            available: true,
        })
    }
}

/// Update client request (only supplied fields change).
///
/// Availability is not accepted here; it follows the client's assignments.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32, message = "CIN must be at most 32 characters"))]
    pub cin: Option<String>,
    #[serde(rename = "type")]
    pub client_type: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    /// Empty string clears the stored image
    pub cin_image: Option<String>,
}

impl UpdateClient {
    fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            first_name: trim(self.first_name),
            last_name: trim(self.last_name),
            cin: trim(self.cin),
            client_type: self.client_type,
            location: trim(self.location),
            phone: trim(self.phone),
            cin_image: self.cin_image,
        }
    }

    /// Merge the supplied fields into `client`
    pub fn apply_to(self, client: &mut Client) -> AppResult<()> {
        let data = self.trimmed();
        let mut errors = collect_errors(data.validate());
        for (field, value) in [
            ("firstName", &data.first_name),
            ("lastName", &data.last_name),
            ("cin", &data.cin),
            ("location", &data.location),
            ("phone", &data.phone),
        ] {
            if let Some(value) = value {
                require_text(&mut errors, field, value);
            }
        }
        let client_type = data
            .client_type
            .as_deref()
            .and_then(|raw| parse_enum_field::<ClientType>(&mut errors, "type", raw));
        finish(errors)?;

        if let Some(first_name) = data.first_name {
            client.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            client.last_name = last_name;
        }
        if let Some(cin) = data.cin {
            client.cin = cin;
        }
        if let Some(client_type) = client_type {
            client.client_type = client_type;
        }
        if let Some(location) = data.location {
            client.location = location;
        }
        if let Some(phone) = data.phone {
            client.phone = phone;
        }
        if data.cin_image.is_some() {
            client.cin_image = non_blank(data.cin_image);
        }
        Ok(())
    }
}
