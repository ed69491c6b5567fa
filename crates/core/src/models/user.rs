use serde::{Deserialize, Serialize};

use crate::utils::lenient;

const DEFAULT_USER_STATUS: &str = "Active";

/// Actor role. Wire values follow the backend (`USER` is a recipient).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    #[serde(rename = "USER", alias = "RECIPIENT")]
    Recipient,
    #[serde(rename = "PARTNER")]
    Partner,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::Recipient => "USER",
            Role::Partner => "PARTNER",
            Role::Admin => "ADMIN",
        }
    }
}

/// An authenticated actor as returned by the backend `login` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", from = "UserRow")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub avatar: String,
    pub address: String,
    pub owner_name: String,
    pub status: String,
    pub created_at: String,
}

/// Raw user row. Sheets may carry the same value under several column
/// headers, so each alias is read separately and the first non-empty wins.
#[derive(Deserialize)]
struct UserRow {
    #[serde(default, deserialize_with = "lenient::string")]
    id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    email: String,
    #[serde(default)]
    role: Role,
    #[serde(default, deserialize_with = "lenient::string")]
    phone: String,
    #[serde(default, deserialize_with = "lenient::string")]
    avatar: String,
    #[serde(default, deserialize_with = "lenient::string")]
    address: String,
    #[serde(default, deserialize_with = "lenient::string")]
    alamat: String,
    #[serde(default, rename = "Alamat", deserialize_with = "lenient::string")]
    alamat_header: String,
    #[serde(default, rename = "Link Maps", deserialize_with = "lenient::string")]
    link_maps: String,
    #[serde(default, rename = "ownerName", deserialize_with = "lenient::string")]
    owner_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    nama_pemilik: String,
    #[serde(default, rename = "Nama Pemilik", deserialize_with = "lenient::string")]
    nama_pemilik_header: String,
    #[serde(default, deserialize_with = "lenient::string")]
    status: String,
    #[serde(default, rename = "createdAt", deserialize_with = "lenient::string")]
    created_at: String,
}

fn first_non_empty(candidates: [String; 4]) -> String {
    candidates
        .into_iter()
        .find(|v| !v.trim().is_empty())
        .unwrap_or_default()
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            phone: row.phone,
            avatar: row.avatar,
            address: first_non_empty([row.address, row.alamat, row.link_maps, row.alamat_header]),
            owner_name: first_non_empty([
                row.owner_name,
                row.nama_pemilik,
                row.nama_pemilik_header,
                String::new(),
            ]),
            status: row.status,
            created_at: row.created_at,
        }
    }
}

impl User {
    /// Fills the defaults the backend leaves out of a user row. Applied to
    /// backend rows only; cached users are read back as written.
    pub(crate) fn normalized(mut self) -> Self {
        if self.id.is_empty() {
            self.id = "0".to_string();
        }
        if self.status.is_empty() {
            self.status = DEFAULT_USER_STATUS.to_string();
        }
        self
    }

    /// Identity used to detect account switches: unique id plus role.
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: if self.id.is_empty() || self.id == "0" {
                self.email.clone()
            } else {
                self.id.clone()
            },
            role: self.role,
        }
    }
}

/// Identity of the signed-in actor; a change triggers a full refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    pub user_id: String,
    pub role: Role,
}

/// Sign-up form data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: String,
    pub avatar: Option<String>,
    pub address: String,
    pub owner_name: String,
}

/// Result of a successful `register_user` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredUser {
    pub user_id: String,
    pub message: String,
}

/// Editable profile fields; email identifies the row and cannot change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    pub avatar: String,
    pub address: String,
    pub owner_name: String,
}
