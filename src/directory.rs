//! Client for the municipal service directory
//!
//! A read-only external endpoint listing municipal service contacts,
//! consumed by the informational screen. One POST with a static bearer
//! credential; the caller never writes. Every failure, transport or
//! shape, is reported as the same generic lookup error.

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::error::{CoreError, Result};

/// One municipal service contact
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceContact {
    /// Row id assigned by the directory
    pub id: i64,
    /// Name of the municipal service
    #[serde(rename = "servicios")]
    pub service_name: String,
    /// Office address
    #[serde(rename = "direccion")]
    pub address: String,
    /// Person in charge
    #[serde(rename = "encargado")]
    pub contact_person: String,
    /// Phone or other contact info
    #[serde(rename = "contacto")]
    pub contact_info: String,
}

/// The directory listing, in the order the endpoint returns it
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDirectory {
    /// Team the listing belongs to
    pub team_name: String,
    /// Municipal service contacts
    pub contacts: Vec<ServiceContact>,
}

#[derive(Deserialize)]
struct DirectoryResponse {
    #[serde(rename = "nombreEquipo")]
    team_name: String,
    #[serde(rename = "datosTablas")]
    tables: TableData,
}

#[derive(Deserialize)]
struct TableData {
    /// Keyed by the backing table's name
    #[serde(rename = "comedatos_ayuda_mejorar_comunidad")]
    contacts: Vec<ServiceContact>,
}

/// Client for the municipal service directory endpoint
#[derive(Debug, Clone)]
pub struct ServiceDirectoryClient {
    http: reqwest::Client,
    config: DirectoryConfig,
}

impl ServiceDirectoryClient {
    /// Build a client for the configured directory endpoint
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            config,
        })
    }

    /// Fetch the service directory listing.
    ///
    /// Any failure, transport, non-success status or unexpected body
    /// shape, comes back as the generic lookup error.
    pub async fn fetch_directory(&self) -> Result<ServiceDirectory> {
        let url = format!(
            "{}/NucleoDigital",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.bearer_token.expose_secret()),
            )
            .json(&json!({
                "email": self.config.email,
                "password": self.config.password.expose_secret(),
            }))
            .send()
            .await
            .map_err(|e| CoreError::DirectoryError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::DirectoryError(format!(
                "directory endpoint answered {}",
                response.status()
            )));
        }

        let body: DirectoryResponse = response
            .json()
            .await
            .map_err(|e| CoreError::DirectoryError(e.to_string()))?;

        debug!(
            team = %body.team_name,
            contacts = body.tables.contacts.len(),
            "fetched service directory"
        );
        Ok(ServiceDirectory {
            team_name: body.team_name,
            contacts: body.tables.contacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_decodes_from_wire_names() {
        let body = r#"{
            "nombreEquipo": "Comedatos",
            "datosTablas": {
                "comedatos_ayuda_mejorar_comunidad": [
                    {
                        "id": 1,
                        "servicios": "Alumbrado Público",
                        "direccion": "Av. Insurgentes 123",
                        "encargado": "Juan Pérez",
                        "contacto": "983 832 1000"
                    }
                ]
            }
        }"#;

        let response: DirectoryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.team_name, "Comedatos");
        assert_eq!(response.tables.contacts.len(), 1);

        let contact = &response.tables.contacts[0];
        assert_eq!(contact.id, 1);
        assert_eq!(contact.service_name, "Alumbrado Público");
        assert_eq!(contact.address, "Av. Insurgentes 123");
        assert_eq!(contact.contact_person, "Juan Pérez");
        assert_eq!(contact.contact_info, "983 832 1000");
    }

    #[test]
    fn test_listing_rejects_missing_table_key() {
        let body = r#"{"nombreEquipo": "Comedatos", "datosTablas": {}}"#;
        assert!(serde_json::from_str::<DirectoryResponse>(body).is_err());
    }
}
