//! CycloneDX software bill of materials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sbom {
    pub bom_format: String,
    pub spec_version: String,
    pub serial_number: String,
    pub version: u32,
    pub metadata: SbomMetadata,
    pub components: Vec<serde_json::Value>,
    pub vulnerabilities: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomMetadata {
    pub timestamp: DateTime<Utc>,
    pub component: SbomComponent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SbomComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(rename = "bom-ref")]
    pub bom_ref: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub licenses: Vec<LicenseChoice>,
    pub external_references: Vec<ExternalReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseChoice {
    pub license: License,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalReference {
    #[serde(rename = "type")]
    pub reference_type: String,
    pub url: String,
}

impl Sbom {
    /// SBOM describing one OpenSSL package build.
    pub fn for_package(package_name: &str, version: &str) -> Self {
        Self {
            bom_format: "CycloneDX".to_string(),
            spec_version: "1.5".to_string(),
            serial_number: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            version: 1,
            metadata: SbomMetadata {
                timestamp: Utc::now(),
                component: SbomComponent {
                    component_type: "library".to_string(),
                    bom_ref: format!("{}@{}", package_name, version),
                    name: package_name.to_string(),
                    version: version.to_string(),
                    description: format!("OpenSSL {} package", package_name),
                    licenses: vec![LicenseChoice {
                        license: License {
                            id: "Apache-2.0".to_string(),
                        },
                    }],
                    external_references: vec![
                        ExternalReference {
                            reference_type: "website".to_string(),
                            url: "https://www.openssl.org".to_string(),
                        },
                        ExternalReference {
                            reference_type: "vcs".to_string(),
                            url: "https://github.com/openssl/openssl".to_string(),
                        },
                    ],
                },
            },
            components: vec![],
            vulnerabilities: vec![],
        }
    }
}
