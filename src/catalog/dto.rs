use serde::{Deserialize, Serialize};

use crate::store::model::{Category, FilePayload, LicenseType, Product};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<Category>,
}

/// Admin product form. Only `name` and `price` are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub image_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub version: Option<String>,
    #[serde(default)]
    pub license_type: LicenseType,
    pub file: Option<FilePayload>,
    pub demo_file: Option<FilePayload>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty");
        }
        if self.price == 0 {
            return Err("price must be positive");
        }
        Ok(())
    }
}

/// Attachment metadata without the Base64 body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl From<&FilePayload> for FileInfo {
    fn from(f: &FilePayload) -> Self {
        Self {
            name: f.name.clone(),
            size: f.size.clone(),
        }
    }
}

/// Catalog entry for anonymous callers. File bodies are only served by the
/// download routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub category: Category,
    pub image_url: String,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub license_type: LicenseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_file: Option<FileInfo>,
}

impl From<Product> for CatalogProduct {
    fn from(p: Product) -> Self {
        Self {
            file: p.file.as_ref().map(FileInfo::from),
            demo_file: p.demo_file.as_ref().map(FileInfo::from),
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category,
            image_url: p.image_url,
            features: p.features,
            version: p.version,
            license_type: p.license_type,
        }
    }
}
