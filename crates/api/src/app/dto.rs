//! Multipart product forms and JSON envelopes.

use axum::extract::Multipart;
use serde::Serialize;
use serde_json::{Value, json};

use bazaar_core::ValidationError;
use bazaar_infra::{DeleteConfirmation, RawAttachment};
use bazaar_products::{Product, ProductDraft, ProductPatch};

use crate::app::errors;

/// Form part carrying an uploaded image file.
pub const IMAGES_FIELD: &str = "images";
/// Form part carrying one external image URL; may repeat.
pub const IMAGE_URLS_FIELD: &str = "image_urls";

/// Product fields as sent by the client, before numeric parsing.
#[derive(Debug, Default)]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
    pub category: Option<String>,
}

/// A decoded `multipart/form-data` product request.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub fields: ProductFields,
    pub attachments: Vec<RawAttachment>,
    pub image_urls: Vec<String>,
}

impl ProductForm {
    /// Buffer every part of the request. Unknown parts are rejected.
    pub async fn read(mut multipart: Multipart) -> Result<Self, axum::response::Response> {
        let mut form = ProductForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(errors::multipart_error_to_response)?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == IMAGES_FIELD {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let content = field
                    .bytes()
                    .await
                    .map_err(errors::multipart_error_to_response)?;
                form.attachments
                    .push(RawAttachment::new(original_name, mime_type, content.to_vec()));
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(errors::multipart_error_to_response)?;
            let slot = match name.as_str() {
                IMAGE_URLS_FIELD => {
                    if !text.trim().is_empty() {
                        form.image_urls.push(text);
                    }
                    continue;
                }
                "name" => &mut form.fields.name,
                "description" => &mut form.fields.description,
                "price" => &mut form.fields.price,
                "quantity" => &mut form.fields.quantity,
                "category" => &mut form.fields.category,
                other => {
                    return Err(errors::json_error(
                        axum::http::StatusCode::BAD_REQUEST,
                        "unknown_field",
                        format!("unexpected form field '{other}'"),
                    ));
                }
            };
            *slot = Some(text);
        }

        Ok(form)
    }

    /// Fields for a create; every field is required.
    pub fn into_draft(self) -> Result<(ProductDraft, Vec<RawAttachment>, Vec<String>), ValidationError> {
        let f = self.fields;
        let draft = ProductDraft {
            name: required(f.name, "name")?,
            description: required(f.description, "description")?,
            price: parse_number(&required(f.price, "price")?, "price")?,
            quantity: parse_number(&required(f.quantity, "quantity")?, "quantity")?,
            category: required(f.category, "category")?,
            images: Vec::new(),
        };
        Ok((draft, self.attachments, self.image_urls))
    }

    /// Fields for an update; absent fields stay unchanged.
    pub fn into_patch(self) -> Result<(ProductPatch, Vec<RawAttachment>, Vec<String>), ValidationError> {
        let f = self.fields;
        let patch = ProductPatch {
            name: f.name,
            description: f.description,
            price: f.price.map(|p| parse_number(&p, "price")).transpose()?,
            quantity: f.quantity.map(|q| parse_number(&q, "quantity")).transpose()?,
            category: f.category,
            images: None,
        };
        Ok((patch, self.attachments, self.image_urls))
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::MissingField { field })
}

fn parse_number<T: std::str::FromStr>(raw: &str, field: &'static str) -> Result<T, ValidationError> {
    raw.trim().parse().map_err(|_| ValidationError::OutOfRange {
        field,
        reason: format!("must be a number, got '{raw}'"),
    })
}

// -------------------------
// Response envelopes
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductEnvelope<'a> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub product: &'a Product,
}

impl<'a> ProductEnvelope<'a> {
    pub fn new(product: &'a Product) -> Self {
        Self {
            success: true,
            message: None,
            product,
        }
    }

    pub fn with_message(product: &'a Product, message: &'static str) -> Self {
        Self {
            success: true,
            message: Some(message),
            product,
        }
    }
}

pub fn products_envelope(products: &[Product]) -> Value {
    json!({ "success": true, "products": products })
}

pub fn deleted_envelope(confirmation: &DeleteConfirmation) -> Value {
    json!({
        "success": true,
        "message": "Product deleted successfully",
        "productId": confirmation.product_id,
        "releasedFiles": confirmation.released_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ProductFields {
        ProductFields {
            name: Some("Mug".into()),
            description: Some("Blue glaze".into()),
            price: Some("12.50".into()),
            quantity: Some(" 7 ".into()),
            category: Some("kitchen".into()),
        }
    }

    #[test]
    fn complete_fields_become_a_draft() {
        let form = ProductForm {
            fields: fields(),
            ..ProductForm::default()
        };
        let (draft, attachments, urls) = form.into_draft().unwrap();
        assert_eq!(draft.price, 12.5);
        assert_eq!(draft.quantity, 7);
        assert!(attachments.is_empty() && urls.is_empty());
    }

    #[test]
    fn missing_create_field_is_reported_by_name() {
        let mut f = fields();
        f.category = None;
        let form = ProductForm {
            fields: f,
            ..ProductForm::default()
        };
        assert_eq!(
            form.into_draft().unwrap_err(),
            ValidationError::MissingField { field: "category" }
        );
    }

    #[test]
    fn patch_keeps_absent_fields_unset_and_rejects_bad_numbers() {
        let form = ProductForm {
            fields: ProductFields {
                quantity: Some("0".into()),
                ..ProductFields::default()
            },
            ..ProductForm::default()
        };
        let (patch, _, _) = form.into_patch().unwrap();
        assert_eq!(patch.quantity, Some(0));
        assert!(patch.name.is_none() && patch.price.is_none());

        let form = ProductForm {
            fields: ProductFields {
                price: Some("cheap".into()),
                ..ProductFields::default()
            },
            ..ProductForm::default()
        };
        assert!(matches!(
            form.into_patch(),
            Err(ValidationError::OutOfRange { field: "price", .. })
        ));
    }
}
