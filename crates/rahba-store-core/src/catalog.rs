//! Product catalog: slugs, creation, updates, listings

use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use rahba_db::{
    CreateProduct, ProductFilter, ProductRepository, ProductRow, TenantRepository, UpdateProduct,
};

use crate::error::StoreError;
use crate::quota::QuotaGuard;

/// Random characters appended to every slug.
const SLUG_SUFFIX_LEN: usize = 5;

/// Longest slug stem kept from the product name.
const SLUG_STEM_MAX: usize = 60;

const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Upper bound for list pagination.
pub const MAX_PAGE_SIZE: i64 = 100;

/// New product input.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub name_ar: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
}

/// Partial product update; None fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub category: Option<String>,
}

/// Catalog service
pub struct CatalogService<P: ProductRepository, T: TenantRepository> {
    products: Arc<P>,
    quota: QuotaGuard<T>,
}

impl<P: ProductRepository, T: TenantRepository> CatalogService<P, T> {
    /// Create a new catalog service
    pub fn new(products: Arc<P>, quota: QuotaGuard<T>) -> Self {
        Self { products, quota }
    }

    /// Create a product, taking a quota slot first.
    ///
    /// The slot is taken before the insert and given back if the insert
    /// fails, so the stored count never undercounts live products.
    pub async fn create_product(
        &self,
        tenant_id: Uuid,
        input: NewProduct,
    ) -> Result<ProductRow, StoreError> {
        let name = require_name(&input.name)?;
        validate_price(input.price)?;
        validate_stock(input.stock)?;

        self.quota.reserve_product_slot(tenant_id).await?;

        let slug = generate_slug(&name);
        let created = self
            .products
            .create(CreateProduct {
                id: Uuid::new_v4(),
                tenant_id,
                name: name.clone(),
                name_ar: none_if_blank(input.name_ar),
                price: input.price,
                stock: input.stock,
                slug,
                is_active: true,
                category: none_if_blank(input.category),
            })
            .await;

        match created {
            Ok(row) => {
                info!(tenant_id = %tenant_id, product_id = %row.id, slug = %row.slug, "product created");
                Ok(row)
            }
            Err(err) => {
                if let Err(release_err) = self.quota.release_product_slot(tenant_id).await {
                    warn!(
                        tenant_id = %tenant_id,
                        error = %release_err,
                        "failed to release product slot after create failure"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Partially update a product. Renaming regenerates the slug, so a
    /// renamed product gets a fresh storefront URL.
    pub async fn update_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
        changes: ProductChanges,
    ) -> Result<ProductRow, StoreError> {
        let name = match changes.name {
            Some(raw) => Some(require_name(&raw)?),
            None => None,
        };
        if let Some(price) = changes.price {
            validate_price(price)?;
        }
        if let Some(stock) = changes.stock {
            validate_stock(stock)?;
        }

        let slug = name.as_deref().map(generate_slug);

        self.products
            .update(
                tenant_id,
                product_id,
                UpdateProduct {
                    name,
                    name_ar: changes.name_ar,
                    price: changes.price,
                    stock: changes.stock,
                    slug,
                    is_active: changes.is_active,
                    category: changes.category,
                },
            )
            .await?
            .ok_or(StoreError::NotFound("Product"))
    }

    /// Delete a product and free its quota slot.
    pub async fn delete_product(&self, tenant_id: Uuid, product_id: Uuid) -> Result<(), StoreError> {
        let removed = self.products.delete(tenant_id, product_id).await?;
        if !removed {
            return Err(StoreError::NotFound("Product"));
        }
        self.quota.release_product_slot(tenant_id).await?;
        info!(tenant_id = %tenant_id, product_id = %product_id, "product deleted");
        Ok(())
    }

    /// Fetch one product within a tenant.
    pub async fn get_product(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<ProductRow, StoreError> {
        self.products
            .find_by_id(tenant_id, product_id)
            .await?
            .ok_or(StoreError::NotFound("Product"))
    }

    /// List products for the merchant dashboard.
    pub async fn list_products(
        &self,
        tenant_id: Uuid,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRow>, StoreError> {
        let filter = ProductFilter {
            is_active,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset: offset.max(0),
        };
        Ok(self.products.list(tenant_id, filter).await?)
    }

    /// List only active products, for the public storefront.
    pub async fn storefront_products(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRow>, StoreError> {
        self.list_products(tenant_id, Some(true), limit, offset).await
    }
}

impl<P: ProductRepository, T: TenantRepository> std::fmt::Debug for CatalogService<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish()
    }
}

// =============================================================================
// Slug generation
// =============================================================================

/// Build a URL slug from a product name: a kebab-case stem from the
/// ASCII-alphanumeric parts of the name, plus a random suffix so equal
/// names within a store stay distinct. Names with no ASCII content
/// (Arabic product names, typically) produce a suffix-only slug.
pub fn generate_slug(name: &str) -> String {
    let stem = slug_stem(name);
    let suffix = random_slug_suffix();
    if stem.is_empty() {
        suffix
    } else {
        format!("{}-{}", stem, suffix)
    }
}

fn slug_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    let mut last_was_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            stem.push('-');
            last_was_dash = true;
        }
        if stem.len() >= SLUG_STEM_MAX {
            break;
        }
    }

    stem.trim_matches('-').to_string()
}

fn random_slug_suffix() -> String {
    let mut rng = rand::rng();
    (0..SLUG_SUFFIX_LEN)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

// =============================================================================
// Field validation
// =============================================================================

fn require_name(raw: &str) -> Result<String, StoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("product name is required".into()));
    }
    if name.chars().count() > 200 {
        return Err(StoreError::Validation(
            "product name must be at most 200 characters".into(),
        ));
    }
    Ok(name.to_string())
}

fn validate_price(price: Decimal) -> Result<(), StoreError> {
    if price < Decimal::ZERO {
        return Err(StoreError::Validation("price cannot be negative".into()));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), StoreError> {
    if stock < 0 {
        return Err(StoreError::Validation("stock cannot be negative".into()));
    }
    Ok(())
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_keeps_ascii_and_appends_suffix() {
        let slug = generate_slug("Robe Kabyle Touche Moderne");
        let (stem, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(stem, "robe-kabyle-touche-moderne");
        assert_eq!(suffix.len(), SLUG_SUFFIX_LEN);
    }

    #[test]
    fn arabic_only_names_get_suffix_only_slugs() {
        let slug = generate_slug("قفطان صيفي");
        assert_eq!(slug.len(), SLUG_SUFFIX_LEN);
        assert!(slug.chars().all(|c| SLUG_ALPHABET.contains(&(c as u8))));
    }

    #[test]
    fn slug_collapses_punctuation_runs() {
        let slug = generate_slug("  Tee -- shirt / (XL)!  ");
        assert!(slug.starts_with("tee-shirt-xl-"));
    }

    #[test]
    fn equal_names_produce_distinct_slugs() {
        let a = generate_slug("Sandale");
        let b = generate_slug("Sandale");
        assert_ne!(a, b);
    }

    #[test]
    fn name_and_price_rules() {
        assert!(require_name("   ").is_err());
        assert!(require_name(&"x".repeat(201)).is_err());
        assert!(require_name("Couscoussier 8L").is_ok());
        assert!(validate_price(Decimal::from(-1)).is_err());
        assert!(validate_stock(-3).is_err());
    }
}
