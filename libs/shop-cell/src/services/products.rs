use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use auth_cell::guard;
use shared_database::ProductRepository;
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;
use shared_models::shop::{Product, ProductFilters};

use crate::models::{CreateProductRequest, ShopError, UpdateProductRequest};

/// Upper bound for a single veterinarian's catalog listing.
const CATALOG_PAGE_LIMIT: usize = 500;

pub struct ProductService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> ProductService<'a, R>
where
    R: ProductRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Admins may place the product in another veterinarian's catalog.
    pub async fn create_product(
        &self,
        actor: &Actor,
        owner: Option<String>,
        request: CreateProductRequest,
    ) -> Result<Product, AppError> {
        let veterinarian_id = match &actor.role {
            Role::Veterinarian => actor.id.clone(),
            Role::Admin => owner
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| actor.id.clone()),
            _ => return Err(ShopError::ProductCreationNotAllowed.into()),
        };

        if request.name.trim().is_empty() || request.category.trim().is_empty() || request.price <= 0.0 {
            return Err(ShopError::MissingProductFields.into());
        }
        if request.stock_quantity < 0 {
            return Err(ShopError::NegativeStock.into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            veterinarian_id,
            name: request.name.trim().to_string(),
            description: request.description,
            category: request.category.trim().to_string(),
            price: request.price,
            stock_quantity: request.stock_quantity,
            sku: request.sku,
            brand: request.brand,
            weight: request.weight,
            dimensions: request.dimensions,
            is_prescription_required: request.is_prescription_required,
            is_active: true,
            images: request.images,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create_product(&product).await?;
        info!("Created product {} for veterinarian {}", created.id, created.veterinarian_id);
        Ok(created)
    }

    pub async fn list_products(&self, filters: &ProductFilters) -> Result<Vec<Product>, AppError> {
        Ok(self.repo.list_products(filters).await?)
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, AppError> {
        Ok(self.repo.get_product(product_id).await?)
    }

    pub async fn update_product(
        &self,
        actor: &Actor,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<Product, AppError> {
        let mut product = self.repo.get_product(product_id).await?;
        guard::authorize_product(actor, &product)?;

        if let Some(name) = request.name.filter(|n| !n.trim().is_empty()) {
            product.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            product.description = description;
        }
        if let Some(category) = request.category.filter(|c| !c.trim().is_empty()) {
            product.category = category.trim().to_string();
        }
        if let Some(price) = request.price {
            if price <= 0.0 {
                return Err(ShopError::InvalidPrice.into());
            }
            product.price = price;
        }
        if let Some(stock) = request.stock_quantity {
            if stock < 0 {
                return Err(ShopError::NegativeStock.into());
            }
            product.stock_quantity = stock;
        }
        if let Some(sku) = request.sku {
            product.sku = sku;
        }
        if let Some(brand) = request.brand {
            product.brand = brand;
        }
        if let Some(weight) = request.weight {
            product.weight = weight;
        }
        if let Some(dimensions) = request.dimensions {
            product.dimensions = dimensions;
        }
        if let Some(required) = request.is_prescription_required {
            product.is_prescription_required = required;
        }
        if let Some(active) = request.is_active {
            product.is_active = active;
        }
        if let Some(images) = request.images {
            product.images = images;
        }
        product.updated_at = Utc::now();

        Ok(self.repo.update_product(&product).await?)
    }

    /// Products are never removed, only hidden from the catalog.
    pub async fn deactivate_product(&self, actor: &Actor, product_id: &str) -> Result<(), AppError> {
        let mut product = self.repo.get_product(product_id).await?;
        guard::authorize_product(actor, &product)?;

        product.is_active = false;
        product.updated_at = Utc::now();
        self.repo.update_product(&product).await?;
        info!("Deactivated product {}", product_id);
        Ok(())
    }

    pub async fn update_stock(
        &self,
        actor: &Actor,
        product_id: &str,
        stock_quantity: i32,
    ) -> Result<Product, AppError> {
        let product = self.repo.get_product(product_id).await?;
        guard::authorize_product(actor, &product)?;

        if stock_quantity < 0 {
            return Err(ShopError::NegativeStock.into());
        }
        Ok(self.repo.set_product_stock(product_id, stock_quantity).await?)
    }

    /// Veterinarians only see their own catalog here; everyone else may browse any.
    pub async fn list_veterinarian_products(
        &self,
        actor: &Actor,
        veterinarian_id: &str,
    ) -> Result<Vec<Product>, AppError> {
        if actor.is_veterinarian() && actor.id != veterinarian_id {
            return Err(guard::forbidden(actor, "catalog listing"));
        }

        let filters = ProductFilters {
            veterinarian_id: Some(veterinarian_id.to_string()),
            limit: Some(CATALOG_PAGE_LIMIT),
            ..Default::default()
        };
        Ok(self.repo.list_products(&filters).await?)
    }
}
