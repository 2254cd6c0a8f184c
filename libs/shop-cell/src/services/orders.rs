use std::str::FromStr;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use auth_cell::guard;
use shared_database::{OrderQuery, OrderRepository, ProductRepository, ProfileRepository, RepositoryError};
use shared_models::auth::{Actor, Role};
use shared_models::error::AppError;
use shared_models::shop::{Order, OrderItem, OrderStatus, PaymentStatus};

use crate::models::{
    CreateOrderRequest, OrderDetails, OrderLineRequest, OrderListQuery, ShopError,
    UpdateOrderStatusRequest,
};

pub struct OrderService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> OrderService<'a, R>
where
    R: ProfileRepository + ProductRepository + OrderRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Prices every line from the current catalog, then persists the order,
    /// its items and the stock decrement in one storage call.
    pub async fn create_order(
        &self,
        actor: &Actor,
        on_behalf_of: Option<String>,
        request: CreateOrderRequest,
    ) -> Result<OrderDetails, AppError> {
        let client_id = match &actor.role {
            Role::Client => actor.id.clone(),
            Role::Admin => on_behalf_of
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| actor.id.clone()),
            _ => return Err(ShopError::OrderingNotAllowed.into()),
        };

        if request.veterinarian_id.is_empty() || request.items.is_empty() {
            return Err(ShopError::MissingOrderFields.into());
        }

        self.repo.get_veterinarian(&request.veterinarian_id).await?;

        let lines = merge_lines(&request.items)?;

        let order_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(lines.len());
        let mut total_amount = 0.0;

        for (product_id, quantity) in lines {
            let product = match self.repo.get_product(product_id).await {
                Ok(product) => product,
                Err(RepositoryError::NotFound(_)) => {
                    return Err(ShopError::UnknownProduct(product_id.to_string()).into())
                }
                Err(e) => return Err(e.into()),
            };
            if !product.is_active {
                return Err(ShopError::InactiveProduct(product.name).into());
            }
            if product.veterinarian_id != request.veterinarian_id {
                return Err(ShopError::MixedVeterinarians.into());
            }
            if product.stock_quantity < quantity {
                return Err(ShopError::InsufficientStock(product.name).into());
            }

            let total_price = product.price * f64::from(quantity);
            total_amount += total_price;
            items.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: product.id,
                quantity,
                unit_price: product.price,
                total_price,
            });
        }

        let now = Utc::now();
        let order = Order {
            id: order_id,
            client_id,
            veterinarian_id: request.veterinarian_id,
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: request.payment_method,
            shipping_address: request.shipping_address,
            delivery_method: request.delivery_method,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        // Stock may have moved since the checks above; storage has the final word.
        let order = self.repo.create_order(&order, &items).await?;
        info!(
            "Created order {} for client {} with {} items",
            order.id,
            order.client_id,
            items.len()
        );

        Ok(OrderDetails { order, items })
    }

    pub async fn list_orders(&self, actor: &Actor, query: &OrderListQuery) -> Result<Vec<Order>, AppError> {
        let scope = match &actor.role {
            Role::Client => OrderQuery {
                client_id: Some(actor.id.clone()),
                ..Default::default()
            },
            Role::Veterinarian => OrderQuery {
                veterinarian_id: Some(actor.id.clone()),
                ..Default::default()
            },
            Role::Admin => OrderQuery {
                client_id: query.client_id.clone().filter(|id| !id.is_empty()),
                veterinarian_id: query.veterinarian_id.clone().filter(|id| !id.is_empty()),
            },
            Role::Unrecognized(_) => return Err(guard::forbidden(actor, "order listing")),
        };

        debug!("Listing orders with {:?}", scope);
        Ok(self.repo.list_orders(&scope).await?)
    }

    pub async fn get_order(&self, actor: &Actor, order_id: &str) -> Result<OrderDetails, AppError> {
        let order = self.repo.get_order(order_id).await?;
        guard::authorize_order(actor, &order)?;

        let items = self.repo.list_order_items(order_id).await?;
        Ok(OrderDetails { order, items })
    }

    /// Moves an order along its fulfilment path. Delivered and cancelled
    /// orders are final. A transition to `cancelled` goes through the
    /// cancellation path so stock is restored exactly once.
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: &str,
        request: UpdateOrderStatusRequest,
    ) -> Result<Order, AppError> {
        let order = self.repo.get_order(order_id).await?;
        guard::authorize_order_fulfilment(actor, &order)?;

        let status = request
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(OrderStatus::from_str)
            .transpose()
            .map_err(|_| ShopError::InvalidOrderStatus)?;
        let payment_status = request
            .payment_status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(PaymentStatus::from_str)
            .transpose()
            .map_err(|_| ShopError::InvalidPaymentStatus)?;

        if let Some(next) = status {
            if !order.status.can_transition_to(next) {
                debug!("Order {} refused move {} -> {}", order.id, order.status, next);
                return Err(ShopError::StatusTransition {
                    from: order.status,
                    to: next,
                }
                .into());
            }
        }

        let order = match status {
            Some(OrderStatus::Cancelled) => {
                let cancelled = self.cancel(&order).await?;
                if payment_status.is_none() {
                    cancelled
                } else {
                    self.repo
                        .update_order_status(order_id, OrderStatus::Cancelled, None, payment_status)
                        .await?
                }
            }
            _ => {
                self.repo
                    .update_order_status(order_id, order.status, status, payment_status)
                    .await?
            }
        };

        info!("Order {} is now {} / {}", order.id, order.status, order.payment_status);
        Ok(order)
    }

    pub async fn cancel_order(&self, actor: &Actor, order_id: &str) -> Result<Order, AppError> {
        let order = self.repo.get_order(order_id).await?;
        guard::authorize_order(actor, &order)?;

        self.cancel(&order).await
    }

    async fn cancel(&self, order: &Order) -> Result<Order, AppError> {
        if !order.status.is_cancellable() {
            return Err(ShopError::NotCancellable.into());
        }

        let cancelled = self.repo.cancel_order(&order.id).await?;
        info!("Cancelled order {} and restored stock", order.id);
        Ok(cancelled)
    }
}

/// Folds repeated product lines into one quantity per product, in first-seen order.
fn merge_lines(lines: &[OrderLineRequest]) -> Result<Vec<(&str, i32)>, ShopError> {
    let mut merged: Vec<(&str, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(ShopError::InvalidQuantity);
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity
                    .checked_add(line.quantity)
                    .ok_or(ShopError::QuantityTooLarge)?;
            }
            None => merged.push((line.product_id.as_str(), line.quantity)),
        }
    }
    Ok(merged)
}
